// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Queries that read a whole collection

use std::sync::Arc;

use mql_analyzer_ir::{CommandType, IsCommand, Node};

use crate::insight::{Insight, InsightKind, InsightSink};
use crate::linter::{Inspection, Linter};
use crate::metadata::LintInput;

/// Reports index-capable commands without any filter
#[derive(Debug, Clone, Copy, Default)]
pub struct NotUsingFiltersLinter;

impl<S: Clone> Linter<S> for NotUsingFiltersLinter {
    fn inspection(&self) -> Inspection {
        Inspection::NotUsingFilters
    }

    fn run(&self, query: &Arc<Node<S>>, _input: &LintInput, sink: &mut InsightSink<S>) {
        let Some(IsCommand { command_type }) = query.component::<IsCommand>() else {
            return;
        };
        // estimatedDocumentCount reads collection metadata, not documents
        if !command_type.uses_indexes() || *command_type == CommandType::EstimatedDocumentCount {
            return;
        }

        if query.all_filters_recursively().is_empty() {
            sink.register(Insight::new(
                query.clone(),
                query.source.clone(),
                InsightKind::QueryNotUsingFilters,
            ));
        }
    }
}
