// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Linter trait and lint engine
//!
//! A [`Linter`] inspects one query against its [`LintInput`] and registers what it finds
//! in an [`InsightSink`]. Linters never mutate the query and never fail: missing
//! metadata becomes a `CannotCheck` insight.
//!
//! The [`LintEngine`] runs the enabled [`Inspection`]s in a fixed order, so insights come
//! out ordered by linter and then by discovery.

use std::sync::Arc;

use mql_analyzer_ir::Node;
use serde::{Deserialize, Serialize};

use crate::error::LintError;
use crate::insight::{Insight, InsightKind, InsightSink};
use crate::linters::{
    FieldCheckingLinter, IndexCheckingLinter, InvalidProjectionLinter, NamespaceCheckingLinter,
    NotUsingFiltersLinter,
};
use crate::metadata::LintInput;

/// A check over one query
pub trait Linter<S>: Send + Sync {
    fn inspection(&self) -> Inspection;

    fn run(&self, query: &Arc<Node<S>>, input: &LintInput, sink: &mut InsightSink<S>);
}

/// The available checks, in the order the engine runs them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Inspection {
    NamespaceCheck,
    FieldCheck,
    InvalidProjection,
    NotUsingFilters,
    IndexCheck,
}

impl Inspection {
    pub const ALL: [Inspection; 5] = [
        Inspection::NamespaceCheck,
        Inspection::FieldCheck,
        Inspection::InvalidProjection,
        Inspection::NotUsingFilters,
        Inspection::IndexCheck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Inspection::NamespaceCheck => "namespace-check",
            Inspection::FieldCheck => "field-check",
            Inspection::InvalidProjection => "invalid-projection",
            Inspection::NotUsingFilters => "not-using-filters",
            Inspection::IndexCheck => "index-check",
        }
    }

    pub fn linter<S: Clone + 'static>(self) -> &'static dyn Linter<S> {
        match self {
            Inspection::NamespaceCheck => &NamespaceCheckingLinter,
            Inspection::FieldCheck => &FieldCheckingLinter,
            Inspection::InvalidProjection => &InvalidProjectionLinter,
            Inspection::NotUsingFilters => &NotUsingFiltersLinter,
            Inspection::IndexCheck => &IndexCheckingLinter,
        }
    }
}

impl std::fmt::Display for Inspection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Inspection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Inspection::ALL
            .into_iter()
            .find(|inspection| inspection.as_str() == s)
            .ok_or_else(|| format!("unknown inspection '{s}'"))
    }
}

/// The `CannotCheck` insight for a check whose metadata is unavailable
pub(crate) fn cannot_check<S: Clone>(
    query: &Arc<Node<S>>,
    inspection: Inspection,
    reason: &LintError,
) -> Insight<S> {
    Insight::new(query.clone(), query.source.clone(), InsightKind::CannotCheck)
        .with_argument(inspection.as_str())
        .with_argument(reason.to_string())
}

/// Runs a set of inspections over queries
#[derive(Debug, Clone)]
pub struct LintEngine {
    inspections: Vec<Inspection>,
}

impl Default for LintEngine {
    fn default() -> Self {
        Self::new(Inspection::ALL)
    }
}

impl LintEngine {
    /// Duplicates are dropped and the engine order is restored
    pub fn new(inspections: impl IntoIterator<Item = Inspection>) -> Self {
        let mut inspections: Vec<Inspection> = inspections.into_iter().collect();
        inspections.sort();
        inspections.dedup();
        Self { inspections }
    }

    pub fn inspections(&self) -> &[Inspection] {
        &self.inspections
    }

    pub fn run<S: Clone + 'static>(&self, query: &Arc<Node<S>>, input: &LintInput) -> Vec<Insight<S>> {
        let mut sink = InsightSink::new();
        for inspection in &self.inspections {
            let before = sink.len();
            inspection.linter::<S>().run(query, input, &mut sink);
            tracing::debug!(
                inspection = inspection.as_str(),
                insights = sink.len() - before,
                "Ran inspection"
            );
        }
        sink.into_insights()
    }
}
