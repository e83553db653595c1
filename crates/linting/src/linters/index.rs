// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Index usage check over an explain plan

use std::sync::Arc;

use mql_analyzer_catalog::ExplainPlan;
use mql_analyzer_ir::Node;

use crate::insight::{Insight, InsightKind, InsightSink};
use crate::linter::{Inspection, Linter, cannot_check};
use crate::metadata::LintInput;

/// Reports queries the server would run without an index, or with an ineffective one
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexCheckingLinter;

impl<S: Clone> Linter<S> for IndexCheckingLinter {
    fn inspection(&self) -> Inspection {
        Inspection::IndexCheck
    }

    fn run(&self, query: &Arc<Node<S>>, input: &LintInput, sink: &mut InsightSink<S>) {
        let plan = match input.explain.require() {
            Ok(Some(plan)) => *plan,
            Ok(None) => return,
            Err(err) => {
                sink.register(cannot_check(query, Inspection::IndexCheck, &err));
                return;
            }
        };

        let kind = match plan {
            ExplainPlan::CollectionScan => InsightKind::QueryNotCoveredByIndex,
            ExplainPlan::IneffectiveIndexUsage => InsightKind::QueryNotUsingEffectiveIndex,
            ExplainPlan::IndexScan | ExplainPlan::NotRun => return,
        };
        sink.register(Insight::new(query.clone(), query.source.clone(), kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Metadata;
    use mql_analyzer_catalog::ReadModelError;

    fn run(explain: Metadata<ExplainPlan>) -> Vec<InsightKind> {
        let query = Arc::new(Node::new(9u32, []));
        let input = LintInput {
            explain,
            ..LintInput::not_applicable()
        };
        let mut sink = InsightSink::new();
        IndexCheckingLinter.run(&query, &input, &mut sink);
        sink.insights().iter().map(|insight| insight.kind).collect()
    }

    #[test]
    fn test_plan_classification() {
        assert_eq!(
            run(Metadata::Available(ExplainPlan::CollectionScan)),
            vec![InsightKind::QueryNotCoveredByIndex]
        );
        assert_eq!(
            run(Metadata::Available(ExplainPlan::IneffectiveIndexUsage)),
            vec![InsightKind::QueryNotUsingEffectiveIndex]
        );
        assert!(run(Metadata::Available(ExplainPlan::IndexScan)).is_empty());
        assert!(run(Metadata::Available(ExplainPlan::NotRun)).is_empty());
        assert!(run(Metadata::NotApplicable).is_empty());
    }

    #[test]
    fn test_failed_explain_cannot_be_checked() {
        assert_eq!(
            run(Metadata::Unavailable(ReadModelError::Timeout(30))),
            vec![InsightKind::CannotCheck]
        );
    }
}
