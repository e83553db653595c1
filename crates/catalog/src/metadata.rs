// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Cluster metadata
//!
//! Values returned by a [`crate::ReadModel`] besides collection schemas.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ratio of examined documents to returned documents above which an index scan is
/// considered ineffective
pub const INEFFECTIVE_EXAMINED_RATIO: f64 = 50.0;

/// How the server would run a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExplainPlan {
    /// The explain was not run or its output was not understood
    NotRun,
    /// Every document of the collection is read
    CollectionScan,
    /// An index is used, but the server still filters or sorts in memory
    IneffectiveIndexUsage,
    /// An index drives the query
    IndexScan,
}

impl ExplainPlan {
    /// Classify the output of an `explain` command.
    ///
    /// The winning plan is inspected at its root and first input stage:
    /// - `COLLSCAN` is a collection scan
    /// - `IXSCAN`/`IDHACK` below a `FILTER` or `SORT` stage is ineffective
    /// - `IXSCAN`/`IDHACK` otherwise is an index scan, unless `executionStats` show at
    ///   least [`INEFFECTIVE_EXAMINED_RATIO`] examined documents per returned document
    pub fn classify(explain_output: &Value) -> ExplainPlan {
        let Some(winning_plan) = explain_output
            .get("queryPlanner")
            .and_then(|planner| planner.get("winningPlan"))
        else {
            return ExplainPlan::NotRun;
        };

        let root_stage = stage_name(winning_plan);
        let scan_stage = winning_plan
            .get("inputStage")
            .map(stage_name)
            .unwrap_or(root_stage);

        match scan_stage {
            Some("COLLSCAN") => ExplainPlan::CollectionScan,
            Some("IXSCAN") | Some("IDHACK") => {
                if matches!(root_stage, Some("FILTER") | Some("SORT")) {
                    ExplainPlan::IneffectiveIndexUsage
                } else if examined_ratio(explain_output)
                    .is_some_and(|ratio| ratio >= INEFFECTIVE_EXAMINED_RATIO)
                {
                    ExplainPlan::IneffectiveIndexUsage
                } else {
                    ExplainPlan::IndexScan
                }
            }
            _ => ExplainPlan::NotRun,
        }
    }
}

fn stage_name(stage: &Value) -> Option<&str> {
    stage.get("stage").and_then(Value::as_str)
}

fn examined_ratio(explain_output: &Value) -> Option<f64> {
    let stats = explain_output.get("executionStats")?;
    let returned = stats.get("nReturned")?.as_f64()?;
    let examined = stats.get("totalDocsExamined")?.as_f64()?;
    if returned <= 0.0 {
        return None;
    }
    Some(examined / returned)
}

/// Server build information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub version: String,
    #[serde(default)]
    pub is_atlas: bool,
    #[serde(default)]
    pub is_enterprise: bool,
}

impl BuildInfo {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            is_atlas: false,
            is_enterprise: false,
        }
    }

    pub fn with_atlas(mut self) -> Self {
        self.is_atlas = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_collection_scan() {
        let output = json!({"queryPlanner": {"winningPlan": {"stage": "COLLSCAN"}}});
        assert_eq!(ExplainPlan::classify(&output), ExplainPlan::CollectionScan);
    }

    #[test]
    fn test_classify_fetch_over_index() {
        let output = json!({"queryPlanner": {"winningPlan": {
            "stage": "FETCH",
            "inputStage": {"stage": "IXSCAN"}
        }}});
        assert_eq!(ExplainPlan::classify(&output), ExplainPlan::IndexScan);
    }

    #[test]
    fn test_classify_in_memory_filter_and_sort() {
        for stage in ["FILTER", "SORT"] {
            let output = json!({"queryPlanner": {"winningPlan": {
                "stage": stage,
                "inputStage": {"stage": "IXSCAN"}
            }}});
            assert_eq!(
                ExplainPlan::classify(&output),
                ExplainPlan::IneffectiveIndexUsage
            );
        }
    }

    #[test]
    fn test_classify_examined_ratio() {
        let plan = json!({"stage": "FETCH", "inputStage": {"stage": "IXSCAN"}});
        let wasteful = json!({
            "executionStats": {"nReturned": 1, "totalDocsExamined": 50},
            "queryPlanner": {"winningPlan": plan.clone()}
        });
        let fine = json!({
            "executionStats": {"nReturned": 1, "totalDocsExamined": 15},
            "queryPlanner": {"winningPlan": plan}
        });
        assert_eq!(ExplainPlan::classify(&wasteful), ExplainPlan::IneffectiveIndexUsage);
        assert_eq!(ExplainPlan::classify(&fine), ExplainPlan::IndexScan);
    }

    #[test]
    fn test_classify_unknown_output() {
        assert_eq!(ExplainPlan::classify(&json!({})), ExplainPlan::NotRun);
        let output = json!({"queryPlanner": {"winningPlan": {"stage": "EOF"}}});
        assert_eq!(ExplainPlan::classify(&output), ExplainPlan::NotRun);
    }
}
