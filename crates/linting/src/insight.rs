// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Insights
//!
//! An [`Insight`] is one finding about one query: what was found ([`InsightKind`]), where
//! in the host source ([`Insight::source`]) and the values that complete its message.
//!
//! Every kind belongs to an [`InspectionCategory`] and suggests a primary
//! [`InsightAction`] the editor may offer to the user.
//!
//! ## Message templates
//!
//! Messages are templates with positional placeholders:
//!
//! ```rust,ignore
//! let kind = InsightKind::DatabaseDoesNotExist;
//! assert_eq!(kind.message(&["shop".to_string()]), "Database \"shop\" does not exist");
//! ```

use std::sync::Arc;

use mql_analyzer_ir::Node;
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::LintResult;

/// What a linter found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InsightKind {
    /// Arguments: field, namespace
    FieldDoesNotExist,
    /// Arguments: field, value type, field type
    FieldValueTypeMismatch,
    /// Arguments: included field
    InvalidProjection,
    /// Arguments: `"database"` or `"collection"`
    NoNamespaceInferred,
    /// Arguments: database
    DatabaseDoesNotExist,
    /// Arguments: collection, database
    CollectionDoesNotExist,
    QueryNotCoveredByIndex,
    QueryNotUsingEffectiveIndex,
    QueryNotUsingFilters,
    /// Arguments: inspection, reason
    CannotCheck,
}

impl InsightKind {
    /// Stable code of this kind of insight
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::FieldDoesNotExist => "CORRECTNESS-001",
            InsightKind::FieldValueTypeMismatch => "CORRECTNESS-002",
            InsightKind::InvalidProjection => "CORRECTNESS-003",
            InsightKind::NoNamespaceInferred => "ENVIRONMENT-001",
            InsightKind::DatabaseDoesNotExist => "ENVIRONMENT-002",
            InsightKind::CollectionDoesNotExist => "ENVIRONMENT-003",
            InsightKind::CannotCheck => "ENVIRONMENT-004",
            InsightKind::QueryNotCoveredByIndex => "PERFORMANCE-001",
            InsightKind::QueryNotUsingEffectiveIndex => "PERFORMANCE-002",
            InsightKind::QueryNotUsingFilters => "PERFORMANCE-003",
        }
    }

    /// Message template, with `{0}`, `{1}`... standing for the insight arguments
    pub fn template(&self) -> &'static str {
        match self {
            InsightKind::FieldDoesNotExist => "Field \"{0}\" does not exist in collection \"{1}\"",
            InsightKind::FieldValueTypeMismatch => {
                "A value of type \"{1}\" cannot be assigned to field \"{0}\" of type \"{2}\""
            }
            InsightKind::InvalidProjection => {
                "Field \"{0}\" cannot be included in a projection that excludes other fields"
            }
            InsightKind::NoNamespaceInferred => "Cannot infer the {0} this query targets",
            InsightKind::DatabaseDoesNotExist => "Database \"{0}\" does not exist",
            InsightKind::CollectionDoesNotExist => {
                "Collection \"{0}\" does not exist in database \"{1}\""
            }
            InsightKind::QueryNotCoveredByIndex => "This query is not covered by any index",
            InsightKind::QueryNotUsingEffectiveIndex => {
                "This query uses an index but still filters or sorts in memory"
            }
            InsightKind::QueryNotUsingFilters => {
                "This query does not filter and reads the whole collection"
            }
            InsightKind::CannotCheck => "Cannot run {0}: {1}",
        }
    }

    /// Render the template with `arguments`; missing arguments stay as placeholders
    pub fn message(&self, arguments: &[String]) -> String {
        arguments
            .iter()
            .enumerate()
            .fold(self.template().to_string(), |message, (i, argument)| {
                message.replace(&format!("{{{i}}}"), argument)
            })
    }

    pub fn category(&self) -> InspectionCategory {
        match self {
            InsightKind::FieldDoesNotExist
            | InsightKind::FieldValueTypeMismatch
            | InsightKind::InvalidProjection => InspectionCategory::Correctness,
            InsightKind::NoNamespaceInferred
            | InsightKind::DatabaseDoesNotExist
            | InsightKind::CollectionDoesNotExist
            | InsightKind::CannotCheck => InspectionCategory::EnvironmentMismatch,
            InsightKind::QueryNotCoveredByIndex
            | InsightKind::QueryNotUsingEffectiveIndex
            | InsightKind::QueryNotUsingFilters => InspectionCategory::Performance,
        }
    }

    /// The action an editor should offer first
    pub fn action(&self) -> InsightAction {
        match self {
            InsightKind::FieldDoesNotExist | InsightKind::FieldValueTypeMismatch => {
                InsightAction::RunQuery
            }
            InsightKind::NoNamespaceInferred
            | InsightKind::DatabaseDoesNotExist
            | InsightKind::CollectionDoesNotExist
            | InsightKind::CannotCheck => InsightAction::ChooseConnection,
            InsightKind::QueryNotCoveredByIndex | InsightKind::QueryNotUsingEffectiveIndex => {
                InsightAction::CreateIndex
            }
            InsightKind::InvalidProjection | InsightKind::QueryNotUsingFilters => {
                InsightAction::None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InspectionCategory {
    Performance,
    Correctness,
    EnvironmentMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InsightAction {
    /// Run the query in a shell to see real documents
    RunQuery,
    /// Pick (another) data source for the file
    ChooseConnection,
    /// Generate a `createIndex` script
    CreateIndex,
    None,
}

/// A finding about a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight<S> {
    /// The query the finding is about
    #[serde(skip)]
    pub query: Arc<Node<S>>,
    /// The syntax element to highlight
    pub source: S,
    pub kind: InsightKind,
    pub arguments: Vec<String>,
}

impl<S> Insight<S> {
    pub fn new(query: Arc<Node<S>>, source: S, kind: InsightKind) -> Self {
        Self {
            query,
            source,
            kind,
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    pub fn message(&self) -> String {
        self.kind.message(&self.arguments)
    }

    /// JSON view of the insight, with its code, category and rendered message
    pub fn export(&self) -> LintResult<Value>
    where
        S: Serialize,
    {
        Ok(json!({
            "code": self.kind.as_str(),
            "kind": self.kind,
            "category": self.kind.category(),
            "action": self.kind.action(),
            "source": serde_json::to_value(&self.source)?,
            "message": self.message(),
            "arguments": self.arguments,
        }))
    }
}

/// Append-only collector of the insights of one lint pass
#[derive(Debug)]
pub struct InsightSink<S> {
    insights: Vec<Insight<S>>,
}

impl<S> Default for InsightSink<S> {
    fn default() -> Self {
        Self {
            insights: Vec::new(),
        }
    }
}

impl<S> InsightSink<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, insight: Insight<S>) {
        tracing::debug!(code = insight.kind.as_str(), "Registered insight");
        self.insights.push(insight);
    }

    pub fn insights(&self) -> &[Insight<S>] {
        &self.insights
    }

    pub fn len(&self) -> usize {
        self.insights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insights.is_empty()
    }

    pub fn into_insights(self) -> Vec<Insight<S>> {
        self.insights
    }
}
