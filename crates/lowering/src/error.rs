// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Error types and handling strategy for the lowering layer
//!
//! Most problems met while lowering are not errors at all: an unknown call shape becomes
//! a `Named(Unknown)` node and an unresolvable symbol becomes an `Unknown` or `Runtime`
//! reference. The errors below are recorded in the [`crate::LoweringContext`] for
//! diagnostics, and only a few of them abort a parse.

use serde::Serialize;

use mql_analyzer_ir::SourceDialect;

/// Result type alias for lowering operations
pub type LoweringResult<T> = Result<T, LoweringError>;

/// Outcome of a lowering operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoweringOutcome {
    /// Every fragment was understood
    Success,

    /// The query was produced, but some fragments degraded to unknown placeholders
    Partial(Vec<LoweringError>),

    /// No query could be produced
    Failed(LoweringError),
}

/// Errors that can occur while lowering host syntax to a query
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq, Serialize)]
pub enum LoweringError {
    /// The expression is not a query of the dialect
    #[error("Expression {expr} is not a {dialect} query")]
    NotACandidate { dialect: SourceDialect, expr: String },

    /// The expression is part of a query owned by another anchor
    #[error("Expression {expr} belongs to the query anchored at {anchor}")]
    NotTheAnchor { expr: String, anchor: String },

    /// A call shape the dialect doesn't recognise
    #[error("Syntax not supported by {dialect}: {feature}")]
    UnsupportedSyntax {
        dialect: SourceDialect,
        feature: String,
    },

    /// A name or value could not be resolved at analysis time
    #[error("Could not resolve {what} at {expr}")]
    Unresolved { what: String, expr: String },

    /// Recursion limit exceeded (e.g. deeply nested helper methods)
    #[error("Recursion limit exceeded: {context} (depth: {depth}, limit: {limit})")]
    RecursionLimitExceeded {
        context: String,
        depth: usize,
        limit: usize,
    },

    /// Generic lowering error for other cases
    #[error("Lowering error: {message}")]
    Generic { message: String },
}

impl LoweringError {
    /// Check if this error is recoverable (allows partial success)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LoweringError::UnsupportedSyntax { .. }
                | LoweringError::Unresolved { .. }
                | LoweringError::RecursionLimitExceeded { .. }
        )
    }

    /// Get the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LoweringError::NotACandidate { .. } => ErrorSeverity::Error,
            LoweringError::NotTheAnchor { .. } => ErrorSeverity::Error,
            LoweringError::UnsupportedSyntax { .. } => ErrorSeverity::Warning,
            LoweringError::Unresolved { .. } => ErrorSeverity::Info,
            LoweringError::RecursionLimitExceeded { .. } => ErrorSeverity::Warning,
            LoweringError::Generic { .. } => ErrorSeverity::Error,
        }
    }
}

/// Severity level for lowering errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational note (e.g., a runtime value)
    Info,
    /// Warning (e.g., unsupported call that was skipped)
    Warning,
    /// Error (e.g., the expression is not a query)
    Error,
}
