// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Error types for linting
//!
//! Linters themselves never fail: missing metadata is reported as a
//! [`InsightKind::CannotCheck`](crate::InsightKind::CannotCheck) insight. The errors here
//! belong to the edges of a lint pass, i.e. metadata access and insight dispatch.

use mql_analyzer_catalog::ReadModelError;
use thiserror::Error;

/// Result type alias for linting operations
pub type LintResult<T> = Result<T, LintError>;

/// Errors that can occur around a lint pass
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LintError {
    /// The read model failed while metadata was required
    #[error("Metadata unavailable: {0}")]
    Metadata(#[from] ReadModelError),

    /// The receiving side of a channel dispatcher was dropped
    #[error("Insight channel closed after {delivered} of {total} insights")]
    ChannelClosed { delivered: usize, total: usize },

    /// An insight could not be exported
    #[error("Failed to serialize insight: {0}")]
    Serialization(String),
}

impl LintError {
    /// Whether running the pass again may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            LintError::Metadata(err) => err.is_recoverable(),
            LintError::ChannelClosed { .. } => false,
            LintError::Serialization(_) => false,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LintError::Metadata(err) => match err.severity() {
                mql_analyzer_catalog::ErrorSeverity::Info => ErrorSeverity::Info,
                mql_analyzer_catalog::ErrorSeverity::Warning => ErrorSeverity::Warning,
                mql_analyzer_catalog::ErrorSeverity::Error => ErrorSeverity::Error,
            },
            LintError::ChannelClosed { .. } => ErrorSeverity::Warning,
            LintError::Serialization(_) => ErrorSeverity::Error,
        }
    }
}

impl From<serde_json::Error> for LintError {
    fn from(err: serde_json::Error) -> Self {
        LintError::Serialization(err.to_string())
    }
}

/// Severity level for lint errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LintError::ChannelClosed {
            delivered: 1,
            total: 3,
        };
        assert_eq!(err.to_string(), "Insight channel closed after 1 of 3 insights");

        let err: LintError = ReadModelError::NoConnection.into();
        assert_eq!(err.to_string(), "Metadata unavailable: No connection is available");
    }

    #[test]
    fn test_metadata_errors_keep_their_classification() {
        let err = LintError::from(ReadModelError::Timeout(5));
        assert!(err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = LintError::from(ReadModelError::SerializationError("bad".into()));
        assert!(!err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }
}
