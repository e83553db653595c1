// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for read model operations
//!
//! Every read model call is fallible. Callers never treat these errors as fatal: a
//! failed lookup degrades the analysis (an undecorated query, a "cannot check" insight)
//! instead of aborting it.

use serde::Serialize;
use thiserror::Error;

use mql_analyzer_ir::Namespace;

/// Result type alias for read model operations
pub type ReadModelResult<T> = Result<T, ReadModelError>;

/// Errors that can occur while reading cluster metadata
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
pub enum ReadModelError {
    /// No data source is attached to the file being analyzed
    #[error("No connection is available")]
    NoConnection,

    /// Failed to reach the cluster
    #[error("Failed to connect to cluster: {0}")]
    ConnectionFailed(String),

    /// A metadata command failed on the server
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// A metadata command timed out
    #[error("Command timed out after {0}s")]
    Timeout(u64),

    /// Requested database was not found
    #[error("Database '{0}' not found")]
    DatabaseNotFound(String),

    /// Requested collection was not found
    #[error("Collection '{0}' not found")]
    CollectionNotFound(Namespace),

    /// The query has no namespace the read model can act on
    #[error("Query has no resolvable namespace")]
    UnresolvedNamespace,

    /// Failed to parse a metadata snapshot
    #[error("Failed to parse metadata snapshot: {0}")]
    SerializationError(String),

    /// The current user cannot run the command
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The read model does not provide this kind of metadata
    #[error("Not supported: {0}")]
    NotSupported(String),
}

impl ReadModelError {
    /// Whether retrying later (or with a different connection) may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ReadModelError::NoConnection
                | ReadModelError::ConnectionFailed(_)
                | ReadModelError::Timeout(_)
                | ReadModelError::CommandFailed(_)
        )
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ReadModelError::NoConnection => ErrorSeverity::Info,
            ReadModelError::NotSupported(_) | ReadModelError::UnresolvedNamespace => {
                ErrorSeverity::Info
            }
            ReadModelError::DatabaseNotFound(_)
            | ReadModelError::CollectionNotFound(_)
            | ReadModelError::PermissionDenied(_)
            | ReadModelError::Timeout(_) => ErrorSeverity::Warning,
            ReadModelError::ConnectionFailed(_)
            | ReadModelError::CommandFailed(_)
            | ReadModelError::SerializationError(_) => ErrorSeverity::Error,
        }
    }
}

/// Severity level for read model errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
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
        let err = ReadModelError::CollectionNotFound(Namespace::new("production", "books"));
        assert_eq!(err.to_string(), "Collection 'production.books' not found");
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(ReadModelError::NoConnection.is_recoverable());
        assert!(ReadModelError::Timeout(5).is_recoverable());
        assert!(!ReadModelError::SerializationError("bad".into()).is_recoverable());
    }

    #[test]
    fn test_error_severity() {
        assert_eq!(ReadModelError::NoConnection.severity(), ErrorSeverity::Info);
        assert_eq!(
            ReadModelError::DatabaseNotFound("x".into()).severity(),
            ErrorSeverity::Warning
        );
        assert!(ReadModelError::ConnectionFailed("refused".into()).severity() > ErrorSeverity::Warning);
    }

    #[test]
    fn test_error_serialization() {
        let json = serde_json::to_string(&ReadModelError::Timeout(3));
        assert!(json.is_ok());
    }
}
