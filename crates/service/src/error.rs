// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Error types for the analysis service

use mql_analyzer_linting::LintError;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors of the analysis service
///
/// Parsing and metadata failures never surface here: the former degrade to partial
/// queries, the latter to undecorated queries and `CannotCheck` insights.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Insights were computed but could not be dispatched
    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] LintError),
}
