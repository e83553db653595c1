// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Source Dialects
//!
//! A dialect is a client library whose query-building idioms the analyzer understands.
//!
//! ## Dialects
//!
//! - **Java Driver**: `MongoCollection` calls with `Filters`, `Updates`, `Aggregates`,
//!   `Projections` and `Sorts` builders
//! - **Spring Criteria**: `MongoTemplate` operations over `Criteria.where(...)` chains
//! - **Mongosh**: the shell syntax, only used as an output format

use serde::{Deserialize, Serialize};

/// Supported client-library dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum SourceDialect {
    /// MongoDB Java driver (sync and reactive builders)
    JavaDriver,
    /// Spring Data MongoDB `Criteria` API
    SpringCriteria,
    /// The MongoDB shell
    Mongosh,
}

impl SourceDialect {
    /// Stable identifier used in configuration and logs
    pub fn id(&self) -> &'static str {
        match self {
            SourceDialect::JavaDriver => "java-driver",
            SourceDialect::SpringCriteria => "spring-criteria",
            SourceDialect::Mongosh => "mongosh",
        }
    }

    /// Whether queries written in this dialect can be parsed from host code
    pub fn is_parseable(&self) -> bool {
        matches!(self, SourceDialect::JavaDriver | SourceDialect::SpringCriteria)
    }

    /// Whether this dialect can render executable text
    pub fn renders_executable_text(&self) -> bool {
        matches!(self, SourceDialect::Mongosh)
    }
}

impl std::fmt::Display for SourceDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
