// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # MQL Analyzer - Linting
//!
//! This crate checks parsed queries against cluster metadata and reports insights.
//!
//! ## Overview
//!
//! A lint pass has three stages:
//!
//! 1. **Gather** ([`MetadataGatherer`], async): fetch schema, database and collection
//!    listings and the explain plan of the query from a read model
//! 2. **Lint** ([`LintEngine`], synchronous): run the enabled [`Inspection`]s over the
//!    query and the gathered [`LintInput`]
//! 3. **Dispatch** ([`InsightDispatcher`], async): hand the insights to logging or to a
//!    channel
//!
//! ## Checks
//!
//! | Inspection | Reports |
//! |---|---|
//! | `namespace-check` | `NoNamespaceInferred`, `DatabaseDoesNotExist`, `CollectionDoesNotExist` |
//! | `field-check` | `FieldDoesNotExist`, `FieldValueTypeMismatch` |
//! | `invalid-projection` | `InvalidProjection` |
//! | `not-using-filters` | `QueryNotUsingFilters` |
//! | `index-check` | `QueryNotCoveredByIndex`, `QueryNotUsingEffectiveIndex` |
//!
//! Any check whose metadata could not be fetched reports `CannotCheck` instead.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mql_analyzer_linting::{LintEngine, MetadataGatherer, TracingDispatcher, InsightDispatcher};
//!
//! let input = MetadataGatherer::new(&read_model).gather(&query).await;
//! let insights = LintEngine::default().run(&query, &input);
//! TracingDispatcher.dispatch(&insights).await?;
//! ```

pub mod dispatch;
pub mod error;
pub mod insight;
pub mod linter;
pub mod linters;
pub mod metadata;

pub use dispatch::{ChannelDispatcher, InsightDispatcher, TracingDispatcher};
pub use error::{ErrorSeverity, LintError, LintResult};
pub use insight::{Insight, InsightAction, InsightKind, InsightSink, InspectionCategory};
pub use linter::{Inspection, LintEngine, Linter};
pub use linters::{
    FieldCheckingLinter, IndexCheckingLinter, InvalidProjectionLinter, NamespaceCheckingLinter,
    NotUsingFiltersLinter,
};
pub use metadata::{DEFAULT_SAMPLE_SIZE, LintInput, Metadata, MetadataGatherer};
