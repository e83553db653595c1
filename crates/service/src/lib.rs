// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # MQL Analyzer - Service
//!
//! This crate ties parsing, metadata and linting together for an editor integration.
//!
//! ## Overview
//!
//! The service provides:
//! - Source tracking: generation counters per anchor, bumped by the host on edits
//! - A query cache that parses each anchor once per generation, with a weak namespace
//!   index for sibling lookups
//! - A dialect registry routing expressions to the client library that owns them
//! - Decoration of parsed queries with cluster metadata
//! - The analysis pipeline, configuration and logging bootstrap
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │      Host (editor, source tracking)      │
//! └──────────────┬───────────────────────────┘
//!                │ touch / discard / analyze
//!                ↓
//! ┌──────────────────────────────────────────┐
//! │             AnalysisService              │
//! ├──────────────────────────────────────────┤
//! │  QueryCache ← DialectRegistry (lowering) │
//! │  Decorator  ← ReadModel (catalog)        │
//! │  LintEngine → InsightDispatcher          │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mql_analyzer_service::{AnalysisService, AnalyzerConfig, logging};
//!
//! let config = AnalyzerConfig::from_settings(&settings)?;
//! logging::init(&config)?;
//!
//! let service = AnalysisService::new(config, Arc::new(read_model))?;
//! let insights = service.analyze(&program, anchor).await?;
//!
//! // After the user edited the query
//! service.tracker().touch(anchor);
//! ```

pub mod cache;
pub mod config;
pub mod decoration;
pub mod error;
pub mod logging;
pub mod registry;
pub mod service;
pub mod tracker;

pub use cache::{QueryCache, QueryParser};
pub use config::{AnalyzerConfig, ConfigError, DEFAULT_TRAVERSAL_LIMIT, SETTINGS_KEY};
pub use decoration::Decorator;
pub use error::{ServiceError, ServiceResult};
pub use registry::{DialectRegistry, ProgramQueries};
pub use service::AnalysisService;
pub use tracker::{INITIAL_GENERATION, SourceTracker};
