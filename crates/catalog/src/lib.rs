// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # MQL Analyzer - Catalog Layer
//!
//! This crate provides the read model through which the analyzer learns about the
//! cluster a query targets. It defines the `ReadModel` trait and the metadata used for:
//!
//! - **Namespace checks**: database and collection listings
//! - **Field checks**: sampled collection schemas
//! - **Index checks**: explain plans
//! - **Decoration**: the server version of the target cluster
//!
//! ## Implementations
//!
//! - [`StaticReadModel`]: answers from a YAML/JSON snapshot
//! - Live cluster access belongs to the embedding tool and plugs in through the trait
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mql_analyzer_catalog::{ReadModel, StaticReadModel};
//!
//! let model = StaticReadModel::from_file("cluster.yaml")?;
//! for database in model.list_databases().await? {
//!     println!("{database}");
//! }
//! ```

pub mod error;
pub mod metadata;
pub mod r#static;
pub mod r#trait;

// Re-exports
pub use error::{ErrorSeverity, ReadModelError, ReadModelResult};
pub use metadata::{BuildInfo, ExplainPlan, INEFFECTIVE_EXAMINED_RATIO};
pub use r#static::{
    CollectionSnapshot, DatabaseSnapshot, FieldSpec, ReadModelSnapshot, StaticReadModel,
    parse_type_name,
};
pub use r#trait::ReadModel;
