// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # MQL Analyzer - Lowering Layer
//!
//! This crate turns host-language syntax into the query IR, and the IR back into
//! user-facing text.
//!
//! ## Overview
//!
//! The lowering layer is responsible for:
//! - Resolving expressions to compile-time constants ([`ConstantResolver`])
//! - Inferring which database and collection a query targets ([`NamespaceExtractor`])
//! - Recognising and parsing the query shapes of each client library
//!   ([`DialectParser`] implementations)
//! - Rendering queries and types for users ([`DialectFormatter`] implementations and
//!   [`dialect::mongosh::index_command`])
//!
//! ## Lowering Process
//!
//! ```text
//! Program (syntax) → is_candidate → anchor → parse → Node<ExprId> → format
//! ```
//!
//! ## Error Handling Strategy
//!
//! Parsing degrades instead of failing:
//!
//! - **Success**: every fragment lowered
//! - **Partial**: unknown shapes became `Named(Unknown)` nodes, errors recorded in the
//!   [`LoweringContext`]
//! - **Failed**: the expression is not a query of the dialect, or not its anchor
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mql_analyzer_lowering::{Dialect, LoweringContext};
//!
//! let dialect = Dialect::java_driver();
//! let parser = dialect.parser();
//! if parser.is_candidate(&program, expr) {
//!     let anchor = parser.anchor(&program, expr);
//!     let mut ctx = LoweringContext::new(dialect.id());
//!     let query = parser.parse(&mut ctx, &program, anchor)?;
//!     if ctx.has_errors() {
//!         println!("lowered with {} errors", ctx.errors().len());
//!     }
//! }
//! ```

pub mod context;
pub mod dialect;
pub mod error;
pub mod namespace;
pub mod resolver;
pub mod types;

pub use context::LoweringContext;
pub use dialect::{Dialect, DialectFormatter, DialectParser, JavaTypeFormatter, OutputQuery};
#[cfg(feature = "java-driver")]
pub use dialect::JavaDriverParser;
#[cfg(feature = "mongosh")]
pub use dialect::MongoshFormatter;
#[cfg(feature = "spring-criteria")]
pub use dialect::SpringCriteriaParser;
pub use error::{ErrorSeverity, LoweringError, LoweringOutcome, LoweringResult};
pub use namespace::NamespaceExtractor;
pub use resolver::ConstantResolver;
