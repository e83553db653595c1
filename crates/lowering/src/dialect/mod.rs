// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Dialects
//!
//! A dialect is the capability set needed to understand one client library:
//!
//! - [`DialectParser`]: recognises candidate expressions, picks the anchor that owns a
//!   query and lowers it to a [`Node`]
//! - [`DialectFormatter`]: renders types (and, for the shell, whole queries) as text
//!
//! Several dialects coexist in one program; a query anchor belongs to the first parser
//! that recognises it.

#[cfg(feature = "java-driver")]
pub mod java_driver;
#[cfg(feature = "mongosh")]
pub mod mongosh;
#[cfg(feature = "spring-criteria")]
pub mod spring_criteria;

pub mod java_types;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use mql_analyzer_ir::{
    BsonType, ConstantValue, Name, Named, Node, QueryContext, SourceDialect, ValueReference,
};
use mql_analyzer_syntax::{ExprId, Program};

use crate::context::LoweringContext;
use crate::error::LoweringResult;

#[cfg(feature = "java-driver")]
pub use java_driver::JavaDriverParser;
pub use java_types::JavaTypeFormatter;
#[cfg(feature = "mongosh")]
pub use mongosh::MongoshFormatter;
#[cfg(feature = "spring-criteria")]
pub use spring_criteria::SpringCriteriaParser;

/// Text produced by a formatter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "text", rename_all = "camelCase")]
pub enum OutputQuery {
    /// The dialect doesn't render queries
    None,
    /// The query runs as is
    CanBeRun(String),
    /// The query was rendered, but some parts are placeholders
    Incomplete(String),
}

impl OutputQuery {
    pub fn text(&self) -> Option<&str> {
        match self {
            OutputQuery::None => None,
            OutputQuery::CanBeRun(text) | OutputQuery::Incomplete(text) => Some(text),
        }
    }
}

/// Parses the queries of one client library
pub trait DialectParser: Send + Sync {
    fn dialect(&self) -> SourceDialect;

    /// Fast syntactic check before attempting a full parse
    fn is_candidate(&self, program: &Program, expr: ExprId) -> bool;

    /// The expression owning the query `expr` belongs to
    fn anchor(&self, program: &Program, expr: ExprId) -> ExprId;

    /// Lower the query at `anchor`
    ///
    /// Unknown shapes degrade to `Named(Unknown)` nodes and are recorded in `ctx`; an
    /// error is only returned when `anchor` is not a query of this dialect.
    fn parse(
        &self,
        ctx: &mut LoweringContext,
        program: &Program,
        anchor: ExprId,
    ) -> LoweringResult<Node<ExprId>>;

    /// Whether `expr` names a database in a query of this dialect
    fn is_reference_to_database(&self, program: &Program, expr: ExprId) -> bool;

    /// Whether `expr` names a collection in a query of this dialect
    fn is_reference_to_collection(&self, program: &Program, expr: ExprId) -> bool;

    /// Whether `expr` names a document field in a query of this dialect
    fn is_reference_to_field(&self, program: &Program, expr: ExprId) -> bool;
}

/// Renders queries and types as text of one dialect
pub trait DialectFormatter<S>: Send + Sync {
    fn format_query(&self, query: &Node<S>, context: &QueryContext) -> OutputQuery;

    fn format_type(&self, bson_type: &BsonType) -> String;
}

/// A parser paired with the formatter used to display its types
#[derive(Clone)]
pub struct Dialect {
    parser: Arc<dyn DialectParser>,
    formatter: Arc<dyn DialectFormatter<ExprId>>,
}

impl Dialect {
    pub fn new(
        parser: Arc<dyn DialectParser>,
        formatter: Arc<dyn DialectFormatter<ExprId>>,
    ) -> Self {
        Self { parser, formatter }
    }

    #[cfg(feature = "java-driver")]
    pub fn java_driver() -> Self {
        Self::new(Arc::new(JavaDriverParser::new()), Arc::new(JavaTypeFormatter))
    }

    #[cfg(feature = "spring-criteria")]
    pub fn spring_criteria() -> Self {
        Self::new(Arc::new(SpringCriteriaParser::new()), Arc::new(JavaTypeFormatter))
    }

    pub fn id(&self) -> SourceDialect {
        self.parser.dialect()
    }

    pub fn parser(&self) -> &dyn DialectParser {
        self.parser.as_ref()
    }

    pub fn formatter(&self) -> &dyn DialectFormatter<ExprId> {
        self.formatter.as_ref()
    }
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect").field("id", &self.id()).finish()
    }
}

/// Placeholder for a call shape the dialect doesn't understand
pub(crate) fn unknown_operator(source: ExprId) -> Node<ExprId> {
    Node::new(source, [Named::new(Name::Unknown).into()])
}

/// Direction or inclusion flag implied by a builder method
pub(crate) fn inferred_int(source: ExprId, value: i32) -> ValueReference<ExprId> {
    ValueReference::inferred(source, ConstantValue::Int32(value), BsonType::Int32)
}
