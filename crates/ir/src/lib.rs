// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # MQL Analyzer - Intermediate Representation
//!
//! This crate provides the dialect-independent representation of MongoDB queries.
//! The IR is designed to:
//! - Represent queries from unrelated client libraries with one node type
//! - Keep a handle to the host syntax each fragment came from
//! - Carry degraded certainty as data (`Unknown`, `OnlyCollection`...) instead of errors
//! - Describe value domains with a small BSON type system

pub mod bson;
pub mod components;
pub mod context;
pub mod dialect;
pub mod namespace;
pub mod node;
pub mod value;

// Re-export commonly used types
pub use bson::{BsonType, TypeUnion};
pub use components::{
    CollectionReference, CommandType, Component, ComponentKind, ComponentOf, ExplainPlanType,
    FieldReference, HasAccumulatedFields, HasAddedFields, HasAggregation, HasCollectionReference,
    HasExplain, HasFieldReference, HasFilter, HasLimit, HasProjections, HasSorts,
    HasSourceDialect, HasTargetCluster, HasUpdates, HasValueReference, IsCommand, Name, Named,
    QueryRole, ValueReference,
};
pub use context::{LocalVariable, QueryContext};
pub use dialect::SourceDialect;
pub use namespace::{CollectionSchema, Namespace, NamespaceError};
pub use node::Node;
pub use value::ConstantValue;
