// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! References to values compared against or written into fields

use serde::{Deserialize, Serialize};

use crate::bson::BsonType;
use crate::value::ConstantValue;

/// How a value was obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueReference<S> {
    /// Known at analysis time
    Constant {
        source: S,
        value: ConstantValue,
        bson_type: BsonType,
    },
    /// Only the static type is known
    Runtime { source: S, bson_type: BsonType },
    /// Derived from other fields; `bson_type` is a `Computed` type
    Computed { source: S, bson_type: BsonType },
    /// Implied by the operation (e.g. `exists(field)` means `true`)
    Inferred {
        source: S,
        value: ConstantValue,
        bson_type: BsonType,
    },
    Unknown,
}

impl<S> ValueReference<S> {
    pub fn constant(source: S, value: ConstantValue) -> Self {
        let bson_type = value.bson_type();
        ValueReference::Constant {
            source,
            value,
            bson_type,
        }
    }

    pub fn runtime(source: S, bson_type: BsonType) -> Self {
        ValueReference::Runtime { source, bson_type }
    }

    pub fn inferred(source: S, value: ConstantValue, bson_type: BsonType) -> Self {
        ValueReference::Inferred {
            source,
            value,
            bson_type,
        }
    }

    pub fn bson_type(&self) -> Option<&BsonType> {
        match self {
            ValueReference::Constant { bson_type, .. }
            | ValueReference::Runtime { bson_type, .. }
            | ValueReference::Computed { bson_type, .. }
            | ValueReference::Inferred { bson_type, .. } => Some(bson_type),
            ValueReference::Unknown => None,
        }
    }

    pub fn source(&self) -> Option<&S> {
        match self {
            ValueReference::Constant { source, .. }
            | ValueReference::Runtime { source, .. }
            | ValueReference::Computed { source, .. }
            | ValueReference::Inferred { source, .. } => Some(source),
            ValueReference::Unknown => None,
        }
    }

    /// The value, when it is known at analysis time
    pub fn constant_value(&self) -> Option<&ConstantValue> {
        match self {
            ValueReference::Constant { value, .. } | ValueReference::Inferred { value, .. } => {
                Some(value)
            }
            _ => None,
        }
    }

    pub fn map_source<T>(&self, f: &impl Fn(&S) -> T) -> ValueReference<T> {
        match self {
            ValueReference::Constant {
                source,
                value,
                bson_type,
            } => ValueReference::Constant {
                source: f(source),
                value: value.clone(),
                bson_type: bson_type.clone(),
            },
            ValueReference::Runtime { source, bson_type } => ValueReference::Runtime {
                source: f(source),
                bson_type: bson_type.clone(),
            },
            ValueReference::Computed { source, bson_type } => ValueReference::Computed {
                source: f(source),
                bson_type: bson_type.clone(),
            },
            ValueReference::Inferred {
                source,
                value,
                bson_type,
            } => ValueReference::Inferred {
                source: f(source),
                value: value.clone(),
                bson_type: bson_type.clone(),
            },
            ValueReference::Unknown => ValueReference::Unknown,
        }
    }
}

/// Component: the value side of a predicate or update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HasValueReference<S> {
    pub reference: ValueReference<S>,
}

impl<S> HasValueReference<S> {
    pub fn new(reference: ValueReference<S>) -> Self {
        Self { reference }
    }

    pub fn unknown() -> Self {
        Self::new(ValueReference::Unknown)
    }
}
