// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! References to document fields

use serde::{Deserialize, Serialize};

/// How a field name was obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldReference<S> {
    /// A field expected to exist in the collection schema
    FromSchema {
        source: S,
        field_name: String,
        display_name: String,
    },
    /// A field produced by the query itself (e.g. a `$group` accumulator)
    Computed {
        source: S,
        field_name: String,
        display_name: String,
    },
    /// A field implied by the operation (e.g. `_id` for a single-argument `eq`)
    Inferred {
        source: S,
        field_name: String,
        display_name: String,
    },
    /// The field name could not be resolved
    Unknown,
}

impl<S> FieldReference<S> {
    pub fn from_schema(source: S, field_name: impl Into<String>) -> Self {
        let field_name = field_name.into();
        FieldReference::FromSchema {
            source,
            display_name: field_name.clone(),
            field_name,
        }
    }

    pub fn computed(source: S, field_name: impl Into<String>) -> Self {
        let field_name = field_name.into();
        FieldReference::Computed {
            source,
            display_name: field_name.clone(),
            field_name,
        }
    }

    pub fn inferred(source: S, field_name: impl Into<String>) -> Self {
        let field_name = field_name.into();
        FieldReference::Inferred {
            source,
            display_name: field_name.clone(),
            field_name,
        }
    }

    /// Override the name shown to users (e.g. `$field` for a field path)
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        match &mut self {
            FieldReference::FromSchema { display_name, .. }
            | FieldReference::Computed { display_name, .. }
            | FieldReference::Inferred { display_name, .. } => *display_name = name.into(),
            FieldReference::Unknown => {}
        }
        self
    }

    pub fn field_name(&self) -> Option<&str> {
        match self {
            FieldReference::FromSchema { field_name, .. }
            | FieldReference::Computed { field_name, .. }
            | FieldReference::Inferred { field_name, .. } => Some(field_name),
            FieldReference::Unknown => None,
        }
    }

    pub fn source(&self) -> Option<&S> {
        match self {
            FieldReference::FromSchema { source, .. }
            | FieldReference::Computed { source, .. }
            | FieldReference::Inferred { source, .. } => Some(source),
            FieldReference::Unknown => None,
        }
    }

    pub fn map_source<T>(&self, f: &impl Fn(&S) -> T) -> FieldReference<T> {
        match self {
            FieldReference::FromSchema {
                source,
                field_name,
                display_name,
            } => FieldReference::FromSchema {
                source: f(source),
                field_name: field_name.clone(),
                display_name: display_name.clone(),
            },
            FieldReference::Computed {
                source,
                field_name,
                display_name,
            } => FieldReference::Computed {
                source: f(source),
                field_name: field_name.clone(),
                display_name: display_name.clone(),
            },
            FieldReference::Inferred {
                source,
                field_name,
                display_name,
            } => FieldReference::Inferred {
                source: f(source),
                field_name: field_name.clone(),
                display_name: display_name.clone(),
            },
            FieldReference::Unknown => FieldReference::Unknown,
        }
    }
}

/// Component: the field a predicate or stage refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasFieldReference<S> {
    pub reference: FieldReference<S>,
}

impl<S> HasFieldReference<S> {
    pub fn new(reference: FieldReference<S>) -> Self {
        Self { reference }
    }

    pub fn unknown() -> Self {
        Self::new(FieldReference::Unknown)
    }
}
