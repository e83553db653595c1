// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Rendering context passed to query formatters

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bson::BsonType;
use crate::value::ConstantValue;

/// A runtime value the user supplied a stand-in for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalVariable {
    pub bson_type: BsonType,
    pub default_value: Option<ConstantValue>,
}

impl LocalVariable {
    pub fn new(bson_type: BsonType, default_value: Option<ConstantValue>) -> Self {
        Self {
            bson_type,
            default_value,
        }
    }
}

/// Options for turning a query back into text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryContext {
    /// Stand-in values for runtime variables, keyed by variable name
    pub expansions: BTreeMap<String, LocalVariable>,
    pub pretty_print: bool,
    /// The query is run without user interaction (sampling, explain)
    pub automatically_run: bool,
}

impl QueryContext {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_pretty_print(mut self, pretty_print: bool) -> Self {
        self.pretty_print = pretty_print;
        self
    }

    pub fn will_automatically_run(mut self) -> Self {
        self.automatically_run = true;
        self
    }

    pub fn with_expansion(mut self, name: impl Into<String>, variable: LocalVariable) -> Self {
        self.expansions.insert(name.into(), variable);
        self
    }
}
