// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Shell text emission: a small JavaScript value tree and the runtime variables it uses

use std::collections::BTreeMap;

use mql_analyzer_ir::{BsonType, ConstantValue, QueryContext};

/// A JavaScript expression in shell output
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Js {
    /// Text emitted as is: literals, variable names, calls
    Raw(String),
    /// Entries keep insertion order; keys are emitted as written
    Object(Vec<(String, Js)>),
    Array(Vec<Js>),
}

impl Js {
    pub(super) fn raw(text: impl Into<String>) -> Self {
        Js::Raw(text.into())
    }

    pub(super) fn string(text: &str) -> Self {
        Js::Raw(quote(text))
    }

    pub(super) fn empty_object() -> Self {
        Js::Object(Vec::new())
    }

    /// Add an entry, merging operator objects written for the same key
    pub(super) fn insert(&mut self, key: String, value: Js) {
        let Js::Object(entries) = self else {
            return;
        };
        match entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, Js::Object(current))) => match value {
                Js::Object(more) => current.extend(more),
                other => *current = vec![(quote("$eq"), other)],
            },
            Some((_, slot)) => *slot = value,
            None => entries.push((key, value)),
        }
    }

    pub(super) fn render(&self, pretty: bool) -> String {
        let mut out = String::new();
        self.write(&mut out, pretty, 0);
        out
    }

    fn write(&self, out: &mut String, pretty: bool, depth: usize) {
        match self {
            Js::Raw(text) => out.push_str(text),
            Js::Object(entries) if entries.is_empty() => out.push_str("{}"),
            Js::Array(items) if items.is_empty() => out.push_str("[]"),
            Js::Object(entries) => {
                out.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    separator(out, pretty, depth + 1, i > 0);
                    out.push_str(key);
                    out.push_str(": ");
                    value.write(out, pretty, depth + 1);
                }
                closing(out, pretty, depth);
                out.push('}');
            }
            Js::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    separator(out, pretty, depth + 1, i > 0);
                    item.write(out, pretty, depth + 1);
                }
                closing(out, pretty, depth);
                out.push(']');
            }
        }
    }
}

fn separator(out: &mut String, pretty: bool, depth: usize, after_item: bool) {
    if after_item {
        out.push(',');
    }
    if pretty {
        out.push('\n');
        out.push_str(&"  ".repeat(depth));
    } else if after_item {
        out.push(' ');
    }
}

fn closing(out: &mut String, pretty: bool, depth: usize) {
    if pretty {
        out.push('\n');
        out.push_str(&"  ".repeat(depth));
    }
}

/// A JSON string literal
pub(super) fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

/// Collects the runtime variables referenced by the rendered query
pub(super) struct MongoshBackend<'c> {
    context: &'c QueryContext,
    variables: BTreeMap<String, BsonType>,
    incomplete: bool,
}

impl<'c> MongoshBackend<'c> {
    pub(super) fn new(context: &'c QueryContext) -> Self {
        Self {
            context,
            variables: BTreeMap::new(),
            incomplete: false,
        }
    }

    pub(super) fn pretty(&self) -> bool {
        self.context.pretty_print
    }

    /// A variable standing for a runtime value; the first registered type wins
    pub(super) fn variable(&mut self, name: &str, bson_type: BsonType) -> Js {
        let name = identifier(name);
        self.variables.entry(name.clone()).or_insert(bson_type);
        Js::Raw(name)
    }

    pub(super) fn context(&self) -> &QueryContext {
        self.context
    }

    /// Some part of the query could not be rendered faithfully
    pub(super) fn mark_incomplete(&mut self) {
        self.incomplete = true;
    }

    pub(super) fn is_incomplete(&self) -> bool {
        self.incomplete
    }

    /// `var x = default` lines followed by the body
    pub(super) fn finish(self, body: String) -> String {
        let prelude: Vec<String> = self
            .variables
            .iter()
            .map(|(name, bson_type)| {
                let value = self
                    .context
                    .expansions
                    .get(name)
                    .and_then(|expansion| expansion.default_value.as_ref())
                    .map(ConstantValue::to_string)
                    .unwrap_or_else(|| default_value(bson_type));
                format!("var {name} = {value}")
            })
            .collect();
        if prelude.is_empty() {
            body.trim().to_string()
        } else {
            format!("{}\n\n{}", prelude.join("\n"), body).trim().to_string()
        }
    }
}

/// A valid JavaScript identifier derived from a field path
fn identifier(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// A placeholder value of the given type
pub(super) fn default_value(bson_type: &BsonType) -> String {
    match bson_type {
        BsonType::Null | BsonType::Any => "null".to_string(),
        BsonType::Boolean => "false".to_string(),
        BsonType::Int32 | BsonType::Int64 => "0".to_string(),
        BsonType::Double => "0.0".to_string(),
        BsonType::Decimal128 => "Decimal128(\"0\")".to_string(),
        BsonType::String => "\"\"".to_string(),
        BsonType::ObjectId => "ObjectId(\"000000000000000000000000\")".to_string(),
        BsonType::Uuid => "UUID(\"00000000-0000-0000-0000-000000000000\")".to_string(),
        BsonType::Date => "ISODate(\"2009-02-11T18:00:00.000Z\")".to_string(),
        BsonType::Array(_) => "[]".to_string(),
        BsonType::Object(_) => "{}".to_string(),
        BsonType::Enum { members, .. } => members
            .iter()
            .next()
            .map(|member| quote(member))
            .unwrap_or_else(|| "\"\"".to_string()),
        BsonType::AnyOf(union) => union
            .non_null_members()
            .next()
            .map(default_value)
            .unwrap_or_else(|| "null".to_string()),
        BsonType::Computed { base, .. } => default_value(base),
    }
}
