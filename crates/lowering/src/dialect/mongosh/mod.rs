// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Mongosh Formatter
//!
//! Renders a query IR as a `mongosh` script, independent of the dialect it was parsed
//! from.
//!
//! ## Overview
//!
//! - The collection is addressed as `db.getSiblingDB("db").getCollection("coll")`.
//!   Unresolved database or collection names become the `database` / `collection`
//!   variables.
//! - Values only known at runtime become variables declared in a `var` prelude, with a
//!   type-appropriate default or the default supplied through [`QueryContext`].
//! - The output is [`OutputQuery::CanBeRun`] only when the namespace is fully known and
//!   every part of the query could be rendered; otherwise it is
//!   [`OutputQuery::Incomplete`].
//!
//! ```rust,ignore
//! let output = MongoshFormatter.format_query(&query, &QueryContext::empty());
//! // db.getSiblingDB("prod").getCollection("users").find({"name": "Ada"})
//! ```

mod backend;
mod index;

pub use index::index_command;

use std::slice;

use mql_analyzer_ir::{
    BsonType, CollectionReference, CommandType, FieldReference, HasAccumulatedFields,
    HasAddedFields, HasAggregation, HasExplain, HasFieldReference, HasFilter, HasLimit,
    HasProjections, HasSorts, HasUpdates, HasValueReference, IsCommand, Name, Namespace, Node,
    QueryContext, ValueReference,
};

use self::backend::{Js, MongoshBackend, quote};
use super::{DialectFormatter, OutputQuery};

/// Limit applied to cursors that are run without an explicit limit
const AUTOMATIC_RUN_LIMIT: i32 = 50;

#[derive(Debug, Clone, Copy, Default)]
pub struct MongoshFormatter;

impl<S> DialectFormatter<S> for MongoshFormatter {
    fn format_query(&self, query: &Node<S>, context: &QueryContext) -> OutputQuery {
        let mut backend = MongoshBackend::new(context);
        let runnable = query.namespace().is_some_and(Namespace::is_valid);
        let body = render_query(&mut backend, query);
        let incomplete = backend.is_incomplete();
        let text = backend.finish(body);

        if runnable && !incomplete {
            OutputQuery::CanBeRun(text)
        } else {
            OutputQuery::Incomplete(text)
        }
    }

    fn format_type(&self, bson_type: &BsonType) -> String {
        bson_type.render_nullable()
    }
}

fn render_query<S>(backend: &mut MongoshBackend<'_>, query: &Node<S>) -> String {
    let pretty = backend.pretty();
    let command = query
        .component::<IsCommand>()
        .map_or(CommandType::Unknown, |c| c.command_type);
    let explain = query
        .component::<HasExplain>()
        .and_then(|e| e.explain_type.server_name());

    let mut text = collection_access(backend, query.collection_reference());
    if let Some(verbosity) = explain {
        text.push_str(&format!(".explain({})", quote(verbosity)));
    }

    let filter = filter_document(
        backend,
        children(query.component::<HasFilter<S>>().map(|c| &c.children)),
    );
    let args = match command {
        CommandType::FindMany | CommandType::FindOne => {
            let projections =
                children(query.component::<HasProjections<S>>().map(|c| &c.children));
            let mut args = vec![filter];
            if !projections.is_empty() {
                args.push(key_document(backend, projections));
            }
            args
        }
        CommandType::CountDocuments
        | CommandType::DeleteMany
        | CommandType::DeleteOne
        | CommandType::FindOneAndDelete => vec![filter],
        CommandType::EstimatedDocumentCount => Vec::new(),
        CommandType::Distinct => {
            let field = match field_key(backend, query) {
                Some(key) => Js::raw(key),
                None => {
                    backend.mark_incomplete();
                    backend.variable("field", BsonType::String)
                }
            };
            vec![field, filter]
        }
        CommandType::UpdateOne | CommandType::UpdateMany | CommandType::FindOneAndUpdate => {
            let updates = update_document(
                backend,
                children(query.component::<HasUpdates<S>>().map(|c| &c.children)),
            );
            vec![filter, updates]
        }
        CommandType::Upsert => {
            let updates = update_document(
                backend,
                children(query.component::<HasUpdates<S>>().map(|c| &c.children)),
            );
            let options = Js::Object(vec![(quote("upsert"), Js::raw("true"))]);
            vec![filter, updates, options]
        }
        CommandType::InsertOne => vec![Js::empty_object()],
        CommandType::InsertMany => vec![Js::Array(Vec::new())],
        CommandType::ReplaceOne | CommandType::FindOneAndReplace => {
            vec![filter, Js::empty_object()]
        }
        CommandType::Aggregate => {
            let stages = children(query.component::<HasAggregation<S>>().map(|c| &c.children))
                .iter()
                .filter_map(|stage| {
                    let rendered = stage_document(backend, stage);
                    if rendered.is_none() {
                        backend.mark_incomplete();
                    }
                    rendered
                })
                .collect();
            vec![Js::Array(stages)]
        }
        CommandType::RunCommand | CommandType::Unknown => {
            backend.mark_incomplete();
            vec![filter]
        }
    };

    let method = match command {
        CommandType::Upsert => "updateOne",
        CommandType::RunCommand | CommandType::Unknown => "find",
        other => other.canonical(),
    };
    let rendered: Vec<String> = args.iter().map(|arg| arg.render(pretty)).collect();
    text.push_str(&format!(".{method}({})", rendered.join(", ")));

    if command == CommandType::FindMany {
        let sorts = children(query.component::<HasSorts<S>>().map(|c| &c.children));
        if !sorts.is_empty() {
            let sort = key_document(backend, sorts);
            text.push_str(&format!(".sort({})", sort.render(pretty)));
        }

        let automatic = backend.context().automatically_run && explain.is_none();
        let limit = query
            .component::<HasLimit>()
            .map(|l| l.limit)
            .or(automatic.then_some(AUTOMATIC_RUN_LIMIT));
        if let Some(limit) = limit {
            text.push_str(&format!(".limit({limit})"));
        }
    }

    text
}

fn children<S>(nodes: Option<&Vec<Node<S>>>) -> &[Node<S>] {
    nodes.map(Vec::as_slice).unwrap_or_default()
}

fn operator(name: Name) -> String {
    quote(&format!("${}", name.canonical()))
}

fn collection_access<S>(
    backend: &mut MongoshBackend<'_>,
    reference: Option<&CollectionReference<S>>,
) -> String {
    let database = reference
        .and_then(CollectionReference::namespace)
        .map(|namespace| namespace.database.as_str())
        .filter(|database| !database.trim().is_empty());
    let collection = reference
        .and_then(CollectionReference::collection)
        .filter(|collection| !collection.trim().is_empty());

    let database = match database {
        Some(database) => Js::string(database),
        None => backend.variable("database", BsonType::String),
    };
    let collection = match collection {
        Some(collection) => Js::string(collection),
        None => backend.variable("collection", BsonType::String),
    };
    format!(
        "db.getSiblingDB({}).getCollection({})",
        database.render(false),
        collection.render(false)
    )
}

/// The quoted field name, or a computed key when the field is unresolved
fn field_key<S>(backend: &mut MongoshBackend<'_>, node: &Node<S>) -> Option<String> {
    match &node.component::<HasFieldReference<S>>()?.reference {
        FieldReference::Unknown => {
            backend.mark_incomplete();
            let variable = backend.variable("field", BsonType::String);
            Some(format!("[{}]", variable.render(false)))
        }
        reference => reference.field_name().map(quote),
    }
}

fn value_js<S>(backend: &mut MongoshBackend<'_>, node: &Node<S>) -> Js {
    let variable_name = node
        .component::<HasFieldReference<S>>()
        .and_then(|f| f.reference.field_name())
        .unwrap_or("value")
        .to_string();

    match node.component::<HasValueReference<S>>().map(|v| &v.reference) {
        Some(ValueReference::Constant { value, .. } | ValueReference::Inferred { value, .. }) => {
            Js::raw(value.to_string())
        }
        Some(ValueReference::Runtime { bson_type, .. }) => {
            backend.variable(&variable_name, bson_type.clone())
        }
        Some(ValueReference::Computed { bson_type, .. }) => match field_path(bson_type) {
            Some(path) => Js::string(&path),
            None => {
                backend.mark_incomplete();
                backend.variable(&variable_name, bson_type.base().clone())
            }
        },
        Some(ValueReference::Unknown) | None => {
            backend.mark_incomplete();
            backend.variable(&variable_name, BsonType::Any)
        }
    }
}

/// `"$field"` for a computed type referencing a single field
fn field_path(bson_type: &BsonType) -> Option<String> {
    let BsonType::Computed { expression, .. } = bson_type else {
        return None;
    };
    display_name(expression)
}

fn display_name<S>(node: &Node<S>) -> Option<String> {
    match &node.component::<HasFieldReference<S>>()?.reference {
        FieldReference::FromSchema { display_name, .. }
        | FieldReference::Computed { display_name, .. }
        | FieldReference::Inferred { display_name, .. } => Some(display_name.clone()),
        FieldReference::Unknown => None,
    }
}

fn filter_document<S>(backend: &mut MongoshBackend<'_>, filters: &[Node<S>]) -> Js {
    let mut document = Js::empty_object();
    for filter in filters {
        add_predicate(backend, filter, &mut document);
    }
    document
}

fn add_predicate<S>(backend: &mut MongoshBackend<'_>, predicate: &Node<S>, document: &mut Js) {
    let nested = children(predicate.component::<HasFilter<S>>().map(|c| &c.children));

    match predicate.name() {
        Some(name @ (Name::And | Name::Or | Name::Nor)) => {
            let clauses = nested
                .iter()
                .map(|clause| filter_document(backend, slice::from_ref(clause)))
                .collect();
            document.insert(operator(name), Js::Array(clauses));
        }
        Some(Name::Not) => {
            let negated = match nested {
                [inner] => negated_condition(backend, inner),
                _ => None,
            };
            match negated {
                Some((key, condition)) => {
                    document.insert(key, Js::Object(vec![(operator(Name::Not), condition)]));
                }
                None => {
                    let clauses = nested
                        .iter()
                        .map(|clause| filter_document(backend, slice::from_ref(clause)))
                        .collect();
                    document.insert(operator(Name::Nor), Js::Array(clauses));
                }
            }
        }
        Some(Name::ElemMatch) => match field_key(backend, predicate) {
            Some(key) => {
                let inner = filter_document(backend, nested);
                document.insert(key, Js::Object(vec![(operator(Name::ElemMatch), inner)]));
            }
            None => backend.mark_incomplete(),
        },
        Some(Name::Unknown) | None => backend.mark_incomplete(),
        Some(name) => match field_key(backend, predicate) {
            Some(key) => {
                let value = value_js(backend, predicate);
                let entry = if name == Name::Eq {
                    value
                } else {
                    Js::Object(vec![(operator(name), value)])
                };
                document.insert(key, entry);
            }
            None => backend.mark_incomplete(),
        },
    }
}

/// `field` and `{"$op": value}` for a negated leaf predicate
fn negated_condition<S>(
    backend: &mut MongoshBackend<'_>,
    inner: &Node<S>,
) -> Option<(String, Js)> {
    let name = inner.name()?;
    if name.is_combinator() || name == Name::Unknown || name == Name::ElemMatch {
        return None;
    }
    let key = field_key(backend, inner)?;
    let value = value_js(backend, inner);
    Some((key, Js::Object(vec![(operator(name), value)])))
}

fn update_document<S>(backend: &mut MongoshBackend<'_>, updates: &[Node<S>]) -> Js {
    let mut document = Js::empty_object();
    for update in updates {
        add_update(backend, update, &mut document);
    }
    document
}

/// Updates are grouped by operator: `{"$set": {..}, "$unset": {..}}`
fn add_update<S>(backend: &mut MongoshBackend<'_>, update: &Node<S>, document: &mut Js) {
    match update.name() {
        Some(Name::Combine) => {
            for child in children(update.component::<HasUpdates<S>>().map(|c| &c.children)) {
                add_update(backend, child, document);
            }
        }
        Some(Name::Unknown) | None => backend.mark_incomplete(),
        Some(name) => {
            let Some(key) = field_key(backend, update) else {
                backend.mark_incomplete();
                return;
            };
            let value = if name == Name::Unset {
                Js::string("")
            } else if let Some(condition) = update.component::<HasFilter<S>>() {
                filter_document(backend, &condition.children)
            } else {
                value_js(backend, update)
            };
            document.insert(operator(name), Js::Object(vec![(key, value)]));
        }
    }
}

/// Projections and sort keys: `{"field": flag}`
fn key_document<S>(backend: &mut MongoshBackend<'_>, keys: &[Node<S>]) -> Js {
    let mut document = Js::empty_object();
    for key in keys {
        match (key.name(), field_key(backend, key)) {
            (Some(Name::Unknown) | None, _) | (_, None) => backend.mark_incomplete(),
            (Some(_), Some(field)) => {
                let flag = value_js(backend, key);
                document.insert(field, flag);
            }
        }
    }
    document
}

fn stage_document<S>(backend: &mut MongoshBackend<'_>, stage: &Node<S>) -> Option<Js> {
    let name = stage.name()?;
    let body = match name {
        Name::Match => filter_document(
            backend,
            children(stage.component::<HasFilter<S>>().map(|c| &c.children)),
        ),
        Name::Project => key_document(
            backend,
            children(stage.component::<HasProjections<S>>().map(|c| &c.children)),
        ),
        Name::Sort => key_document(
            backend,
            children(stage.component::<HasSorts<S>>().map(|c| &c.children)),
        ),
        Name::Group => group_document(backend, stage),
        Name::AddFields => {
            let mut document = Js::empty_object();
            for added in children(stage.component::<HasAddedFields<S>>().map(|c| &c.children)) {
                match field_key(backend, added) {
                    Some(key) => {
                        let value = value_js(backend, added);
                        document.insert(key, value);
                    }
                    None => backend.mark_incomplete(),
                }
            }
            document
        }
        Name::Unwind => Js::string(&display_name(stage)?),
        Name::Limit => Js::raw(stage.component::<HasLimit>()?.limit.to_string()),
        _ => return None,
    };
    Some(Js::Object(vec![(operator(name), body)]))
}

fn group_document<S>(backend: &mut MongoshBackend<'_>, stage: &Node<S>) -> Js {
    let key = value_js(backend, stage);
    let mut document = Js::Object(vec![(quote("_id"), key)]);

    let accumulators = children(stage.component::<HasAccumulatedFields<S>>().map(|c| &c.children));
    for accumulator in accumulators {
        let (Some(name), Some(output)) = (accumulator.name(), field_key(backend, accumulator)) else {
            backend.mark_incomplete();
            continue;
        };
        let value = value_js(backend, accumulator);
        let body = match name {
            Name::Top | Name::Bottom | Name::TopN | Name::BottomN => {
                let sorts = children(accumulator.component::<HasSorts<S>>().map(|c| &c.children));
                let mut spec = vec![
                    (quote("sortBy"), key_document(backend, sorts)),
                    (quote("output"), value),
                ];
                if let Some(limit) = accumulator.component::<HasLimit>() {
                    spec.push((quote("n"), Js::raw(limit.limit.to_string())));
                }
                Js::Object(spec)
            }
            Name::Unknown => {
                backend.mark_incomplete();
                continue;
            }
            _ => value,
        };
        document.insert(output, Js::Object(vec![(operator(name), body)]));
    }
    document
}
