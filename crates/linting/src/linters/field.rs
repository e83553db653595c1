// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Field existence and value type checks against the collection schema

use std::sync::Arc;

use mql_analyzer_ir::{
    CollectionSchema, ComponentKind, FieldReference, HasFieldReference, HasValueReference, Name,
    Node, QueryRole, ValueReference,
};

use crate::insight::{Insight, InsightKind, InsightSink};
use crate::linter::{Inspection, Linter, cannot_check};
use crate::metadata::LintInput;

/// Verifies that every schema field a query references exists, and that constant values
/// compared to or assigned to it have a compatible type
///
/// Fields introduced by `$addFields` and the target of `$unwind` are exempt. Computed,
/// inferred and unknown field references are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldCheckingLinter;

impl<S: Clone> Linter<S> for FieldCheckingLinter {
    fn inspection(&self) -> Inspection {
        Inspection::FieldCheck
    }

    fn run(&self, query: &Arc<Node<S>>, input: &LintInput, sink: &mut InsightSink<S>) {
        let schema = match input.schema.require() {
            Ok(Some(schema)) => schema,
            Ok(None) => return,
            Err(err) => {
                sink.register(cannot_check(query, Inspection::FieldCheck, &err));
                return;
            }
        };

        let mut nodes = Vec::new();
        schema_references(query, &mut nodes);
        for node in nodes {
            check_node(query, node, schema, sink);
        }
    }
}

fn schema_references<'a, S>(node: &'a Node<S>, out: &mut Vec<&'a Node<S>>) {
    if node.name() == Some(Name::Unwind) {
        return;
    }
    if let Some(HasFieldReference {
        reference: FieldReference::FromSchema { .. },
    }) = node.component::<HasFieldReference<S>>()
    {
        out.push(node);
    }
    for component in node.components() {
        if component.kind() == ComponentKind::AddedFields {
            continue;
        }
        for child in component.children() {
            schema_references(child, out);
        }
    }
}

fn check_node<S: Clone>(
    query: &Arc<Node<S>>,
    node: &Node<S>,
    schema: &CollectionSchema,
    sink: &mut InsightSink<S>,
) {
    let Some(HasFieldReference {
        reference: FieldReference::FromSchema {
            source,
            field_name,
            display_name,
        },
    }) = node.component::<HasFieldReference<S>>()
    else {
        return;
    };

    if !schema.has_field(field_name) {
        sink.register(
            Insight::new(query.clone(), source.clone(), InsightKind::FieldDoesNotExist)
                .with_argument(display_name.as_str())
                .with_argument(schema.namespace.to_string()),
        );
        return;
    }

    if node.name().map(|name| name.role()) == Some(QueryRole::Sort) {
        return;
    }
    let Some(HasValueReference {
        reference: ValueReference::Constant {
            source: value_source,
            bson_type,
            ..
        },
    }) = node.component::<HasValueReference<S>>()
    else {
        return;
    };

    let field_type = schema.type_of(field_name);
    if !bson_type.is_assignable_to(&field_type) {
        sink.register(
            Insight::new(
                query.clone(),
                value_source.clone(),
                InsightKind::FieldValueTypeMismatch,
            )
            .with_argument(display_name.as_str())
            .with_argument(bson_type.render_nullable())
            .with_argument(field_type.render_nullable()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Metadata;
    use mql_analyzer_catalog::ReadModelError;
    use mql_analyzer_ir::{
        BsonType, ConstantValue, HasAddedFields, HasAggregation, HasFilter, Named, Namespace,
    };

    fn leaf(name: Name, source: u32, field: &str, value: Option<ConstantValue>) -> Node<u32> {
        let value = match value {
            Some(value) => ValueReference::constant(source + 1, value),
            None => ValueReference::runtime(source + 1, BsonType::String),
        };
        Node::new(
            source,
            [
                Named::new(name).into(),
                HasFieldReference::new(FieldReference::from_schema(source, field)).into(),
                HasValueReference::new(value).into(),
            ],
        )
    }

    fn schema() -> CollectionSchema {
        CollectionSchema::new(
            Namespace::new("shop", "users"),
            BsonType::object([
                ("name", BsonType::String),
                ("age", BsonType::Int64.nullable()),
                (
                    "address",
                    BsonType::object([("city", BsonType::String)]),
                ),
            ]),
        )
    }

    fn run(query: Node<u32>, input: &LintInput) -> Vec<Insight<u32>> {
        let mut sink = InsightSink::new();
        FieldCheckingLinter.run(&Arc::new(query), input, &mut sink);
        sink.into_insights()
    }

    #[test]
    fn test_missing_and_mismatching_fields() {
        let query = Node::new(
            0,
            [HasFilter::new(vec![
                leaf(Name::Eq, 10, "name", Some(ConstantValue::String("Ada".into()))),
                leaf(Name::Eq, 20, "nickname", Some(ConstantValue::String("A".into()))),
                leaf(Name::Gt, 30, "age", Some(ConstantValue::Int32(30))),
                leaf(Name::Eq, 40, "address.city", Some(ConstantValue::Boolean(true))),
            ])
            .into()],
        );

        let insights = run(query, &LintInput::not_applicable().with_schema(schema()));
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].kind, InsightKind::FieldDoesNotExist);
        assert_eq!(insights[0].source, 20);
        assert_eq!(insights[0].arguments, vec!["nickname", "shop.users"]);
        assert_eq!(insights[1].kind, InsightKind::FieldValueTypeMismatch);
        assert_eq!(insights[1].source, 41);
        assert_eq!(insights[1].arguments, vec!["address.city", "boolean", "string"]);
    }

    #[test]
    fn test_runtime_values_and_sorts_are_not_type_checked() {
        let query = Node::new(
            0,
            [HasFilter::new(vec![
                leaf(Name::Eq, 10, "age", None),
                leaf(Name::Ascending, 20, "name", Some(ConstantValue::Int32(1))),
            ])
            .into()],
        );
        assert!(run(query, &LintInput::not_applicable().with_schema(schema())).is_empty());
    }

    #[test]
    fn test_added_fields_and_unwind_are_exempt() {
        let added = Node::new(
            5,
            [
                Named::new(Name::AddFields).into(),
                HasAddedFields::new(vec![leaf(Name::Set, 10, "fullName", None)]).into(),
            ],
        );
        let unwind = Node::new(
            6,
            [
                Named::new(Name::Unwind).into(),
                HasFieldReference::new(FieldReference::from_schema(6, "tags")).into(),
            ],
        );
        let query = Node::new(0, [HasAggregation::new(vec![added, unwind]).into()]);
        assert!(run(query, &LintInput::not_applicable().with_schema(schema())).is_empty());
    }

    #[test]
    fn test_unavailable_schema_cannot_be_checked() {
        let query = Node::new(0, [HasFilter::new(vec![leaf(Name::Eq, 1, "x", None)]).into()]);
        let input = LintInput {
            schema: Metadata::Unavailable(ReadModelError::NoConnection),
            ..LintInput::not_applicable()
        };
        let insights = run(query, &input);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::CannotCheck);
        assert_eq!(insights[0].source, 0);
        assert_eq!(insights[0].arguments[0], "field-check");
    }
}
