// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Structural properties of the query node model

use mql_analyzer_ir::{
    CollectionReference, CommandType, ConstantValue, FieldReference, HasCollectionReference,
    HasFieldReference, HasFilter, HasLimit, HasValueReference, IsCommand, Name, Named, Namespace,
    Node, ValueReference,
};

fn eq(source: usize, field: &str, value: &str) -> Node<usize> {
    Node::new(
        source,
        [
            Named::new(Name::Eq).into(),
            HasFieldReference::new(FieldReference::from_schema(source, field)).into(),
            HasValueReference::new(ValueReference::constant(
                source,
                ConstantValue::String(value.to_string()),
            ))
            .into(),
        ],
    )
}

fn nest_in_and(depth: usize) -> Node<usize> {
    let mut current = eq(0, "field", "v");
    for level in 1..=depth {
        current = Node::new(
            level,
            [
                Named::new(Name::And).into(),
                HasFilter::new(vec![current]).into(),
            ],
        );
    }
    current
}

fn and_depth(node: &Node<usize>) -> usize {
    match (node.name(), node.component::<HasFilter<usize>>()) {
        (Some(Name::And), Some(filter)) => 1 + filter.children.iter().map(and_depth).max().unwrap_or(0),
        _ => 0,
    }
}

#[test]
fn test_nested_and_keeps_depth() {
    for depth in [1, 2, 5, 20] {
        let tree = nest_in_and(depth);
        assert_eq!(and_depth(&tree), depth);
        assert_eq!(tree.all_filters_recursively().len(), depth);
    }
}

#[test]
fn test_leaf_predicate_has_field_and_value() {
    let tree = nest_in_and(3);
    let leaves: Vec<_> = tree
        .all_filters_recursively()
        .into_iter()
        .filter(|n| n.name() == Some(Name::Eq))
        .collect();

    assert_eq!(leaves.len(), 1);
    let leaf = leaves[0];
    assert!(leaf.has::<HasFieldReference<usize>>());
    assert!(leaf.has::<HasValueReference<usize>>());
}

#[test]
fn test_component_lookup_is_unique() {
    let query = Node::new(
        0usize,
        [
            IsCommand::new(CommandType::FindMany).into(),
            HasLimit { limit: 1 }.into(),
            IsCommand::new(CommandType::FindOne).into(),
        ],
    );

    assert_eq!(query.components().len(), 2);
    assert_eq!(
        query.component::<IsCommand>().map(|c| c.command_type),
        Some(CommandType::FindOne)
    );
}

#[test]
fn test_namespace_accessor() {
    let ns = Namespace::new("production", "books");
    let query = Node::new(
        0usize,
        [HasCollectionReference::new(CollectionReference::known(Some(1), 2, ns.clone())).into()],
    );
    assert_eq!(query.namespace(), Some(&ns));

    let partial = Node::new(
        0usize,
        [HasCollectionReference::new(CollectionReference::only_collection(2, "books")).into()],
    );
    assert_eq!(partial.namespace(), None);
    assert_eq!(
        partial.collection_reference().and_then(|r| r.collection()),
        Some("books")
    );
}

#[test]
fn test_deserialize_keeps_one_component_per_kind() {
    let first = serde_json::to_value(Node::new(1usize, [Named::new(Name::Eq).into()])).unwrap();
    let second = serde_json::to_value(Node::new(1usize, [Named::new(Name::Gt).into()])).unwrap();

    let mut json = first.clone();
    let components = json["components"].as_array_mut().unwrap();
    components.extend(second["components"].as_array().unwrap().iter().cloned());
    assert_eq!(components.len(), 2);

    let node: Node<usize> = serde_json::from_value(json).unwrap();
    assert_eq!(node.components().len(), 1);
    assert_eq!(node.name(), Some(Name::Gt));

    let round_trip: Node<usize> = serde_json::from_value(first).unwrap();
    assert_eq!(round_trip, Node::new(1usize, [Named::new(Name::Eq).into()]));
}
