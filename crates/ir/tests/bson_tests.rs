// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Compatibility rules of the BSON type system

use mql_analyzer_ir::{BsonType, CollectionSchema, Namespace, Node};

fn primitives() -> Vec<BsonType> {
    vec![
        BsonType::Null,
        BsonType::Boolean,
        BsonType::Int32,
        BsonType::Int64,
        BsonType::Double,
        BsonType::Decimal128,
        BsonType::String,
        BsonType::ObjectId,
        BsonType::Uuid,
        BsonType::Date,
        BsonType::array(BsonType::String),
        BsonType::object([("a", BsonType::Int32)]),
    ]
}

#[test]
fn test_every_type_is_compatible_with_its_nullable_union() {
    for ty in primitives() {
        let field = BsonType::any_of([ty.clone(), BsonType::Null]);
        assert!(ty.is_assignable_to(&field), "{ty} should fit {field}");
    }
}

#[test]
fn test_null_is_not_compatible_with_non_nullable_union() {
    let field = BsonType::any_of([BsonType::String]);
    assert!(!BsonType::Null.is_assignable_to(&field));

    let field = BsonType::any_of([BsonType::String, BsonType::Int32]);
    assert!(!BsonType::Null.is_assignable_to(&field));
}

#[test]
fn test_any_is_compatible_both_ways() {
    for ty in primitives() {
        assert!(BsonType::Any.is_assignable_to(&ty));
        assert!(ty.is_assignable_to(&BsonType::Any));
    }
}

#[test]
fn test_numeric_widening() {
    assert!(BsonType::Int32.is_assignable_to(&BsonType::Int64));
    assert!(BsonType::Double.is_assignable_to(&BsonType::Decimal128));
    assert!(!BsonType::String.is_assignable_to(&BsonType::Double));
}

#[test]
fn test_union_value_needs_every_member_to_fit() {
    let value = BsonType::any_of([BsonType::Int32, BsonType::String]);
    assert!(!value.is_assignable_to(&BsonType::Int32));
    assert!(value.is_assignable_to(&BsonType::any_of([BsonType::Int64, BsonType::String])));
}

#[test]
fn test_computed_behaves_as_base() {
    let computed = BsonType::computed(BsonType::Int32, Node::new((), []));
    assert!(computed.is_assignable_to(&BsonType::Int64));
    assert!(!computed.is_assignable_to(&BsonType::String));
}

#[test]
fn test_nested_unions_are_flattened() {
    let nested = BsonType::any_of([
        BsonType::any_of([BsonType::String, BsonType::Null]),
        BsonType::any_of([BsonType::Int32, BsonType::String]),
    ]);
    match nested {
        BsonType::AnyOf(union) => {
            assert_eq!(union.members().len(), 3);
            assert!(union.members().iter().all(|m| !matches!(m, BsonType::AnyOf(_))));
        }
        other => panic!("expected a union, got {other}"),
    }
}

#[test]
fn test_schema_lookup_through_arrays_and_unions() {
    let schema = CollectionSchema::new(
        Namespace::new("db", "coll"),
        BsonType::object([
            (
                "address",
                BsonType::any_of([
                    BsonType::object([("city", BsonType::String)]),
                    BsonType::Null,
                ]),
            ),
            (
                "tags",
                BsonType::array(BsonType::object([("label", BsonType::String)])),
            ),
        ]),
    );

    assert!(schema.has_field("address.city"));
    assert!(schema.has_field("tags.0.label"));
    assert!(!schema.has_field("missing"));
    assert_eq!(schema.type_of("missing"), BsonType::Null);
}
