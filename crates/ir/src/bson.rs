// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # BSON Type System
//!
//! This module models the value domain of MongoDB documents as seen by the analyzer.
//!
//! ## Overview
//!
//! [`BsonType`] is a closed set of descriptors:
//! - **Primitives**: `Null`, `Boolean`, `Int32`, `Int64`, `Double`, `Decimal128`, `String`,
//!   `ObjectId`, `Uuid`, `Date`
//! - **Containers**: `Array(of)` and `Object(fields)`
//! - **Unions**: `AnyOf`, always flattened and de-duplicated through [`TypeUnion`]
//! - **Enums**: a finite set of string members, optionally named
//! - **Computed**: a type derived from an expression, which behaves as its base type
//! - **Any**: the "don't warn" escape hatch for types that cannot be represented
//!
//! A union containing `Null` denotes an optional value. Compatibility checks treat it
//! specially and [`BsonType::render_nullable`] renders it with a `?` suffix.
//!
//! ## Example
//!
//! ```rust
//! use mql_analyzer_ir::BsonType;
//!
//! let field = BsonType::any_of([BsonType::Int32, BsonType::Null]);
//! assert!(BsonType::Int32.is_assignable_to(&field));
//! assert!(BsonType::Null.is_assignable_to(&field));
//! assert!(!BsonType::String.is_assignable_to(&field));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::Node;

/// A BSON value-domain descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "camelCase")]
pub enum BsonType {
    Null,
    Boolean,
    Int32,
    Int64,
    Double,
    Decimal128,
    String,
    ObjectId,
    Uuid,
    Date,
    /// An array whose elements are of the given type
    Array(Box<BsonType>),
    /// A document with the given field types
    Object(BTreeMap<String, BsonType>),
    /// A string with a closed set of values
    Enum {
        members: BTreeSet<String>,
        name: Option<String>,
    },
    /// A union of types
    AnyOf(TypeUnion),
    /// A type computed from an expression (e.g. `"$field"` inside an aggregation)
    Computed {
        base: Box<BsonType>,
        expression: Box<Node<()>>,
    },
    Any,
}

impl BsonType {
    /// Build an array type
    pub fn array(of: BsonType) -> Self {
        BsonType::Array(Box::new(of))
    }

    /// Build an object type from `(field, type)` pairs
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, BsonType)>) -> Self {
        BsonType::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build an enum type
    pub fn enumeration<M: Into<String>>(
        members: impl IntoIterator<Item = M>,
        name: Option<String>,
    ) -> Self {
        BsonType::Enum {
            members: members.into_iter().map(Into::into).collect(),
            name,
        }
    }

    /// Build a computed type
    pub fn computed(base: BsonType, expression: Node<()>) -> Self {
        BsonType::Computed {
            base: Box::new(base),
            expression: Box::new(expression),
        }
    }

    /// Build a union of types.
    ///
    /// Nested unions are flattened and duplicates removed. A union with a single member
    /// collapses to that member and an empty union collapses to `Any`.
    pub fn any_of(types: impl IntoIterator<Item = BsonType>) -> Self {
        let union = TypeUnion::new(types);
        match union.members.len() {
            0 => BsonType::Any,
            1 => union.members.into_iter().next().unwrap_or(BsonType::Any),
            _ => BsonType::AnyOf(union),
        }
    }

    /// Shorthand for `AnyOf(self, Null)`
    pub fn nullable(self) -> Self {
        BsonType::any_of([self, BsonType::Null])
    }

    /// Whether this type admits `Null`
    pub fn is_nullable(&self) -> bool {
        match self {
            BsonType::Null | BsonType::Any => true,
            BsonType::AnyOf(union) => union.contains_null(),
            BsonType::Computed { base, .. } => base.is_nullable(),
            _ => false,
        }
    }

    /// Strip the computed wrapper, if any
    pub fn base(&self) -> &BsonType {
        match self {
            BsonType::Computed { base, .. } => base.base(),
            other => other,
        }
    }

    /// Number of distinct values this type can hold, saturated at `u64::MAX`
    pub fn cardinality(&self) -> u64 {
        match self {
            BsonType::Null => 1,
            BsonType::Boolean => 2,
            BsonType::Enum { members, .. } => members.len() as u64,
            BsonType::AnyOf(union) => union
                .members()
                .iter()
                .map(BsonType::cardinality)
                .max()
                .unwrap_or(u64::MAX),
            BsonType::Computed { base, .. } => base.cardinality(),
            _ => u64::MAX,
        }
    }

    /// Checks whether a value of this type may be stored in a field of type `field`.
    ///
    /// - `Any` on either side is always compatible
    /// - `Null` is only compatible with `Null` or a union containing `Null`
    /// - a union field accepts the value if at least one member does
    /// - a union value is compatible if every non-null member is
    /// - `Int32` widens to `Int64` and `Double` widens to `Decimal128`
    /// - an `Enum` value is compatible with `String` and with any superset enum
    /// - an `Object` value is compatible when all of its keys exist compatibly in the field
    /// - an array field accepts a value matching its element type
    pub fn is_assignable_to(&self, field: &BsonType) -> bool {
        if let BsonType::Computed { base, .. } = self {
            return base.is_assignable_to(field);
        }
        if let BsonType::Computed { base, .. } = field {
            return self.is_assignable_to(base);
        }

        match (self, field) {
            (BsonType::Any, _) | (_, BsonType::Any) => true,
            (BsonType::Null, BsonType::Null) => true,
            (BsonType::Null, BsonType::AnyOf(union)) => union.contains_null(),
            (BsonType::Null, _) => false,
            (BsonType::AnyOf(value), BsonType::Null) => {
                value.members().iter().all(|m| *m == BsonType::Null)
            }
            (BsonType::AnyOf(value), _) => {
                let mut non_null = value.non_null_members().peekable();
                if non_null.peek().is_none() {
                    return BsonType::Null.is_assignable_to(field);
                }
                non_null.all(|m| m.is_assignable_to(field))
            }
            (_, BsonType::AnyOf(union)) => union.members().iter().any(|m| self.is_assignable_to(m)),
            (BsonType::Object(value), BsonType::Object(expected)) => value
                .iter()
                .all(|(key, ty)| expected.get(key).is_some_and(|f| ty.is_assignable_to(f))),
            (BsonType::Object(_), _) => false,
            (BsonType::Array(value), BsonType::Array(expected)) => value.is_assignable_to(expected),
            (BsonType::Array(value), _) => value.is_assignable_to(field),
            (BsonType::Enum { members, .. }, BsonType::Enum { members: expected, .. }) => {
                members.is_subset(expected)
            }
            (BsonType::Enum { .. }, BsonType::String) => true,
            (BsonType::Int32, BsonType::Int64) => true,
            (BsonType::Double, BsonType::Decimal128) => true,
            (_, BsonType::Array(element)) => self.is_assignable_to(element),
            (value, expected) => value == expected,
        }
    }

    /// Returns a copy with every nested union flattened
    pub fn flatten(&self) -> BsonType {
        match self {
            BsonType::Array(of) => BsonType::array(of.flatten()),
            BsonType::Object(fields) => BsonType::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.flatten()))
                    .collect(),
            ),
            BsonType::AnyOf(union) => BsonType::any_of(union.members().iter().map(BsonType::flatten)),
            other => other.clone(),
        }
    }

    /// Merge two observed schemas into one that accepts both
    pub fn merge(first: &BsonType, second: &BsonType) -> BsonType {
        match (first, second) {
            (BsonType::Object(a), BsonType::Object(b)) => {
                let mut merged = a.clone();
                for (key, ty) in b {
                    let entry = match merged.get(key) {
                        Some(existing) => BsonType::merge(existing, ty),
                        None => ty.clone(),
                    };
                    merged.insert(key.clone(), entry);
                }
                BsonType::Object(merged)
            }
            (BsonType::Array(a), BsonType::Array(b)) => BsonType::array(BsonType::merge(a, b)),
            (a, b) if a == b => a.clone(),
            (a, b) => BsonType::any_of([a.clone(), b.clone()]),
        }
    }

    /// The type without its `Null` alternative. `Null` alone becomes `Any`.
    pub fn to_non_nullable(&self) -> BsonType {
        match self {
            BsonType::Null => BsonType::Any,
            BsonType::AnyOf(union) => BsonType::any_of(union.non_null_members().cloned()),
            other => other.clone(),
        }
    }

    /// Render for display, spelling optional types as `T?`
    pub fn render_nullable(&self) -> String {
        match self {
            BsonType::AnyOf(union) if union.contains_null() => {
                let rest: Vec<BsonType> = union.non_null_members().cloned().collect();
                if rest.is_empty() {
                    return BsonType::Null.to_string();
                }
                match BsonType::any_of(rest) {
                    inner @ BsonType::AnyOf(_) => format!("({inner})?"),
                    other => format!("{other}?"),
                }
            }
            other => other.to_string(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            BsonType::Null => 0,
            BsonType::Boolean => 1,
            BsonType::Int32 => 2,
            BsonType::Int64 => 3,
            BsonType::Double => 4,
            BsonType::Decimal128 => 5,
            BsonType::String => 6,
            BsonType::ObjectId => 7,
            BsonType::Uuid => 8,
            BsonType::Date => 9,
            BsonType::Array(_) => 10,
            BsonType::Object(_) => 11,
            BsonType::Enum { .. } => 12,
            BsonType::AnyOf(_) => 13,
            BsonType::Computed { .. } => 14,
            BsonType::Any => 15,
        }
    }
}

impl fmt::Display for BsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BsonType::Null => write!(f, "null"),
            BsonType::Boolean => write!(f, "boolean"),
            BsonType::Int32 => write!(f, "int"),
            BsonType::Int64 => write!(f, "long"),
            BsonType::Double => write!(f, "double"),
            BsonType::Decimal128 => write!(f, "decimal"),
            BsonType::String => write!(f, "string"),
            BsonType::ObjectId => write!(f, "objectId"),
            BsonType::Uuid => write!(f, "uuid"),
            BsonType::Date => write!(f, "date"),
            BsonType::Array(of) => write!(f, "array<{of}>"),
            BsonType::Object(fields) => {
                write!(f, "{{")?;
                for (i, (key, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {ty}")?;
                }
                write!(f, "}}")
            }
            BsonType::Enum { members, name } => match name {
                Some(name) => write!(f, "{name}"),
                None => {
                    let shown: Vec<&str> = members.iter().take(3).map(String::as_str).collect();
                    write!(f, "enum({})", shown.join(" | "))
                }
            },
            BsonType::AnyOf(union) => {
                let rendered: Vec<String> = union.members().iter().map(|t| t.to_string()).collect();
                write!(f, "{}", rendered.join(" | "))
            }
            BsonType::Computed { base, .. } => write!(f, "{base}"),
            BsonType::Any => write!(f, "any"),
        }
    }
}

/// The members of an `AnyOf` type.
///
/// Always flat (no member is itself a union), de-duplicated and stored in a canonical
/// order so structurally equal unions compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<BsonType>", into = "Vec<BsonType>")]
pub struct TypeUnion {
    members: Vec<BsonType>,
}

impl TypeUnion {
    /// Build a normalized union
    pub fn new(types: impl IntoIterator<Item = BsonType>) -> Self {
        let mut members: Vec<BsonType> = Vec::new();
        for ty in types {
            match ty {
                BsonType::AnyOf(nested) => {
                    for member in nested.members {
                        push_unique(&mut members, member);
                    }
                }
                other => push_unique(&mut members, other),
            }
        }
        members.sort_by_cached_key(|t| (t.rank(), t.to_string()));
        Self { members }
    }

    /// Members in canonical order
    pub fn members(&self) -> &[BsonType] {
        &self.members
    }

    /// Whether `Null` is one of the members
    pub fn contains_null(&self) -> bool {
        self.members.contains(&BsonType::Null)
    }

    /// Iterate members other than `Null`
    pub fn non_null_members(&self) -> impl Iterator<Item = &BsonType> {
        self.members.iter().filter(|m| **m != BsonType::Null)
    }
}

fn push_unique(members: &mut Vec<BsonType>, ty: BsonType) {
    if !members.contains(&ty) {
        members.push(ty);
    }
}

impl From<Vec<BsonType>> for TypeUnion {
    fn from(types: Vec<BsonType>) -> Self {
        TypeUnion::new(types)
    }
}

impl From<TypeUnion> for Vec<BsonType> {
    fn from(union: TypeUnion) -> Self {
        union.members
    }
}
