// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Namespaces and collection schemas

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bson::BsonType;

/// A `(database, collection)` pair identifying the target of a query
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Both parts are non-blank
    pub fn is_valid(&self) -> bool {
        !self.database.trim().is_empty() && !self.collection.trim().is_empty()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Errors produced when parsing a namespace string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamespaceError {
    #[error("Namespace '{0}' must have the form <database>.<collection>")]
    MissingSeparator(String),

    #[error("Namespace '{0}' has an empty database or collection")]
    EmptyPart(String),
}

impl FromStr for Namespace {
    type Err = NamespaceError;

    /// Parses `db.coll`. Collections may contain dots, databases may not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (database, collection) = s
            .split_once('.')
            .ok_or_else(|| NamespaceError::MissingSeparator(s.to_string()))?;
        let namespace = Namespace::new(database, collection);
        if !namespace.is_valid() {
            return Err(NamespaceError::EmptyPart(s.to_string()));
        }
        Ok(namespace)
    }
}

/// A snapshot of the inferred field types of a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub namespace: Namespace,
    pub schema: BsonType,
}

impl CollectionSchema {
    /// Create a schema snapshot. `schema` is expected to be an `Object`.
    pub fn new(namespace: Namespace, schema: BsonType) -> Self {
        Self { namespace, schema }
    }

    /// An empty schema (no known fields)
    pub fn empty(namespace: Namespace) -> Self {
        Self::new(namespace, BsonType::object::<String>([]))
    }

    /// Type of a dotted field path.
    ///
    /// Numeric segments step into arrays. A segment that does not exist resolves to
    /// `Null`; inside unions each member is looked up and the results are joined.
    pub fn type_of(&self, path: &str) -> BsonType {
        path.split('.')
            .fold(self.schema.clone(), |current, segment| step(&current, segment))
    }

    /// Whether the dotted path exists in the schema
    pub fn has_field(&self, path: &str) -> bool {
        self.type_of(path) != BsonType::Null
    }
}

fn step(current: &BsonType, segment: &str) -> BsonType {
    match current {
        BsonType::Object(fields) => fields.get(segment).cloned().unwrap_or(BsonType::Null),
        BsonType::Array(of) => {
            if segment.parse::<usize>().is_ok() {
                (**of).clone()
            } else {
                step(of, segment)
            }
        }
        BsonType::AnyOf(union) => {
            BsonType::any_of(union.members().iter().map(|member| step(member, segment)))
        }
        BsonType::Computed { base, .. } => step(base, segment),
        BsonType::Any => BsonType::Any,
        _ => BsonType::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_display_and_parse() {
        let ns = Namespace::new("db", "coll.sub");
        assert_eq!(ns.to_string(), "db.coll.sub");
        assert_eq!("db.coll.sub".parse::<Namespace>().unwrap(), ns);
    }

    #[test]
    fn test_namespace_parse_errors() {
        assert!(matches!(
            "nodot".parse::<Namespace>(),
            Err(NamespaceError::MissingSeparator(_))
        ));
        assert!(matches!(
            ".coll".parse::<Namespace>(),
            Err(NamespaceError::EmptyPart(_))
        ));
    }

    #[test]
    fn test_namespace_validity() {
        assert!(Namespace::new("a", "b").is_valid());
        assert!(!Namespace::new("", "b").is_valid());
        assert!(!Namespace::new("a", " ").is_valid());
    }

    #[test]
    fn test_type_of_root_field() {
        let schema = CollectionSchema::new(
            Namespace::new("a", "b"),
            BsonType::object([("myField", BsonType::Int32)]),
        );
        assert_eq!(schema.type_of("myField"), BsonType::Int32);
        assert_eq!(schema.type_of("other"), BsonType::Null);
    }

    #[test]
    fn test_type_of_union_field() {
        let union = BsonType::any_of([BsonType::String, BsonType::Int32]);
        let schema = CollectionSchema::new(
            Namespace::new("a", "b"),
            BsonType::object([("myField", union.clone())]),
        );
        assert_eq!(schema.type_of("myField"), union);
    }

    #[test]
    fn test_type_of_through_array_of_objects() {
        let schema = CollectionSchema::new(
            Namespace::new("a", "b"),
            BsonType::object([(
                "myField",
                BsonType::array(BsonType::any_of([
                    BsonType::String,
                    BsonType::object([("otherField", BsonType::Double)]),
                ])),
            )]),
        );

        assert_eq!(
            schema.type_of("myField.0.otherField"),
            BsonType::any_of([BsonType::Null, BsonType::Double])
        );
        assert!(schema.has_field("myField"));
    }

    #[test]
    fn test_empty_schema_has_no_fields() {
        let schema = CollectionSchema::empty(Namespace::new("a", "b"));
        assert!(!schema.has_field("nonExistingField"));
    }
}
