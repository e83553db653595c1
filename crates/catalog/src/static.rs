// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Static Read Model
//!
//! A read model backed by a metadata snapshot, used for offline analysis and tests.
//!
//! ## Snapshot format
//!
//! ```yaml
//! buildInfo:
//!   version: "7.0.2"
//! databases:
//!   - name: production
//!     collections:
//!       - name: books
//!         explain: indexScan
//!         fields:
//!           _id: objectId
//!           title: string
//!           rating: "double?"
//!           tags: "string[]"
//!           author:
//!             name: string
//!           reviews:
//!             - stars: int
//! ```
//!
//! Field types are written as BSON type names (`null`, `boolean`, `int`, `long`, `double`,
//! `decimal`, `string`, `objectId`, `uuid`, `date`, `any`). A `[]` suffix makes an
//! array, a `?` suffix makes the type nullable and `|` separates union members. Nested
//! maps are documents and a one-element list is an array of that element.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use mql_analyzer_ir::{BsonType, CollectionSchema, ExplainPlanType, Namespace, Node};

use crate::metadata::{BuildInfo, ExplainPlan};
use crate::{ReadModel, ReadModelError, ReadModelResult};

/// The type of a field as written in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    Type(String),
    ArrayOf(Vec<FieldSpec>),
    Document(BTreeMap<String, FieldSpec>),
}

impl FieldSpec {
    pub fn to_bson_type(&self) -> ReadModelResult<BsonType> {
        match self {
            FieldSpec::Type(name) => parse_type_name(name),
            FieldSpec::ArrayOf(elements) => match elements.as_slice() {
                [element] => Ok(BsonType::array(element.to_bson_type()?)),
                _ => Err(ReadModelError::SerializationError(
                    "array fields must list exactly one element type".to_string(),
                )),
            },
            FieldSpec::Document(fields) => document_type(fields),
        }
    }
}

fn document_type(fields: &BTreeMap<String, FieldSpec>) -> ReadModelResult<BsonType> {
    let mut out = BTreeMap::new();
    for (name, spec) in fields {
        out.insert(name.clone(), spec.to_bson_type()?);
    }
    Ok(BsonType::Object(out))
}

/// Parse a type name such as `string`, `int[]`, `date?` or `int | string`
pub fn parse_type_name(name: &str) -> ReadModelResult<BsonType> {
    let name = name.trim();
    if name.contains('|') {
        let members = name
            .split('|')
            .map(parse_type_name)
            .collect::<ReadModelResult<Vec<_>>>()?;
        return Ok(BsonType::any_of(members));
    }
    if let Some(inner) = name.strip_suffix('?') {
        return Ok(parse_type_name(inner)?.nullable());
    }
    if let Some(inner) = name.strip_suffix("[]") {
        return Ok(BsonType::array(parse_type_name(inner)?));
    }
    let ty = match name {
        "null" => BsonType::Null,
        "boolean" | "bool" => BsonType::Boolean,
        "int" | "int32" => BsonType::Int32,
        "long" | "int64" => BsonType::Int64,
        "double" => BsonType::Double,
        "decimal" | "decimal128" => BsonType::Decimal128,
        "string" => BsonType::String,
        "objectId" => BsonType::ObjectId,
        "uuid" => BsonType::Uuid,
        "date" => BsonType::Date,
        "any" => BsonType::Any,
        "object" => BsonType::object::<String>([]),
        other => {
            return Err(ReadModelError::SerializationError(format!(
                "unknown type name '{other}'"
            )));
        }
    };
    Ok(ty)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSnapshot {
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
    /// Answer given to every explain on this collection
    #[serde(default)]
    pub explain: Option<ExplainPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSnapshot {
    pub name: String,
    #[serde(default)]
    pub collections: Vec<CollectionSnapshot>,
}

/// A complete metadata snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadModelSnapshot {
    #[serde(default)]
    pub build_info: Option<BuildInfo>,
    #[serde(default)]
    pub databases: Vec<DatabaseSnapshot>,
}

/// Read model answering from a [`ReadModelSnapshot`]
#[derive(Debug, Clone, Default)]
pub struct StaticReadModel {
    snapshot: ReadModelSnapshot,
}

impl StaticReadModel {
    pub fn new(snapshot: ReadModelSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn from_yaml_str(yaml: &str) -> ReadModelResult<Self> {
        let snapshot = serde_yaml::from_str(yaml)
            .map_err(|e| ReadModelError::SerializationError(e.to_string()))?;
        Ok(Self::new(snapshot))
    }

    pub fn from_json_str(json: &str) -> ReadModelResult<Self> {
        let snapshot = serde_json::from_str(json)
            .map_err(|e| ReadModelError::SerializationError(e.to_string()))?;
        Ok(Self::new(snapshot))
    }

    /// Load a snapshot file; `.json` files are parsed as JSON, anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> ReadModelResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReadModelError::SerializationError(format!("{}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "Loading read model snapshot");
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    pub fn snapshot(&self) -> &ReadModelSnapshot {
        &self.snapshot
    }

    fn database(&self, name: &str) -> ReadModelResult<&DatabaseSnapshot> {
        self.snapshot
            .databases
            .iter()
            .find(|db| db.name == name)
            .ok_or_else(|| ReadModelError::DatabaseNotFound(name.to_string()))
    }

    fn collection(&self, namespace: &Namespace) -> ReadModelResult<&CollectionSnapshot> {
        self.database(&namespace.database)?
            .collections
            .iter()
            .find(|c| c.name == namespace.collection)
            .ok_or_else(|| ReadModelError::CollectionNotFound(namespace.clone()))
    }
}

#[async_trait]
impl ReadModel for StaticReadModel {
    async fn list_databases(&self) -> ReadModelResult<Vec<String>> {
        Ok(self.snapshot.databases.iter().map(|db| db.name.clone()).collect())
    }

    async fn list_collections(&self, database: &str) -> ReadModelResult<Vec<String>> {
        Ok(self
            .database(database)?
            .collections
            .iter()
            .map(|c| c.name.clone())
            .collect())
    }

    async fn get_collection_schema(
        &self,
        namespace: &Namespace,
        sample_size: usize,
    ) -> ReadModelResult<CollectionSchema> {
        debug!(%namespace, sample_size, "Serving schema from snapshot");
        let collection = self.collection(namespace)?;
        Ok(CollectionSchema::new(
            namespace.clone(),
            document_type(&collection.fields)?,
        ))
    }

    async fn explain_query(
        &self,
        query: &Node<()>,
        explain_type: ExplainPlanType,
    ) -> ReadModelResult<ExplainPlan> {
        if explain_type == ExplainPlanType::None {
            return Ok(ExplainPlan::NotRun);
        }
        let namespace = query
            .namespace()
            .ok_or(ReadModelError::UnresolvedNamespace)?;
        self.collection(namespace)?
            .explain
            .ok_or_else(|| ReadModelError::NotSupported(format!("no explain plan for {namespace}")))
    }

    async fn build_info(&self) -> ReadModelResult<BuildInfo> {
        self.snapshot
            .build_info
            .clone()
            .ok_or_else(|| ReadModelError::NotSupported("no build info in snapshot".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mql_analyzer_ir::{CollectionReference, HasCollectionReference};

    const SNAPSHOT: &str = r#"
buildInfo:
  version: "7.0.2"
databases:
  - name: production
    collections:
      - name: books
        explain: collectionScan
        fields:
          _id: objectId
          rating: "double?"
          tags: "string[]"
          author:
            name: string
          reviews:
            - stars: int
"#;

    fn books() -> Namespace {
        Namespace::new("production", "books")
    }

    #[test]
    fn test_parse_type_names() {
        assert_eq!(parse_type_name("int").unwrap(), BsonType::Int32);
        assert_eq!(
            parse_type_name("date?").unwrap(),
            BsonType::any_of([BsonType::Date, BsonType::Null])
        );
        assert_eq!(
            parse_type_name("int | string").unwrap(),
            BsonType::any_of([BsonType::Int32, BsonType::String])
        );
        assert_eq!(
            parse_type_name("long[]").unwrap(),
            BsonType::array(BsonType::Int64)
        );
        assert!(parse_type_name("varchar").is_err());
    }

    #[tokio::test]
    async fn test_static_read_model_listings() {
        let model = StaticReadModel::from_yaml_str(SNAPSHOT).unwrap();
        assert_eq!(model.list_databases().await.unwrap(), vec!["production"]);
        assert_eq!(
            model.list_collections("production").await.unwrap(),
            vec!["books"]
        );
        assert!(matches!(
            model.list_collections("staging").await,
            Err(ReadModelError::DatabaseNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_static_read_model_schema() {
        let model = StaticReadModel::from_yaml_str(SNAPSHOT).unwrap();
        let schema = model.get_collection_schema(&books(), 50).await.unwrap();

        assert_eq!(schema.type_of("author.name"), BsonType::String);
        assert_eq!(schema.type_of("reviews.0.stars"), BsonType::Int32);
        assert!(schema.has_field("tags"));
        assert!(!schema.has_field("title"));
    }

    #[tokio::test]
    async fn test_static_read_model_explain() {
        let model = StaticReadModel::from_yaml_str(SNAPSHOT).unwrap();
        let query = Node::new(
            (),
            [HasCollectionReference::new(CollectionReference::known(Some(()), (), books())).into()],
        );

        assert_eq!(
            model.explain_query(&query, ExplainPlanType::Safe).await.unwrap(),
            ExplainPlan::CollectionScan
        );
        assert_eq!(
            model.explain_query(&query, ExplainPlanType::None).await.unwrap(),
            ExplainPlan::NotRun
        );

        let unresolved = Node::new((), []);
        assert_eq!(
            model.explain_query(&unresolved, ExplainPlanType::Safe).await,
            Err(ReadModelError::UnresolvedNamespace)
        );
    }

    #[tokio::test]
    async fn test_static_read_model_build_info() {
        let model = StaticReadModel::from_yaml_str(SNAPSHOT).unwrap();
        assert_eq!(model.build_info().await.unwrap().version, "7.0.2");
        assert!(StaticReadModel::default().build_info().await.is_err());
    }

    #[test]
    fn test_invalid_snapshot() {
        let result = StaticReadModel::from_yaml_str("databases: 3");
        assert!(matches!(result, Err(ReadModelError::SerializationError(_))));
    }
}
