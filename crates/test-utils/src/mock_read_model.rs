// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mock read model implementation for testing
//!
//! Provides an in-memory cluster with builder pattern for easy test setup. Any operation
//! can be made to fail, and every call is counted.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use mql_analyzer_catalog::{
    BuildInfo, ExplainPlan, ReadModel, ReadModelError, ReadModelResult,
};
use mql_analyzer_ir::{BsonType, CollectionSchema, ExplainPlanType, Namespace, Node};

/// Operations of the read model, used to inject failures and count calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    ListDatabases,
    ListCollections,
    GetCollectionSchema,
    ExplainQuery,
    BuildInfo,
}

#[derive(Debug, Clone)]
struct MockCollection {
    schema: BsonType,
    explain: ExplainPlan,
}

/// In-memory mock read model for testing
#[derive(Debug, Default)]
pub struct MockReadModel {
    databases: BTreeMap<String, BTreeMap<String, MockCollection>>,
    build_info: Option<BuildInfo>,
    failures: HashMap<MockCall, ReadModelError>,
    calls: Mutex<HashMap<MockCall, usize>>,
}

impl MockReadModel {
    /// Create a new empty mock read model
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `call` was made
    pub fn call_count(&self, call: MockCall) -> usize {
        let calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.get(&call).copied().unwrap_or(0)
    }

    fn record(&self, call: MockCall) -> ReadModelResult<()> {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        *calls.entry(call).or_insert(0) += 1;
        match self.failures.get(&call) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn collection(&self, namespace: &Namespace) -> ReadModelResult<&MockCollection> {
        self.databases
            .get(&namespace.database)
            .and_then(|collections| collections.get(&namespace.collection))
            .ok_or_else(|| ReadModelError::CollectionNotFound(namespace.clone()))
    }
}

#[async_trait::async_trait]
impl ReadModel for MockReadModel {
    async fn list_databases(&self) -> ReadModelResult<Vec<String>> {
        self.record(MockCall::ListDatabases)?;
        Ok(self.databases.keys().cloned().collect())
    }

    async fn list_collections(&self, database: &str) -> ReadModelResult<Vec<String>> {
        self.record(MockCall::ListCollections)?;
        self.databases
            .get(database)
            .map(|collections| collections.keys().cloned().collect())
            .ok_or_else(|| ReadModelError::DatabaseNotFound(database.to_string()))
    }

    async fn get_collection_schema(
        &self,
        namespace: &Namespace,
        _sample_size: usize,
    ) -> ReadModelResult<CollectionSchema> {
        self.record(MockCall::GetCollectionSchema)?;
        let collection = self.collection(namespace)?;
        Ok(CollectionSchema::new(namespace.clone(), collection.schema.clone()))
    }

    async fn explain_query(
        &self,
        query: &Node<()>,
        explain_type: ExplainPlanType,
    ) -> ReadModelResult<ExplainPlan> {
        self.record(MockCall::ExplainQuery)?;
        if explain_type == ExplainPlanType::None {
            return Ok(ExplainPlan::NotRun);
        }
        let namespace = query
            .namespace()
            .ok_or(ReadModelError::UnresolvedNamespace)?;
        Ok(self.collection(namespace)?.explain)
    }

    async fn build_info(&self) -> ReadModelResult<BuildInfo> {
        self.record(MockCall::BuildInfo)?;
        self.build_info
            .clone()
            .ok_or_else(|| ReadModelError::NotSupported("buildInfo".to_string()))
    }
}

/// Builder for creating mock read models with a fluent API
pub struct MockReadModelBuilder {
    model: MockReadModel,
}

impl Default for MockReadModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockReadModelBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            model: MockReadModel::new(),
        }
    }

    /// Add the standard test cluster: `shop.users` and `shop.orders` on version 7.0.2
    pub fn with_standard_schema(self) -> Self {
        self.with_build_info(BuildInfo::new("7.0.2"))
            .with_collection(
                "shop",
                "users",
                BsonType::object([
                    ("_id", BsonType::ObjectId),
                    ("name", BsonType::String),
                    ("email", BsonType::String),
                    ("age", BsonType::Int32.nullable()),
                    ("status", BsonType::String),
                    ("createdAt", BsonType::Date),
                ]),
            )
            .with_collection(
                "shop",
                "orders",
                BsonType::object([
                    ("_id", BsonType::ObjectId),
                    ("customer", BsonType::ObjectId),
                    ("total", BsonType::Decimal128),
                    ("status", BsonType::String),
                    ("items", BsonType::array(BsonType::String)),
                ]),
            )
    }

    /// Add an empty database
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.model.databases.entry(database.into()).or_default();
        self
    }

    /// Add a collection answering explains with an index scan
    pub fn with_collection(
        mut self,
        database: impl Into<String>,
        collection: impl Into<String>,
        schema: BsonType,
    ) -> Self {
        self.model.databases.entry(database.into()).or_default().insert(
            collection.into(),
            MockCollection {
                schema,
                explain: ExplainPlan::IndexScan,
            },
        );
        self
    }

    /// Set the explain outcome of an existing collection
    pub fn with_explain(mut self, namespace: &Namespace, explain: ExplainPlan) -> Self {
        if let Some(collection) = self
            .model
            .databases
            .get_mut(&namespace.database)
            .and_then(|collections| collections.get_mut(&namespace.collection))
        {
            collection.explain = explain;
        }
        self
    }

    pub fn with_build_info(mut self, build_info: BuildInfo) -> Self {
        self.model.build_info = Some(build_info);
        self
    }

    /// Make every `call` fail with `error`
    pub fn failing(mut self, call: MockCall, error: ReadModelError) -> Self {
        self.model.failures.insert(call, error);
        self
    }

    /// Build the mock read model
    pub fn build(self) -> MockReadModel {
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_read_model_listings() {
        let model = MockReadModelBuilder::new()
            .with_standard_schema()
            .with_database("admin")
            .build();

        assert_eq!(model.list_databases().await.unwrap(), vec!["admin", "shop"]);
        assert_eq!(model.list_collections("shop").await.unwrap(), vec!["orders", "users"]);
        assert!(model.list_collections("admin").await.unwrap().is_empty());
        assert_eq!(
            model.list_collections("missing").await,
            Err(ReadModelError::DatabaseNotFound("missing".to_string()))
        );
        assert_eq!(model.call_count(MockCall::ListCollections), 3);
    }

    #[tokio::test]
    async fn test_mock_read_model_schema() {
        let model = MockReadModelBuilder::new().with_standard_schema().build();

        let schema = model
            .get_collection_schema(&Namespace::new("shop", "users"), 50)
            .await
            .unwrap();
        assert_eq!(schema.type_of("email"), BsonType::String);

        let missing = model
            .get_collection_schema(&Namespace::new("shop", "missing"), 50)
            .await;
        assert!(matches!(missing, Err(ReadModelError::CollectionNotFound(_))));
    }

    #[tokio::test]
    async fn test_mock_read_model_failures() {
        let model = MockReadModelBuilder::new()
            .with_standard_schema()
            .failing(MockCall::BuildInfo, ReadModelError::Timeout(3))
            .build();

        assert_eq!(model.build_info().await, Err(ReadModelError::Timeout(3)));
        assert_eq!(model.call_count(MockCall::BuildInfo), 1);
        assert_eq!(model.call_count(MockCall::ListDatabases), 0);
    }
}
