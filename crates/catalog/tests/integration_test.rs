// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Integration tests for the catalog crate

use std::sync::Arc;

use mql_analyzer_catalog::{
    BuildInfo, ExplainPlan, ReadModel, ReadModelError, ReadModelResult, StaticReadModel,
};
use mql_analyzer_ir::{BsonType, CollectionSchema, ExplainPlanType, Namespace, Node};

// Read model that is never connected
struct DisconnectedReadModel;

#[async_trait::async_trait]
impl ReadModel for DisconnectedReadModel {
    async fn list_databases(&self) -> ReadModelResult<Vec<String>> {
        Err(ReadModelError::NoConnection)
    }

    async fn list_collections(&self, _database: &str) -> ReadModelResult<Vec<String>> {
        Err(ReadModelError::NoConnection)
    }

    async fn get_collection_schema(
        &self,
        _namespace: &Namespace,
        _sample_size: usize,
    ) -> ReadModelResult<CollectionSchema> {
        Err(ReadModelError::NoConnection)
    }

    async fn explain_query(
        &self,
        _query: &Node<()>,
        _explain_type: ExplainPlanType,
    ) -> ReadModelResult<ExplainPlan> {
        Err(ReadModelError::NoConnection)
    }

    async fn build_info(&self) -> ReadModelResult<BuildInfo> {
        Err(ReadModelError::NoConnection)
    }
}

#[tokio::test]
async fn test_trait_objects_behind_arc() {
    let models: Vec<Arc<dyn ReadModel>> = vec![
        Arc::new(DisconnectedReadModel),
        Arc::new(StaticReadModel::default()),
    ];

    assert!(models[0].list_databases().await.is_err());
    assert_eq!(models[1].list_databases().await.unwrap(), Vec::<String>::new());
}

#[tokio::test]
async fn test_json_snapshot() {
    let model = StaticReadModel::from_json_str(
        r#"{
            "buildInfo": {"version": "6.0.0", "isAtlas": true},
            "databases": [
                {"name": "sample_mflix", "collections": [
                    {"name": "movies", "fields": {"year": "int | string", "cast": ["string"]}}
                ]}
            ]
        }"#,
    )
    .unwrap();

    let info = model.build_info().await.unwrap();
    assert_eq!(info, BuildInfo::new("6.0.0").with_atlas());

    let schema = model
        .get_collection_schema(&Namespace::new("sample_mflix", "movies"), 10)
        .await
        .unwrap();
    assert_eq!(
        schema.type_of("year"),
        BsonType::any_of([BsonType::Int32, BsonType::String])
    );
    assert_eq!(schema.type_of("cast"), BsonType::array(BsonType::String));
}

#[tokio::test]
async fn test_missing_collection() {
    let model = StaticReadModel::from_yaml_str("databases:\n  - name: production\n").unwrap();
    let result = model
        .get_collection_schema(&Namespace::new("production", "books"), 10)
        .await;
    assert_eq!(
        result,
        Err(ReadModelError::CollectionNotFound(Namespace::new(
            "production",
            "books"
        )))
    );
}
