// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Integration tests for the analysis pipeline

use std::sync::Arc;

use anyhow::Result;
use mql_analyzer_catalog::{ExplainPlan, ReadModelError};
use mql_analyzer_ir::{BsonType, HasTargetCluster, Namespace};
use mql_analyzer_linting::{ChannelDispatcher, InsightKind, LintError};
use mql_analyzer_service::{AnalysisService, AnalyzerConfig, ServiceError};
use mql_analyzer_test_utils::{
    InsightAssertions, MockCall, MockReadModel, MockReadModelBuilder, QueryFixtures, init_tracing,
};

fn service(model: MockReadModel) -> Result<AnalysisService<MockReadModel>> {
    init_tracing();
    Ok(AnalysisService::new(AnalyzerConfig::default(), Arc::new(model))?)
}

#[tokio::test]
async fn test_missing_field_end_to_end() -> Result<()> {
    let service = service(MockReadModelBuilder::new().with_standard_schema().build())?;
    let fixture = QueryFixtures::find_eq("shop", "users", "nickname", "ada");

    let insights = service.analyze(&fixture.program, fixture.anchor).await?;

    InsightAssertions::assert_kinds(&insights, &[InsightKind::FieldDoesNotExist]);
    assert_eq!(insights[0].arguments, vec!["nickname", "shop.users"]);
    assert_eq!(
        insights[0]
            .query
            .component::<HasTargetCluster>()
            .map(|c| c.version.as_str()),
        Some("7.0.2")
    );
    Ok(())
}

#[tokio::test]
async fn test_injected_schema_is_sampled_once() -> Result<()> {
    let model = MockReadModelBuilder::new().with_standard_schema().build();
    let service = service(model)?;
    let fixture = QueryFixtures::find_eq("shop", "users", "email", "ada@example.com");

    let insights = service.analyze(&fixture.program, fixture.anchor).await?;
    assert!(insights.is_empty());

    let model = MockReadModelBuilder::new().with_standard_schema().build();
    let model = Arc::new(model);
    let service = AnalysisService::new(AnalyzerConfig::default(), model.clone())?;
    service.analyze(&fixture.program, fixture.anchor).await?;
    assert_eq!(model.call_count(MockCall::GetCollectionSchema), 1);
    assert_eq!(model.call_count(MockCall::ExplainQuery), 1);
    Ok(())
}

#[tokio::test]
async fn test_insights_are_dispatched() -> Result<()> {
    let model = MockReadModelBuilder::new()
        .with_standard_schema()
        .with_explain(&Namespace::new("shop", "users"), ExplainPlan::CollectionScan)
        .build();
    let (dispatcher, mut receiver) = ChannelDispatcher::channel(8);
    let service = service(model)?.with_dispatcher(Arc::new(dispatcher));
    let fixture = QueryFixtures::find_eq("shop", "users", "status", "active");

    let insights = service.analyze(&fixture.program, fixture.anchor).await?;

    InsightAssertions::assert_kinds(&insights, &[InsightKind::QueryNotCoveredByIndex]);
    let received = receiver.recv().await.map(|insight| insight.kind);
    assert_eq!(received, Some(InsightKind::QueryNotCoveredByIndex));
    Ok(())
}

#[tokio::test]
async fn test_closed_channel_fails_analysis() -> Result<()> {
    let model = MockReadModelBuilder::new().build();
    let (dispatcher, receiver) = ChannelDispatcher::channel(1);
    drop(receiver);
    let service = service(model)?.with_dispatcher(Arc::new(dispatcher));
    let fixture = QueryFixtures::find_eq("myDatabase", "users", "name", "Ada");

    let result = service.analyze(&fixture.program, fixture.anchor).await;

    assert_eq!(
        result.unwrap_err(),
        ServiceError::Dispatch(LintError::ChannelClosed {
            delivered: 0,
            total: 1
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_file_database_override_resolves_spring_query() -> Result<()> {
    let model = MockReadModelBuilder::new()
        .with_build_info(mql_analyzer_catalog::BuildInfo::new("7.0.2"))
        .with_collection(
            "library",
            "books",
            BsonType::object([("_id", BsonType::ObjectId), ("title", BsonType::String)]),
        )
        .build();
    let service = service(model)?;
    let fixture = QueryFixtures::spring_find("books", "title", "Dune");

    let insights = service.analyze(&fixture.program, fixture.anchor).await?;
    InsightAssertions::assert_kinds(&insights, &[InsightKind::NoNamespaceInferred]);

    service
        .tracker()
        .set_database_override("BookRepository.java", "library");
    let insights = service.analyze(&fixture.program, fixture.anchor).await?;
    assert!(insights.is_empty(), "{:?}", insights.iter().map(|i| i.message()).collect::<Vec<_>>());
    Ok(())
}

#[tokio::test]
async fn test_spring_update_with_string_on_double_field() -> Result<()> {
    let model = MockReadModelBuilder::new()
        .with_build_info(mql_analyzer_catalog::BuildInfo::new("7.0.2"))
        .with_collection(
            "library",
            "books",
            BsonType::object([
                ("_id", BsonType::ObjectId),
                ("title", BsonType::String),
                ("rating", BsonType::Double),
            ]),
        )
        .build();
    let service = service(model)?;
    service
        .tracker()
        .set_database_override("BookRepository.java", "library");
    let fixture = QueryFixtures::spring_update_set("books", "rating", "five");

    let insights = service.analyze(&fixture.program, fixture.anchor).await?;

    InsightAssertions::assert_kinds(&insights, &[InsightKind::FieldValueTypeMismatch]);
    assert_eq!(insights[0].arguments[0], "rating");
    assert_eq!(insights[0].arguments[1], "string");
    Ok(())
}

#[tokio::test]
async fn test_default_database_applies_to_every_query() -> Result<()> {
    let model = MockReadModelBuilder::new().with_standard_schema().build();
    let config = AnalyzerConfig {
        default_database: Some("archive".to_string()),
        ..Default::default()
    };
    let service = AnalysisService::new(config, Arc::new(model))?;
    let fixture = QueryFixtures::find_eq("shop", "users", "name", "Ada");

    let insights = service.analyze(&fixture.program, fixture.anchor).await?;

    InsightAssertions::assert_kinds(&insights, &[InsightKind::DatabaseDoesNotExist]);
    assert_eq!(insights[0].arguments, vec!["archive"]);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_cluster_degrades() -> Result<()> {
    let error = ReadModelError::ConnectionFailed("no route to host".to_string());
    let model = MockReadModelBuilder::new()
        .with_standard_schema()
        .failing(MockCall::BuildInfo, error.clone())
        .failing(MockCall::ListDatabases, error.clone())
        .failing(MockCall::GetCollectionSchema, error.clone())
        .failing(MockCall::ExplainQuery, error)
        .build();
    let service = service(model)?;
    let fixture = QueryFixtures::find_eq("shop", "users", "name", "Ada");

    let insights = service.analyze(&fixture.program, fixture.anchor).await?;

    assert!(
        insights
            .iter()
            .all(|insight| insight.kind == InsightKind::CannotCheck)
    );
    assert_eq!(insights.len(), 3);
    assert!(insights[0].query.component::<HasTargetCluster>().is_none());
    Ok(())
}

#[tokio::test]
async fn test_siblings_and_invalidation() -> Result<()> {
    let service = service(MockReadModelBuilder::new().with_standard_schema().build())?;
    let (program, anchors) = QueryFixtures::many_finds("shop", "users", 4);

    let insights = service.analyze_all(&program, anchors.iter().copied()).await?;
    assert!(insights.is_empty());
    assert_eq!(service.cache().len(), 4);

    let first = service
        .query_at(&program, anchors[0])
        .ok_or_else(|| anyhow::anyhow!("first query not cached"))?;
    assert_eq!(service.siblings_of(&first).len(), 3);

    service.tracker().touch(anchors[1]);
    assert_eq!(service.siblings_of(&first).len(), 2);

    let reparsed = service
        .query_at(&program, anchors[1])
        .ok_or_else(|| anyhow::anyhow!("second query not cached"))?;
    assert_eq!(service.siblings_of(&first).len(), 3);
    assert_eq!(service.siblings_of(&reparsed).len(), 3);

    service.cache().on_anchor_discarded(anchors[2]);
    assert_eq!(service.siblings_of(&first).len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_query_containing_finds_the_anchor() -> Result<()> {
    let service = service(MockReadModelBuilder::new().build())?;
    let fixture = QueryFixtures::spring_find("books", "title", "Dune");
    let where_call = fixture
        .program
        .call(fixture.anchor)
        .and_then(|call| call.receiver)
        .ok_or_else(|| anyhow::anyhow!("criteria chain without receiver"))?;

    let query = service
        .query_containing(&fixture.program, where_call)
        .ok_or_else(|| anyhow::anyhow!("no query around the where call"))?;
    assert_eq!(query.source, fixture.anchor);
    Ok(())
}
