// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Analysis pipeline
//!
//! ```text
//! anchor → QueryCache (parse once) → Decorator → MetadataGatherer → LintEngine → dispatch
//! ```
//!
//! Everything before linting is async and talks to the read model; linting is
//! synchronous; dispatch is async again. The insights are returned in linter order,
//! then in the order each linter found them.

use std::sync::Arc;

use mql_analyzer_catalog::ReadModel;
use mql_analyzer_ir::Node;
use mql_analyzer_linting::{
    Insight, InsightDispatcher, LintEngine, MetadataGatherer, TracingDispatcher,
};
use mql_analyzer_syntax::{ExprId, Program};

use crate::cache::QueryCache;
use crate::config::AnalyzerConfig;
use crate::decoration::Decorator;
use crate::error::ServiceResult;
use crate::registry::DialectRegistry;
use crate::tracker::SourceTracker;

/// Parses, decorates, lints and dispatches the queries of a program
pub struct AnalysisService<R: ReadModel + ?Sized> {
    config: AnalyzerConfig,
    read_model: Arc<R>,
    registry: DialectRegistry,
    cache: QueryCache<ExprId>,
    engine: LintEngine,
    dispatcher: Arc<dyn InsightDispatcher<ExprId>>,
}

impl<R: ReadModel + ?Sized> AnalysisService<R> {
    /// A service with the default dialects, logging every insight
    pub fn new(config: AnalyzerConfig, read_model: Arc<R>) -> ServiceResult<Self> {
        config.validate()?;
        let engine = LintEngine::new(config.enabled_inspections.iter().copied());
        Ok(Self {
            config,
            read_model,
            registry: DialectRegistry::default(),
            cache: QueryCache::new(Arc::new(SourceTracker::new())),
            engine,
            dispatcher: Arc::new(TracingDispatcher),
        })
    }

    pub fn with_registry(mut self, registry: DialectRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn InsightDispatcher<ExprId>>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn cache(&self) -> &QueryCache<ExprId> {
        &self.cache
    }

    pub fn tracker(&self) -> &Arc<SourceTracker<ExprId>> {
        self.cache.tracker()
    }

    pub fn registry(&self) -> &DialectRegistry {
        &self.registry
    }

    /// The memoized query at `anchor`
    pub fn query_at(&self, program: &Program, anchor: ExprId) -> Option<Arc<Node<ExprId>>> {
        let parser = self.registry.parser_for(program, &self.config);
        let query = self.cache.query_at(anchor, &parser)?;
        if self.tracker().file_of(anchor).is_none()
            && let Some(file) = program.file_of(anchor)
        {
            self.tracker().assign_file(anchor, program.file(file).path.clone());
        }
        Some(query)
    }

    /// The memoized query owning `expr`, wherever `expr` sits inside it
    pub fn query_containing(
        &self,
        program: &Program,
        expr: ExprId,
    ) -> Option<Arc<Node<ExprId>>> {
        let (_, anchor) = self.registry.anchor_of(program, expr)?;
        self.query_at(program, anchor)
    }

    /// Cached queries sharing the namespace of `query`
    pub fn siblings_of(&self, query: &Node<ExprId>) -> Vec<Arc<Node<ExprId>>> {
        self.cache.all_siblings_of(query)
    }

    /// Run the whole pipeline on the query at `anchor`
    ///
    /// An anchor that is not a query yields no insights. The only error is a failed
    /// dispatch.
    pub async fn analyze(
        &self,
        program: &Program,
        anchor: ExprId,
    ) -> ServiceResult<Vec<Insight<ExprId>>> {
        let Some(parsed) = self.query_at(program, anchor) else {
            tracing::debug!(%anchor, "Not a query anchor");
            return Ok(Vec::new());
        };

        let database = self
            .tracker()
            .database_override(anchor)
            .or_else(|| self.config.default_database.clone());
        let decorated = Decorator::new(self.read_model.as_ref(), self.config.sample_size)
            .decorate(parsed.as_ref().clone(), database.as_deref())
            .await;
        let query = Arc::new(decorated);

        let input = MetadataGatherer::new(self.read_model.as_ref())
            .with_sample_size(self.config.sample_size)
            .with_explain_plan(self.config.explain_plan)
            .gather(query.as_ref())
            .await;

        let insights = self.engine.run(&query, &input);
        tracing::info!(%anchor, insights = insights.len(), "Query analyzed");

        self.dispatcher.dispatch(&insights).await?;
        Ok(insights)
    }

    /// Analyze every query anchored in `anchors`, skipping expressions that aren't anchors
    pub async fn analyze_all(
        &self,
        program: &Program,
        anchors: impl IntoIterator<Item = ExprId>,
    ) -> ServiceResult<Vec<Insight<ExprId>>> {
        let mut insights = Vec::new();
        for anchor in anchors {
            insights.extend(self.analyze(program, anchor).await?);
        }
        Ok(insights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::error::ServiceError;
    use mql_analyzer_linting::{InsightKind, Inspection};
    use mql_analyzer_test_utils::{MockReadModel, MockReadModelBuilder, QueryFixtures};

    fn service(config: AnalyzerConfig) -> AnalysisService<MockReadModel> {
        let model = MockReadModelBuilder::new().with_standard_schema().build();
        AnalysisService::new(config, Arc::new(model)).unwrap()
    }

    #[test]
    fn test_new_validates_config() {
        let config = AnalyzerConfig {
            sample_size: 0,
            ..Default::default()
        };
        let model = Arc::new(MockReadModel::new());
        assert!(matches!(
            AnalysisService::new(config, model),
            Err(ServiceError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_query_at_assigns_file() {
        let service = service(AnalyzerConfig::default());
        let fixture = QueryFixtures::find_eq("shop", "users", "name", "Ada");

        let query = service.query_at(&fixture.program, fixture.anchor).unwrap();
        assert_eq!(query.source, fixture.anchor);
        assert_eq!(
            service.tracker().file_of(fixture.anchor).as_deref(),
            Some("Repository.java")
        );
    }

    #[test]
    fn test_analyze_non_anchor() {
        let service = service(AnalyzerConfig::default());
        let fixture = QueryFixtures::find_eq("shop", "users", "name", "Ada");
        let filter = fixture.program.call(fixture.anchor).unwrap().args[0];

        let insights = tokio_test::block_on(service.analyze(&fixture.program, filter)).unwrap();
        assert!(insights.is_empty());
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_respects_enabled_inspections() {
        let config = AnalyzerConfig {
            enabled_inspections: vec![Inspection::FieldCheck],
            ..Default::default()
        };
        let service = service(config);
        let fixture = QueryFixtures::find_all("shop", "users");

        // Not using filters, but that inspection is disabled
        let insights = service.analyze(&fixture.program, fixture.anchor).await.unwrap();
        assert!(insights.is_empty());

        let service = self::service(AnalyzerConfig::default());
        let insights = service.analyze(&fixture.program, fixture.anchor).await.unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::QueryNotUsingFilters);
    }
}
