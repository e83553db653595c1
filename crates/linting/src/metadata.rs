// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Metadata gathering
//!
//! Linters are synchronous and pure over their inputs. Everything they need from the
//! cluster is fetched beforehand by a [`MetadataGatherer`] into a [`LintInput`].
//!
//! A read model failure is not an error of the pass: it is stored as
//! [`Metadata::Unavailable`] and the linters that needed it report a
//! [`CannotCheck`](crate::InsightKind::CannotCheck) insight instead.

use mql_analyzer_catalog::{ExplainPlan, ReadModel, ReadModelError};
use mql_analyzer_ir::{
    CollectionReference, CollectionSchema, ExplainPlanType, IsCommand, Namespace, Node,
};
use serde::Serialize;

use crate::error::LintResult;

/// Default number of documents sampled to infer a collection schema
pub const DEFAULT_SAMPLE_SIZE: usize = 50;

/// One piece of metadata needed by the linters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "value")]
pub enum Metadata<T> {
    Available(T),
    /// The read model failed to provide it
    Unavailable(ReadModelError),
    /// The query gives nothing to ask for (e.g. no namespace)
    NotApplicable,
}

impl<T> Metadata<T> {
    fn from_result(result: Result<T, ReadModelError>) -> Self {
        match result {
            Ok(value) => Metadata::Available(value),
            Err(err) => {
                tracing::debug!(error = %err, "Metadata unavailable");
                Metadata::Unavailable(err)
            }
        }
    }

    /// `Ok(None)` when not applicable, an error when unavailable
    pub fn require(&self) -> LintResult<Option<&T>> {
        match self {
            Metadata::Available(value) => Ok(Some(value)),
            Metadata::Unavailable(err) => Err(err.clone().into()),
            Metadata::NotApplicable => Ok(None),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Metadata::Available(_))
    }
}

/// Everything the linters may look at besides the query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LintInput {
    pub schema: Metadata<CollectionSchema>,
    pub databases: Metadata<Vec<String>>,
    pub collections: Metadata<Vec<String>>,
    pub explain: Metadata<ExplainPlan>,
}

impl LintInput {
    /// No metadata at all, as when no connection is attached
    pub fn not_applicable() -> Self {
        Self {
            schema: Metadata::NotApplicable,
            databases: Metadata::NotApplicable,
            collections: Metadata::NotApplicable,
            explain: Metadata::NotApplicable,
        }
    }

    pub fn with_schema(mut self, schema: CollectionSchema) -> Self {
        self.schema = Metadata::Available(schema);
        self
    }

    pub fn with_databases<D: Into<String>>(mut self, databases: impl IntoIterator<Item = D>) -> Self {
        self.databases = Metadata::Available(databases.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_collections<C: Into<String>>(
        mut self,
        collections: impl IntoIterator<Item = C>,
    ) -> Self {
        self.collections = Metadata::Available(collections.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_explain(mut self, plan: ExplainPlan) -> Self {
        self.explain = Metadata::Available(plan);
        self
    }
}

/// Fetches the [`LintInput`] of a query from a read model
///
/// # Examples
///
/// ```rust,ignore
/// let gatherer = MetadataGatherer::new(&read_model)
///     .with_sample_size(100)
///     .with_explain_plan(ExplainPlanType::Full);
/// let input = gatherer.gather(&query).await;
/// ```
pub struct MetadataGatherer<'r, R: ReadModel + ?Sized> {
    read_model: &'r R,
    sample_size: usize,
    explain_plan: ExplainPlanType,
}

impl<'r, R: ReadModel + ?Sized> MetadataGatherer<'r, R> {
    pub fn new(read_model: &'r R) -> Self {
        Self {
            read_model,
            sample_size: DEFAULT_SAMPLE_SIZE,
            explain_plan: ExplainPlanType::Safe,
        }
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// `ExplainPlanType::None` disables explain
    pub fn with_explain_plan(mut self, explain_plan: ExplainPlanType) -> Self {
        self.explain_plan = explain_plan;
        self
    }

    /// Fetch the metadata relevant to `query`
    ///
    /// The database listing is always requested. Collections, schema and explain plan
    /// need a valid `Known` namespace that is not missing from a successful listing; a
    /// schema already injected into the query is used as is. Explain is only run for
    /// commands that can use an index.
    pub async fn gather<S>(&self, query: &Node<S>) -> LintInput {
        let databases = Metadata::from_result(self.read_model.list_databases().await);

        let Some(CollectionReference::Known {
            namespace, schema, ..
        }) = query.collection_reference()
        else {
            return LintInput {
                databases,
                ..LintInput::not_applicable()
            };
        };
        if !namespace.is_valid() {
            return LintInput {
                databases,
                ..LintInput::not_applicable()
            };
        }

        if let Metadata::Available(listed) = &databases
            && !listed.contains(&namespace.database)
        {
            return LintInput {
                databases,
                ..LintInput::not_applicable()
            };
        }

        let collections =
            Metadata::from_result(self.read_model.list_collections(&namespace.database).await);
        if let Metadata::Available(listed) = &collections
            && !listed.contains(&namespace.collection)
        {
            return LintInput {
                databases,
                collections,
                ..LintInput::not_applicable()
            };
        }

        let schema = match schema {
            Some(schema) => Metadata::Available(schema.clone()),
            None => self.schema(namespace).await,
        };
        let explain = self.explain(query).await;

        LintInput {
            schema,
            databases,
            collections,
            explain,
        }
    }

    async fn schema(&self, namespace: &Namespace) -> Metadata<CollectionSchema> {
        Metadata::from_result(
            self.read_model
                .get_collection_schema(namespace, self.sample_size)
                .await,
        )
    }

    async fn explain<S>(&self, query: &Node<S>) -> Metadata<ExplainPlan> {
        let uses_indexes = query
            .component::<IsCommand>()
            .is_some_and(|command| command.command_type.uses_indexes());
        if !uses_indexes || self.explain_plan == ExplainPlanType::None {
            return Metadata::NotApplicable;
        }

        let stripped = query.map_source(&|_| ()).with_explain(self.explain_plan);
        Metadata::from_result(self.read_model.explain_query(&stripped, self.explain_plan).await)
    }
}
