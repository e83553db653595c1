// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # ReadModel trait for cluster metadata
//!
//! This module defines the async trait the analyzer uses to read schema and cluster
//! information. Implementations can talk to a live cluster, read a snapshot from disk,
//! or serve canned answers in tests. Callers are expected to rate-limit and cache.

use std::sync::Arc;

use mql_analyzer_ir::{CollectionSchema, ExplainPlanType, Namespace, Node};

use crate::error::ReadModelResult;
use crate::metadata::{BuildInfo, ExplainPlan};

/// Read-only access to the metadata of the cluster a query targets
///
/// # Examples
///
/// ```rust,ignore
/// use mql_analyzer_catalog::{ReadModel, ReadModelError};
///
/// async fn database_exists(model: &impl ReadModel, db: &str) -> Result<bool, ReadModelError> {
///     Ok(model.list_databases().await?.iter().any(|name| name == db))
/// }
/// ```
#[async_trait::async_trait]
pub trait ReadModel: Send + Sync {
    /// List the databases visible to the current user
    async fn list_databases(&self) -> ReadModelResult<Vec<String>>;

    /// List the collections of a database
    ///
    /// # Errors
    ///
    /// Returns `ReadModelError::DatabaseNotFound` if the database doesn't exist.
    async fn list_collections(&self, database: &str) -> ReadModelResult<Vec<String>>;

    /// Infer the schema of a collection by sampling up to `sample_size` documents
    async fn get_collection_schema(
        &self,
        namespace: &Namespace,
        sample_size: usize,
    ) -> ReadModelResult<CollectionSchema>;

    /// Ask the server how it would run `query`
    ///
    /// The query carries no source handles; callers strip them with `Node::map_source`.
    async fn explain_query(
        &self,
        query: &Node<()>,
        explain_type: ExplainPlanType,
    ) -> ReadModelResult<ExplainPlan>;

    /// Version and deployment information of the cluster
    async fn build_info(&self) -> ReadModelResult<BuildInfo>;
}

#[async_trait::async_trait]
impl<T: ReadModel + ?Sized> ReadModel for Arc<T> {
    async fn list_databases(&self) -> ReadModelResult<Vec<String>> {
        (**self).list_databases().await
    }

    async fn list_collections(&self, database: &str) -> ReadModelResult<Vec<String>> {
        (**self).list_collections(database).await
    }

    async fn get_collection_schema(
        &self,
        namespace: &Namespace,
        sample_size: usize,
    ) -> ReadModelResult<CollectionSchema> {
        (**self).get_collection_schema(namespace, sample_size).await
    }

    async fn explain_query(
        &self,
        query: &Node<()>,
        explain_type: ExplainPlanType,
    ) -> ReadModelResult<ExplainPlan> {
        (**self).explain_query(query, explain_type).await
    }

    async fn build_info(&self) -> ReadModelResult<BuildInfo> {
        (**self).build_info().await
    }
}
