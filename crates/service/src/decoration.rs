// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Query decoration
//!
//! Parsed queries only know what the source code says. Before linting, a query is
//! decorated with what the cluster and the user know:
//!
//! 1. The server version, as `HasTargetCluster`
//! 2. The database override of its file (or the configured default database), which
//!    turns an `OnlyCollection` reference into a `Known` one
//! 3. The sampled schema of its collection, injected into the `Known` reference
//!
//! Decoration never fails: a read-model error is logged and the step is skipped.

use mql_analyzer_catalog::ReadModel;
use mql_analyzer_ir::{CollectionReference, Node};

/// Decorates queries with cluster metadata
pub struct Decorator<'r, R: ReadModel + ?Sized> {
    read_model: &'r R,
    sample_size: usize,
}

impl<'r, R: ReadModel + ?Sized> Decorator<'r, R> {
    pub fn new(read_model: &'r R, sample_size: usize) -> Self {
        Self {
            read_model,
            sample_size,
        }
    }

    /// Apply every decoration step to `query`
    pub async fn decorate<S: Send>(&self, query: Node<S>, database: Option<&str>) -> Node<S> {
        let query = match self.read_model.build_info().await {
            Ok(build_info) => query.with_target_cluster(build_info.version),
            Err(err) => {
                tracing::warn!(error = %err, "Could not fetch build info, skipping target cluster");
                query
            }
        };

        let query = match database {
            Some(database) => query.query_with_overwritten_database(database),
            None => query,
        };

        self.inject_schema(query).await
    }

    async fn inject_schema<S: Send>(&self, query: Node<S>) -> Node<S> {
        let namespace = match query.collection_reference() {
            Some(CollectionReference::Known {
                namespace,
                schema: None,
                ..
            }) if namespace.is_valid() => namespace.clone(),
            _ => return query,
        };

        match self
            .read_model
            .get_collection_schema(&namespace, self.sample_size)
            .await
        {
            Ok(schema) => query.query_with_injected_collection_schema(schema),
            Err(err) => {
                tracing::warn!(
                    namespace = %namespace,
                    error = %err,
                    "Could not sample collection schema, skipping injection"
                );
                query
            }
        }
    }
}
