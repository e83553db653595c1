// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Database and collection existence checks

use std::sync::Arc;

use mql_analyzer_ir::{CollectionReference, Node};

use crate::insight::{Insight, InsightKind, InsightSink};
use crate::linter::{Inspection, Linter, cannot_check};
use crate::metadata::LintInput;

/// Verifies that the namespace of a query was inferred and exists in the cluster
///
/// - `Unknown` reference: the collection could not be inferred
/// - `OnlyCollection`: the database could not be inferred
/// - `Known`: the database must be listed, then the collection must be listed in it
#[derive(Debug, Clone, Copy, Default)]
pub struct NamespaceCheckingLinter;

impl<S: Clone> Linter<S> for NamespaceCheckingLinter {
    fn inspection(&self) -> Inspection {
        Inspection::NamespaceCheck
    }

    fn run(&self, query: &Arc<Node<S>>, input: &LintInput, sink: &mut InsightSink<S>) {
        let Some(reference) = query.collection_reference() else {
            return;
        };

        match reference {
            CollectionReference::Unknown => sink.register(
                Insight::new(query.clone(), query.source.clone(), InsightKind::NoNamespaceInferred)
                    .with_argument("collection"),
            ),
            CollectionReference::OnlyCollection {
                collection_source,
                collection,
            } => {
                if !collection.is_empty() {
                    sink.register(
                        Insight::new(
                            query.clone(),
                            collection_source.clone(),
                            InsightKind::NoNamespaceInferred,
                        )
                        .with_argument("database"),
                    );
                }
            }
            CollectionReference::Known {
                database_source,
                collection_source,
                namespace,
                ..
            } => {
                let databases = match input.databases.require() {
                    Ok(Some(databases)) => databases,
                    Ok(None) => return,
                    Err(err) => {
                        sink.register(cannot_check(query, Inspection::NamespaceCheck, &err));
                        return;
                    }
                };
                if !databases.contains(&namespace.database) {
                    let source = database_source.as_ref().unwrap_or(collection_source);
                    sink.register(
                        Insight::new(query.clone(), source.clone(), InsightKind::DatabaseDoesNotExist)
                            .with_argument(namespace.database.as_str()),
                    );
                    return;
                }

                // A listing failure inside an existing database reads as "not found"
                let exists = input
                    .collections
                    .require()
                    .ok()
                    .flatten()
                    .is_some_and(|collections| collections.contains(&namespace.collection));
                if !exists {
                    sink.register(
                        Insight::new(
                            query.clone(),
                            collection_source.clone(),
                            InsightKind::CollectionDoesNotExist,
                        )
                        .with_argument(namespace.collection.as_str())
                        .with_argument(namespace.database.as_str()),
                    );
                }
            }
        }
    }
}
