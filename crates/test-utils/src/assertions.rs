// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Query and insight assertions

use mql_analyzer_ir::{CollectionReference, Node};
use mql_analyzer_linting::{Insight, InsightKind};

/// Custom assertion helpers for insights
pub struct InsightAssertions;

impl InsightAssertions {
    /// Assert the exact kinds of `insights`, in order
    pub fn assert_kinds<S>(insights: &[Insight<S>], expected: &[InsightKind]) {
        let kinds: Vec<InsightKind> = insights.iter().map(|insight| insight.kind).collect();
        assert_eq!(kinds, expected, "Unexpected insights: {:?}", messages(insights));
    }

    /// Assert that exactly one insight of `kind` exists and return it
    pub fn assert_single<S>(insights: &[Insight<S>], kind: InsightKind) -> &Insight<S> {
        let matching: Vec<&Insight<S>> =
            insights.iter().filter(|insight| insight.kind == kind).collect();
        assert_eq!(
            matching.len(),
            1,
            "Expected exactly one {:?}, found {:?}",
            kind,
            messages(insights)
        );
        matching[0]
    }

    /// Assert that no insight of `kind` exists
    pub fn assert_none<S>(insights: &[Insight<S>], kind: InsightKind) {
        assert!(
            insights.iter().all(|insight| insight.kind != kind),
            "Unexpected {:?} in {:?}",
            kind,
            messages(insights)
        );
    }
}

fn messages<S>(insights: &[Insight<S>]) -> Vec<String> {
    insights.iter().map(Insight::message).collect()
}

/// Custom assertion helpers for parsed queries
pub struct QueryAssertions;

impl QueryAssertions {
    /// Assert that `query` targets the known namespace `database.collection`
    pub fn assert_known_namespace<S>(query: &Node<S>, database: &str, collection: &str) {
        match query.namespace() {
            Some(namespace) => {
                assert_eq!(namespace.database, database, "Database mismatch");
                assert_eq!(namespace.collection, collection, "Collection mismatch");
            }
            None => panic!("Expected a known namespace {database}.{collection}"),
        }
    }

    /// Assert that `query` knows only its collection
    pub fn assert_only_collection<S>(query: &Node<S>, collection: &str) {
        match query.collection_reference() {
            Some(CollectionReference::OnlyCollection { collection: found, .. }) => {
                assert_eq!(found, collection, "Collection mismatch");
            }
            other => panic!("Expected only collection '{collection}', found {:?}", other.is_some()),
        }
    }
}
