// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! The namespace a query targets, with progressively degraded certainty

use serde::{Deserialize, Serialize};

use crate::namespace::{CollectionSchema, Namespace};

/// What is known about a query's target collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CollectionReference<S> {
    /// Both database and collection were resolved
    Known {
        database_source: Option<S>,
        collection_source: S,
        namespace: Namespace,
        schema: Option<CollectionSchema>,
    },
    /// Only the collection name was resolved
    OnlyCollection { collection_source: S, collection: String },
    /// Nothing could be resolved
    Unknown,
}

impl<S> CollectionReference<S> {
    pub fn known(
        database_source: Option<S>,
        collection_source: S,
        namespace: Namespace,
    ) -> Self {
        CollectionReference::Known {
            database_source,
            collection_source,
            namespace,
            schema: None,
        }
    }

    pub fn only_collection(collection_source: S, collection: impl Into<String>) -> Self {
        CollectionReference::OnlyCollection {
            collection_source,
            collection: collection.into(),
        }
    }

    /// The namespace, when fully known
    pub fn namespace(&self) -> Option<&Namespace> {
        match self {
            CollectionReference::Known { namespace, .. } => Some(namespace),
            _ => None,
        }
    }

    /// The collection name, when at least that is known
    pub fn collection(&self) -> Option<&str> {
        match self {
            CollectionReference::Known { namespace, .. } => Some(&namespace.collection),
            CollectionReference::OnlyCollection { collection, .. } => Some(collection),
            CollectionReference::Unknown => None,
        }
    }

    pub fn map_source<T>(&self, f: &impl Fn(&S) -> T) -> CollectionReference<T> {
        match self {
            CollectionReference::Known {
                database_source,
                collection_source,
                namespace,
                schema,
            } => CollectionReference::Known {
                database_source: database_source.as_ref().map(f),
                collection_source: f(collection_source),
                namespace: namespace.clone(),
                schema: schema.clone(),
            },
            CollectionReference::OnlyCollection {
                collection_source,
                collection,
            } => CollectionReference::OnlyCollection {
                collection_source: f(collection_source),
                collection: collection.clone(),
            },
            CollectionReference::Unknown => CollectionReference::Unknown,
        }
    }
}

/// Component: the target collection of a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HasCollectionReference<S> {
    pub reference: CollectionReference<S>,
}

impl<S> HasCollectionReference<S> {
    pub fn new(reference: CollectionReference<S>) -> Self {
        Self { reference }
    }

    pub fn unknown() -> Self {
        Self::new(CollectionReference::Unknown)
    }

    /// Keep `self` unless it is unknown
    pub fn or(self, other: HasCollectionReference<S>) -> HasCollectionReference<S> {
        match self.reference {
            CollectionReference::Unknown => other,
            _ => self,
        }
    }
}
