// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Query Node
//!
//! A [`Node`] is a query or query fragment: an opaque source handle plus a set of
//! typed [`Component`]s. The same node type represents a whole `find` call, a single
//! `eq` predicate or a `$group` accumulator; what it is depends only on the components
//! it carries.
//!
//! ## Invariants
//!
//! - At most one component per [`ComponentKind`]. Constructors and [`Node::with`]
//!   replace an existing component of the same kind in place.
//! - Nodes are immutable. Enrichment (`with_target_cluster`, schema injection...)
//!   returns a new node.
//!
//! ## Example
//!
//! ```rust,ignore
//! let predicate = Node::new(source, vec![
//!     Named::new(Name::Eq).into(),
//!     HasFieldReference::new(FieldReference::from_schema(source, "name")).into(),
//! ]);
//! assert!(predicate.component::<HasFieldReference<_>>().is_some());
//! ```

use serde::{Deserialize, Serialize};

use crate::components::{
    CollectionReference, Component, ComponentKind, ComponentOf, ExplainPlanType, FieldReference,
    HasAggregation, HasCollectionReference, HasExplain, HasFieldReference, HasFilter,
    HasTargetCluster, Named,
};
use crate::namespace::{CollectionSchema, Namespace};

/// A query or query fragment tagged with its host syntax location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawNode<S>")]
pub struct Node<S> {
    pub source: S,
    components: Vec<Component<S>>,
}

/// Wire form of a [`Node`]; duplicate kinds are folded by [`Node::new`] on the way in
#[derive(Deserialize)]
struct RawNode<S> {
    source: S,
    components: Vec<Component<S>>,
}

impl<S> From<RawNode<S>> for Node<S> {
    fn from(raw: RawNode<S>) -> Self {
        Node::new(raw.source, raw.components)
    }
}

impl<S> Node<S> {
    /// Create a node; a later component replaces an earlier one of the same kind
    pub fn new(source: S, components: impl IntoIterator<Item = Component<S>>) -> Self {
        let mut node = Node {
            source,
            components: Vec::new(),
        };
        for component in components {
            node.put(component);
        }
        node
    }

    fn put(&mut self, component: Component<S>) {
        let kind = component.kind();
        match self.components.iter_mut().find(|c| c.kind() == kind) {
            Some(slot) => *slot = component,
            None => self.components.push(component),
        }
    }

    pub fn components(&self) -> &[Component<S>] {
        &self.components
    }

    /// The component of type `C`, if present
    pub fn component<C: ComponentOf<S>>(&self) -> Option<&C> {
        self.components.iter().find_map(C::extract)
    }

    pub fn has<C: ComponentOf<S>>(&self) -> bool {
        self.components.iter().any(|c| c.kind() == C::KIND)
    }

    pub fn component_of_kind(&self, kind: ComponentKind) -> Option<&Component<S>> {
        self.components.iter().find(|c| c.kind() == kind)
    }

    /// Components that hold child nodes
    pub fn components_with_children(&self) -> impl Iterator<Item = &Component<S>> {
        self.components.iter().filter(|c| !c.children().is_empty())
    }

    /// A copy with `component` added, replacing any component of the same kind
    pub fn with(mut self, component: impl Into<Component<S>>) -> Self {
        self.put(component.into());
        self
    }

    pub fn with_target_cluster(self, version: impl Into<String>) -> Self {
        self.with(HasTargetCluster::new(version))
    }

    pub fn with_explain(self, explain_type: ExplainPlanType) -> Self {
        self.with(HasExplain { explain_type })
    }

    /// Operator name, `None` for nodes without a `Named` component
    pub fn name(&self) -> Option<crate::components::Name> {
        self.component::<Named>().map(|named| named.name)
    }

    /// Attach `schema` to a `Known` collection reference
    pub fn query_with_injected_collection_schema(mut self, schema: CollectionSchema) -> Self {
        for component in &mut self.components {
            if let Component::CollectionReference(HasCollectionReference {
                reference: CollectionReference::Known { schema: slot, .. },
            }) = component
            {
                *slot = Some(schema);
                break;
            }
        }
        self
    }

    /// Force the database of the collection reference
    ///
    /// `OnlyCollection` is promoted to `Known` without a database source, `Known` keeps
    /// its collection and sources, `Unknown` is left untouched.
    pub fn query_with_overwritten_database(mut self, database: impl Into<String>) -> Self {
        let database = database.into();
        for component in &mut self.components {
            let Component::CollectionReference(has_ref) = component else {
                continue;
            };
            let reference = std::mem::replace(&mut has_ref.reference, CollectionReference::Unknown);
            has_ref.reference = match reference {
                CollectionReference::OnlyCollection {
                    collection_source,
                    collection,
                } => CollectionReference::Known {
                    database_source: None,
                    collection_source,
                    namespace: Namespace::new(database.clone(), collection),
                    schema: None,
                },
                CollectionReference::Known {
                    database_source,
                    collection_source,
                    namespace,
                    schema,
                } => CollectionReference::Known {
                    database_source,
                    collection_source,
                    namespace: Namespace::new(database.clone(), namespace.collection),
                    schema,
                },
                CollectionReference::Unknown => CollectionReference::Unknown,
            };
        }
        self
    }

    /// The resolved collection reference, `Unknown` when the node has none
    pub fn collection_reference(&self) -> Option<&CollectionReference<S>> {
        self.component::<HasCollectionReference<S>>()
            .map(|c| &c.reference)
    }

    pub fn namespace(&self) -> Option<&Namespace> {
        self.collection_reference().and_then(|r| r.namespace())
    }

    /// Every node inside the filter tree, including filters of aggregation stages
    ///
    /// The children of a filter are listed before their own descendants. Empty when the
    /// query has no filter at all.
    pub fn all_filters_recursively(&self) -> Vec<&Node<S>> {
        fn gather<'a, S>(node: &'a Node<S>, out: &mut Vec<&'a Node<S>>) {
            if let Some(filter) = node.component::<HasFilter<S>>() {
                out.extend(filter.children.iter());
                for child in &filter.children {
                    gather(child, out);
                }
            }
        }

        let mut out = Vec::new();
        gather(self, &mut out);
        if let Some(aggregation) = self.component::<HasAggregation<S>>() {
            for stage in &aggregation.children {
                gather(stage, &mut out);
            }
        }
        out
    }

    /// Depth-first pre-order walk over this node and every descendant
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node<S>)) {
        visit(self);
        for component in &self.components {
            for child in component.children() {
                child.walk(visit);
            }
        }
    }

    /// Every descendant carrying a `FromSchema` field reference
    pub fn all_field_references(&self) -> Vec<&Node<S>> {
        let mut out = Vec::new();
        self.walk(&mut |node| {
            if let Some(HasFieldReference {
                reference: FieldReference::FromSchema { .. },
            }) = node.component::<HasFieldReference<S>>()
            {
                out.push(node);
            }
        });
        out
    }

    /// Convert the source handle of this node and all its descendants
    pub fn map_source<T>(&self, f: &impl Fn(&S) -> T) -> Node<T> {
        Node {
            source: f(&self.source),
            components: self.components.iter().map(|c| c.map_source(f)).collect(),
        }
    }
}
