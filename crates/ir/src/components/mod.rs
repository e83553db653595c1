// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Components
//!
//! Typed facets attached to a [`Node`]. A node carries at most one component of each
//! kind, so components behave like a map keyed by their own type.
//!
//! ## Kinds
//!
//! - **References**: [`HasCollectionReference`], [`HasFieldReference`], [`HasValueReference`]
//! - **Children**: [`HasFilter`], [`HasProjections`], [`HasSorts`], [`HasAggregation`],
//!   [`HasAccumulatedFields`], [`HasAddedFields`], [`HasUpdates`]
//! - **Metadata**: [`Named`], [`IsCommand`], [`HasLimit`], [`HasSourceDialect`],
//!   [`HasTargetCluster`], [`HasExplain`]

pub mod collection;
pub mod command;
pub mod field;
pub mod name;
pub mod value;

use serde::{Deserialize, Serialize};

use crate::dialect::SourceDialect;
use crate::node::Node;

pub use collection::{CollectionReference, HasCollectionReference};
pub use command::{CommandType, IsCommand};
pub use field::{FieldReference, HasFieldReference};
pub use name::{Name, Named, QueryRole};
pub use value::{HasValueReference, ValueReference};

macro_rules! children_component {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name<S> {
            pub children: Vec<Node<S>>,
        }

        impl<S> $name<S> {
            pub fn new(children: Vec<Node<S>>) -> Self {
                Self { children }
            }
        }
    };
}

children_component!(
    /// Filter predicates (leaf predicates and boolean combinators)
    HasFilter
);
children_component!(
    /// Projected fields (`include`, `exclude`)
    HasProjections
);
children_component!(
    /// Sort keys (`ascending`, `descending`)
    HasSorts
);
children_component!(
    /// Aggregation pipeline stages
    HasAggregation
);
children_component!(
    /// Accumulators of a `$group` stage
    HasAccumulatedFields
);
children_component!(
    /// Fields introduced by `$addFields`
    HasAddedFields
);
children_component!(
    /// Update operations (`set`, `unset`, `push`...)
    HasUpdates
);

/// Maximum number of documents returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HasLimit {
    pub limit: i32,
}

/// Dialect the query was parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HasSourceDialect {
    pub dialect: SourceDialect,
}

/// Server version of the cluster the query will run on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HasTargetCluster {
    pub version: String,
}

impl HasTargetCluster {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    /// `(major, minor)` parsed from the version string, when well formed
    pub fn major_minor(&self) -> Option<(u32, u32)> {
        let mut parts = self.version.split('.');
        let major = parts.next()?.trim().parse().ok()?;
        let minor = parts.next().map_or(Some(0), |p| p.trim().parse().ok())?;
        Some((major, minor))
    }
}

/// Verbosity of an explain plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExplainPlanType {
    #[default]
    None,
    /// `queryPlanner`: does not run the query
    Safe,
    /// `executionStats`: runs the query
    Full,
}

impl ExplainPlanType {
    /// Server verbosity name, `None` has no server counterpart
    pub fn server_name(&self) -> Option<&'static str> {
        match self {
            ExplainPlanType::None => None,
            ExplainPlanType::Safe => Some("queryPlanner"),
            ExplainPlanType::Full => Some("executionStats"),
        }
    }
}

/// Requests that the query be rendered as an explain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HasExplain {
    pub explain_type: ExplainPlanType,
}

/// Discriminant of a [`Component`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    CollectionReference,
    FieldReference,
    ValueReference,
    Filter,
    Projections,
    Sorts,
    Aggregation,
    AccumulatedFields,
    AddedFields,
    Updates,
    Limit,
    Named,
    Command,
    SourceDialect,
    TargetCluster,
    Explain,
}

/// A typed facet of a [`Node`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component<S> {
    CollectionReference(HasCollectionReference<S>),
    FieldReference(HasFieldReference<S>),
    ValueReference(HasValueReference<S>),
    Filter(HasFilter<S>),
    Projections(HasProjections<S>),
    Sorts(HasSorts<S>),
    Aggregation(HasAggregation<S>),
    AccumulatedFields(HasAccumulatedFields<S>),
    AddedFields(HasAddedFields<S>),
    Updates(HasUpdates<S>),
    Limit(HasLimit),
    Named(Named),
    Command(IsCommand),
    SourceDialect(HasSourceDialect),
    TargetCluster(HasTargetCluster),
    Explain(HasExplain),
}

impl<S> Component<S> {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::CollectionReference(_) => ComponentKind::CollectionReference,
            Component::FieldReference(_) => ComponentKind::FieldReference,
            Component::ValueReference(_) => ComponentKind::ValueReference,
            Component::Filter(_) => ComponentKind::Filter,
            Component::Projections(_) => ComponentKind::Projections,
            Component::Sorts(_) => ComponentKind::Sorts,
            Component::Aggregation(_) => ComponentKind::Aggregation,
            Component::AccumulatedFields(_) => ComponentKind::AccumulatedFields,
            Component::AddedFields(_) => ComponentKind::AddedFields,
            Component::Updates(_) => ComponentKind::Updates,
            Component::Limit(_) => ComponentKind::Limit,
            Component::Named(_) => ComponentKind::Named,
            Component::Command(_) => ComponentKind::Command,
            Component::SourceDialect(_) => ComponentKind::SourceDialect,
            Component::TargetCluster(_) => ComponentKind::TargetCluster,
            Component::Explain(_) => ComponentKind::Explain,
        }
    }

    /// Child nodes held by this component, empty for non-container kinds
    pub fn children(&self) -> &[Node<S>] {
        match self {
            Component::Filter(c) => &c.children,
            Component::Projections(c) => &c.children,
            Component::Sorts(c) => &c.children,
            Component::Aggregation(c) => &c.children,
            Component::AccumulatedFields(c) => &c.children,
            Component::AddedFields(c) => &c.children,
            Component::Updates(c) => &c.children,
            _ => &[],
        }
    }

    pub fn map_source<T>(&self, f: &impl Fn(&S) -> T) -> Component<T> {
        let map_children = |children: &[Node<S>]| -> Vec<Node<T>> {
            children.iter().map(|child| child.map_source(f)).collect()
        };

        match self {
            Component::CollectionReference(c) => {
                Component::CollectionReference(HasCollectionReference::new(c.reference.map_source(f)))
            }
            Component::FieldReference(c) => {
                Component::FieldReference(HasFieldReference::new(c.reference.map_source(f)))
            }
            Component::ValueReference(c) => {
                Component::ValueReference(HasValueReference::new(c.reference.map_source(f)))
            }
            Component::Filter(c) => Component::Filter(HasFilter::new(map_children(&c.children))),
            Component::Projections(c) => {
                Component::Projections(HasProjections::new(map_children(&c.children)))
            }
            Component::Sorts(c) => Component::Sorts(HasSorts::new(map_children(&c.children))),
            Component::Aggregation(c) => {
                Component::Aggregation(HasAggregation::new(map_children(&c.children)))
            }
            Component::AccumulatedFields(c) => {
                Component::AccumulatedFields(HasAccumulatedFields::new(map_children(&c.children)))
            }
            Component::AddedFields(c) => {
                Component::AddedFields(HasAddedFields::new(map_children(&c.children)))
            }
            Component::Updates(c) => Component::Updates(HasUpdates::new(map_children(&c.children))),
            Component::Limit(c) => Component::Limit(*c),
            Component::Named(c) => Component::Named(*c),
            Component::Command(c) => Component::Command(*c),
            Component::SourceDialect(c) => Component::SourceDialect(*c),
            Component::TargetCluster(c) => Component::TargetCluster(c.clone()),
            Component::Explain(c) => Component::Explain(*c),
        }
    }
}

/// Typed access to a component stored in a [`Node`]
pub trait ComponentOf<S>: Sized {
    const KIND: ComponentKind;

    fn extract(component: &Component<S>) -> Option<&Self>;
}

macro_rules! component_of {
    (generic $ty:ident => $variant:ident) => {
        impl<S> ComponentOf<S> for $ty<S> {
            const KIND: ComponentKind = ComponentKind::$variant;

            fn extract(component: &Component<S>) -> Option<&Self> {
                match component {
                    Component::$variant(c) => Some(c),
                    _ => None,
                }
            }
        }

        impl<S> From<$ty<S>> for Component<S> {
            fn from(c: $ty<S>) -> Self {
                Component::$variant(c)
            }
        }
    };
    (plain $ty:ident => $variant:ident) => {
        impl<S> ComponentOf<S> for $ty {
            const KIND: ComponentKind = ComponentKind::$variant;

            fn extract(component: &Component<S>) -> Option<&Self> {
                match component {
                    Component::$variant(c) => Some(c),
                    _ => None,
                }
            }
        }

        impl<S> From<$ty> for Component<S> {
            fn from(c: $ty) -> Self {
                Component::$variant(c)
            }
        }
    };
}

component_of!(generic HasCollectionReference => CollectionReference);
component_of!(generic HasFieldReference => FieldReference);
component_of!(generic HasValueReference => ValueReference);
component_of!(generic HasFilter => Filter);
component_of!(generic HasProjections => Projections);
component_of!(generic HasSorts => Sorts);
component_of!(generic HasAggregation => Aggregation);
component_of!(generic HasAccumulatedFields => AccumulatedFields);
component_of!(generic HasAddedFields => AddedFields);
component_of!(generic HasUpdates => Updates);
component_of!(plain HasLimit => Limit);
component_of!(plain Named => Named);
component_of!(plain IsCommand => Command);
component_of!(plain HasSourceDialect => SourceDialect);
component_of!(plain HasTargetCluster => TargetCluster);
component_of!(plain HasExplain => Explain);
