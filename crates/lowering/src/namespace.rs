// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Namespace Extractor
//!
//! Infers the database and collection a driver query targets, even when the names are
//! not written next to the query call.
//!
//! ## Algorithm
//!
//! 1. **Local pass**: follow the collection expression through locals, fields and
//!    helper returns to a `getCollection(..)` call, and its receiver to a
//!    `getDatabase(..)` call. Constant arguments name the collection and the database.
//! 2. **Contextual pass**, only when the local pass found no collection: an explicit
//!    worklist of `(goal, expression)` pairs. References are traced through field
//!    initializers and assignments (constructor injection), through parameters to the
//!    matching argument of every call site in the query's class hierarchy, and through
//!    helper method returns. A visited set and a hop cap bound the search.
//! 3. The concepts compose into `Known`, `OnlyCollection` or `Unknown`.
//!
//! The first constant found for each concept wins. A collection named locally stays
//! `OnlyCollection` when its database is a runtime value, even if some caller passes a
//! constant for it.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use mql_analyzer_ir::{CollectionReference, HasCollectionReference, Namespace};
use mql_analyzer_syntax::{ClassId, ExprId, ExprKind, Program, Reference};

use crate::context::{DEFAULT_MAX_NAMESPACE_HOPS, LoweringContext};
use crate::resolver::ConstantResolver;
use crate::types::driver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Concept {
    Database,
    Collection,
}

/// What the worklist is looking for at an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Goal {
    /// An expression evaluating to a collection handle
    CollectionHandle,
    /// An expression evaluating to a database handle
    DatabaseHandle,
    /// An expression evaluating to the name of a database or collection
    Name(Concept),
}

#[derive(Debug, Default)]
struct Resolved {
    database: Option<(ExprId, String)>,
    collection: Option<(ExprId, String)>,
}

impl Resolved {
    fn is_complete(&self) -> bool {
        self.database.is_some() && self.collection.is_some()
    }

    fn offer(&mut self, concept: Concept, source: ExprId, name: String) {
        let slot = match concept {
            Concept::Database => &mut self.database,
            Concept::Collection => &mut self.collection,
        };
        if slot.is_none() {
            *slot = Some((source, name));
        }
    }

    fn into_reference(self) -> HasCollectionReference<ExprId> {
        match (self.collection, self.database) {
            (Some((collection_source, collection)), Some((database_source, database))) => {
                HasCollectionReference::new(CollectionReference::known(
                    Some(database_source),
                    collection_source,
                    Namespace::new(database, collection),
                ))
            }
            (Some((collection_source, collection)), None) => HasCollectionReference::new(
                CollectionReference::only_collection(collection_source, collection),
            ),
            _ => HasCollectionReference::unknown(),
        }
    }
}

/// Infers the namespace of the collection handle a query runs on
pub struct NamespaceExtractor<'p> {
    resolver: ConstantResolver<'p>,
    max_hops: usize,
}

impl<'p> NamespaceExtractor<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            resolver: ConstantResolver::new(program),
            max_hops: DEFAULT_MAX_NAMESPACE_HOPS,
        }
    }

    /// An extractor using the bounds of a lowering context
    pub fn from_context(program: &'p Program, ctx: &LoweringContext) -> Self {
        Self {
            resolver: ConstantResolver::new(program).with_max_depth(ctx.max_recursion_depth()),
            max_hops: ctx.max_namespace_hops(),
        }
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Namespace of `collection`, an expression evaluating to a collection handle
    pub fn extract(&self, collection: ExprId) -> HasCollectionReference<ExprId> {
        let mut resolved = Resolved::default();
        self.local_pass(collection, &mut resolved);

        if resolved.collection.is_none() {
            self.contextual_pass(collection, &mut resolved);
        }

        debug!(
            %collection,
            database = resolved.database.as_ref().map(|(_, name)| name.as_str()),
            collection_name = resolved.collection.as_ref().map(|(_, name)| name.as_str()),
            "Extracted namespace"
        );
        resolved.into_reference()
    }

    fn local_pass(&self, collection: ExprId, resolved: &mut Resolved) {
        let program = self.resolver.program();
        let Some(get_collection) = self
            .resolver
            .resolve_element_until(collection, &is_get_collection)
        else {
            return;
        };
        let Some(call) = program.call(get_collection) else {
            return;
        };

        if let Some(&name_arg) = call.args.first()
            && let Some(name) = self.resolver.resolve_string(name_arg)
        {
            resolved.offer(Concept::Collection, name_arg, name);
        }

        let database_name = call
            .receiver
            .and_then(|db| self.resolver.resolve_element_until(db, &is_get_database))
            .and_then(|db_call| program.call(db_call))
            .and_then(|db_call| db_call.args.first().copied())
            .and_then(|arg| self.resolver.resolve_string(arg).map(|name| (arg, name)));
        if let Some((arg, name)) = database_name {
            resolved.offer(Concept::Database, arg, name);
        }
    }

    fn contextual_pass(&self, collection: ExprId, resolved: &mut Resolved) {
        let program = self.resolver.program();
        let query_class = program.enclosing_class(collection);

        let mut queue = VecDeque::from([(Goal::CollectionHandle, collection)]);
        let mut visited = HashSet::new();
        let mut hops = 0;

        while let Some((goal, expr)) = queue.pop_front() {
            if resolved.is_complete() {
                break;
            }
            if !visited.insert((goal, expr)) {
                continue;
            }
            hops += 1;
            if hops > self.max_hops {
                debug!(%collection, hops, "Namespace search hop limit reached");
                break;
            }

            let id = program.strip_parens(expr);
            match goal {
                Goal::Name(concept) => {
                    if let Some(name) = self.resolver.resolve_string(id) {
                        resolved.offer(concept, id, name);
                        continue;
                    }
                }
                Goal::CollectionHandle if is_get_collection(program, id) => {
                    if let Some(call) = program.call(id) {
                        if let Some(&name_arg) = call.args.first() {
                            queue.push_back((Goal::Name(Concept::Collection), name_arg));
                        }
                        if let Some(receiver) = call.receiver {
                            queue.push_back((Goal::DatabaseHandle, receiver));
                        }
                    }
                    continue;
                }
                Goal::DatabaseHandle if is_get_database(program, id) => {
                    if let Some(&name_arg) = program.call(id).and_then(|call| call.args.first()) {
                        queue.push_back((Goal::Name(Concept::Database), name_arg));
                    }
                    continue;
                }
                Goal::CollectionHandle | Goal::DatabaseHandle => {}
            }

            for definition in self.definitions_of(id, query_class) {
                queue.push_back((goal, definition));
            }
        }
    }

    /// Expressions that may define the value of `id`
    fn definitions_of(&self, id: ExprId, query_class: Option<ClassId>) -> Vec<ExprId> {
        let program = self.resolver.program();
        match &program.expr(id).kind {
            ExprKind::Reference(Reference::Local(var)) => {
                let variable = program.var(*var);
                match program.parameter_index(*var) {
                    Some(index) => program
                        .call_sites_of(variable.method)
                        .into_iter()
                        .filter(|site| in_hierarchy(program, *site, query_class))
                        .filter_map(|site| program.arguments(site).get(index).copied())
                        .collect(),
                    None => variable
                        .initializer
                        .into_iter()
                        .chain(program.local_assignments(*var))
                        .collect(),
                }
            }
            ExprKind::Reference(Reference::Field(field)) => program
                .field(*field)
                .initializer
                .into_iter()
                .chain(
                    program
                        .field_assignments(*field)
                        .into_iter()
                        .map(|(_, value)| value),
                )
                .collect(),
            ExprKind::Call(call) => call
                .target
                .filter(|method| !program.method(*method).is_constructor)
                .map(|method| program.returns_of(method))
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

fn in_hierarchy(program: &Program, site: ExprId, query_class: Option<ClassId>) -> bool {
    match (query_class, program.enclosing_class(site)) {
        (Some(query_class), Some(site_class)) => program.in_same_hierarchy(query_class, site_class),
        (None, _) => true,
        (Some(_), None) => false,
    }
}

/// `database.getCollection(name)`
pub fn is_get_collection(program: &Program, id: ExprId) -> bool {
    program.call(id).is_some_and(|call| {
        call.name == "getCollection"
            && call.declaring_type.as_deref().is_some_and(driver::is_database)
    })
}

/// `client.getDatabase(name)`
pub fn is_get_database(program: &Program, id: ExprId) -> bool {
    program.call(id).is_some_and(|call| {
        call.name == "getDatabase" && call.declaring_type.as_deref().is_some_and(driver::is_client)
    })
}
