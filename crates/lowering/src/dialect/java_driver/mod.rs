// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Java Driver Dialect
//!
//! Parses queries written with the MongoDB Java driver:
//!
//! ```java
//! collection.find(Filters.and(Filters.eq("status", status), Filters.gt("age", 18)))
//!     .sort(Sorts.ascending("name"))
//!     .first();
//! ```
//!
//! ## Shape
//!
//! A query is a chain of calls: a `MongoCollection` command, optionally followed by
//! cursor calls (`sort`, `limit`, `projection`, `first`). The anchor is the outermost
//! call of the chain. Filters, updates and pipeline stages are built with the static
//! `Filters`, `Updates`, `Aggregates`, `Projections`, `Sorts` and `Accumulators`
//! factories, possibly through local variables and helper methods.

mod aggregates;
mod filters;

use tracing::debug;

use mql_analyzer_ir::{
    CommandType, HasAggregation, HasFieldReference, HasFilter, HasLimit, HasProjections,
    HasSorts, HasSourceDialect, HasUpdates, IsCommand, Node, SourceDialect,
};
use mql_analyzer_syntax::{Call, ExprId, ExprKind, Program};

use crate::context::LoweringContext;
use crate::dialect::DialectParser;
use crate::error::{LoweringError, LoweringResult};
use crate::namespace::{NamespaceExtractor, is_get_collection, is_get_database};
use crate::resolver::ConstantResolver;
use crate::types::{driver, jdk};

/// Parser for the MongoDB Java driver
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaDriverParser;

impl JavaDriverParser {
    pub fn new() -> Self {
        Self
    }

    /// The command a `MongoCollection` method runs
    fn collection_command(name: &str) -> Option<CommandType> {
        let command = match name {
            "aggregate" => CommandType::Aggregate,
            "countDocuments" => CommandType::CountDocuments,
            "estimatedDocumentCount" => CommandType::EstimatedDocumentCount,
            "distinct" => CommandType::Distinct,
            "find" => CommandType::FindMany,
            "deleteMany" => CommandType::DeleteMany,
            "deleteOne" => CommandType::DeleteOne,
            "insertMany" => CommandType::InsertMany,
            "insertOne" => CommandType::InsertOne,
            "replaceOne" => CommandType::ReplaceOne,
            "updateMany" => CommandType::UpdateMany,
            "updateOne" => CommandType::UpdateOne,
            "findOneAndDelete" => CommandType::FindOneAndDelete,
            "findOneAndReplace" => CommandType::FindOneAndReplace,
            "findOneAndUpdate" => CommandType::FindOneAndUpdate,
            _ => return None,
        };
        Some(command)
    }

    /// Walk from `expr` down the receivers of the chain to the collection command
    ///
    /// Returns the command call and the cursor calls above it, outermost first.
    fn command_chain(&self, program: &Program, expr: ExprId) -> Option<(ExprId, Vec<ExprId>)> {
        let resolver = ConstantResolver::new(program);
        let mut cursors = Vec::new();
        let mut current = program.strip_parens(expr);

        loop {
            let call = program.call(current)?;
            let declaring_type = call.declaring_type.as_deref();
            if declaring_type.is_some_and(driver::is_collection) {
                Self::collection_command(&call.name)?;
                return Some((current, cursors));
            }
            if declaring_type.is_some_and(driver::is_cursor) {
                if cursors.contains(&current) {
                    return None;
                }
                cursors.push(current);
                current = resolver.resolve_element_until(call.receiver?, &is_driver_call)?;
                continue;
            }
            // Helper returning a collection or a cursor
            current = resolver.resolve_element_until(current, &is_driver_call)?;
        }
    }

    fn command_of(program: &Program, command_call: ExprId, cursors: &[ExprId]) -> CommandType {
        let base = program
            .call(command_call)
            .and_then(|call| Self::collection_command(&call.name))
            .unwrap_or(CommandType::Unknown);
        let first = cursors
            .iter()
            .filter_map(|cursor| program.call(*cursor))
            .any(|cursor| cursor.name == "first");
        match base {
            CommandType::FindMany if first => CommandType::FindOne,
            other => other,
        }
    }

    /// Arguments of a command, without a leading `ClientSession`
    fn command_args<'p>(program: &'p Program, call: &'p Call) -> &'p [ExprId] {
        let has_session = call.args.first().is_some_and(|first| {
            program
                .static_type(*first)
                .is_some_and(|ty| ty.simple_name() == "ClientSession")
        });
        if has_session {
            &call.args[1..]
        } else {
            &call.args
        }
    }

    fn parse_query(
        &self,
        ctx: &mut LoweringContext,
        program: &Program,
        anchor: ExprId,
        command_call: ExprId,
        cursors: &[ExprId],
    ) -> Node<ExprId> {
        let command = Self::command_of(program, command_call, cursors);
        let mut lowerer = filters::Lowerer::new(ctx, program);

        let Some(call) = program.call(command_call) else {
            return Node::new(anchor, [IsCommand::new(CommandType::Unknown).into()]);
        };
        let collection = match call.receiver {
            Some(receiver) => NamespaceExtractor::from_context(program, lowerer.ctx()).extract(receiver),
            None => mql_analyzer_ir::HasCollectionReference::unknown(),
        };

        let args = Self::command_args(program, call);
        let mut filter = Vec::new();
        let mut updates = Vec::new();
        let mut stages = Vec::new();
        let mut distinct_field = None;
        match command {
            CommandType::Aggregate => {
                if let Some(pipeline) = args.first() {
                    stages = lowerer
                        .list_elements(*pipeline)
                        .into_iter()
                        .map(|stage| lowerer.stage(stage))
                        .collect();
                }
            }
            CommandType::Distinct => {
                distinct_field = args
                    .first()
                    .map(|field| lowerer.resolver().resolve_field_name(*field));
                if let Some(query) = args
                    .get(1)
                    .filter(|arg| !matches!(program.expr(**arg).kind, ExprKind::ClassLiteral(_)))
                {
                    filter = lowerer.filters(*query);
                }
            }
            CommandType::InsertOne
            | CommandType::InsertMany
            | CommandType::EstimatedDocumentCount => {}
            _ => {
                if let Some(query) = args.first() {
                    filter = lowerer.filters(*query);
                }
                if command.updates_documents()
                    && let Some(update) = args.get(1)
                {
                    updates = lowerer
                        .list_elements(*update)
                        .into_iter()
                        .map(|update| lowerer.update(update))
                        .collect();
                }
            }
        }

        let mut node = Node::new(
            anchor,
            [
                HasSourceDialect {
                    dialect: SourceDialect::JavaDriver,
                }
                .into(),
                IsCommand::new(command).into(),
                collection.into(),
            ],
        );

        if let Some(field) = distinct_field {
            node = node.with(HasFieldReference::new(field));
        }

        // Cursor modifiers, innermost first so the outermost call wins
        for cursor in cursors.iter().rev() {
            let Some(cursor_call) = program.call(*cursor) else {
                continue;
            };
            let Some(&arg) = cursor_call.args.first() else {
                continue;
            };
            match cursor_call.name.as_str() {
                "sort" => node = node.with(HasSorts::new(lowerer.sorts(arg))),
                "projection" => node = node.with(HasProjections::new(lowerer.projections(arg))),
                "filter" => filter.extend(lowerer.filters(arg)),
                "limit" => {
                    if let Some(limit) = lowerer.resolver().resolve(arg).and_then(|v| v.as_i32()) {
                        node = node.with(HasLimit { limit });
                    }
                }
                _ => {}
            }
        }

        node.with(HasFilter::new(filter))
            .with(HasUpdates::new(updates))
            .with(HasAggregation::new(stages))
    }
}

/// Calls declared by a collection or a cursor type
fn is_driver_call(program: &Program, id: ExprId) -> bool {
    program.call(id).is_some_and(|call| {
        call.declaring_type
            .as_deref()
            .is_some_and(|ty| driver::is_collection(ty) || driver::is_cursor(ty))
    })
}

/// `List.of(..)`, `Arrays.asList(..)`, `Collections.singletonList(..)`
pub(crate) fn is_list_factory(program: &Program, id: ExprId) -> bool {
    program.call(id).is_some_and(|call| {
        call.is(jdk::LIST, "of")
            || call.is(jdk::ARRAYS, "asList")
            || call.is(jdk::COLLECTIONS, "singletonList")
            || call.is(jdk::COLLECTIONS, "singleton")
    })
}

/// The call holding `expr` as an argument, looking through parentheses and list factories
fn enclosing_call(program: &Program, expr: ExprId) -> Option<(ExprId, usize)> {
    let mut child = expr;
    let mut parent = program.parent(child)?;
    loop {
        match &program.expr(parent).kind {
            ExprKind::Parenthesized(_) | ExprKind::ArrayInit(_) => {}
            ExprKind::Call(call) if !is_list_factory(program, parent) => {
                let index = call.args.iter().position(|arg| *arg == child)?;
                return Some((parent, index));
            }
            ExprKind::Call(_) => {}
            _ => return None,
        }
        child = parent;
        parent = program.parent(child)?;
    }
}

impl DialectParser for JavaDriverParser {
    fn dialect(&self) -> SourceDialect {
        SourceDialect::JavaDriver
    }

    fn is_candidate(&self, program: &Program, expr: ExprId) -> bool {
        let Some(call) = program.call(expr) else {
            return false;
        };
        match call.declaring_type.as_deref() {
            Some(ty) if driver::is_collection(ty) => Self::collection_command(&call.name).is_some(),
            Some(ty) if driver::is_cursor(ty) => self.command_chain(program, expr).is_some(),
            _ => false,
        }
    }

    fn anchor(&self, program: &Program, expr: ExprId) -> ExprId {
        let mut anchor = expr;
        let mut current = expr;
        while let Some(parent) = program.parent(current) {
            match &program.expr(parent).kind {
                ExprKind::Parenthesized(_) => {}
                ExprKind::Call(call) if call.receiver == Some(current) => {
                    if self.is_candidate(program, parent) {
                        anchor = parent;
                    }
                }
                _ => break,
            }
            current = parent;
        }
        anchor
    }

    fn parse(
        &self,
        ctx: &mut LoweringContext,
        program: &Program,
        anchor: ExprId,
    ) -> LoweringResult<Node<ExprId>> {
        if !self.is_candidate(program, anchor) {
            return Err(LoweringError::NotACandidate {
                dialect: SourceDialect::JavaDriver,
                expr: anchor.to_string(),
            });
        }
        let owner = self.anchor(program, anchor);
        if owner != anchor {
            return Err(LoweringError::NotTheAnchor {
                expr: anchor.to_string(),
                anchor: owner.to_string(),
            });
        }

        let Some((command_call, cursors)) = self.command_chain(program, anchor) else {
            return Err(LoweringError::NotACandidate {
                dialect: SourceDialect::JavaDriver,
                expr: anchor.to_string(),
            });
        };

        let query = self.parse_query(ctx, program, anchor, command_call, &cursors);
        debug!(
            %anchor,
            command = ?query.component::<IsCommand>().map(|c| c.command_type),
            errors = ctx.errors().len(),
            "Parsed java driver query"
        );
        Ok(query)
    }

    fn is_reference_to_database(&self, program: &Program, expr: ExprId) -> bool {
        enclosing_call(program, expr)
            .is_some_and(|(call, index)| index == 0 && is_get_database(program, call))
    }

    fn is_reference_to_collection(&self, program: &Program, expr: ExprId) -> bool {
        enclosing_call(program, expr)
            .is_some_and(|(call, index)| index == 0 && is_get_collection(program, call))
    }

    fn is_reference_to_field(&self, program: &Program, expr: ExprId) -> bool {
        let Some(value) = ConstantResolver::new(program).resolve_string(expr) else {
            return false;
        };
        let Some((call_id, index)) = enclosing_call(program, expr) else {
            return false;
        };
        let Some(call) = program.call(call_id) else {
            return false;
        };
        match call.declaring_type.as_deref() {
            Some(driver::FILTERS | driver::UPDATES) => index == 0,
            Some(driver::PROJECTIONS | driver::SORTS) => true,
            Some(driver::ACCUMULATORS) => index > 0 && value.starts_with('$'),
            Some(driver::AGGREGATES) => match call.name.as_str() {
                "unwind" => true,
                "group" => index == 0 && value.starts_with('$'),
                _ => false,
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mql_analyzer_ir::{CollectionReference, FieldReference, HasFieldReference, Name, Namespace};
    use mql_analyzer_syntax::{ProgramBuilder, TypeRef};

    struct Fixture {
        program: Program,
        find: ExprId,
        first: ExprId,
        field: ExprId,
        collection_name: ExprId,
    }

    /// `client.getDatabase("shop").getCollection("orders").find(Filters.eq("status", "open")).first()`
    fn find_first() -> Fixture {
        let mut b = ProgramBuilder::new();
        let file = b.file("Repo.java");
        let class = b.class(file, "com.example.Repo");
        let method = b.method(class, "find", None);
        let client = b.param(method, "client", TypeRef::named(driver::MONGO_CLIENT));
        let client_ref = b.local_ref(client);
        let db = b.string("shop");
        let database = b.call(client_ref, driver::MONGO_CLIENT, "getDatabase", vec![db]);
        let collection_name = b.string("orders");
        let collection = b.call(database, driver::MONGO_DATABASE, "getCollection", vec![collection_name]);
        let field = b.string("status");
        let value = b.string("open");
        let eq = b.static_call(driver::FILTERS, "eq", vec![field, value]);
        let find = b.call(collection, driver::MONGO_COLLECTION, "find", vec![eq]);
        let first = b.call(find, driver::FIND_ITERABLE, "first", vec![]);
        Fixture {
            program: b.build(),
            find,
            first,
            field,
            collection_name,
        }
    }

    #[test]
    fn test_anchor_is_outermost_call() {
        let fixture = find_first();
        let parser = JavaDriverParser::new();
        assert!(parser.is_candidate(&fixture.program, fixture.find));
        assert_eq!(parser.anchor(&fixture.program, fixture.find), fixture.first);
    }

    #[test]
    fn test_parse_find_one() {
        let fixture = find_first();
        let parser = JavaDriverParser::new();
        let mut ctx = LoweringContext::new(SourceDialect::JavaDriver);
        let query = parser.parse(&mut ctx, &fixture.program, fixture.first).unwrap();

        assert_eq!(
            query.component::<IsCommand>().map(|c| c.command_type),
            Some(CommandType::FindOne)
        );
        assert_eq!(
            query.namespace(),
            Some(&Namespace::new("shop", "orders"))
        );
        let filter = query.component::<HasFilter<ExprId>>().unwrap();
        assert_eq!(filter.children.len(), 1);
        assert_eq!(filter.children[0].name(), Some(Name::Eq));
        assert_eq!(
            filter.children[0].component::<HasFieldReference<ExprId>>().unwrap().reference,
            FieldReference::from_schema(fixture.field, "status")
        );
        assert!(!ctx.has_errors());
    }

    #[test]
    fn test_parse_rejects_inner_expression() {
        let fixture = find_first();
        let parser = JavaDriverParser::new();
        let mut ctx = LoweringContext::new(SourceDialect::JavaDriver);
        let error = parser.parse(&mut ctx, &fixture.program, fixture.find).unwrap_err();
        assert!(matches!(error, LoweringError::NotTheAnchor { .. }));
    }

    #[test]
    fn test_references() {
        let fixture = find_first();
        let parser = JavaDriverParser::new();
        assert!(parser.is_reference_to_field(&fixture.program, fixture.field));
        assert!(parser.is_reference_to_collection(&fixture.program, fixture.collection_name));
        assert!(!parser.is_reference_to_database(&fixture.program, fixture.collection_name));
    }

    #[test]
    fn test_session_argument_is_skipped() {
        let mut b = ProgramBuilder::new();
        let file = b.file("Repo.java");
        let class = b.class(file, "com.example.Repo");
        let method = b.method(class, "delete", None);
        let session = b.param(method, "session", TypeRef::named(driver::CLIENT_SESSION));
        let collection = b.param(method, "collection", TypeRef::named(driver::MONGO_COLLECTION));
        let session_ref = b.local_ref(session);
        let collection_ref = b.local_ref(collection);
        let field = b.string("_id");
        let value = b.int(1);
        let eq = b.static_call(driver::FILTERS, "eq", vec![field, value]);
        let delete = b.call(collection_ref, driver::MONGO_COLLECTION, "deleteOne", vec![session_ref, eq]);
        let program = b.build();

        let mut ctx = LoweringContext::new(SourceDialect::JavaDriver);
        let query = JavaDriverParser::new().parse(&mut ctx, &program, delete).unwrap();
        assert_eq!(
            query.component::<IsCommand>().map(|c| c.command_type),
            Some(CommandType::DeleteOne)
        );
        assert_eq!(query.collection_reference(), Some(&CollectionReference::Unknown));
        let filter = query.component::<HasFilter<ExprId>>().unwrap();
        assert_eq!(filter.children[0].name(), Some(Name::Eq));
    }
}
