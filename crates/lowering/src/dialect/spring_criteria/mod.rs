// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Spring Criteria Dialect
//!
//! Parses `Criteria` chains and aggregation pipelines run through a `MongoTemplate`:
//!
//! ```java
//! template.find(query(where("status").is(status).and("age").gt(18)).with(Sort.by("age")), User.class);
//! template.query(User.class).matching(where("name").is(name)).all();
//! template.updateFirst(query(where("_id").is(id)), new Update().inc("visits", 1), User.class);
//! template.aggregate(newAggregation(match(where("active").is(true)), group("city").count().as("n")), "users", Out.class);
//! ```
//!
//! ## Shape
//!
//! - The anchor is the outermost `Criteria` call; nested chains passed to
//!   `orOperator`/`andOperator`/`norOperator` belong to it.
//! - A pipeline is anchored at the criteria of its first direct `match` stage, or at
//!   `newAggregation` itself when it has none. Its stages carry the filters.
//! - The command comes from the template operation the criteria is passed to, directly
//!   or through a local variable.
//! - The collection comes from an explicit name, the typed input of the pipeline, or the
//!   entity class: its `@Document(collection = ..)` annotation, else its decapitalized
//!   simple name. The database is never known.

mod sorts;
mod stages;
mod updates;

use tracing::debug;

use mql_analyzer_ir::{
    BsonType, CollectionReference, CommandType, ConstantValue, HasAggregation,
    HasCollectionReference, HasFieldReference, HasFilter, HasLimit, HasSorts, HasSourceDialect,
    HasUpdates, HasValueReference, IsCommand, Name, Named, Node, SourceDialect, ValueReference,
};
use mql_analyzer_syntax::{Call, ExprId, ExprKind, Program, Reference, TypeRef};

use crate::context::LoweringContext;
use crate::dialect::{DialectParser, unknown_operator};
use crate::error::{LoweringError, LoweringResult};
use crate::resolver::ConstantResolver;
use crate::types::{jdk, spring};
use stages::{enclosing_pipeline, first_match_criteria, is_new_aggregation};

/// Parser for Spring Data MongoDB criteria queries
#[derive(Debug, Clone, Copy, Default)]
pub struct SpringCriteriaParser;

fn is_criteria_call(program: &Program, id: ExprId) -> bool {
    program
        .call(id)
        .is_some_and(|call| call.is_declared_by(spring::CRITERIA))
}

fn is_template_call(program: &Program, id: ExprId) -> bool {
    program.call(id).is_some_and(|call| {
        call.declaring_type
            .as_deref()
            .is_some_and(spring::is_template_operation)
    })
}

impl SpringCriteriaParser {
    pub fn new() -> Self {
        Self
    }

    /// The command a template operation runs
    fn operation_command(name: &str) -> CommandType {
        match name {
            "aggregate" | "aggregateStream" => CommandType::Aggregate,
            "count" | "exactCount" => CommandType::CountDocuments,
            "estimatedCount" => CommandType::EstimatedDocumentCount,
            "find" | "findAll" | "stream" | "scroll" | "all" => CommandType::FindMany,
            "exists" | "findById" | "findOne" | "one" | "oneValue" | "first" | "firstValue" => {
                CommandType::FindOne
            }
            "findDistinct" | "distinct" => CommandType::Distinct,
            "findAllAndRemove" | "remove" => CommandType::DeleteMany,
            "findAndModify" => CommandType::FindOneAndUpdate,
            "findAndRemove" => CommandType::FindOneAndDelete,
            "findAndReplace" => CommandType::FindOneAndReplace,
            "insert" => CommandType::InsertOne,
            "insertAll" => CommandType::InsertMany,
            "replace" => CommandType::ReplaceOne,
            "save" | "upsert" => CommandType::Upsert,
            "updateFirst" => CommandType::UpdateOne,
            "updateMulti" => CommandType::UpdateMany,
            _ => CommandType::Unknown,
        }
    }

    /// The command of a fluent chain; `apply(update)` turns its terminal into an update
    fn chain_command(program: &Program, chain: &[ExprId], outermost: ExprId) -> CommandType {
        let Some(terminal) = program.call(outermost) else {
            return CommandType::Unknown;
        };
        let applies_update = chain
            .iter()
            .filter_map(|id| program.call(*id))
            .any(|call| call.name == "apply");
        if !applies_update {
            return Self::operation_command(&terminal.name);
        }
        match terminal.name.as_str() {
            "all" => CommandType::UpdateMany,
            "first" => CommandType::UpdateOne,
            "upsert" => CommandType::Upsert,
            "findAndModify" => CommandType::FindOneAndUpdate,
            _ => CommandType::Unknown,
        }
    }

    /// Calls of a chain from its head (`where`) to `outer`, in source order
    fn chain(program: &Program, outer: ExprId) -> Vec<ExprId> {
        let mut calls = Vec::new();
        let mut current = Some(program.strip_parens(outer));
        while let Some(id) = current {
            if !is_criteria_call(program, id) {
                break;
            }
            calls.push(id);
            current = program
                .call(id)
                .and_then(|call| call.receiver)
                .map(|receiver| program.strip_parens(receiver));
        }
        calls.reverse();
        calls
    }

    fn criteria(
        &self,
        ctx: &mut LoweringContext,
        resolver: &ConstantResolver<'_>,
        expr: ExprId,
    ) -> Vec<Node<ExprId>> {
        if let Err(error) = ctx.enter_recursive_context("criteria") {
            ctx.add_error(error);
            return vec![unknown_operator(expr)];
        }
        let nodes = self.criteria_inner(ctx, resolver, expr);
        ctx.exit_recursive_context();
        nodes
    }

    fn criteria_inner(
        &self,
        ctx: &mut LoweringContext,
        resolver: &ConstantResolver<'_>,
        expr: ExprId,
    ) -> Vec<Node<ExprId>> {
        let program = resolver.program();
        let Some(outer) = resolver.resolve_element_until(expr, &is_criteria_call) else {
            ctx.add_error(LoweringError::UnsupportedSyntax {
                dialect: SourceDialect::SpringCriteria,
                feature: "filter not built with Criteria".to_string(),
            });
            return vec![unknown_operator(expr)];
        };

        let mut nodes = Vec::new();
        let mut field: Option<ExprId> = None;
        let mut negate = false;
        for id in Self::chain(program, outer) {
            let Some(call) = program.call(id) else {
                continue;
            };
            match (call.name.as_str(), call.args.as_slice()) {
                ("where" | "and", [name]) => field = Some(*name),
                ("not", []) => negate = true,
                ("orOperator" | "andOperator" | "norOperator", args) => {
                    let name = match call.name.as_str() {
                        "orOperator" => Name::Or,
                        "andOperator" => Name::And,
                        _ => Name::Nor,
                    };
                    let children = Self::operands(resolver, args)
                        .into_iter()
                        .map(|operand| {
                            let mut parsed = self.criteria(ctx, resolver, operand);
                            if parsed.len() == 1 {
                                parsed.remove(0)
                            } else {
                                Node::new(
                                    operand,
                                    [Named::new(Name::And).into(), HasFilter::new(parsed).into()],
                                )
                            }
                        })
                        .collect();
                    nodes.push(Node::new(
                        id,
                        [Named::new(name).into(), HasFilter::new(children).into()],
                    ));
                }
                (operator, args) => {
                    let name = match operator {
                        "is" => Name::Eq,
                        other => Name::from_canonical(other),
                    };
                    let Some(field_expr) = field else {
                        nodes.push(unknown_operator(id));
                        continue;
                    };
                    let mut predicate = Node::new(
                        id,
                        [
                            Named::new(name).into(),
                            HasFieldReference::new(resolver.resolve_field_name(field_expr)).into(),
                        ],
                    );
                    if let Some(value) = Self::operator_value(resolver, name, id, args) {
                        predicate = predicate.with(HasValueReference::new(value));
                    }
                    if negate {
                        negate = false;
                        predicate = Node::new(
                            id,
                            [
                                Named::new(Name::Not).into(),
                                HasFieldReference::new(resolver.resolve_field_name(field_expr))
                                    .into(),
                                HasFilter::new(vec![predicate]).into(),
                            ],
                        );
                    }
                    nodes.push(predicate);
                }
            }
        }
        nodes
    }

    /// Arguments of a combinator: varargs, an array or a list factory
    fn operands(resolver: &ConstantResolver<'_>, args: &[ExprId]) -> Vec<ExprId> {
        let program = resolver.program();
        let [single] = args else {
            return args.to_vec();
        };
        let found = resolver.resolve_element_until(*single, &|program, id| {
            matches!(program.expr(id).kind, ExprKind::ArrayInit(_))
                || program.call(id).is_some_and(|call| {
                    call.is(jdk::LIST, "of") || call.is(jdk::ARRAYS, "asList")
                })
        });
        match found.map(|id| &program.expr(id).kind) {
            Some(ExprKind::ArrayInit(elements)) => elements.clone(),
            Some(ExprKind::Call(call)) => call.args.clone(),
            _ => vec![*single],
        }
    }

    fn operator_value(
        resolver: &ConstantResolver<'_>,
        name: Name,
        source: ExprId,
        args: &[ExprId],
    ) -> Option<ValueReference<ExprId>> {
        match (name, args) {
            (_, []) => None,
            (Name::In | Name::Nin | Name::All, values) => {
                let resolved: Option<Vec<ConstantValue>> =
                    values.iter().map(|value| resolver.resolve(*value)).collect();
                Some(match resolved {
                    Some(items) if values.len() > 1 => {
                        let element = BsonType::any_of(items.iter().map(|v| resolver.constant_type(v)));
                        ValueReference::Constant {
                            source,
                            value: ConstantValue::Array(items),
                            bson_type: BsonType::array(element),
                        }
                    }
                    _ => match resolver.resolve_value(values[0]) {
                        ValueReference::Runtime {
                            source,
                            bson_type: array @ BsonType::Array(_),
                        } => ValueReference::runtime(source, array),
                        ValueReference::Runtime { source, bson_type } => {
                            ValueReference::runtime(source, BsonType::array(bson_type))
                        }
                        other => other,
                    },
                })
            }
            (_, [value, ..]) => Some(resolver.resolve_value(*value)),
        }
    }

    /// Template operations fed by the criteria at `anchor`, outermost last
    fn operations(program: &Program, anchor: ExprId) -> Vec<ExprId> {
        let direct = Self::operations_above(program, anchor);
        if !direct.is_empty() {
            return direct;
        }

        // `Query q = query(where(..)); template.find(q, User.class);`
        let root = program.root(anchor);
        let holders: Vec<_> = program
            .exprs()
            .filter_map(|(id, expr)| match &expr.kind {
                ExprKind::Reference(Reference::Local(var)) => {
                    let variable = program.var(*var);
                    let holds_root = variable.initializer == Some(root)
                        || program.local_assignments(*var).contains(&root);
                    holds_root.then_some(id)
                }
                _ => None,
            })
            .collect();
        holders
            .into_iter()
            .map(|usage| Self::operations_above(program, usage))
            .find(|operations| !operations.is_empty())
            .unwrap_or_default()
    }

    fn operations_above(program: &Program, expr: ExprId) -> Vec<ExprId> {
        let mut operations = Vec::new();
        let mut current = expr;
        while let Some(parent) = program.parent(current) {
            if is_template_call(program, parent) {
                operations.push(parent);
            }
            current = parent;
        }
        operations
    }

    /// Every template call of the fluent chain ending at `outermost`
    fn operation_chain(program: &Program, outermost: ExprId) -> Vec<ExprId> {
        let mut calls = Vec::new();
        let mut current = Some(outermost);
        while let Some(id) = current {
            if !is_template_call(program, id) {
                break;
            }
            calls.push(id);
            current = program.call(id).and_then(|call| call.receiver);
        }
        calls
    }

    fn collection(
        resolver: &ConstantResolver<'_>,
        operations: &[ExprId],
        typed_input: Option<ExprId>,
    ) -> HasCollectionReference<ExprId> {
        let program = resolver.program();
        let calls: Vec<(ExprId, &Call)> = operations
            .iter()
            .filter_map(|id| program.call(*id).map(|call| (*id, call)))
            .collect();

        // Explicit collection name
        for (_, call) in &calls {
            let candidate = match (call.name.as_str(), call.args.as_slice()) {
                ("inCollection", [name]) => Some(*name),
                ("aggregate" | "aggregateStream", [_, name, ..]) => Some(*name),
                (_, [_, .., last]) => Some(*last),
                _ => None,
            };
            if let Some(source) = candidate
                && let Some(name) = resolver.resolve_string(source)
            {
                return HasCollectionReference::new(CollectionReference::only_collection(source, name));
            }
        }

        // Typed pipeline input, then the entity class
        if let Some(id) = typed_input
            && let ExprKind::ClassLiteral(ty) = &program.expr(id).kind
        {
            let (source, name) = Self::entity_collection(resolver, id, ty);
            return HasCollectionReference::new(CollectionReference::only_collection(source, name));
        }
        for (_, call) in &calls {
            for arg in &call.args {
                let id = program.strip_parens(*arg);
                if let ExprKind::ClassLiteral(ty) = &program.expr(id).kind {
                    let (source, name) = Self::entity_collection(resolver, id, ty);
                    return HasCollectionReference::new(CollectionReference::only_collection(source, name));
                }
            }
        }

        HasCollectionReference::unknown()
    }

    /// Collection of an entity: `@Document(collection = ..)`, else its decapitalized name
    fn entity_collection(
        resolver: &ConstantResolver<'_>,
        literal: ExprId,
        ty: &TypeRef,
    ) -> (ExprId, String) {
        let program = resolver.program();
        let annotated = program
            .class_by_name(&ty.name)
            .and_then(|class| program.class(class).annotation(spring::DOCUMENT))
            .and_then(|document| document.arg("collection").or_else(|| document.arg("value")))
            .and_then(|arg| resolver.resolve_string(arg).map(|name| (arg, name)));
        annotated.unwrap_or_else(|| (literal, decapitalize(ty.simple_name())))
    }
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl DialectParser for SpringCriteriaParser {
    fn dialect(&self) -> SourceDialect {
        SourceDialect::SpringCriteria
    }

    fn is_candidate(&self, program: &Program, expr: ExprId) -> bool {
        is_criteria_call(program, expr) || is_new_aggregation(program, expr)
    }

    fn anchor(&self, program: &Program, expr: ExprId) -> ExprId {
        if is_new_aggregation(program, expr) {
            return first_match_criteria(program, expr)
                .map(|criteria| self.anchor(program, criteria))
                .unwrap_or(expr);
        }

        let mut anchor = expr;
        let mut current = expr;
        while let Some(parent) = program.parent(current) {
            if is_criteria_call(program, parent) {
                anchor = parent;
            } else if !matches!(program.expr(parent).kind, ExprKind::Parenthesized(_))
                && !program.call(parent).is_some_and(|call| {
                    call.is(jdk::LIST, "of") || call.is(jdk::ARRAYS, "asList")
                })
                && !matches!(program.expr(parent).kind, ExprKind::ArrayInit(_))
            {
                break;
            }
            current = parent;
        }

        // Every `match` stage of a pipeline belongs to the first one
        match enclosing_pipeline(program, anchor)
            .and_then(|pipeline| first_match_criteria(program, pipeline))
        {
            Some(first) if first != anchor => self.anchor(program, first),
            _ => anchor,
        }
    }

    fn parse(
        &self,
        ctx: &mut LoweringContext,
        program: &Program,
        anchor: ExprId,
    ) -> LoweringResult<Node<ExprId>> {
        if !self.is_candidate(program, anchor) {
            return Err(LoweringError::NotACandidate {
                dialect: SourceDialect::SpringCriteria,
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

        let resolver = ConstantResolver::new(program).with_max_depth(ctx.max_recursion_depth());
        let pipeline = if is_new_aggregation(program, anchor) {
            Some(anchor)
        } else {
            enclosing_pipeline(program, anchor)
        };
        let (filters, stages, typed_input) = match pipeline {
            Some(pipeline) => {
                let (stages, typed_input) = self.pipeline(ctx, &resolver, pipeline);
                (Vec::new(), stages, typed_input)
            }
            None => (self.criteria(ctx, &resolver, anchor), Vec::new(), None),
        };

        let operations = Self::operations(program, pipeline.unwrap_or(anchor));
        let (command, collection, chain) = match operations.last() {
            Some(&outermost) => {
                let chain = Self::operation_chain(program, outermost);
                let command = Self::chain_command(program, &chain, outermost);
                let collection = Self::collection(&resolver, &chain, typed_input);
                (command, collection, chain)
            }
            None => (CommandType::Unknown, HasCollectionReference::unknown(), Vec::new()),
        };

        let updates = match chain
            .iter()
            .find_map(|operation| Self::update_argument(program, *operation))
        {
            Some(update) if command.updates_documents() => Self::updates(&resolver, update),
            _ => Vec::new(),
        };

        let mut query = Node::new(
            anchor,
            [
                HasSourceDialect {
                    dialect: SourceDialect::SpringCriteria,
                }
                .into(),
                IsCommand::new(command).into(),
                collection.into(),
                HasFilter::new(filters).into(),
                HasUpdates::new(updates).into(),
                HasAggregation::new(stages).into(),
            ],
        );

        // `query(..).limit(n)` and `query(..).with(sort)`
        let mut current = anchor;
        while let Some(parent) = program.parent(current) {
            if let Some(call) = program.call(parent)
                && call.is_declared_by(spring::QUERY)
                && let [arg] = call.args.as_slice()
            {
                match call.name.as_str() {
                    "limit" => {
                        if let Some(limit) = resolver.resolve(*arg).and_then(|value| value.as_i32()) {
                            query = query.with(HasLimit { limit });
                        }
                    }
                    "with" => {
                        let keys = self.sort_keys(ctx, &resolver, *arg);
                        query = query.with(HasSorts::new(keys));
                    }
                    _ => {}
                }
            }
            current = parent;
        }

        debug!(%anchor, ?command, "Parsed spring criteria query");
        Ok(query)
    }

    fn is_reference_to_database(&self, _program: &Program, _expr: ExprId) -> bool {
        false
    }

    fn is_reference_to_collection(&self, program: &Program, expr: ExprId) -> bool {
        let in_document = program
            .enclosing_class(expr)
            .is_some_and(|class| program.is_annotation_argument(class, spring::DOCUMENT, expr));
        in_document
            || program.parent(expr).is_some_and(|parent| {
                program
                    .call(parent)
                    .is_some_and(|call| call.name == "inCollection" && is_template_call(program, parent))
            })
    }

    fn is_reference_to_field(&self, program: &Program, expr: ExprId) -> bool {
        let Some(parent) = program.parent(expr) else {
            return false;
        };
        program.call(parent).is_some_and(|call| {
            call.is_declared_by(spring::CRITERIA)
                && matches!(call.name.as_str(), "where" | "and")
                && call.args.first() == Some(&expr)
        }) && ConstantResolver::new(program).resolve_string(expr).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mql_analyzer_ir::FieldReference;
    use mql_analyzer_syntax::{ClassId, ProgramBuilder};

    const TEMPLATE: &str = "org.springframework.data.mongodb.core.MongoTemplate";

    fn template_class(b: &mut ProgramBuilder) -> (ClassId, TypeRef) {
        let file = b.file("Repo.java");
        let repo = b.class(file, "com.example.Repo");
        (repo, TypeRef::named(TEMPLATE))
    }

    #[test]
    fn test_find_with_annotated_entity() {
        let mut b = ProgramBuilder::new();
        let file = b.file("Book.java");
        let book = b.class(file, "com.example.Book");
        b.enter_class(book);
        let collection_name = b.string("library_books");
        b.annotate(book, spring::DOCUMENT, vec![("collection".to_string(), collection_name)]);

        let (repo, template_type) = template_class(&mut b);
        let method = b.method(repo, "find", None);
        let template = b.param(method, "template", template_type);
        let template_ref = b.local_ref(template);
        let field = b.string("title");
        let where_call = b.static_call(spring::CRITERIA, "where", vec![field]);
        let value = b.string("Dune");
        let is_call = b.call(where_call, spring::CRITERIA, "is", vec![value]);
        let age = b.string("pages");
        let and_call = b.call(is_call, spring::CRITERIA, "and", vec![age]);
        let min = b.int(100);
        let gt_call = b.call(and_call, spring::CRITERIA, "gt", vec![min]);
        let query = b.static_call(spring::QUERY, "query", vec![gt_call]);
        let class_literal = b.class_literal(TypeRef::named("com.example.Book"));
        b.call(template_ref, TEMPLATE, "find", vec![query, class_literal]);
        let program = b.build();

        let parser = SpringCriteriaParser::new();
        assert_eq!(parser.anchor(&program, where_call), gt_call);

        let mut ctx = LoweringContext::new(SourceDialect::SpringCriteria);
        let node = parser.parse(&mut ctx, &program, gt_call).unwrap();
        assert_eq!(
            node.component::<IsCommand>().map(|c| c.command_type),
            Some(CommandType::FindMany)
        );
        assert_eq!(
            node.collection_reference(),
            Some(&CollectionReference::only_collection(collection_name, "library_books"))
        );
        let filters = &node.component::<HasFilter<ExprId>>().unwrap().children;
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].name(), Some(Name::Eq));
        assert_eq!(filters[1].name(), Some(Name::Gt));
        assert_eq!(
            filters[1].component::<HasFieldReference<ExprId>>().unwrap().reference,
            FieldReference::from_schema(age, "pages")
        );
        assert!(parser.is_reference_to_field(&program, field));
        assert!(parser.is_reference_to_collection(&program, collection_name));
    }

    #[test]
    fn test_query_held_in_local_and_default_collection_name() {
        let mut b = ProgramBuilder::new();
        let (repo, template_type) = template_class(&mut b);
        let method = b.method(repo, "count", None);
        let template = b.param(method, "template", template_type);
        let field = b.string("active");
        let where_call = b.static_call(spring::CRITERIA, "where", vec![field]);
        let value = b.boolean(true);
        let is_call = b.call(where_call, spring::CRITERIA, "is", vec![value]);
        let query = b.static_call(spring::QUERY, "query", vec![is_call]);
        let local = b.local("q", TypeRef::named(spring::QUERY), Some(query)).unwrap();
        let template_ref = b.local_ref(template);
        let query_ref = b.local_ref(local);
        let class_literal = b.class_literal(TypeRef::named("com.example.UserAccount"));
        b.call(template_ref, TEMPLATE, "count", vec![query_ref, class_literal]);
        let program = b.build();

        let mut ctx = LoweringContext::new(SourceDialect::SpringCriteria);
        let node = SpringCriteriaParser::new().parse(&mut ctx, &program, is_call).unwrap();
        assert_eq!(
            node.component::<IsCommand>().map(|c| c.command_type),
            Some(CommandType::CountDocuments)
        );
        assert_eq!(
            node.collection_reference().and_then(|r| r.collection()),
            Some("userAccount")
        );
    }

    #[test]
    fn test_or_operator_nests_chains() {
        let mut b = ProgramBuilder::new();
        let (repo, _) = template_class(&mut b);
        b.method(repo, "m", None);
        let a = b.string("a");
        let where_a = b.static_call(spring::CRITERIA, "where", vec![a]);
        let one = b.int(1);
        let is_a = b.call(where_a, spring::CRITERIA, "is", vec![one]);
        let bf = b.string("b");
        let where_b = b.static_call(spring::CRITERIA, "where", vec![bf]);
        let two = b.int(2);
        let lt_b = b.call(where_b, spring::CRITERIA, "lt", vec![two]);
        let root = b.new_object(TypeRef::named(spring::CRITERIA), vec![]);
        let or = b.call(root, spring::CRITERIA, "orOperator", vec![is_a, lt_b]);
        let program = b.build();

        let parser = SpringCriteriaParser::new();
        assert_eq!(parser.anchor(&program, is_a), or);

        let mut ctx = LoweringContext::new(SourceDialect::SpringCriteria);
        let node = parser.parse(&mut ctx, &program, or).unwrap();
        let filters = &node.component::<HasFilter<ExprId>>().unwrap().children;
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].name(), Some(Name::Or));
        let children = &filters[0].component::<HasFilter<ExprId>>().unwrap().children;
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].name(), Some(Name::Lt));
        assert_eq!(
            node.component::<IsCommand>().map(|c| c.command_type),
            Some(CommandType::Unknown)
        );
    }
}
