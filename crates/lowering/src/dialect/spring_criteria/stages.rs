// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `Aggregation.newAggregation(..)` pipelines
//!
//! Stages are fluent chains rooted at a static `Aggregation` factory, e.g.
//! `group("category").sum("amount").as("total")`. Each lowers to the same node shapes the
//! driver dialect produces for `Aggregates.*`.

use mql_analyzer_ir::{
    BsonType, ConstantValue, FieldReference, HasAccumulatedFields, HasAddedFields,
    HasFieldReference, HasFilter, HasLimit, HasProjections, HasSorts, HasValueReference, Name,
    Named, Node, SourceDialect, ValueReference,
};
use mql_analyzer_syntax::{ExprId, ExprKind, Program};

use super::{SpringCriteriaParser, is_criteria_call};
use crate::context::LoweringContext;
use crate::dialect::{inferred_int, unknown_operator};
use crate::error::LoweringError;
use crate::resolver::ConstantResolver;
use crate::types::{jdk, spring};

pub(super) fn is_new_aggregation(program: &Program, id: ExprId) -> bool {
    program
        .call(id)
        .is_some_and(|call| call.is(spring::AGGREGATION, "newAggregation"))
}

fn is_stage_call(program: &Program, id: ExprId) -> bool {
    program.call(id).is_some_and(|call| {
        call.declaring_type
            .as_deref()
            .is_some_and(|declaring| spring::STAGE_TYPES.contains(&declaring))
    })
}

fn is_fields_call(program: &Program, id: ExprId) -> bool {
    program
        .call(id)
        .is_some_and(|call| call.is_declared_by(spring::FIELDS))
}

/// Whether `parent` only wraps its operands: parentheses, arrays and list factories
fn is_operand_wrapper(program: &Program, parent: ExprId) -> bool {
    matches!(
        program.expr(parent).kind,
        ExprKind::Parenthesized(_) | ExprKind::ArrayInit(_)
    ) || program
        .call(parent)
        .is_some_and(|call| call.is(jdk::LIST, "of") || call.is(jdk::ARRAYS, "asList"))
}

/// The `newAggregation` call whose `match` stage takes `criteria` directly
pub(super) fn enclosing_pipeline(program: &Program, criteria: ExprId) -> Option<ExprId> {
    let mut current = criteria;
    let mut parent = program.parent(current)?;
    while matches!(program.expr(parent).kind, ExprKind::Parenthesized(_)) {
        current = parent;
        parent = program.parent(current)?;
    }
    if !program
        .call(parent)
        .is_some_and(|call| call.is(spring::AGGREGATION, "match"))
    {
        return None;
    }

    current = parent;
    while let Some(parent) = program.parent(current) {
        if is_new_aggregation(program, parent) {
            return Some(parent);
        }
        if !is_operand_wrapper(program, parent) {
            return None;
        }
        current = parent;
    }
    None
}

/// `Criteria` chain passed directly to the first `match` stage of a pipeline
pub(super) fn first_match_criteria(program: &Program, pipeline: ExprId) -> Option<ExprId> {
    let call = program.call(pipeline)?;
    let mut pending: Vec<ExprId> = call.args.iter().rev().copied().collect();
    while let Some(arg) = pending.pop() {
        let id = program.strip_parens(arg);
        match &program.expr(id).kind {
            ExprKind::ArrayInit(elements) => pending.extend(elements.iter().rev()),
            ExprKind::Call(wrapper)
                if wrapper.is(jdk::LIST, "of") || wrapper.is(jdk::ARRAYS, "asList") =>
            {
                pending.extend(wrapper.args.iter().rev())
            }
            ExprKind::Call(stage) if stage.is(spring::AGGREGATION, "match") => {
                if let [criteria] = stage.args.as_slice()
                    && is_criteria_call(program, program.strip_parens(*criteria))
                {
                    return Some(program.strip_parens(*criteria));
                }
            }
            _ => {}
        }
    }
    None
}

impl SpringCriteriaParser {
    /// Stages of a pipeline and its typed input class literal, if any
    pub(super) fn pipeline(
        &self,
        ctx: &mut LoweringContext,
        resolver: &ConstantResolver<'_>,
        new_aggregation: ExprId,
    ) -> (Vec<Node<ExprId>>, Option<ExprId>) {
        let program = resolver.program();
        let Some(call) = program.call(new_aggregation) else {
            return (Vec::new(), None);
        };
        let (typed_input, stages) = match call.args.split_first() {
            Some((first, rest))
                if matches!(
                    program.expr(program.strip_parens(*first)).kind,
                    ExprKind::ClassLiteral(_)
                ) =>
            {
                (Some(program.strip_parens(*first)), rest)
            }
            _ => (None, call.args.as_slice()),
        };

        let stages = Self::operands(resolver, stages)
            .into_iter()
            .map(|stage| self.stage(ctx, resolver, stage))
            .collect();
        (stages, typed_input)
    }

    fn stage(
        &self,
        ctx: &mut LoweringContext,
        resolver: &ConstantResolver<'_>,
        expr: ExprId,
    ) -> Node<ExprId> {
        if let Err(error) = ctx.enter_recursive_context("stage") {
            ctx.add_error(error);
            return unknown_operator(expr);
        }
        let node = self.stage_inner(ctx, resolver, expr);
        ctx.exit_recursive_context();
        node
    }

    fn stage_inner(
        &self,
        ctx: &mut LoweringContext,
        resolver: &ConstantResolver<'_>,
        expr: ExprId,
    ) -> Node<ExprId> {
        let program = resolver.program();
        let Some(outer) = resolver.resolve_element_until(expr, &is_stage_call) else {
            ctx.add_error(LoweringError::UnsupportedSyntax {
                dialect: SourceDialect::SpringCriteria,
                feature: "stage not built with Aggregation".to_string(),
            });
            return unknown_operator(expr);
        };
        let chain = Self::stage_chain(program, outer);
        let Some((root, call)) = chain
            .first()
            .and_then(|root| program.call(*root).map(|call| (*root, call)))
        else {
            return unknown_operator(outer);
        };

        match (call.name.as_str(), call.args.as_slice()) {
            ("match", [criteria]) => {
                let children = self.criteria(ctx, resolver, *criteria);
                Node::new(root, [Named::new(Name::Match).into(), HasFilter::new(children).into()])
            }
            ("project", _) => Node::new(
                root,
                [
                    Named::new(Name::Project).into(),
                    HasProjections::new(Self::projections(resolver, &chain)).into(),
                ],
            ),
            ("sort", _) => {
                let keys = self.sort_operation(ctx, resolver, &chain);
                Node::new(root, [Named::new(Name::Sort).into(), HasSorts::new(keys).into()])
            }
            ("group", keys) => Self::group(resolver, root, keys, &chain[1..]),
            ("addFields" | "addField", _) => Node::new(
                root,
                [
                    Named::new(Name::AddFields).into(),
                    HasAddedFields::new(Self::added_fields(resolver, &chain)).into(),
                ],
            ),
            ("unwind", [path, ..]) => {
                let field = match resolver.resolve_string(*path) {
                    Some(path_name) => {
                        FieldReference::from_schema(*path, path_name.trim_start_matches('$'))
                            .with_display_name(path_name.clone())
                    }
                    None => FieldReference::Unknown,
                };
                Node::new(
                    root,
                    [Named::new(Name::Unwind).into(), HasFieldReference::new(field).into()],
                )
            }
            ("limit", [limit]) => {
                let node = Node::new(root, [Named::new(Name::Limit).into()]);
                match resolver.resolve(*limit).and_then(|v| v.as_i32()) {
                    Some(limit) => node.with(HasLimit { limit }),
                    None => node,
                }
            }
            _ => unknown_operator(root),
        }
    }

    /// Calls of a stage from its `Aggregation` factory to `outer`, in source order
    fn stage_chain(program: &Program, outer: ExprId) -> Vec<ExprId> {
        let mut calls = Vec::new();
        let mut current = Some(program.strip_parens(outer));
        while let Some(id) = current {
            if !is_stage_call(program, id) {
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

    /// Field names given as strings or as `Fields`; aliased fields are skipped
    pub(super) fn field_names(resolver: &ConstantResolver<'_>, args: &[ExprId]) -> Vec<ExprId> {
        let program = resolver.program();
        Self::operands(resolver, args)
            .into_iter()
            .flat_map(|arg| {
                let fields = resolver
                    .resolve_element_until(arg, &is_fields_call)
                    .and_then(|id| program.call(id));
                match fields {
                    Some(call) => match (call.name.as_str(), call.args.as_slice()) {
                        ("field", [name]) => vec![*name],
                        ("fields" | "from", names) => Self::field_names(resolver, names),
                        _ => Vec::new(),
                    },
                    None => vec![arg],
                }
            })
            .collect()
    }

    /// `project(..)`, `andInclude(..)` and `andExclude(..)`
    fn projections(resolver: &ConstantResolver<'_>, chain: &[ExprId]) -> Vec<Node<ExprId>> {
        let program = resolver.program();
        let mut projections = Vec::new();
        for &id in chain {
            let Some(call) = program.call(id) else {
                continue;
            };
            let (name, flag) = match call.name.as_str() {
                "project" | "andInclude" => (Name::Include, 1),
                "andExclude" => (Name::Exclude, 0),
                _ => {
                    projections.push(unknown_operator(id));
                    continue;
                }
            };
            projections.extend(Self::field_names(resolver, &call.args).into_iter().map(|field| {
                Node::new(
                    id,
                    [
                        Named::new(name).into(),
                        HasFieldReference::new(resolver.resolve_field_name(field)).into(),
                        HasValueReference::new(inferred_int(field, flag)).into(),
                    ],
                )
            }));
        }
        projections
    }

    /// `group(keys..)` followed by `accumulator(field).as(output)` pairs
    fn group(
        resolver: &ConstantResolver<'_>,
        root: ExprId,
        keys: &[ExprId],
        accumulators: &[ExprId],
    ) -> Node<ExprId> {
        let program = resolver.program();
        let keys = Self::field_names(resolver, keys);
        let id_value = match keys.as_slice() {
            [] => ValueReference::constant(root, ConstantValue::Null),
            [key] => resolver.resolve_field_expression(*key),
            keys => {
                let fields = keys
                    .iter()
                    .filter_map(|key| resolver.resolve_string(*key))
                    .map(|name| {
                        Node::new(
                            (),
                            [HasFieldReference::new(FieldReference::from_schema((), name)).into()],
                        )
                    })
                    .collect();
                let expression = Node::new((), [HasProjections::new(fields).into()]);
                ValueReference::Computed {
                    source: root,
                    bson_type: BsonType::computed(BsonType::Any, expression),
                }
            }
        };

        let mut accumulated = Vec::new();
        let mut pending: Option<(ExprId, Name, Option<ExprId>)> = None;
        for &id in accumulators {
            let Some(call) = program.call(id) else {
                continue;
            };
            match (call.name.as_str(), call.args.as_slice()) {
                (
                    "sum" | "avg" | "first" | "last" | "max" | "min" | "push" | "addToSet",
                    args,
                ) if call.is_declared_by(spring::GROUP_OPERATION) => {
                    pending = Some((id, Name::from_canonical(&call.name), args.first().copied()));
                }
                ("as", [output]) if call.is_declared_by(spring::GROUP_OPERATION_BUILDER) => {
                    let Some((source, name, expression)) = pending.take() else {
                        continue;
                    };
                    let field = match resolver.resolve_string(*output) {
                        Some(output_name) => FieldReference::computed(*output, output_name),
                        None => FieldReference::Unknown,
                    };
                    let value = expression
                        .map(|expression| resolver.resolve_field_expression(expression))
                        .unwrap_or(ValueReference::Unknown);
                    accumulated.push(Node::new(
                        source,
                        [
                            Named::new(name).into(),
                            HasFieldReference::new(field).into(),
                            HasValueReference::new(value).into(),
                        ],
                    ));
                }
                _ => {
                    pending = None;
                    accumulated.push(unknown_operator(id));
                }
            }
        }

        Node::new(
            root,
            [
                Named::new(Name::Group).into(),
                HasFieldReference::new(FieldReference::inferred(root, "_id")).into(),
                HasValueReference::new(id_value).into(),
                HasAccumulatedFields::new(accumulated).into(),
            ],
        )
    }

    /// Fields added by an `AddFieldsOperation` builder; `build()` closes it
    fn added_fields(resolver: &ConstantResolver<'_>, chain: &[ExprId]) -> Vec<Node<ExprId>> {
        let program = resolver.program();
        let mut added = Vec::new();
        let mut pending: Option<ExprId> = None;
        for &id in chain {
            let Some(call) = program.call(id) else {
                continue;
            };
            let (field, value) = match (call.name.as_str(), call.args.as_slice()) {
                ("addFieldWithValue", [field, value]) => (*field, Self::added_constant(resolver, *value)),
                ("addFieldWithValueOf", [field, value]) => {
                    (*field, Self::added_expression(resolver, *value))
                }
                ("addField", [field]) => {
                    pending = Some(*field);
                    continue;
                }
                ("withValue", [value]) => match pending.take() {
                    Some(field) => (field, Self::added_constant(resolver, *value)),
                    None => continue,
                },
                ("withValueOf", [value]) => match pending.take() {
                    Some(field) => (field, Self::added_expression(resolver, *value)),
                    None => continue,
                },
                _ => continue,
            };
            let reference = match resolver.resolve_string(field) {
                Some(name) => FieldReference::computed(field, name),
                None => FieldReference::Unknown,
            };
            added.push(Node::new(
                id,
                [
                    HasFieldReference::new(reference).into(),
                    HasValueReference::new(value).into(),
                ],
            ));
        }
        added
    }

    fn added_constant(resolver: &ConstantResolver<'_>, value: ExprId) -> ValueReference<ExprId> {
        match resolver.resolve_value(value) {
            constant @ ValueReference::Constant { .. } => constant,
            _ => ValueReference::Unknown,
        }
    }

    /// A field path, as a string or `Fields.field(..)`
    fn added_expression(resolver: &ConstantResolver<'_>, value: ExprId) -> ValueReference<ExprId> {
        match Self::field_names(resolver, &[value]).as_slice() {
            [path] => resolver.resolve_field_expression(*path),
            _ => ValueReference::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mql_analyzer_syntax::ProgramBuilder;

    fn program_with(build: impl FnOnce(&mut ProgramBuilder) -> ExprId) -> (Program, ExprId) {
        let mut b = ProgramBuilder::new();
        let file = b.file("A.java");
        let class = b.class(file, "com.example.A");
        b.method(class, "m", None);
        let expr = build(&mut b);
        (b.build(), expr)
    }

    fn lower(program: &Program, stage: ExprId) -> Node<ExprId> {
        let resolver = ConstantResolver::new(program);
        let mut ctx = LoweringContext::new(SourceDialect::SpringCriteria);
        SpringCriteriaParser::new().stage(&mut ctx, &resolver, stage)
    }

    #[test]
    fn test_group_keys_and_accumulators() {
        let (program, stage) = program_with(|b| {
            let category = b.string("category");
            let group = b.static_call(spring::AGGREGATION, "group", vec![category]);
            let amount = b.string("amount");
            let sum = b.call(group, spring::GROUP_OPERATION, "sum", vec![amount]);
            let total = b.string("total");
            let sum_as = b.call(sum, spring::GROUP_OPERATION_BUILDER, "as", vec![total]);
            let count = b.call(sum_as, spring::GROUP_OPERATION, "count", vec![]);
            let n = b.string("n");
            b.call(count, spring::GROUP_OPERATION_BUILDER, "as", vec![n])
        });
        let node = lower(&program, stage);

        assert_eq!(node.name(), Some(Name::Group));
        assert!(matches!(
            node.component::<HasValueReference<ExprId>>().unwrap().reference,
            ValueReference::Computed { .. }
        ));
        let accumulated = &node.component::<HasAccumulatedFields<ExprId>>().unwrap().children;
        let names: Vec<_> = accumulated.iter().filter_map(|a| a.name()).collect();
        assert_eq!(names, vec![Name::Sum, Name::Unknown]);
        assert_eq!(
            accumulated[0]
                .component::<HasFieldReference<ExprId>>()
                .unwrap()
                .reference
                .field_name(),
            Some("total")
        );
    }

    #[test]
    fn test_group_without_keys_has_null_id() {
        let (program, stage) =
            program_with(|b| b.static_call(spring::AGGREGATION, "group", vec![]));
        let node = lower(&program, stage);
        assert_eq!(
            node.component::<HasValueReference<ExprId>>()
                .unwrap()
                .reference
                .constant_value(),
            Some(&ConstantValue::Null)
        );
    }

    #[test]
    fn test_projection_through_fields() {
        let (program, stage) = program_with(|b| {
            let a = b.string("a");
            let bb = b.string("b");
            let fields = b.static_call(spring::FIELDS, "fields", vec![a, bb]);
            let project = b.static_call(spring::AGGREGATION, "project", vec![fields]);
            let alias = b.string("alias");
            let c = b.string("c");
            let aliased = b.static_call(spring::FIELDS, "field", vec![alias, c]);
            let include = b.call(
                project,
                spring::PROJECTION_OPERATION,
                "andInclude",
                vec![aliased],
            );
            let id = b.string("_id");
            b.call(include, spring::PROJECTION_OPERATION, "andExclude", vec![id])
        });
        let node = lower(&program, stage);

        let projections = &node.component::<HasProjections<ExprId>>().unwrap().children;
        let names: Vec<_> = projections.iter().filter_map(|p| p.name()).collect();
        assert_eq!(names, vec![Name::Include, Name::Include, Name::Exclude]);
    }

    #[test]
    fn test_added_fields_from_builder() {
        let (program, stage) = program_with(|b| {
            let builder = b.static_call(spring::AGGREGATION, "addFields", vec![]);
            let flag = b.string("flag");
            let yes = b.boolean(true);
            let with_value = b.call(
                builder,
                spring::ADD_FIELDS_OPERATION_BUILDER,
                "addFieldWithValue",
                vec![flag, yes],
            );
            let copy = b.string("copy");
            let appender = b.call(
                with_value,
                spring::ADD_FIELDS_OPERATION_BUILDER,
                "addField",
                vec![copy],
            );
            let source = b.string("$name");
            let value_of = b.call(appender, spring::VALUE_APPENDER, "withValueOf", vec![source]);
            b.call(value_of, spring::ADD_FIELDS_OPERATION_BUILDER, "build", vec![])
        });
        let node = lower(&program, stage);

        assert_eq!(node.name(), Some(Name::AddFields));
        let added = &node.component::<HasAddedFields<ExprId>>().unwrap().children;
        assert_eq!(added.len(), 2);
        assert_eq!(
            added[0].component::<HasValueReference<ExprId>>().unwrap().reference.constant_value(),
            Some(&ConstantValue::Boolean(true))
        );
        assert!(matches!(
            added[1].component::<HasValueReference<ExprId>>().unwrap().reference,
            ValueReference::Computed { .. }
        ));
    }

    #[test]
    fn test_unsupported_stage_records_error() {
        let (program, stage) = program_with(|b| b.string("not a stage"));
        let resolver = ConstantResolver::new(&program);
        let mut ctx = LoweringContext::new(SourceDialect::SpringCriteria);
        let node = SpringCriteriaParser::new().stage(&mut ctx, &resolver, stage);
        assert_eq!(node.name(), Some(Name::Unknown));
        assert!(ctx.has_errors());
    }
}
