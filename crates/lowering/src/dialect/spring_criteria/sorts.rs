// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `Sort` objects, as passed to `Query.with(..)` and `Aggregation.sort(..)`
//!
//! Keys come out in source order. A trailing `.ascending()` or `.descending()` forces the
//! direction of every key before it, and `.reverse()` flips it.

use mql_analyzer_ir::{
    ConstantValue, FieldReference, HasFieldReference, HasValueReference, Name, Named, Node,
    SourceDialect, ValueReference,
};
use mql_analyzer_syntax::{ExprId, Program};

use super::SpringCriteriaParser;
use crate::context::LoweringContext;
use crate::dialect::{inferred_int, unknown_operator};
use crate::error::LoweringError;
use crate::resolver::ConstantResolver;
use crate::types::spring;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn flipped(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }
}

/// Direction modifiers applied by the calls wrapping a key
#[derive(Debug, Clone, Copy, Default)]
struct SortState {
    forced: Option<Direction>,
    reversed: bool,
}

impl SortState {
    /// Fold in a modifier found further inside the chain
    fn inner(self, name: &str) -> Self {
        if self.forced.is_some() {
            return self;
        }
        match name {
            "ascending" => Self { forced: Some(Direction::Ascending), ..self },
            "descending" => Self { forced: Some(Direction::Descending), ..self },
            "reverse" => Self { reversed: !self.reversed, ..self },
            _ => self,
        }
    }

    fn apply(self, direction: Option<Direction>) -> Option<Direction> {
        let direction = self.forced.or(direction)?;
        Some(if self.reversed { direction.flipped() } else { direction })
    }
}

fn is_sort_call(program: &Program, id: ExprId) -> bool {
    program
        .call(id)
        .is_some_and(|call| call.is_declared_by(spring::SORT))
}

fn is_order_call(program: &Program, id: ExprId) -> bool {
    program
        .call(id)
        .is_some_and(|call| call.is_declared_by(spring::ORDER))
}

/// Calls of a receiver chain accepted by `accept`, innermost first
fn receiver_chain(
    program: &Program,
    outer: ExprId,
    accept: fn(&Program, ExprId) -> bool,
) -> Vec<ExprId> {
    let mut calls = Vec::new();
    let mut current = Some(program.strip_parens(outer));
    while let Some(id) = current {
        if !accept(program, id) {
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

impl SpringCriteriaParser {
    /// Keys of a `Sort` object
    pub(super) fn sort_keys(
        &self,
        ctx: &mut LoweringContext,
        resolver: &ConstantResolver<'_>,
        expr: ExprId,
    ) -> Vec<Node<ExprId>> {
        self.sort_keys_with(ctx, resolver, expr, SortState::default())
    }

    fn sort_keys_with(
        &self,
        ctx: &mut LoweringContext,
        resolver: &ConstantResolver<'_>,
        expr: ExprId,
        inherited: SortState,
    ) -> Vec<Node<ExprId>> {
        if let Err(error) = ctx.enter_recursive_context("sort") {
            ctx.add_error(error);
            return vec![unknown_operator(expr)];
        }
        let keys = self.sort_keys_inner(ctx, resolver, expr, inherited);
        ctx.exit_recursive_context();
        keys
    }

    fn sort_keys_inner(
        &self,
        ctx: &mut LoweringContext,
        resolver: &ConstantResolver<'_>,
        expr: ExprId,
        inherited: SortState,
    ) -> Vec<Node<ExprId>> {
        let program = resolver.program();
        let Some(outer) = resolver.resolve_element_until(expr, &is_sort_call) else {
            ctx.add_error(LoweringError::UnsupportedSyntax {
                dialect: SourceDialect::SpringCriteria,
                feature: "sort not built with Sort".to_string(),
            });
            return vec![unknown_operator(expr)];
        };

        let chain = receiver_chain(program, outer, is_sort_call);
        let mut keys = Vec::new();
        for (position, &id) in chain.iter().enumerate() {
            let Some(call) = program.call(id) else {
                continue;
            };
            let state = chain[position + 1..]
                .iter()
                .rev()
                .filter_map(|outer| program.call(*outer))
                .fold(inherited, |state, outer| state.inner(&outer.name));

            match (call.name.as_str(), call.args.as_slice()) {
                ("by", args) => keys.extend(Self::sort_by(resolver, id, args, state)),
                ("and", [other]) => keys.extend(self.sort_keys_with(ctx, resolver, *other, state)),
                ("unsorted", _) | ("ascending" | "descending" | "reverse", []) => {}
                _ => keys.push(unknown_operator(id)),
            }
        }
        keys
    }

    /// `Sort.by(String...)`, `Sort.by(Direction, String...)` or `Sort.by(Order...)`
    fn sort_by(
        resolver: &ConstantResolver<'_>,
        source: ExprId,
        args: &[ExprId],
        state: SortState,
    ) -> Vec<Node<ExprId>> {
        if let [first, fields @ ..] = args
            && let Some(direction) = Self::direction(resolver, *first)
        {
            return Self::directed_keys(resolver, source, Some(direction), fields, state);
        }

        Self::operands(resolver, args)
            .into_iter()
            .map(
                |operand| match resolver.resolve_element_until(operand, &is_order_call) {
                    Some(order) => Self::order(resolver, order, state),
                    None => Self::sort_key(
                        resolver,
                        source,
                        operand,
                        state.apply(Some(Direction::Ascending)),
                    ),
                },
            )
            .collect()
    }

    /// `Order.asc(..)`, `Order.desc(..)` or `Order.by(..)`, optionally followed by `.with(Direction)`
    fn order(resolver: &ConstantResolver<'_>, outer: ExprId, state: SortState) -> Node<ExprId> {
        let program = resolver.program();
        let mut field = None;
        let mut direction = None;
        for id in receiver_chain(program, outer, is_order_call) {
            let Some(call) = program.call(id) else {
                continue;
            };
            match (call.name.as_str(), call.args.as_slice()) {
                ("asc" | "by", [name]) => {
                    field = Some(*name);
                    direction = Some(Direction::Ascending);
                }
                ("desc", [name]) => {
                    field = Some(*name);
                    direction = Some(Direction::Descending);
                }
                ("with", [value]) => direction = Self::direction(resolver, *value),
                _ => {}
            }
        }
        match field {
            Some(field) => Self::sort_key(resolver, outer, field, state.apply(direction)),
            None => unknown_operator(outer),
        }
    }

    /// One key per field, all sorted the same way
    fn directed_keys(
        resolver: &ConstantResolver<'_>,
        source: ExprId,
        direction: Option<Direction>,
        fields: &[ExprId],
        state: SortState,
    ) -> Vec<Node<ExprId>> {
        Self::field_names(resolver, fields)
            .into_iter()
            .map(|field| Self::sort_key(resolver, source, field, state.apply(direction)))
            .collect()
    }

    fn sort_key(
        resolver: &ConstantResolver<'_>,
        source: ExprId,
        field: ExprId,
        direction: Option<Direction>,
    ) -> Node<ExprId> {
        let (name, value) = match direction {
            Some(Direction::Ascending) => (Name::Ascending, inferred_int(field, 1)),
            Some(Direction::Descending) => (Name::Descending, inferred_int(field, -1)),
            None => (Name::Unknown, ValueReference::Unknown),
        };
        let reference = match resolver.resolve_string(field) {
            Some(name) => FieldReference::from_schema(field, name),
            None => FieldReference::Unknown,
        };
        Node::new(
            source,
            [
                Named::new(name).into(),
                HasFieldReference::new(reference).into(),
                HasValueReference::new(value).into(),
            ],
        )
    }

    /// A `Sort.Direction` constant
    fn direction(resolver: &ConstantResolver<'_>, expr: ExprId) -> Option<Direction> {
        match resolver.resolve(expr)? {
            ConstantValue::Enum { class, constant } if class == spring::DIRECTION => {
                match constant.as_str() {
                    "ASC" => Some(Direction::Ascending),
                    "DESC" => Some(Direction::Descending),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Sort operation of a pipeline: `sort(..)` followed by any number of `.and(..)`
    pub(super) fn sort_operation(
        &self,
        ctx: &mut LoweringContext,
        resolver: &ConstantResolver<'_>,
        chain: &[ExprId],
    ) -> Vec<Node<ExprId>> {
        let program = resolver.program();
        let mut keys = Vec::new();
        for &id in chain {
            let Some(call) = program.call(id) else {
                continue;
            };
            match call.args.as_slice() {
                [sort] => keys.extend(self.sort_keys(ctx, resolver, *sort)),
                [direction, fields @ ..] => keys.extend(Self::directed_keys(
                    resolver,
                    id,
                    Self::direction(resolver, *direction),
                    fields,
                    SortState::default(),
                )),
                [] => keys.push(unknown_operator(id)),
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mql_analyzer_syntax::{ProgramBuilder, TypeRef};

    fn directions(keys: &[Node<ExprId>]) -> Vec<(Option<String>, Option<Name>)> {
        keys.iter()
            .map(|key| {
                let field = key
                    .component::<HasFieldReference<ExprId>>()
                    .and_then(|f| f.reference.field_name().map(str::to_string));
                (field, key.name())
            })
            .collect()
    }

    #[test]
    fn test_trailing_modifiers_apply_to_earlier_keys() {
        let mut b = ProgramBuilder::new();
        let file = b.file("A.java");
        let direction = b.enumeration(file, spring::DIRECTION, &["ASC", "DESC"]);
        let class = b.class(file, "com.example.A");
        b.method(class, "m", None);
        let desc = b.program().class(direction).fields[1];
        let desc_ref = b.field_ref(desc);
        let a = b.string("a");
        let by_a = b.static_call(spring::SORT, "by", vec![desc_ref, a]);
        let bb = b.string("b");
        let by_b = b.static_call(spring::SORT, "by", vec![bb]);
        let and = b.call(by_a, spring::SORT, "and", vec![by_b]);
        let reverse = b.call(and, spring::SORT, "reverse", vec![]);
        let c = b.string("c");
        let asc_c = b.static_call(spring::ORDER, "asc", vec![c]);
        let by_order = b.static_call(spring::SORT, "by", vec![asc_c]);
        let and_order = b.call(reverse, spring::SORT, "and", vec![by_order]);
        let program = b.build();

        let resolver = ConstantResolver::new(&program);
        let mut ctx = LoweringContext::new(SourceDialect::SpringCriteria);
        let keys = SpringCriteriaParser::new().sort_keys(&mut ctx, &resolver, and_order);
        assert_eq!(
            directions(&keys),
            vec![
                (Some("a".to_string()), Some(Name::Ascending)),
                (Some("b".to_string()), Some(Name::Descending)),
                (Some("c".to_string()), Some(Name::Ascending)),
            ]
        );
        assert!(ctx.errors().is_empty());
    }

    #[test]
    fn test_unresolved_direction_is_unknown() {
        let mut b = ProgramBuilder::new();
        let file = b.file("A.java");
        let class = b.class(file, "com.example.A");
        let method = b.method(class, "m", None);
        let direction = b.param(method, "direction", TypeRef::named(spring::DIRECTION));
        let direction_ref = b.local_ref(direction);
        let a = b.string("a");
        let sort = b.static_call(spring::AGGREGATION, "sort", vec![direction_ref, a]);
        let program = b.build();

        let resolver = ConstantResolver::new(&program);
        let mut ctx = LoweringContext::new(SourceDialect::SpringCriteria);
        let keys = SpringCriteriaParser::new().sort_operation(&mut ctx, &resolver, &[sort]);
        assert_eq!(directions(&keys), vec![(Some("a".to_string()), Some(Name::Unknown))]);
        assert_eq!(
            keys[0].component::<HasValueReference<ExprId>>().map(|v| &v.reference),
            Some(&ValueReference::Unknown)
        );
    }
}
