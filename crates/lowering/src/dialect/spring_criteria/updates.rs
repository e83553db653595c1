// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `Update` objects passed to `updateFirst`, `updateMulti`, `upsert`, `findAndModify` or the
//! fluent `apply(..)`
//!
//! Operations come from a fluent chain (`new Update().set("a", 1).inc("b", 2)`,
//! `Update.update("a", 1)`) and from statements on the variable holding it
//! (`update.set("a", 1);`) that run before the update is used.

use mql_analyzer_ir::{HasFieldReference, HasValueReference, Name, Named, Node};
use mql_analyzer_syntax::{ExprId, ExprKind, Program, Reference};

use super::SpringCriteriaParser;
use crate::dialect::unknown_operator;
use crate::resolver::ConstantResolver;
use crate::types::spring;

fn is_update_call(program: &Program, id: ExprId) -> bool {
    program
        .call(id)
        .is_some_and(|call| call.is_declared_by(spring::UPDATE))
}

fn is_update(program: &Program, id: ExprId) -> bool {
    is_update_call(program, id)
        || matches!(&program.expr(id).kind, ExprKind::New { ty, .. } if ty.is(spring::UPDATE))
}

impl SpringCriteriaParser {
    /// The `Update` argument of a template operation
    pub(super) fn update_argument(program: &Program, operation: ExprId) -> Option<ExprId> {
        let call = program.call(operation)?;
        match call.name.as_str() {
            "updateFirst" | "updateMulti" | "upsert" | "findAndModify" => call.args.get(1).copied(),
            "apply" => call.args.first().copied(),
            _ => None,
        }
    }

    /// Update operations in the order they run
    pub(super) fn updates(resolver: &ConstantResolver<'_>, expr: ExprId) -> Vec<Node<ExprId>> {
        let program = resolver.program();
        let Some(outer) = resolver.resolve_element_until(expr, &is_update) else {
            return vec![unknown_operator(expr)];
        };

        let mut calls = Self::update_chain(program, outer);
        calls.extend(Self::statement_updates(program, expr));
        calls
            .into_iter()
            .map(|id| Self::update_operation(resolver, id))
            .collect()
    }

    /// Update calls of a chain from its root to `outer`
    fn update_chain(program: &Program, outer: ExprId) -> Vec<ExprId> {
        let mut calls = Vec::new();
        let mut current = Some(program.strip_parens(outer));
        while let Some(id) = current {
            if !is_update_call(program, id) {
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

    /// Update chains started on the local variable `usage` refers to, before `usage`
    fn statement_updates(program: &Program, usage: ExprId) -> Vec<ExprId> {
        let usage = program.strip_parens(usage);
        let ExprKind::Reference(Reference::Local(var)) = &program.expr(usage).kind else {
            return Vec::new();
        };
        let use_offset = program.expr(usage).offset;

        let mut starts: Vec<ExprId> = program
            .exprs()
            .filter(|(id, expr)| {
                expr.offset < use_offset
                    && is_update_call(program, *id)
                    && program
                        .call(*id)
                        .and_then(|call| call.receiver)
                        .map(|receiver| program.strip_parens(receiver))
                        .is_some_and(|receiver| {
                            matches!(
                                program.expr(receiver).kind,
                                ExprKind::Reference(Reference::Local(other)) if other == *var
                            )
                        })
            })
            .map(|(id, _)| id)
            .collect();
        starts.sort_by_key(|id| program.expr(*id).offset);

        let mut calls = Vec::new();
        for start in starts {
            let mut current = start;
            calls.push(current);
            while let Some(parent) = program.parent(current) {
                let continues = program
                    .call(parent)
                    .and_then(|call| call.receiver)
                    .is_some_and(|receiver| program.strip_parens(receiver) == current);
                if !continues || !is_update_call(program, parent) {
                    break;
                }
                calls.push(parent);
                current = parent;
            }
        }
        calls
    }

    fn update_operation(resolver: &ConstantResolver<'_>, id: ExprId) -> Node<ExprId> {
        let Some(call) = resolver.program().call(id) else {
            return unknown_operator(id);
        };
        let name = match call.name.as_str() {
            "update" => Name::Set,
            other => Name::from_canonical(other),
        };
        match (name, call.args.as_slice()) {
            (Name::Pop, [field, ..]) | (_, [field]) => Node::new(
                id,
                [
                    Named::new(name).into(),
                    HasFieldReference::new(resolver.resolve_field_name(*field)).into(),
                ],
            ),
            (_, [field, value]) => Node::new(
                id,
                [
                    Named::new(name).into(),
                    HasFieldReference::new(resolver.resolve_field_name(*field)).into(),
                    HasValueReference::new(resolver.resolve_value(*value)).into(),
                ],
            ),
            _ => unknown_operator(id),
        }
    }
}
