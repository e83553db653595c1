// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `Aggregates.*` stages with their `Projections`, `Sorts` and `Accumulators` arguments

use mql_analyzer_ir::{
    FieldReference, HasAccumulatedFields, HasAddedFields,
    HasFieldReference, HasFilter, HasLimit, HasProjections, HasSorts, HasValueReference, Name,
    Named, Node, ValueReference,
};
use mql_analyzer_syntax::{ExprId, ExprKind};

use super::filters::Lowerer;
use crate::dialect::inferred_int;
use crate::types::driver;

impl Lowerer<'_, '_> {
    pub(super) fn stage(&mut self, expr: ExprId) -> Node<ExprId> {
        self.nested("stage", expr, |lowerer| lowerer.stage_inner(expr))
    }

    fn stage_inner(&mut self, expr: ExprId) -> Node<ExprId> {
        let Some((id, call)) = self.builder_call(expr, &[driver::AGGREGATES]) else {
            return self.unsupported(expr, "stage not built with Aggregates");
        };
        let args = call.args.as_slice();

        match (call.name.as_str(), args) {
            ("match", [filter]) => {
                let children = self.filters(*filter);
                Node::new(id, [Named::new(Name::Match).into(), HasFilter::new(children).into()])
            }
            ("project", [projection]) => {
                let children = self.projections(*projection);
                Node::new(
                    id,
                    [Named::new(Name::Project).into(), HasProjections::new(children).into()],
                )
            }
            ("sort", [sort]) => {
                let children = self.sorts(*sort);
                Node::new(id, [Named::new(Name::Sort).into(), HasSorts::new(children).into()])
            }
            ("group", [key, accumulators @ ..]) => {
                let accumulated = self
                    .varargs(accumulators)
                    .into_iter()
                    .map(|accumulator| self.accumulator(accumulator))
                    .collect();
                Node::new(
                    id,
                    [
                        Named::new(Name::Group).into(),
                        HasFieldReference::new(FieldReference::inferred(*key, "_id")).into(),
                        HasValueReference::new(self.resolver().resolve_field_expression(*key))
                            .into(),
                        HasAccumulatedFields::new(accumulated).into(),
                    ],
                )
            }
            ("addFields", fields) => {
                let added = self
                    .varargs(fields)
                    .into_iter()
                    .map(|field| self.added_field(field))
                    .collect();
                Node::new(
                    id,
                    [Named::new(Name::AddFields).into(), HasAddedFields::new(added).into()],
                )
            }
            ("unwind", [path, ..]) => {
                let field = match self.resolver().resolve_string(*path) {
                    Some(path_name) => {
                        FieldReference::from_schema(*path, path_name.trim_start_matches('$'))
                            .with_display_name(path_name.clone())
                    }
                    None => FieldReference::Unknown,
                };
                Node::new(
                    id,
                    [Named::new(Name::Unwind).into(), HasFieldReference::new(field).into()],
                )
            }
            ("limit", [limit]) => {
                let node = Node::new(id, [Named::new(Name::Limit).into()]);
                match self.resolver().resolve(*limit).and_then(|v| v.as_i32()) {
                    Some(limit) => node.with(HasLimit { limit }),
                    None => node,
                }
            }
            _ => Node::new(id, [Named::new(Name::Unknown).into()]),
        }
    }

    /// `new Field<>("name", value)` inside `addFields`
    fn added_field(&mut self, expr: ExprId) -> Node<ExprId> {
        let program = self.program();
        let id = program.strip_parens(expr);
        match &program.expr(id).kind {
            ExprKind::New { ty, args, .. } if ty.is(driver::FIELD) && args.len() == 2 => {
                let field = match self.resolver().resolve_string(args[0]) {
                    Some(name) => FieldReference::computed(args[0], name),
                    None => FieldReference::Unknown,
                };
                let value = match self.resolver().resolve_value(args[1]) {
                    constant @ ValueReference::Constant { .. } => constant,
                    _ => ValueReference::Unknown,
                };
                Node::new(
                    id,
                    [
                        HasFieldReference::new(field).into(),
                        HasValueReference::new(value).into(),
                    ],
                )
            }
            _ => self.unsupported(expr, "added field not built with new Field"),
        }
    }

    /// Projected fields; `fields(..)` is flattened
    pub(super) fn projections(&mut self, expr: ExprId) -> Vec<Node<ExprId>> {
        let Some((id, call)) = self.builder_call(expr, &[driver::PROJECTIONS]) else {
            return vec![self.unsupported(expr, "projection not built with Projections")];
        };
        match call.name.as_str() {
            "fields" => self
                .varargs(&call.args)
                .into_iter()
                .flat_map(|inner| self.projections(inner))
                .collect(),
            "include" => self.field_list(id, &call.args, Name::Include, 1),
            "exclude" => self.field_list(id, &call.args, Name::Exclude, 0),
            "excludeId" => vec![Node::new(
                id,
                [
                    Named::new(Name::Exclude).into(),
                    HasFieldReference::new(FieldReference::inferred(id, "_id")).into(),
                    HasValueReference::new(inferred_int(id, 0)).into(),
                ],
            )],
            _ => vec![Node::new(id, [Named::new(Name::Unknown).into()])],
        }
    }

    /// Sort keys; `orderBy(..)` is flattened
    pub(super) fn sorts(&mut self, expr: ExprId) -> Vec<Node<ExprId>> {
        let Some((id, call)) = self.builder_call(expr, &[driver::SORTS]) else {
            return vec![self.unsupported(expr, "sort not built with Sorts")];
        };
        match call.name.as_str() {
            "orderBy" => self
                .varargs(&call.args)
                .into_iter()
                .flat_map(|inner| self.sorts(inner))
                .collect(),
            "ascending" => self.field_list(id, &call.args, Name::Ascending, 1),
            "descending" => self.field_list(id, &call.args, Name::Descending, -1),
            _ => vec![Node::new(id, [Named::new(Name::Unknown).into()])],
        }
    }

    /// One node per field name, each with an inferred direction or inclusion flag
    fn field_list(&self, source: ExprId, args: &[ExprId], name: Name, flag: i32) -> Vec<Node<ExprId>> {
        self.varargs(args)
            .into_iter()
            .map(|field| {
                Node::new(
                    source,
                    [
                        Named::new(name).into(),
                        HasFieldReference::new(self.resolver().resolve_field_name(field)).into(),
                        HasValueReference::new(inferred_int(field, flag)).into(),
                    ],
                )
            })
            .collect()
    }

    fn accumulator(&mut self, expr: ExprId) -> Node<ExprId> {
        let Some((id, call)) = self.builder_call(expr, &[driver::ACCUMULATORS]) else {
            return self.unsupported(expr, "accumulator not built with Accumulators");
        };
        let name = Name::from_canonical(&call.name);
        let args = call.args.as_slice();
        let Some(&output) = args.first() else {
            return Node::new(id, [Named::new(Name::Unknown).into()]);
        };
        let output_field = match self.resolver().resolve_string(output) {
            Some(field) => FieldReference::computed(output, field),
            None => FieldReference::Unknown,
        };

        match (name, &args[1..]) {
            (
                Name::Sum
                | Name::Avg
                | Name::First
                | Name::Last
                | Name::Max
                | Name::Min
                | Name::Push
                | Name::AddToSet,
                [expression],
            ) => Node::new(
                id,
                [
                    Named::new(name).into(),
                    HasFieldReference::new(output_field).into(),
                    HasValueReference::new(self.resolver().resolve_field_expression(*expression))
                        .into(),
                ],
            ),
            (Name::Top | Name::Bottom, [sort_by, expression]) => {
                let sorts = self.sorts(*sort_by);
                Node::new(
                    id,
                    [
                        Named::new(name).into(),
                        HasFieldReference::new(output_field).into(),
                        HasSorts::new(sorts).into(),
                        HasValueReference::new(
                            self.resolver().resolve_field_expression(*expression),
                        )
                        .into(),
                    ],
                )
            }
            (Name::TopN | Name::BottomN, [sort_by, expression, n]) => {
                let sorts = self.sorts(*sort_by);
                let node = Node::new(
                    id,
                    [
                        Named::new(name).into(),
                        HasFieldReference::new(output_field).into(),
                        HasSorts::new(sorts).into(),
                        HasValueReference::new(
                            self.resolver().resolve_field_expression(*expression),
                        )
                        .into(),
                    ],
                );
                match self.resolver().resolve(*n).and_then(|v| v.as_i32()) {
                    Some(limit) => node.with(HasLimit { limit }),
                    None => node,
                }
            }
            _ => Node::new(id, [Named::new(Name::Unknown).into()]),
        }
    }
}
