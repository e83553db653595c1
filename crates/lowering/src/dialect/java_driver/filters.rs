// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `Filters.*` and `Updates.*` builders

use mql_analyzer_ir::{
    BsonType, ConstantValue, FieldReference, HasFieldReference, HasFilter, HasUpdates,
    HasValueReference, Name, Named, Node, SourceDialect, ValueReference,
};
use mql_analyzer_syntax::{Call, ExprId, ExprKind, Program};

use super::is_list_factory;
use crate::context::LoweringContext;
use crate::dialect::unknown_operator;
use crate::error::LoweringError;
use crate::resolver::ConstantResolver;
use crate::types::{bson_type_of, driver};

/// Lowering state shared by the builder parsers of one query
pub(super) struct Lowerer<'a, 'p> {
    ctx: &'a mut LoweringContext,
    program: &'p Program,
    resolver: ConstantResolver<'p>,
}

impl<'a, 'p> Lowerer<'a, 'p> {
    pub(super) fn new(ctx: &'a mut LoweringContext, program: &'p Program) -> Self {
        let resolver = ConstantResolver::new(program).with_max_depth(ctx.max_recursion_depth());
        Self {
            ctx,
            program,
            resolver,
        }
    }

    pub(super) fn ctx(&self) -> &LoweringContext {
        self.ctx
    }

    pub(super) fn program(&self) -> &'p Program {
        self.program
    }

    pub(super) fn resolver(&self) -> &ConstantResolver<'p> {
        &self.resolver
    }

    /// Follow `expr` to a call of one of the `declaring` factories
    pub(super) fn builder_call(&self, expr: ExprId, declaring: &[&str]) -> Option<(ExprId, &'p Call)> {
        let found = self.resolver.resolve_element_until(expr, &|program, id| {
            program.call(id).is_some_and(|call| {
                call.declaring_type
                    .as_deref()
                    .is_some_and(|ty| declaring.contains(&ty))
            })
        })?;
        Some((found, self.program.call(found)?))
    }

    /// Run `parse` one level deeper, degrading to an unknown node past the depth bound
    pub(super) fn nested(
        &mut self,
        what: &str,
        expr: ExprId,
        parse: impl FnOnce(&mut Self) -> Node<ExprId>,
    ) -> Node<ExprId> {
        if let Err(error) = self.ctx.enter_recursive_context(what) {
            self.ctx.add_error(error);
            return unknown_operator(expr);
        }
        let node = parse(self);
        self.ctx.exit_recursive_context();
        node
    }

    pub(super) fn unsupported(&mut self, expr: ExprId, feature: &str) -> Node<ExprId> {
        self.ctx.add_error(LoweringError::UnsupportedSyntax {
            dialect: SourceDialect::JavaDriver,
            feature: feature.to_string(),
        });
        unknown_operator(expr)
    }

    /// The elements of a varargs list, an array or a list factory
    ///
    /// A single argument that is neither is returned as is.
    pub(super) fn varargs(&self, args: &[ExprId]) -> Vec<ExprId> {
        match args {
            [single] => self.list_elements(*single),
            _ => args.to_vec(),
        }
    }

    /// Elements of a list-valued expression, or the expression itself
    pub(super) fn list_elements(&self, expr: ExprId) -> Vec<ExprId> {
        let program = self.program;
        let id = program.strip_parens(expr);
        if let ExprKind::ArrayInit(elements) = &program.expr(id).kind {
            return elements.clone();
        }
        let factory = self
            .resolver
            .resolve_element_until(id, &|program, candidate| {
                is_list_factory(program, candidate)
                    || matches!(program.expr(candidate).kind, ExprKind::ArrayInit(_))
            });
        match factory.map(|found| &program.expr(found).kind) {
            Some(ExprKind::ArrayInit(elements)) => elements.clone(),
            Some(ExprKind::Call(call)) => call.args.clone(),
            _ => vec![id],
        }
    }

    fn field(&self, expr: ExprId) -> HasFieldReference<ExprId> {
        HasFieldReference::new(self.resolver.resolve_field_name(expr))
    }

    fn value(&self, expr: ExprId) -> HasValueReference<ExprId> {
        HasValueReference::new(self.resolver.resolve_value(expr))
    }

    /// Predicates of a filter argument; `Filters.empty()` has none
    pub(super) fn filters(&mut self, expr: ExprId) -> Vec<Node<ExprId>> {
        let is_empty = self
            .builder_call(expr, &[driver::FILTERS])
            .is_some_and(|(_, call)| call.name == "empty");
        if is_empty {
            Vec::new()
        } else {
            vec![self.filter(expr)]
        }
    }

    pub(super) fn filter(&mut self, expr: ExprId) -> Node<ExprId> {
        self.nested("filter", expr, |lowerer| lowerer.filter_inner(expr))
    }

    fn filter_inner(&mut self, expr: ExprId) -> Node<ExprId> {
        let Some((id, call)) = self.builder_call(expr, &[driver::FILTERS]) else {
            return self.unsupported(expr, "filter not built with Filters");
        };
        let name = Name::from_canonical(&call.name);
        let args = call.args.as_slice();

        match (call.name.as_str(), args) {
            ("and" | "or" | "nor", _) => {
                let children = self
                    .varargs(args)
                    .into_iter()
                    .map(|child| self.filter(child))
                    .collect();
                Node::new(id, [Named::new(name).into(), HasFilter::new(children).into()])
            }
            ("not", [inner]) => {
                let child = self.filter(*inner);
                Node::new(id, [Named::new(name).into(), HasFilter::new(vec![child]).into()])
            }
            ("in" | "nin", [field, values @ ..]) => Node::new(
                id,
                [
                    Named::new(name).into(),
                    self.field(*field).into(),
                    HasValueReference::new(self.array_value(id, values)).into(),
                ],
            ),
            ("eq", [value]) => Node::new(
                id,
                [
                    Named::new(name).into(),
                    HasFieldReference::new(FieldReference::from_schema(id, "_id")).into(),
                    self.value(*value).into(),
                ],
            ),
            ("exists", [field]) => Node::new(
                id,
                [
                    Named::new(name).into(),
                    self.field(*field).into(),
                    HasValueReference::new(ValueReference::inferred(
                        id,
                        ConstantValue::Boolean(true),
                        BsonType::Boolean,
                    ))
                    .into(),
                ],
            ),
            (_, [field, value]) => Node::new(
                id,
                [
                    Named::new(name).into(),
                    self.field(*field).into(),
                    self.value(*value).into(),
                ],
            ),
            _ => Node::new(id, [Named::new(name).into()]),
        }
    }

    /// Value of `in`/`nin`: varargs, an array or an iterable
    fn array_value(&self, source: ExprId, values: &[ExprId]) -> ValueReference<ExprId> {
        match values {
            [] => ValueReference::constant(source, ConstantValue::Array(Vec::new())),
            [single] => match self.resolver.resolve_value(*single) {
                ValueReference::Constant {
                    source,
                    value: ConstantValue::Array(items),
                    bson_type,
                } => ValueReference::Constant {
                    source,
                    value: ConstantValue::Array(items),
                    bson_type,
                },
                ValueReference::Constant {
                    source,
                    value,
                    bson_type,
                } => ValueReference::Constant {
                    source,
                    value: ConstantValue::Array(vec![value]),
                    bson_type: BsonType::array(bson_type),
                },
                ValueReference::Runtime {
                    source,
                    bson_type: array @ BsonType::Array(_),
                } => ValueReference::runtime(source, array),
                ValueReference::Runtime { source, bson_type } => {
                    ValueReference::runtime(source, BsonType::array(bson_type))
                }
                other => other,
            },
            many => {
                let resolved: Option<Vec<ConstantValue>> =
                    many.iter().map(|value| self.resolver.resolve(*value)).collect();
                match resolved {
                    Some(items) => {
                        let element = BsonType::any_of(
                            items.iter().map(|item| self.resolver.constant_type(item)),
                        );
                        ValueReference::Constant {
                            source,
                            value: ConstantValue::Array(items),
                            bson_type: BsonType::array(element),
                        }
                    }
                    None => {
                        let element = BsonType::any_of(many.iter().map(|value| {
                            self.program
                                .static_type(*value)
                                .map(|ty| bson_type_of(self.program, &ty))
                                .unwrap_or(BsonType::Any)
                        }));
                        ValueReference::runtime(source, BsonType::array(element))
                    }
                }
            }
        }
    }

    pub(super) fn update(&mut self, expr: ExprId) -> Node<ExprId> {
        self.nested("update", expr, |lowerer| lowerer.update_inner(expr))
    }

    fn update_inner(&mut self, expr: ExprId) -> Node<ExprId> {
        let Some((id, call)) = self.builder_call(expr, &[driver::UPDATES]) else {
            return self.unsupported(expr, "update not built with Updates");
        };
        let name = Name::from_canonical(&call.name);
        let args = call.args.as_slice();

        match (call.name.as_str(), args) {
            ("combine", _) => {
                let children = self
                    .varargs(args)
                    .into_iter()
                    .map(|child| self.update(child))
                    .collect();
                Node::new(id, [Named::new(name).into(), HasUpdates::new(children).into()])
            }
            ("pull", [field, condition])
                if self.builder_call(*condition, &[driver::FILTERS]).is_some() =>
            {
                let filter = self.filter(*condition);
                Node::new(
                    id,
                    [
                        Named::new(name).into(),
                        self.field(*field).into(),
                        HasFilter::new(vec![filter]).into(),
                    ],
                )
            }
            (_, [field, value]) => Node::new(
                id,
                [
                    Named::new(name).into(),
                    self.field(*field).into(),
                    self.value(*value).into(),
                ],
            ),
            (_, [field]) => Node::new(id, [Named::new(name).into(), self.field(*field).into()]),
            _ => Node::new(id, [Named::new(name).into()]),
        }
    }
}
