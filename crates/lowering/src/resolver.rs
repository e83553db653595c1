// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Constant Resolver
//!
//! Decides whether an expression is known at analysis time, and if so, what it is.
//!
//! ## Overview
//!
//! The resolver follows:
//! - **Literals** and parenthesized expressions
//! - **Enum constants**, which resolve to [`ConstantValue::Enum`]
//! - **Fields** with an initializer
//! - **Locals**: the last assignment before the use, else the initializer
//! - **Calls** into methods of the program, through each `return` (first resolvable wins)
//!
//! Every other shape is unknown. Resolution is depth bounded, so reference cycles
//! terminate as "unknown".
//!
//! ## Example
//!
//! ```rust,ignore
//! let resolver = ConstantResolver::new(&program);
//! match resolver.resolve(expr) {
//!     Some(ConstantValue::String(name)) => println!("field {name}"),
//!     _ => println!("not a constant"),
//! }
//! ```

use tracing::debug;

use mql_analyzer_ir::{
    BsonType, ConstantValue, FieldReference, HasFieldReference, Node, ValueReference,
};
use mql_analyzer_syntax::{ExprId, ExprKind, Literal, Program, Reference, TypeRef, VarId};

use crate::context::DEFAULT_MAX_RECURSION_DEPTH;
use crate::types::bson_type_of;

/// Compile-time value resolution over a [`Program`]
#[derive(Debug, Clone, Copy)]
pub struct ConstantResolver<'p> {
    program: &'p Program,
    max_depth: usize,
}

impl<'p> ConstantResolver<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            max_depth: DEFAULT_MAX_RECURSION_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    /// The value of `expr` when it is known at analysis time
    pub fn resolve(&self, expr: ExprId) -> Option<ConstantValue> {
        self.resolve_at(expr, 0)
    }

    /// Shorthand for a constant string
    pub fn resolve_string(&self, expr: ExprId) -> Option<String> {
        match self.resolve(expr)? {
            ConstantValue::String(value) => Some(value),
            _ => None,
        }
    }

    fn resolve_at(&self, expr: ExprId, depth: usize) -> Option<ConstantValue> {
        if depth > self.max_depth {
            debug!(%expr, depth, "Constant resolution depth exceeded");
            return None;
        }

        let program = self.program;
        let id = program.strip_parens(expr);
        match &program.expr(id).kind {
            ExprKind::Literal(literal) => Some(literal_value(literal)),
            ExprKind::Reference(Reference::Field(field_id)) => {
                let field = program.field(*field_id);
                if field.is_enum_constant {
                    return Some(ConstantValue::Enum {
                        class: program.class(field.class).name.clone(),
                        constant: field.name.clone(),
                    });
                }
                field
                    .initializer
                    .and_then(|init| self.resolve_at(init, depth + 1))
            }
            ExprKind::Reference(Reference::Local(var)) => self
                .local_value(*var, id)
                .and_then(|value| self.resolve_at(value, depth + 1)),
            ExprKind::Call(call) => {
                let method = call.target?;
                if program.method(method).is_constructor {
                    return None;
                }
                program
                    .returns_of(method)
                    .into_iter()
                    .find_map(|value| self.resolve_at(value, depth + 1))
            }
            ExprKind::ArrayInit(elements) => elements
                .iter()
                .map(|element| self.resolve_at(*element, depth + 1))
                .collect::<Option<Vec<_>>>()
                .map(ConstantValue::Array),
            ExprKind::Reference(Reference::Type(_))
            | ExprKind::Parenthesized(_)
            | ExprKind::New { .. }
            | ExprKind::ClassLiteral(_) => None,
        }
    }

    /// The expression a local variable holds at `use_site`
    fn local_value(&self, var: VarId, use_site: ExprId) -> Option<ExprId> {
        let program = self.program;
        if program.parameter_index(var).is_some() {
            return None;
        }
        let use_offset = program.expr(use_site).offset;
        program
            .local_assignments(var)
            .into_iter()
            .filter(|value| program.expr(*value).offset < use_offset)
            .last()
            .or(program.var(var).initializer)
    }

    /// Follow `expr` through variables, fields and method returns until `accept` holds
    pub fn resolve_element_until(
        &self,
        expr: ExprId,
        accept: &dyn Fn(&Program, ExprId) -> bool,
    ) -> Option<ExprId> {
        self.until_at(expr, accept, 0)
    }

    fn until_at(
        &self,
        expr: ExprId,
        accept: &dyn Fn(&Program, ExprId) -> bool,
        depth: usize,
    ) -> Option<ExprId> {
        if depth > self.max_depth {
            debug!(%expr, depth, "Element resolution depth exceeded");
            return None;
        }

        let program = self.program;
        let id = program.strip_parens(expr);
        if accept(program, id) {
            return Some(id);
        }

        match &program.expr(id).kind {
            ExprKind::Call(call) => {
                let method = call.target?;
                program
                    .returns_of(method)
                    .into_iter()
                    .find_map(|value| self.until_at(value, accept, depth + 1))
            }
            ExprKind::Reference(Reference::Local(var)) => self
                .local_value(*var, id)
                .and_then(|value| self.until_at(value, accept, depth + 1)),
            ExprKind::Reference(Reference::Field(field_id)) => {
                let field = program.field(*field_id);
                if let Some(found) = field
                    .initializer
                    .and_then(|init| self.until_at(init, accept, depth + 1))
                {
                    return Some(found);
                }

                // Assignments in the same method that happen before the use
                let method = program.enclosing_method(id)?;
                let use_offset = program.expr(id).offset;
                program
                    .field_assignments(*field_id)
                    .into_iter()
                    .filter(|(owner, value)| {
                        *owner == method && program.expr(*value).offset < use_offset
                    })
                    .map(|(_, value)| value)
                    .last()
                    .and_then(|value| self.until_at(value, accept, depth + 1))
            }
            _ => None,
        }
    }

    /// Type of a resolved constant; enum constants take the type of their whole enum
    pub fn constant_type(&self, value: &ConstantValue) -> BsonType {
        match value {
            ConstantValue::Enum { class, .. } if self.program.class_by_name(class).is_some() => {
                bson_type_of(self.program, &TypeRef::named(class.clone()))
            }
            other => other.bson_type(),
        }
    }

    /// A value reference: `Constant` when resolvable, `Runtime` when only the type is known
    pub fn resolve_value(&self, expr: ExprId) -> ValueReference<ExprId> {
        match self.resolve(expr) {
            Some(value) => {
                let bson_type = self.constant_type(&value);
                ValueReference::Constant {
                    source: expr,
                    value,
                    bson_type,
                }
            }
            None => match self.program.static_type(expr) {
                Some(ty) => ValueReference::runtime(expr, bson_type_of(self.program, &ty)),
                None => ValueReference::Unknown,
            },
        }
    }

    /// A schema field named by a constant string, `Unknown` otherwise
    pub fn resolve_field_name(&self, expr: ExprId) -> FieldReference<ExprId> {
        match self.resolve_string(expr) {
            Some(name) => FieldReference::from_schema(expr, name),
            None => FieldReference::Unknown,
        }
    }

    /// A value written as a field path, such as `"$amount"` in an accumulator
    ///
    /// A constant string becomes a `Computed` reference to that field; any other
    /// constant is kept as is.
    pub fn resolve_field_expression(&self, expr: ExprId) -> ValueReference<ExprId> {
        match self.resolve(expr) {
            Some(ConstantValue::String(path)) => {
                let field = FieldReference::from_schema((), path.trim_start_matches('$'))
                    .with_display_name(path.clone());
                let expression = Node::new((), [HasFieldReference::new(field).into()]);
                ValueReference::Computed {
                    source: expr,
                    bson_type: BsonType::computed(BsonType::Any, expression),
                }
            }
            Some(value) => {
                let bson_type = self.constant_type(&value);
                ValueReference::Constant {
                    source: expr,
                    value,
                    bson_type,
                }
            }
            None => ValueReference::runtime(
                expr,
                self.program
                    .static_type(expr)
                    .map(|ty| bson_type_of(self.program, &ty))
                    .unwrap_or(BsonType::Any),
            ),
        }
    }
}

fn literal_value(literal: &Literal) -> ConstantValue {
    match literal {
        Literal::Null => ConstantValue::Null,
        Literal::Boolean(value) => ConstantValue::Boolean(*value),
        Literal::Int(value) => ConstantValue::Int32(*value),
        Literal::Long(value) => ConstantValue::Int64(*value),
        Literal::Double(value) => ConstantValue::Double(*value),
        Literal::Char(value) => ConstantValue::String(value.to_string()),
        Literal::String(value) => ConstantValue::String(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mql_analyzer_syntax::ProgramBuilder;

    fn string_value(value: &str) -> Option<ConstantValue> {
        Some(ConstantValue::String(value.to_string()))
    }

    #[test]
    fn test_literals_and_parentheses() {
        let mut b = ProgramBuilder::new();
        let file = b.file("A.java");
        let class = b.class(file, "com.example.A");
        b.method(class, "m", None);
        let int = b.int(42);
        let long = b.long(7);
        let inner = b.string("x");
        let paren = b.paren(inner);
        let program = b.build();

        let resolver = ConstantResolver::new(&program);
        assert_eq!(resolver.resolve(int), Some(ConstantValue::Int32(42)));
        assert_eq!(resolver.resolve(long), Some(ConstantValue::Int64(7)));
        assert_eq!(resolver.resolve(paren), string_value("x"));
    }

    #[test]
    fn test_final_field_and_enum_constant() {
        let mut b = ProgramBuilder::new();
        let file = b.file("A.java");
        let status = b.enumeration(file, "com.example.Status", &["ACTIVE", "INACTIVE"]);
        let class = b.class(file, "com.example.A");
        b.enter_class(class);
        let init = b.string("users");
        let field = b.final_field(class, "COLLECTION", TypeRef::string(), Some(init));
        b.method(class, "m", None);
        let field_use = b.field_ref(field);
        let active = b.program().class(status).fields[0];
        let enum_use = b.field_ref(active);
        let program = b.build();

        let resolver = ConstantResolver::new(&program);
        assert_eq!(resolver.resolve(field_use), string_value("users"));
        assert_eq!(
            resolver.resolve(enum_use),
            Some(ConstantValue::Enum {
                class: "com.example.Status".to_string(),
                constant: "ACTIVE".to_string(),
            })
        );

        let value = resolver.resolve_value(enum_use);
        assert_eq!(
            value.bson_type(),
            Some(&BsonType::enumeration(
                ["ACTIVE", "INACTIVE"],
                Some("Status".to_string())
            ))
        );
    }

    #[test]
    fn test_local_uses_last_assignment_before_use() {
        let mut b = ProgramBuilder::new();
        let file = b.file("A.java");
        let class = b.class(file, "com.example.A");
        b.method(class, "m", None);
        let first = b.string("first");
        let var = b.local("name", TypeRef::string(), Some(first)).unwrap();
        let early_use = b.local_ref(var);
        b.expr_stmt(early_use);
        let second = b.string("second");
        b.assign_local(var, second);
        let late_use = b.local_ref(var);
        b.expr_stmt(late_use);
        let program = b.build();

        let resolver = ConstantResolver::new(&program);
        assert_eq!(resolver.resolve(early_use), string_value("first"));
        assert_eq!(resolver.resolve(late_use), string_value("second"));
    }

    #[test]
    fn test_method_returns_first_resolvable() {
        let mut b = ProgramBuilder::new();
        let file = b.file("A.java");
        let class = b.class(file, "com.example.A");
        let helper = b.method(class, "collectionName", Some(TypeRef::string()));
        let param = b.param(helper, "other", TypeRef::string());
        let runtime = b.local_ref(param);
        b.ret(runtime);
        let constant = b.string("orders");
        b.ret(constant);
        b.method(class, "m", None);
        let call = b.invoke(None, helper, vec![]);
        let program = b.build();

        let resolver = ConstantResolver::new(&program);
        assert_eq!(resolver.resolve(call), string_value("orders"));
    }

    #[test]
    fn test_runtime_value_keeps_static_type() {
        let mut b = ProgramBuilder::new();
        let file = b.file("A.java");
        let class = b.class(file, "com.example.A");
        let method = b.method(class, "m", None);
        let param = b.param(method, "age", TypeRef::int());
        let use_site = b.local_ref(param);
        let program = b.build();

        let resolver = ConstantResolver::new(&program);
        assert_eq!(resolver.resolve(use_site), None);
        assert_eq!(
            resolver.resolve_value(use_site),
            ValueReference::runtime(use_site, BsonType::Int32)
        );
    }

    #[test]
    fn test_self_recursive_method_terminates() {
        let mut b = ProgramBuilder::new();
        let file = b.file("A.java");
        let class = b.class(file, "com.example.A");
        let method = b.method(class, "loop", Some(TypeRef::string()));
        let call = b.invoke(None, method, vec![]);
        b.ret(call);
        let program = b.build();

        let resolver = ConstantResolver::new(&program).with_max_depth(10);
        assert_eq!(resolver.resolve(call), None);
        assert_eq!(resolver.resolve_element_until(call, &|_, _| false), None);
    }

    #[test]
    fn test_field_expression_becomes_computed() {
        let mut b = ProgramBuilder::new();
        let file = b.file("A.java");
        let class = b.class(file, "com.example.A");
        b.method(class, "m", None);
        let path = b.string("$amount");
        let program = b.build();

        let resolver = ConstantResolver::new(&program);
        let ValueReference::Computed { bson_type, .. } = resolver.resolve_field_expression(path)
        else {
            panic!("expected a computed reference");
        };
        let BsonType::Computed { expression, .. } = bson_type else {
            panic!("expected a computed type");
        };
        let field = expression.component::<HasFieldReference<()>>().unwrap();
        assert_eq!(field.reference.field_name(), Some("amount"));
    }
}
