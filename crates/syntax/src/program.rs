// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Program
//!
//! An arena of declarations, statements and expressions. Every node is addressed by
//! a typed id from [`crate::ids`]; expressions keep a link to their parent and to the
//! declaration that owns them so analyses can walk both down and up the tree.
//!
//! ## Navigation
//!
//! - **Downwards**: [`Program::children`], [`Program::descendants`]
//! - **Upwards**: [`Program::parent`], [`Program::root`], [`Program::enclosing_method`]
//! - **Across**: [`Program::call_sites_of`], [`Program::field_assignments`],
//!   [`Program::returns_of`]

use serde::{Deserialize, Serialize};

use crate::ids::{ClassId, ExprId, FieldId, FileId, MethodId, StmtId, VarId};
use crate::types::{TypeRef, fqn};

/// A literal as written in source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Char(char),
    String(String),
}

impl Literal {
    pub fn static_type(&self) -> Option<TypeRef> {
        match self {
            Literal::Null => None,
            Literal::Boolean(_) => Some(TypeRef::boolean()),
            Literal::Int(_) => Some(TypeRef::int()),
            Literal::Long(_) => Some(TypeRef::named("long")),
            Literal::Double(_) => Some(TypeRef::named("double")),
            Literal::Char(_) => Some(TypeRef::named("char")),
            Literal::String(_) => Some(TypeRef::string()),
        }
    }
}

/// What a name expression points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reference {
    Local(VarId),
    Field(FieldId),
    /// A type used as a static receiver, e.g. `Filters` in `Filters.eq(..)`
    Type(String),
}

/// A method invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub receiver: Option<ExprId>,
    pub name: String,
    /// Fully qualified name of the class declaring the invoked method, when resolved
    pub declaring_type: Option<String>,
    /// The invoked declaration, when it is part of the program
    pub target: Option<MethodId>,
    pub args: Vec<ExprId>,
}

impl Call {
    pub fn is(&self, declaring_type: &str, name: &str) -> bool {
        self.name == name && self.declaring_type.as_deref() == Some(declaring_type)
    }

    pub fn is_declared_by(&self, declaring_type: &str) -> bool {
        self.declaring_type.as_deref() == Some(declaring_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Literal(Literal),
    Reference(Reference),
    Call(Call),
    Parenthesized(ExprId),
    New {
        ty: TypeRef,
        constructor: Option<MethodId>,
        args: Vec<ExprId>,
    },
    /// `Type.class`
    ClassLiteral(TypeRef),
    /// `{a, b, c}`
    ArrayInit(Vec<ExprId>),
}

/// Declaration that contains an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Method(MethodId),
    /// Field initializers and annotation arguments
    Class(ClassId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    /// Static type when known; see [`Program::static_type`]
    pub ty: Option<TypeRef>,
    pub parent: Option<ExprId>,
    pub owner: Option<Owner>,
    /// Monotonic position in source
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignTarget {
    Field(FieldId),
    Local(VarId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StmtKind {
    Return(Option<ExprId>),
    Local(VarId),
    Expr(ExprId),
    Assign { target: AssignTarget, value: ExprId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub method: MethodId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Fully qualified annotation name
    pub name: String,
    pub args: Vec<(String, ExprId)>,
}

impl Annotation {
    pub fn arg(&self, key: &str) -> Option<ExprId> {
        self.args
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| *value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    /// Fully qualified name
    pub name: String,
    pub kind: ClassKind,
    pub file: FileId,
    pub superclass: Option<String>,
    pub annotations: Vec<Annotation>,
    pub fields: Vec<FieldId>,
    pub methods: Vec<MethodId>,
}

impl Class {
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub class: ClassId,
    pub params: Vec<VarId>,
    pub return_type: Option<TypeRef>,
    pub is_constructor: bool,
    pub is_varargs: bool,
    pub body: Vec<StmtId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub class: ClassId,
    pub ty: TypeRef,
    pub is_final: bool,
    pub is_enum_constant: bool,
    pub initializer: Option<ExprId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    Local,
    Parameter { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub ty: TypeRef,
    pub method: MethodId,
    pub kind: VarKind,
    pub initializer: Option<ExprId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub path: String,
}

/// The whole host program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub(crate) files: Vec<File>,
    pub(crate) classes: Vec<Class>,
    pub(crate) methods: Vec<Method>,
    pub(crate) fields: Vec<Field>,
    pub(crate) vars: Vec<Variable>,
    pub(crate) stmts: Vec<Stmt>,
    pub(crate) exprs: Vec<Expr>,
}

impl Program {
    pub fn file(&self, id: FileId) -> &File {
        &self.files[id.index()]
    }

    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.index()]
    }

    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.index()]
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.index()]
    }

    pub fn var(&self, id: VarId) -> &Variable {
        &self.vars[id.index()]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    /// # Panics
    ///
    /// Panics if `id` belongs to another program; use [`Program::get_expr`] for ids that
    /// come from outside
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// The expression `id` names, if it belongs to this program
    pub fn get_expr(&self, id: ExprId) -> Option<&Expr> {
        self.exprs.get(id.index())
    }

    pub fn exprs(&self) -> impl Iterator<Item = (ExprId, &Expr)> {
        self.exprs
            .iter()
            .enumerate()
            .map(|(i, e)| (ExprId::from_index(i), e))
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &Class)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (ClassId::from_index(i), c))
    }

    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.classes().find(|(_, c)| c.name == name).map(|(id, _)| id)
    }

    /// Replace a literal in place, as an editor would. Returns `false` for non-literals.
    pub fn replace_literal(&mut self, id: ExprId, literal: Literal) -> bool {
        match &mut self.exprs[id.index()].kind {
            ExprKind::Literal(slot) => {
                *slot = literal;
                true
            }
            _ => false,
        }
    }

    // --- class hierarchy -------------------------------------------------------

    pub fn superclass(&self, class: ClassId) -> Option<ClassId> {
        self.class(class)
            .superclass
            .as_deref()
            .and_then(|name| self.class_by_name(name))
    }

    /// `class` followed by its ancestors declared in the program
    pub fn hierarchy(&self, class: ClassId) -> Vec<ClassId> {
        let mut chain = vec![class];
        let mut current = class;
        while let Some(parent) = self.superclass(current) {
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Whether one class is an ancestor of (or equal to) the other
    pub fn in_same_hierarchy(&self, a: ClassId, b: ClassId) -> bool {
        self.hierarchy(a).contains(&b) || self.hierarchy(b).contains(&a)
    }

    pub fn constructors(&self, class: ClassId) -> impl Iterator<Item = MethodId> + '_ {
        self.class(class)
            .methods
            .iter()
            .copied()
            .filter(|m| self.method(*m).is_constructor)
    }

    /// Constructors of `class` and of all of its ancestors, nearest first
    pub fn constructors_with_inherited(&self, class: ClassId) -> Vec<MethodId> {
        self.hierarchy(class)
            .into_iter()
            .flat_map(|c| self.constructors(c).collect::<Vec<_>>())
            .collect()
    }

    pub fn enum_constants(&self, class: ClassId) -> Vec<&str> {
        self.class(class)
            .fields
            .iter()
            .map(|f| self.field(*f))
            .filter(|f| f.is_enum_constant)
            .map(|f| f.name.as_str())
            .collect()
    }

    // --- expressions -----------------------------------------------------------

    pub fn call(&self, id: ExprId) -> Option<&Call> {
        match &self.expr(id).kind {
            ExprKind::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Drop any number of enclosing parentheses
    pub fn strip_parens(&self, mut id: ExprId) -> ExprId {
        while let ExprKind::Parenthesized(inner) = self.expr(id).kind {
            id = inner;
        }
        id
    }

    pub fn parent(&self, id: ExprId) -> Option<ExprId> {
        self.expr(id).parent
    }

    /// The outermost expression containing `id`
    pub fn root(&self, mut id: ExprId) -> ExprId {
        while let Some(parent) = self.parent(id) {
            id = parent;
        }
        id
    }

    /// Direct sub-expressions in source order
    pub fn children(&self, id: ExprId) -> Vec<ExprId> {
        match &self.expr(id).kind {
            ExprKind::Call(call) => call.receiver.into_iter().chain(call.args.iter().copied()).collect(),
            ExprKind::Parenthesized(inner) => vec![*inner],
            ExprKind::New { args, .. } => args.clone(),
            ExprKind::ArrayInit(elements) => elements.clone(),
            ExprKind::Literal(_) | ExprKind::Reference(_) | ExprKind::ClassLiteral(_) => Vec::new(),
        }
    }

    /// `id` and every expression below it, pre-order
    pub fn descendants(&self, id: ExprId) -> Vec<ExprId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let mut children = self.children(current);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    pub fn enclosing_method(&self, id: ExprId) -> Option<MethodId> {
        match self.expr(id).owner {
            Some(Owner::Method(method)) => Some(method),
            _ => None,
        }
    }

    pub fn enclosing_class(&self, id: ExprId) -> Option<ClassId> {
        match self.expr(id).owner? {
            Owner::Method(method) => Some(self.method(method).class),
            Owner::Class(class) => Some(class),
        }
    }

    pub fn file_of(&self, id: ExprId) -> Option<FileId> {
        self.enclosing_class(id).map(|class| self.class(class).file)
    }

    /// Static type of an expression, derived from declarations when not recorded
    pub fn static_type(&self, id: ExprId) -> Option<TypeRef> {
        let expr = self.expr(id);
        if let Some(ty) = &expr.ty {
            return Some(ty.clone());
        }
        match &expr.kind {
            ExprKind::Literal(literal) => literal.static_type(),
            ExprKind::Reference(Reference::Local(var)) => Some(self.var(*var).ty.clone()),
            ExprKind::Reference(Reference::Field(field)) => Some(self.field(*field).ty.clone()),
            ExprKind::Reference(Reference::Type(_)) => None,
            ExprKind::Call(call) => call
                .target
                .and_then(|m| self.method(m).return_type.clone()),
            ExprKind::Parenthesized(inner) => self.static_type(*inner),
            ExprKind::New { ty, .. } => Some(ty.clone()),
            ExprKind::ClassLiteral(_) => Some(TypeRef::named("java.lang.Class")),
            ExprKind::ArrayInit(elements) => elements
                .first()
                .and_then(|e| self.static_type(*e))
                .map(TypeRef::array_of)
                .or_else(|| Some(TypeRef::array_of(TypeRef::named(fqn::OBJECT)))),
        }
    }

    // --- statements and cross references ---------------------------------------

    /// Expressions directly held by the statements of a method body
    pub fn statement_roots(&self, method: MethodId) -> Vec<ExprId> {
        self.method(method)
            .body
            .iter()
            .filter_map(|stmt| match &self.stmt(*stmt).kind {
                StmtKind::Return(value) => *value,
                StmtKind::Local(var) => self.var(*var).initializer,
                StmtKind::Expr(expr) => Some(*expr),
                StmtKind::Assign { value, .. } => Some(*value),
            })
            .collect()
    }

    /// Every expression in a method body
    pub fn exprs_in(&self, method: MethodId) -> Vec<ExprId> {
        self.statement_roots(method)
            .into_iter()
            .flat_map(|root| self.descendants(root))
            .collect()
    }

    /// Values of every `return` statement of a method
    pub fn returns_of(&self, method: MethodId) -> Vec<ExprId> {
        self.method(method)
            .body
            .iter()
            .filter_map(|stmt| match self.stmt(*stmt).kind {
                StmtKind::Return(value) => value,
                _ => None,
            })
            .collect()
    }

    /// Invocations of `method`: calls, `new` expressions and `super(..)` calls
    pub fn call_sites_of(&self, method: MethodId) -> Vec<ExprId> {
        self.exprs()
            .filter(|(_, expr)| match &expr.kind {
                ExprKind::Call(call) => call.target == Some(method),
                ExprKind::New { constructor, .. } => *constructor == Some(method),
                _ => false,
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Arguments of an invocation, whether a call or a `new`
    pub fn arguments(&self, id: ExprId) -> &[ExprId] {
        match &self.expr(id).kind {
            ExprKind::Call(call) => &call.args,
            ExprKind::New { args, .. } => args,
            _ => &[],
        }
    }

    /// `(method, assigned value)` for every assignment statement targeting `field`
    pub fn field_assignments(&self, field: FieldId) -> Vec<(MethodId, ExprId)> {
        self.stmts
            .iter()
            .filter_map(|stmt| match &stmt.kind {
                StmtKind::Assign {
                    target: AssignTarget::Field(target),
                    value,
                } if *target == field => Some((stmt.method, *value)),
                _ => None,
            })
            .collect()
    }

    /// Values assigned to a local variable after its declaration, in source order
    pub fn local_assignments(&self, var: VarId) -> Vec<ExprId> {
        let mut values: Vec<ExprId> = self
            .stmts
            .iter()
            .filter_map(|stmt| match &stmt.kind {
                StmtKind::Assign {
                    target: AssignTarget::Local(target),
                    value,
                } if *target == var => Some(*value),
                _ => None,
            })
            .collect();
        values.sort_by_key(|value| self.expr(*value).offset);
        values
    }

    /// Whether an expression is an argument of the annotation `name` on `class`
    pub fn is_annotation_argument(&self, class: ClassId, name: &str, id: ExprId) -> bool {
        self.class(class)
            .annotation(name)
            .is_some_and(|annotation| annotation.args.iter().any(|(_, value)| *value == id))
    }

    /// The parameter a variable stands for, if it is one
    pub fn parameter_index(&self, var: VarId) -> Option<usize> {
        match self.var(var).kind {
            VarKind::Parameter { index } => Some(index),
            VarKind::Local => None,
        }
    }
}
