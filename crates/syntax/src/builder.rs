// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Program Builder
//!
//! Imperative construction of a [`Program`]. Declarations return ids; expressions are
//! created bottom-up and attached to the declaration currently entered with
//! [`ProgramBuilder::enter`] or [`ProgramBuilder::enter_class`].
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut b = ProgramBuilder::new();
//! let file = b.file("Repo.java");
//! let repo = b.class(file, "com.example.Repo");
//! let find = b.method(repo, "find", None);
//! let field = b.string("name");
//! let value = b.string("Ada");
//! let eq = b.static_call(FILTERS, "eq", vec![field, value]);
//! b.ret(eq);
//! let program = b.build();
//! ```

use crate::ids::{ClassId, ExprId, FieldId, FileId, MethodId, StmtId, VarId};
use crate::program::{
    AssignTarget, Annotation, Call, Class, ClassKind, Expr, ExprKind, Field, File, Literal,
    Method, Owner, Program, Reference, Stmt, StmtKind, VarKind, Variable,
};
use crate::types::TypeRef;

#[derive(Debug, Default)]
pub struct ProgramBuilder {
    program: Program,
    owner: Option<Owner>,
    offset: u32,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue building on top of an existing program
    pub fn from_program(program: Program) -> Self {
        let offset = program
            .exprs
            .iter()
            .map(|e| e.offset + 1)
            .max()
            .unwrap_or(0);
        Self {
            program,
            owner: None,
            offset,
        }
    }

    pub fn build(self) -> Program {
        self.program
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    // --- declarations ----------------------------------------------------------

    pub fn file(&mut self, path: impl Into<String>) -> FileId {
        self.program.files.push(File { path: path.into() });
        FileId::from_index(self.program.files.len() - 1)
    }

    pub fn class(&mut self, file: FileId, name: impl Into<String>) -> ClassId {
        self.push_class(file, name.into(), ClassKind::Class)
    }

    pub fn interface(&mut self, file: FileId, name: impl Into<String>) -> ClassId {
        self.push_class(file, name.into(), ClassKind::Interface)
    }

    /// An enum with the given constants
    pub fn enumeration(&mut self, file: FileId, name: impl Into<String>, constants: &[&str]) -> ClassId {
        let name = name.into();
        let class = self.push_class(file, name.clone(), ClassKind::Enum);
        for constant in constants {
            let id = self.push_field(Field {
                name: (*constant).to_string(),
                class,
                ty: TypeRef::named(name.clone()),
                is_final: true,
                is_enum_constant: true,
                initializer: None,
            });
            self.program.classes[class.index()].fields.push(id);
        }
        class
    }

    fn push_class(&mut self, file: FileId, name: String, kind: ClassKind) -> ClassId {
        self.program.classes.push(Class {
            name,
            kind,
            file,
            superclass: None,
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        });
        ClassId::from_index(self.program.classes.len() - 1)
    }

    pub fn extends(&mut self, class: ClassId, superclass: impl Into<String>) {
        self.program.classes[class.index()].superclass = Some(superclass.into());
    }

    /// Attach an annotation whose arguments were built with [`ProgramBuilder::enter_class`]
    pub fn annotate(&mut self, class: ClassId, name: impl Into<String>, args: Vec<(String, ExprId)>) {
        self.program.classes[class.index()].annotations.push(Annotation {
            name: name.into(),
            args,
        });
    }

    pub fn field(&mut self, class: ClassId, name: impl Into<String>, ty: TypeRef) -> FieldId {
        let id = self.push_field(Field {
            name: name.into(),
            class,
            ty,
            is_final: false,
            is_enum_constant: false,
            initializer: None,
        });
        self.program.classes[class.index()].fields.push(id);
        id
    }

    /// A `final` field with an initializer built in the class context
    pub fn final_field(
        &mut self,
        class: ClassId,
        name: impl Into<String>,
        ty: TypeRef,
        initializer: Option<ExprId>,
    ) -> FieldId {
        let id = self.field(class, name, ty);
        let field = &mut self.program.fields[id.index()];
        field.is_final = true;
        field.initializer = initializer;
        id
    }

    /// Set the initializer of a non-final field
    pub fn initialize(&mut self, field: FieldId, initializer: ExprId) {
        self.program.fields[field.index()].initializer = Some(initializer);
    }

    fn push_field(&mut self, field: Field) -> FieldId {
        self.program.fields.push(field);
        FieldId::from_index(self.program.fields.len() - 1)
    }

    /// Declare a method and enter it
    pub fn method(&mut self, class: ClassId, name: impl Into<String>, return_type: Option<TypeRef>) -> MethodId {
        self.push_method(class, name.into(), return_type, false)
    }

    /// Declare a constructor and enter it
    pub fn constructor(&mut self, class: ClassId) -> MethodId {
        let name = self.program.classes[class.index()].simple_name().to_string();
        self.push_method(class, name, None, true)
    }

    fn push_method(
        &mut self,
        class: ClassId,
        name: String,
        return_type: Option<TypeRef>,
        is_constructor: bool,
    ) -> MethodId {
        self.program.methods.push(Method {
            name,
            class,
            params: Vec::new(),
            return_type,
            is_constructor,
            is_varargs: false,
            body: Vec::new(),
        });
        let id = MethodId::from_index(self.program.methods.len() - 1);
        self.program.classes[class.index()].methods.push(id);
        self.enter(id);
        id
    }

    pub fn param(&mut self, method: MethodId, name: impl Into<String>, ty: TypeRef) -> VarId {
        let index = self.program.methods[method.index()].params.len();
        let id = self.push_var(Variable {
            name: name.into(),
            ty,
            method,
            kind: VarKind::Parameter { index },
            initializer: None,
        });
        self.program.methods[method.index()].params.push(id);
        id
    }

    pub fn varargs(&mut self, method: MethodId) {
        self.program.methods[method.index()].is_varargs = true;
    }

    /// Attach subsequent expressions and statements to `method`
    pub fn enter(&mut self, method: MethodId) {
        self.owner = Some(Owner::Method(method));
    }

    /// Attach subsequent expressions to the body of `class` (field initializers, annotations)
    pub fn enter_class(&mut self, class: ClassId) {
        self.owner = Some(Owner::Class(class));
    }

    fn push_var(&mut self, var: Variable) -> VarId {
        self.program.vars.push(var);
        VarId::from_index(self.program.vars.len() - 1)
    }

    // --- statements ------------------------------------------------------------

    fn current_method(&self) -> Option<MethodId> {
        match self.owner {
            Some(Owner::Method(method)) => Some(method),
            _ => None,
        }
    }

    fn push_stmt(&mut self, kind: StmtKind) -> Option<StmtId> {
        let method = self.current_method()?;
        self.program.stmts.push(Stmt { kind, method });
        let id = StmtId::from_index(self.program.stmts.len() - 1);
        self.program.methods[method.index()].body.push(id);
        Some(id)
    }

    /// Declare a local variable in the current method
    pub fn local(&mut self, name: impl Into<String>, ty: TypeRef, initializer: Option<ExprId>) -> Option<VarId> {
        let method = self.current_method()?;
        let id = self.push_var(Variable {
            name: name.into(),
            ty,
            method,
            kind: VarKind::Local,
            initializer,
        });
        self.push_stmt(StmtKind::Local(id));
        Some(id)
    }

    pub fn ret(&mut self, value: ExprId) -> Option<StmtId> {
        self.push_stmt(StmtKind::Return(Some(value)))
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> Option<StmtId> {
        self.push_stmt(StmtKind::Expr(expr))
    }

    /// `this.field = value;`
    pub fn assign_field(&mut self, field: FieldId, value: ExprId) -> Option<StmtId> {
        self.push_stmt(StmtKind::Assign {
            target: AssignTarget::Field(field),
            value,
        })
    }

    pub fn assign_local(&mut self, var: VarId, value: ExprId) -> Option<StmtId> {
        self.push_stmt(StmtKind::Assign {
            target: AssignTarget::Local(var),
            value,
        })
    }

    // --- expressions -----------------------------------------------------------

    fn push_expr(&mut self, kind: ExprKind) -> ExprId {
        let id = ExprId::from_index(self.program.exprs.len());
        let children: Vec<ExprId> = match &kind {
            ExprKind::Call(call) => call.receiver.into_iter().chain(call.args.iter().copied()).collect(),
            ExprKind::Parenthesized(inner) => vec![*inner],
            ExprKind::New { args, .. } => args.clone(),
            ExprKind::ArrayInit(elements) => elements.clone(),
            _ => Vec::new(),
        };
        self.program.exprs.push(Expr {
            kind,
            ty: None,
            parent: None,
            owner: self.owner,
            offset: self.offset,
        });
        self.offset += 1;
        for child in children {
            self.program.exprs[child.index()].parent = Some(id);
        }
        id
    }

    pub fn literal(&mut self, literal: Literal) -> ExprId {
        self.push_expr(ExprKind::Literal(literal))
    }

    pub fn string(&mut self, value: impl Into<String>) -> ExprId {
        self.literal(Literal::String(value.into()))
    }

    pub fn int(&mut self, value: i32) -> ExprId {
        self.literal(Literal::Int(value))
    }

    pub fn long(&mut self, value: i64) -> ExprId {
        self.literal(Literal::Long(value))
    }

    pub fn double(&mut self, value: f64) -> ExprId {
        self.literal(Literal::Double(value))
    }

    pub fn boolean(&mut self, value: bool) -> ExprId {
        self.literal(Literal::Boolean(value))
    }

    pub fn null(&mut self) -> ExprId {
        self.literal(Literal::Null)
    }

    pub fn local_ref(&mut self, var: VarId) -> ExprId {
        self.push_expr(ExprKind::Reference(Reference::Local(var)))
    }

    pub fn field_ref(&mut self, field: FieldId) -> ExprId {
        self.push_expr(ExprKind::Reference(Reference::Field(field)))
    }

    pub fn type_ref(&mut self, name: impl Into<String>) -> ExprId {
        self.push_expr(ExprKind::Reference(Reference::Type(name.into())))
    }

    pub fn paren(&mut self, inner: ExprId) -> ExprId {
        self.push_expr(ExprKind::Parenthesized(inner))
    }

    /// Instance call of a library method
    pub fn call(
        &mut self,
        receiver: ExprId,
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        args: Vec<ExprId>,
    ) -> ExprId {
        self.push_expr(ExprKind::Call(Call {
            receiver: Some(receiver),
            name: name.into(),
            declaring_type: Some(declaring_type.into()),
            target: None,
            args,
        }))
    }

    /// `Type.method(args)` for a library type; the receiver is a type reference
    pub fn static_call(
        &mut self,
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        args: Vec<ExprId>,
    ) -> ExprId {
        let declaring_type = declaring_type.into();
        let receiver = self.type_ref(declaring_type.clone());
        self.call(receiver, declaring_type, name, args)
    }

    /// A call whose declaration is unknown
    pub fn unresolved_call(&mut self, receiver: Option<ExprId>, name: impl Into<String>, args: Vec<ExprId>) -> ExprId {
        self.push_expr(ExprKind::Call(Call {
            receiver,
            name: name.into(),
            declaring_type: None,
            target: None,
            args,
        }))
    }

    /// Call of a method declared in the program
    pub fn invoke(&mut self, receiver: Option<ExprId>, method: MethodId, args: Vec<ExprId>) -> ExprId {
        let declaration = &self.program.methods[method.index()];
        let name = declaration.name.clone();
        let declaring_type = self.program.classes[declaration.class.index()].name.clone();
        self.push_expr(ExprKind::Call(Call {
            receiver,
            name,
            declaring_type: Some(declaring_type),
            target: Some(method),
            args,
        }))
    }

    /// `super(args)` inside a constructor
    pub fn super_call(&mut self, constructor: MethodId, args: Vec<ExprId>) -> ExprId {
        let declaring_type = self.program.classes[self.program.methods[constructor.index()].class.index()]
            .name
            .clone();
        self.push_expr(ExprKind::Call(Call {
            receiver: None,
            name: "super".to_string(),
            declaring_type: Some(declaring_type),
            target: Some(constructor),
            args,
        }))
    }

    /// `new Type(args)` for a library type
    pub fn new_object(&mut self, ty: TypeRef, args: Vec<ExprId>) -> ExprId {
        self.push_expr(ExprKind::New {
            ty,
            constructor: None,
            args,
        })
    }

    /// `new Type(args)` for a constructor declared in the program
    pub fn new_instance(&mut self, constructor: MethodId, args: Vec<ExprId>) -> ExprId {
        let class = self.program.methods[constructor.index()].class;
        let ty = TypeRef::named(self.program.classes[class.index()].name.clone());
        self.push_expr(ExprKind::New {
            ty,
            constructor: Some(constructor),
            args,
        })
    }

    pub fn class_literal(&mut self, ty: TypeRef) -> ExprId {
        self.push_expr(ExprKind::ClassLiteral(ty))
    }

    pub fn array(&mut self, elements: Vec<ExprId>) -> ExprId {
        self.push_expr(ExprKind::ArrayInit(elements))
    }

    /// Record the static type of an expression
    pub fn typed(&mut self, expr: ExprId, ty: TypeRef) -> ExprId {
        self.program.exprs[expr.index()].ty = Some(ty);
        expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILTERS: &str = "com.mongodb.client.model.Filters";

    #[test]
    fn test_parent_links() {
        let mut b = ProgramBuilder::new();
        let file = b.file("Repo.java");
        let class = b.class(file, "com.example.Repo");
        let method = b.method(class, "find", None);
        let field = b.string("name");
        let value = b.string("Ada");
        let eq = b.static_call(FILTERS, "eq", vec![field, value]);
        b.ret(eq);
        let program = b.build();

        assert_eq!(program.parent(field), Some(eq));
        assert_eq!(program.root(value), eq);
        assert_eq!(program.enclosing_method(eq), Some(method));
        assert_eq!(program.enclosing_class(field), Some(class));
        assert_eq!(program.returns_of(method), vec![eq]);
        assert!(program.call(eq).is_some_and(|c| c.is(FILTERS, "eq")));
    }

    #[test]
    fn test_descendants_are_pre_order() {
        let mut b = ProgramBuilder::new();
        let file = b.file("Repo.java");
        let class = b.class(file, "com.example.Repo");
        b.method(class, "find", None);
        let a = b.string("a");
        let inner = b.paren(a);
        let outer = b.static_call(FILTERS, "not", vec![inner]);
        let program = b.build();

        let receiver = program.call(outer).and_then(|c| c.receiver);
        let order = program.descendants(outer);
        assert_eq!(order.first(), Some(&outer));
        assert_eq!(order.len(), 4);
        assert_eq!(order[1], receiver.unwrap_or(outer));
        assert_eq!(program.strip_parens(inner), a);
    }

    #[test]
    fn test_hierarchy_and_constructors() {
        let mut b = ProgramBuilder::new();
        let file = b.file("Repo.java");
        let base = b.class(file, "com.example.BaseRepo");
        let base_ctor = b.constructor(base);
        let child = b.class(file, "com.example.BookRepo");
        b.extends(child, "com.example.BaseRepo");
        let child_ctor = b.constructor(child);
        let unrelated = b.class(file, "com.example.Other");
        let program = b.build();

        assert_eq!(program.superclass(child), Some(base));
        assert!(program.in_same_hierarchy(child, base));
        assert!(!program.in_same_hierarchy(child, unrelated));
        assert_eq!(program.constructors_with_inherited(child), vec![child_ctor, base_ctor]);
    }

    #[test]
    fn test_enum_constants() {
        let mut b = ProgramBuilder::new();
        let file = b.file("Status.java");
        let status = b.enumeration(file, "com.example.Status", &["ACTIVE", "ARCHIVED"]);
        let program = b.build();

        assert_eq!(program.enum_constants(status), vec!["ACTIVE", "ARCHIVED"]);
    }
}
