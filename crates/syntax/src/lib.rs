// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # MQL Analyzer - Host Syntax Model
//!
//! A resolved, in-memory view of the host program that dialect parsers read from.
//!
//! ## Overview
//!
//! - **Declarations**: files, classes, methods, fields and variables
//! - **Expressions**: literals, references, calls and `new` expressions with parent links
//! - **Cross references**: call sites, field assignments and return statements
//!
//! The model is produced by the embedding tool (or by [`ProgramBuilder`] in tests).
//! Every expression is addressed by an [`ExprId`], which is the source handle carried
//! by the query IR.

pub mod builder;
pub mod ids;
pub mod program;
pub mod types;

pub use builder::ProgramBuilder;
pub use ids::{ClassId, ExprId, FieldId, FileId, MethodId, StmtId, VarId};
pub use program::{
    Annotation, AssignTarget, Call, Class, ClassKind, Expr, ExprKind, Field, File, Literal,
    Method, Owner, Program, Reference, Stmt, StmtKind, VarKind, Variable,
};
pub use types::{TypeRef, fqn};
