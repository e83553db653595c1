// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Typed arena indices

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

define_id!(
    /// A source file
    FileId,
    "file#"
);
define_id!(
    /// A class, interface or enum declaration
    ClassId,
    "class#"
);
define_id!(
    /// A method or constructor declaration
    MethodId,
    "method#"
);
define_id!(
    /// A field or enum constant declaration
    FieldId,
    "field#"
);
define_id!(
    /// A local variable or parameter
    VarId,
    "var#"
);
define_id!(
    /// A statement inside a method body
    StmtId,
    "stmt#"
);
define_id!(
    /// An expression; the anchor type of parsed queries
    ExprId,
    "expr#"
);
