// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Static types as written in host source

use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known fully qualified names
pub mod fqn {
    pub const STRING: &str = "java.lang.String";
    pub const OBJECT: &str = "java.lang.Object";
    pub const ITERABLE: &str = "java.lang.Iterable";
    pub const LIST: &str = "java.util.List";
    pub const SET: &str = "java.util.Set";
    pub const COLLECTION: &str = "java.util.Collection";
    pub const ARRAY_LIST: &str = "java.util.ArrayList";
}

/// A possibly generic, possibly array type such as `java.util.List<java.lang.String>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    /// Fully qualified name, or a primitive keyword (`int`, `boolean`...)
    pub name: String,
    pub args: Vec<TypeRef>,
    /// Number of `[]` suffixes
    pub array_dims: u8,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            array_dims: 0,
        }
    }

    pub fn generic(name: impl Into<String>, args: impl IntoIterator<Item = TypeRef>) -> Self {
        Self {
            name: name.into(),
            args: args.into_iter().collect(),
            array_dims: 0,
        }
    }

    pub fn string() -> Self {
        Self::named(fqn::STRING)
    }

    pub fn int() -> Self {
        Self::named("int")
    }

    pub fn boolean() -> Self {
        Self::named("boolean")
    }

    pub fn array_of(element: TypeRef) -> Self {
        Self {
            array_dims: element.array_dims + 1,
            ..element
        }
    }

    pub fn is_array(&self) -> bool {
        self.array_dims > 0
    }

    /// Element type of an array, `None` for non-arrays
    pub fn element(&self) -> Option<TypeRef> {
        self.is_array().then(|| TypeRef {
            array_dims: self.array_dims - 1,
            ..self.clone()
        })
    }

    /// Whether the type is one of the iterable containers the parsers understand
    pub fn is_iterable(&self) -> bool {
        !self.is_array()
            && matches!(
                self.name.as_str(),
                fqn::ITERABLE | fqn::LIST | fqn::SET | fqn::COLLECTION | fqn::ARRAY_LIST
            )
    }

    /// Whether the erased type has the given fully qualified name
    pub fn is(&self, name: &str) -> bool {
        !self.is_array() && self.name == name
    }

    /// Last segment of the name
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// The fully qualified spelling, e.g. `java.util.List<java.lang.String>[]`
    pub fn canonical_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ">")?;
        }
        for _ in 0..self.array_dims {
            write!(f, "[]")?;
        }
        Ok(())
    }
}
