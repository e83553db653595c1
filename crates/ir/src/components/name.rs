// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Operator names and their role when choosing an index

use serde::{Deserialize, Serialize};

/// How an operator participates in an index (ESR: equality, sort, range)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryRole {
    Equality,
    Sort,
    Range,
    Union,
    Irrelevant,
}

macro_rules! names {
    ($($variant:ident => ($canonical:literal, $role:ident)),+ $(,)?) => {
        /// Canonical representation of every operation the dialects recognise
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Name {
            $($variant,)+
        }

        impl Name {
            /// All known names, in declaration order
            pub const ALL_NAMES: &'static [Name] = &[$(Name::$variant,)+];

            /// The operator spelling (without the leading `$`)
            pub fn canonical(&self) -> &'static str {
                match self {
                    $(Name::$variant => $canonical,)+
                }
            }

            /// Role of the operator when building an index
            pub fn role(&self) -> QueryRole {
                match self {
                    $(Name::$variant => QueryRole::$role,)+
                }
            }
        }
    };
}

names! {
    All => ("all", Irrelevant),
    And => ("and", Irrelevant),
    BitsAllClear => ("bitsAllClear", Irrelevant),
    BitsAllSet => ("bitsAllSet", Irrelevant),
    BitsAnyClear => ("bitsAnyClear", Irrelevant),
    BitsAnySet => ("bitsAnySet", Irrelevant),
    Combine => ("combine", Irrelevant),
    ElemMatch => ("elemMatch", Irrelevant),
    Eq => ("eq", Equality),
    Exists => ("exists", Irrelevant),
    GeoIntersects => ("geoIntersects", Range),
    GeoWithin => ("geoWithin", Range),
    GeoWithinBox => ("geoWithinBox", Range),
    GeoWithinCenter => ("geoWithinCenter", Range),
    GeoWithinCenterSphere => ("geoWithinCenterSphere", Range),
    GeoWithinPolygon => ("geoWithinPolygon", Range),
    Gt => ("gt", Range),
    Gte => ("gte", Range),
    In => ("in", Range),
    Inc => ("inc", Irrelevant),
    Lt => ("lt", Range),
    Lte => ("lte", Range),
    Ne => ("ne", Range),
    Near => ("near", Range),
    NearSphere => ("nearSphere", Range),
    Nin => ("nin", Range),
    Nor => ("nor", Union),
    Not => ("not", Irrelevant),
    Or => ("or", Union),
    Regex => ("regex", Range),
    Set => ("set", Irrelevant),
    SetOnInsert => ("setOnInsert", Irrelevant),
    Size => ("size", Irrelevant),
    Text => ("text", Range),
    Type => ("type", Irrelevant),
    Unset => ("unset", Irrelevant),
    Match => ("match", Irrelevant),
    Project => ("project", Irrelevant),
    Include => ("include", Irrelevant),
    Exclude => ("exclude", Irrelevant),
    Group => ("group", Irrelevant),
    Sum => ("sum", Irrelevant),
    Avg => ("avg", Irrelevant),
    First => ("first", Irrelevant),
    Last => ("last", Irrelevant),
    Top => ("top", Irrelevant),
    TopN => ("topN", Irrelevant),
    Bottom => ("bottom", Irrelevant),
    BottomN => ("bottomN", Irrelevant),
    Max => ("max", Sort),
    Min => ("min", Sort),
    Push => ("push", Irrelevant),
    Pull => ("pull", Irrelevant),
    PullAll => ("pullAll", Irrelevant),
    Pop => ("pop", Irrelevant),
    AddToSet => ("addToSet", Irrelevant),
    Sort => ("sort", Sort),
    Ascending => ("ascending", Sort),
    Descending => ("descending", Sort),
    AddFields => ("addFields", Irrelevant),
    Unwind => ("unwind", Irrelevant),
    Limit => ("limit", Irrelevant),
    Unknown => ("<unknown operator>", Irrelevant),
}

impl Name {
    /// Look a name up by its canonical spelling, falling back to [`Name::Unknown`]
    pub fn from_canonical(canonical: &str) -> Name {
        Name::ALL_NAMES
            .iter()
            .copied()
            .find(|name| name.canonical() == canonical)
            .unwrap_or(Name::Unknown)
    }

    /// Boolean combinators whose children are filters
    pub fn is_combinator(&self) -> bool {
        matches!(self, Name::And | Name::Or | Name::Nor | Name::Not)
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.canonical())
    }
}

/// The operation a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Named {
    pub name: Name,
}

impl Named {
    pub fn new(name: Name) -> Self {
        Self { name }
    }

    pub fn role(&self) -> QueryRole {
        self.name.role()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_canonical() {
        assert_eq!(Name::from_canonical("eq"), Name::Eq);
        assert_eq!(Name::from_canonical("elemMatch"), Name::ElemMatch);
        assert_eq!(Name::from_canonical("doesNotExist"), Name::Unknown);
    }

    #[test]
    fn test_canonical_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for name in Name::ALL_NAMES {
            assert!(seen.insert(name.canonical()), "duplicate {}", name);
        }
    }

    #[test]
    fn test_roles() {
        assert_eq!(Name::Eq.role(), QueryRole::Equality);
        assert_eq!(Name::Gt.role(), QueryRole::Range);
        assert_eq!(Name::Or.role(), QueryRole::Union);
        assert_eq!(Name::Ascending.role(), QueryRole::Sort);
        assert_eq!(Named::new(Name::Set).role(), QueryRole::Irrelevant);
    }

    #[test]
    fn test_combinators() {
        assert!(Name::And.is_combinator());
        assert!(Name::Not.is_combinator());
        assert!(!Name::Eq.is_combinator());
    }
}
