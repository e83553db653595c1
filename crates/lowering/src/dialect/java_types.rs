// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Java spellings of BSON types, shared by the Java driver and Spring dialects

use mql_analyzer_ir::{BsonType, Node, QueryContext};

use super::{DialectFormatter, OutputQuery};

/// Renders types the way a Java developer would declare them
///
/// Optional numeric and boolean types use their boxed spelling (`Integer`, `Double`...).
/// Java code is never rendered as executable text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaTypeFormatter;

impl JavaTypeFormatter {
    fn render(bson_type: &BsonType) -> String {
        match bson_type {
            BsonType::Null => "null".to_string(),
            BsonType::Boolean => "boolean".to_string(),
            BsonType::Int32 => "int".to_string(),
            BsonType::Int64 => "long".to_string(),
            BsonType::Double => "double".to_string(),
            BsonType::Decimal128 => "BigDecimal".to_string(),
            BsonType::String => "String".to_string(),
            BsonType::ObjectId => "ObjectId".to_string(),
            BsonType::Uuid => "UUID".to_string(),
            BsonType::Date => "Date".to_string(),
            BsonType::Array(of) => format!("List<{}>", Self::boxed(of)),
            BsonType::Object(_) => "Object".to_string(),
            BsonType::Enum { members, name } => match name {
                Some(name) => name.clone(),
                None => {
                    let shown: Vec<&str> = members.iter().take(3).map(String::as_str).collect();
                    if members.len() > 3 {
                        format!("{} | ...", shown.join(" | "))
                    } else {
                        shown.join(" | ")
                    }
                }
            },
            BsonType::AnyOf(union) => {
                let non_null: Vec<&BsonType> = union.non_null_members().collect();
                if union.contains_null() && non_null.len() == 1 {
                    return Self::boxed(non_null[0]);
                }
                let mut rendered: Vec<String> = union.members().iter().map(Self::render).collect();
                rendered.sort();
                rendered.join(" | ")
            }
            BsonType::Computed { base, .. } => Self::render(base),
            BsonType::Any => "any".to_string(),
        }
    }

    /// Spelling usable where a reference type is required
    fn boxed(bson_type: &BsonType) -> String {
        match bson_type {
            BsonType::Boolean => "Boolean".to_string(),
            BsonType::Int32 => "Integer".to_string(),
            BsonType::Int64 => "Long".to_string(),
            BsonType::Double => "Double".to_string(),
            other => Self::render(other),
        }
    }
}

impl<S> DialectFormatter<S> for JavaTypeFormatter {
    fn format_query(&self, _query: &Node<S>, _context: &QueryContext) -> OutputQuery {
        OutputQuery::None
    }

    fn format_type(&self, bson_type: &BsonType) -> String {
        Self::render(bson_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(bson_type: BsonType) -> String {
        DialectFormatter::<()>::format_type(&JavaTypeFormatter, &bson_type)
    }

    #[test]
    fn test_primitive_spellings() {
        assert_eq!(format(BsonType::Int32), "int");
        assert_eq!(format(BsonType::Double), "double");
        assert_eq!(format(BsonType::Decimal128), "BigDecimal");
        assert_eq!(format(BsonType::array(BsonType::Int64)), "List<Long>");
    }

    #[test]
    fn test_nullable_uses_boxed_names() {
        assert_eq!(format(BsonType::Int32.nullable()), "Integer");
        assert_eq!(format(BsonType::Boolean.nullable()), "Boolean");
        assert_eq!(format(BsonType::String.nullable()), "String");
    }

    #[test]
    fn test_unions_and_enums() {
        assert_eq!(
            format(BsonType::any_of([BsonType::String, BsonType::Int32])),
            "String | int"
        );
        assert_eq!(
            format(BsonType::enumeration(["A", "B", "C", "D"], None)),
            "A | B | C | ..."
        );
        assert_eq!(
            format(BsonType::enumeration(["A"], Some("Status".to_string()))),
            "Status"
        );
    }

    #[test]
    fn test_no_executable_output() {
        let query: Node<()> = Node::new((), []);
        assert_eq!(
            JavaTypeFormatter.format_query(&query, &QueryContext::empty()),
            OutputQuery::None
        );
    }
}
