// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Compile-time known values

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bson::BsonType;

/// A value that was resolved from source without running it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ConstantValue {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    /// Decimal128 kept in its textual form
    Decimal(String),
    String(String),
    /// Milliseconds since the epoch
    Date(i64),
    /// Hex representation
    ObjectId(String),
    /// A reference to an enum constant
    Enum { class: String, constant: String },
    Array(Vec<ConstantValue>),
}

impl ConstantValue {
    /// The BSON type a value of this shape is stored as
    pub fn bson_type(&self) -> BsonType {
        match self {
            ConstantValue::Null => BsonType::Null,
            ConstantValue::Boolean(_) => BsonType::Boolean,
            ConstantValue::Int32(_) => BsonType::Int32,
            ConstantValue::Int64(_) => BsonType::Int64,
            ConstantValue::Double(_) => BsonType::Double,
            ConstantValue::Decimal(_) => BsonType::Decimal128,
            ConstantValue::String(_) => BsonType::String,
            ConstantValue::Date(_) => BsonType::Date,
            ConstantValue::ObjectId(_) => BsonType::ObjectId,
            ConstantValue::Enum { class, constant } => {
                BsonType::enumeration([constant.clone()], Some(simple_name(class).to_string()))
            }
            ConstantValue::Array(values) if values.is_empty() => BsonType::array(BsonType::Any),
            ConstantValue::Array(values) => {
                BsonType::array(BsonType::any_of(values.iter().map(ConstantValue::bson_type)))
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstantValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view, used for limits and sort directions
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            ConstantValue::Int32(v) => Some(*v),
            ConstantValue::Int64(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }
}

fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

impl fmt::Display for ConstantValue {
    /// Renders the value as a JavaScript / extended JSON literal
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Null => write!(f, "null"),
            ConstantValue::Boolean(v) => write!(f, "{v}"),
            ConstantValue::Int32(v) => write!(f, "{v}"),
            ConstantValue::Int64(v) => write!(f, "{v}"),
            ConstantValue::Double(v) => write!(f, "{v}"),
            ConstantValue::Decimal(v) => write!(f, "Decimal128(\"{v}\")"),
            ConstantValue::String(v) => {
                write!(f, "{}", serde_json::Value::String(v.clone()))
            }
            ConstantValue::Date(v) => write!(f, "ISODate({v})"),
            ConstantValue::ObjectId(v) => write!(f, "ObjectId(\"{v}\")"),
            ConstantValue::Enum { constant, .. } => {
                write!(f, "{}", serde_json::Value::String(constant.clone()))
            }
            ConstantValue::Array(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_types() {
        assert_eq!(ConstantValue::String("a".into()).bson_type(), BsonType::String);
        assert_eq!(ConstantValue::Int32(1).bson_type(), BsonType::Int32);
        assert_eq!(ConstantValue::Null.bson_type(), BsonType::Null);
    }

    #[test]
    fn test_array_type_joins_elements() {
        let value = ConstantValue::Array(vec![
            ConstantValue::Int32(1),
            ConstantValue::String("x".into()),
        ]);
        assert_eq!(
            value.bson_type(),
            BsonType::array(BsonType::any_of([BsonType::Int32, BsonType::String]))
        );
        assert_eq!(
            ConstantValue::Array(vec![]).bson_type(),
            BsonType::array(BsonType::Any)
        );
    }

    #[test]
    fn test_enum_type_is_named() {
        let value = ConstantValue::Enum {
            class: "com.example.Status".into(),
            constant: "ACTIVE".into(),
        };
        assert_eq!(
            value.bson_type(),
            BsonType::enumeration(["ACTIVE"], Some("Status".into()))
        );
    }

    #[test]
    fn test_display_escapes_strings() {
        assert_eq!(ConstantValue::String("a\"b".into()).to_string(), r#""a\"b""#);
        assert_eq!(
            ConstantValue::Array(vec![ConstantValue::Int32(1), ConstantValue::Boolean(true)])
                .to_string(),
            "[1, true]"
        );
    }
}
