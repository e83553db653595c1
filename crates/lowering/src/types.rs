// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Host Types
//!
//! Maps static types written in host source to [`BsonType`]s, and names the driver and
//! framework types the dialects recognise.
//!
//! Reference types that can hold `null` map to a nullable union; primitives don't.

use mql_analyzer_ir::BsonType;
use mql_analyzer_syntax::{ClassKind, Program, TypeRef};

/// Fully qualified names of the MongoDB Java driver
pub mod driver {
    pub const MONGO_CLIENT: &str = "com.mongodb.client.MongoClient";
    pub const MONGO_CLUSTER: &str = "com.mongodb.client.MongoCluster";
    pub const MONGO_DATABASE: &str = "com.mongodb.client.MongoDatabase";
    pub const MONGO_COLLECTION: &str = "com.mongodb.client.MongoCollection";
    pub const REACTIVE_CLIENT: &str = "com.mongodb.reactivestreams.client.MongoClient";
    pub const REACTIVE_DATABASE: &str = "com.mongodb.reactivestreams.client.MongoDatabase";
    pub const REACTIVE_COLLECTION: &str = "com.mongodb.reactivestreams.client.MongoCollection";
    pub const CLIENT_SESSION: &str = "com.mongodb.client.ClientSession";
    pub const MONGO_ITERABLE: &str = "com.mongodb.client.MongoIterable";
    pub const FIND_ITERABLE: &str = "com.mongodb.client.FindIterable";
    pub const AGGREGATE_ITERABLE: &str = "com.mongodb.client.AggregateIterable";
    pub const FILTERS: &str = "com.mongodb.client.model.Filters";
    pub const UPDATES: &str = "com.mongodb.client.model.Updates";
    pub const AGGREGATES: &str = "com.mongodb.client.model.Aggregates";
    pub const PROJECTIONS: &str = "com.mongodb.client.model.Projections";
    pub const SORTS: &str = "com.mongodb.client.model.Sorts";
    pub const ACCUMULATORS: &str = "com.mongodb.client.model.Accumulators";
    pub const FIELD: &str = "com.mongodb.client.model.Field";
    pub const OBJECT_ID: &str = "org.bson.types.ObjectId";

    pub fn is_client(name: &str) -> bool {
        matches!(name, MONGO_CLIENT | MONGO_CLUSTER | REACTIVE_CLIENT)
    }

    pub fn is_database(name: &str) -> bool {
        matches!(name, MONGO_DATABASE | REACTIVE_DATABASE)
    }

    pub fn is_collection(name: &str) -> bool {
        matches!(name, MONGO_COLLECTION | REACTIVE_COLLECTION)
    }

    pub fn is_cursor(name: &str) -> bool {
        matches!(name, MONGO_ITERABLE | FIND_ITERABLE | AGGREGATE_ITERABLE)
    }
}

/// Fully qualified names of Spring Data MongoDB
pub mod spring {
    pub const CRITERIA: &str = "org.springframework.data.mongodb.core.query.Criteria";
    pub const QUERY: &str = "org.springframework.data.mongodb.core.query.Query";
    pub const DOCUMENT: &str = "org.springframework.data.mongodb.core.mapping.Document";
    pub const UPDATE: &str = "org.springframework.data.mongodb.core.query.Update";

    pub const AGGREGATION: &str = "org.springframework.data.mongodb.core.aggregation.Aggregation";
    pub const FIELDS: &str = "org.springframework.data.mongodb.core.aggregation.Fields";
    pub const PROJECTION_OPERATION: &str =
        "org.springframework.data.mongodb.core.aggregation.ProjectionOperation";
    pub const PROJECTION_OPERATION_BUILDER: &str =
        "org.springframework.data.mongodb.core.aggregation.ProjectionOperation.ProjectionOperationBuilder";
    pub const SORT_OPERATION: &str = "org.springframework.data.mongodb.core.aggregation.SortOperation";
    pub const GROUP_OPERATION: &str = "org.springframework.data.mongodb.core.aggregation.GroupOperation";
    pub const GROUP_OPERATION_BUILDER: &str =
        "org.springframework.data.mongodb.core.aggregation.GroupOperation.GroupOperationBuilder";
    pub const ADD_FIELDS_OPERATION: &str =
        "org.springframework.data.mongodb.core.aggregation.AddFieldsOperation";
    pub const ADD_FIELDS_OPERATION_BUILDER: &str =
        "org.springframework.data.mongodb.core.aggregation.AddFieldsOperation.AddFieldsOperationBuilder";
    pub const VALUE_APPENDER: &str =
        "org.springframework.data.mongodb.core.aggregation.AddFieldsOperation.AddFieldsOperationBuilder.ValueAppender";

    pub const SORT: &str = "org.springframework.data.domain.Sort";
    pub const DIRECTION: &str = "org.springframework.data.domain.Sort.Direction";
    pub const ORDER: &str = "org.springframework.data.domain.Sort.Order";

    /// Types whose calls build an aggregation stage
    pub const STAGE_TYPES: &[&str] = &[
        AGGREGATION,
        PROJECTION_OPERATION,
        PROJECTION_OPERATION_BUILDER,
        SORT_OPERATION,
        GROUP_OPERATION,
        GROUP_OPERATION_BUILDER,
        ADD_FIELDS_OPERATION,
        ADD_FIELDS_OPERATION_BUILDER,
        VALUE_APPENDER,
    ];

    /// Simple names of the interfaces exposing template operations
    pub const OPERATION_INTERFACES: &[&str] = &[
        "MongoTemplate",
        "MongoOperations",
        "FluentMongoOperations",
        "ExecutableAggregationOperation",
        "ExecutableFindOperation",
        "ExecutableInsertOperation",
        "ExecutableRemoveOperation",
        "ExecutableUpdateOperation",
    ];

    /// Whether a type is, or is nested in, one of the operation interfaces
    pub fn is_template_operation(declaring_type: &str) -> bool {
        OPERATION_INTERFACES
            .iter()
            .any(|interface| declaring_type.contains(interface))
    }
}

/// Fully qualified names of the JDK collection factories
pub mod jdk {
    pub const LIST: &str = "java.util.List";
    pub const ARRAYS: &str = "java.util.Arrays";
    pub const COLLECTIONS: &str = "java.util.Collections";
}

/// The BSON type values of a host type are stored as
pub fn bson_type_of(program: &Program, ty: &TypeRef) -> BsonType {
    if let Some(element) = ty.element() {
        return BsonType::array(bson_type_of(program, &element));
    }

    if ty.is_iterable() {
        let element = ty
            .args
            .first()
            .map(|arg| bson_type_of(program, arg))
            .unwrap_or(BsonType::Any);
        return BsonType::array(element);
    }

    match ty.name.as_str() {
        driver::OBJECT_ID => BsonType::ObjectId.nullable(),
        "boolean" => BsonType::Boolean,
        "java.lang.Boolean" => BsonType::Boolean.nullable(),
        "short" | "int" => BsonType::Int32,
        "java.lang.Short" | "java.lang.Integer" => BsonType::Int32.nullable(),
        "long" => BsonType::Int64,
        "java.lang.Long" => BsonType::Int64.nullable(),
        "float" | "double" => BsonType::Double,
        "java.lang.Float" | "java.lang.Double" => BsonType::Double.nullable(),
        "char" => BsonType::String,
        "java.lang.String" | "java.lang.CharSequence" => BsonType::String.nullable(),
        "java.util.Date" | "java.time.Instant" | "java.time.LocalDate"
        | "java.time.LocalDateTime" => BsonType::Date.nullable(),
        "java.math.BigInteger" => BsonType::Int64.nullable(),
        "java.math.BigDecimal" => BsonType::Decimal128.nullable(),
        "java.util.UUID" => BsonType::Uuid.nullable(),
        name => enum_type(program, name).unwrap_or(BsonType::Any),
    }
}

fn enum_type(program: &Program, name: &str) -> Option<BsonType> {
    let class_id = program.class_by_name(name)?;
    let class = program.class(class_id);
    (class.kind == ClassKind::Enum).then(|| {
        BsonType::enumeration(
            program.enum_constants(class_id),
            Some(class.simple_name().to_string()),
        )
    })
}
