// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Test fixtures: small host programs containing driver and Spring queries

use mql_analyzer_lowering::types::{driver, spring};
use mql_analyzer_syntax::{ClassId, ExprId, MethodId, Program, ProgramBuilder, TypeRef};

const SPRING_TEMPLATE: &str = "org.springframework.data.mongodb.core.MongoTemplate";

/// A program and the anchor of the query under test
#[derive(Debug, Clone)]
pub struct QueryFixture {
    pub program: Program,
    pub anchor: ExprId,
}

/// Sample host programs for testing
pub struct QueryFixtures;

impl QueryFixtures {
    /// `com.example.Repository` in `Repository.java`
    pub fn repository(b: &mut ProgramBuilder) -> ClassId {
        let file = b.file("Repository.java");
        b.class(file, "com.example.Repository")
    }

    /// `client.getDatabase(database).getCollection(collection)` in a new method of `class`
    pub fn collection(
        b: &mut ProgramBuilder,
        class: ClassId,
        method: &str,
        database: &str,
        collection: &str,
    ) -> (MethodId, ExprId) {
        let method = b.method(class, method, None);
        let client = b.param(method, "client", TypeRef::named(driver::MONGO_CLIENT));
        let client_ref = b.local_ref(client);
        let database = b.string(database);
        let database = b.call(client_ref, driver::MONGO_CLIENT, "getDatabase", vec![database]);
        let collection = b.string(collection);
        let collection = b.call(database, driver::MONGO_DATABASE, "getCollection", vec![collection]);
        (method, collection)
    }

    /// `Filters.eq(field, "value")`
    pub fn eq(b: &mut ProgramBuilder, field: &str, value: &str) -> ExprId {
        let field = b.string(field);
        let value = b.string(value);
        b.static_call(driver::FILTERS, "eq", vec![field, value])
    }

    /// `collection.find(Filters.eq(field, "value"))`
    pub fn find_eq(database: &str, collection: &str, field: &str, value: &str) -> QueryFixture {
        let mut b = ProgramBuilder::new();
        let class = Self::repository(&mut b);
        let (_, coll) = Self::collection(&mut b, class, "query", database, collection);
        let filter = Self::eq(&mut b, field, value);
        let anchor = b.call(coll, driver::MONGO_COLLECTION, "find", vec![filter]);
        QueryFixture {
            program: b.build(),
            anchor,
        }
    }

    /// `collection.find()`
    pub fn find_all(database: &str, collection: &str) -> QueryFixture {
        let mut b = ProgramBuilder::new();
        let class = Self::repository(&mut b);
        let (_, coll) = Self::collection(&mut b, class, "query", database, collection);
        let anchor = b.call(coll, driver::MONGO_COLLECTION, "find", vec![]);
        QueryFixture {
            program: b.build(),
            anchor,
        }
    }

    /// `collection.updateMany(Filters.empty(), Updates.set(field, "value"))`
    pub fn update_set(database: &str, collection: &str, field: &str, value: &str) -> QueryFixture {
        let mut b = ProgramBuilder::new();
        let class = Self::repository(&mut b);
        let (_, coll) = Self::collection(&mut b, class, "query", database, collection);
        let filter = b.static_call(driver::FILTERS, "empty", vec![]);
        let field = b.string(field);
        let value = b.string(value);
        let set = b.static_call(driver::UPDATES, "set", vec![field, value]);
        let anchor = b.call(coll, driver::MONGO_COLLECTION, "updateMany", vec![filter, set]);
        QueryFixture {
            program: b.build(),
            anchor,
        }
    }

    /// `count` find queries on the same namespace, each in its own method of one file
    pub fn many_finds(database: &str, collection: &str, count: usize) -> (Program, Vec<ExprId>) {
        let mut b = ProgramBuilder::new();
        let class = Self::repository(&mut b);
        let anchors = (0..count)
            .map(|i| {
                let method = format!("query{i}");
                let (_, coll) = Self::collection(&mut b, class, &method, database, collection);
                let filter = Self::eq(&mut b, "status", &format!("status-{i}"));
                b.call(coll, driver::MONGO_COLLECTION, "find", vec![filter])
            })
            .collect();
        (b.build(), anchors)
    }

    /// `template.find(query(where(field).is("value")), Entity.class, collection)`
    ///
    /// The anchor is the outermost criteria call; Spring queries never know their database.
    pub fn spring_find(collection: &str, field: &str, value: &str) -> QueryFixture {
        let mut b = ProgramBuilder::new();
        let file = b.file("BookRepository.java");
        let repo = b.class(file, "com.example.BookRepository");
        let method = b.method(repo, "find", None);
        let template = b.param(method, "template", TypeRef::named(SPRING_TEMPLATE));
        let template_ref = b.local_ref(template);
        let field = b.string(field);
        let where_call = b.static_call(spring::CRITERIA, "where", vec![field]);
        let value = b.string(value);
        let anchor = b.call(where_call, spring::CRITERIA, "is", vec![value]);
        let query = b.static_call(spring::QUERY, "query", vec![anchor]);
        let entity = b.class_literal(TypeRef::named("com.example.Book"));
        let collection = b.string(collection);
        b.call(template_ref, SPRING_TEMPLATE, "find", vec![query, entity, collection]);
        QueryFixture {
            program: b.build(),
            anchor,
        }
    }

    /// `template.updateFirst(query(where("title").is("Dune")), new Update().set(field, "value"), Entity.class, collection)`
    pub fn spring_update_set(collection: &str, field: &str, value: &str) -> QueryFixture {
        let mut b = ProgramBuilder::new();
        let file = b.file("BookRepository.java");
        let repo = b.class(file, "com.example.BookRepository");
        let method = b.method(repo, "update", None);
        let template = b.param(method, "template", TypeRef::named(SPRING_TEMPLATE));
        let template_ref = b.local_ref(template);
        let title = b.string("title");
        let where_call = b.static_call(spring::CRITERIA, "where", vec![title]);
        let dune = b.string("Dune");
        let anchor = b.call(where_call, spring::CRITERIA, "is", vec![dune]);
        let query = b.static_call(spring::QUERY, "query", vec![anchor]);
        let update = b.new_object(TypeRef::named(spring::UPDATE), vec![]);
        let field = b.string(field);
        let value = b.string(value);
        let set = b.call(update, spring::UPDATE, "set", vec![field, value]);
        let entity = b.class_literal(TypeRef::named("com.example.Book"));
        let collection = b.string(collection);
        b.call(
            template_ref,
            SPRING_TEMPLATE,
            "updateFirst",
            vec![query, set, entity, collection],
        );
        QueryFixture {
            program: b.build(),
            anchor,
        }
    }
}
