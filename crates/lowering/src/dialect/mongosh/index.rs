// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Index suggestions for a query

use mql_analyzer_ir::{
    FieldReference, HasFieldReference, HasSorts, HasTargetCluster, Node, QueryRole,
};

use super::backend::quote;

const DEFAULT_DOCS_VERSION: (u32, u32) = (7, 0);

/// A `createIndex` script covering the fields the query filters and sorts on
///
/// Fields are ordered equality first, then sort, then range, and by first appearance
/// within each group. Returns an empty string when no field qualifies.
pub fn index_command<S>(query: &Node<S>) -> String {
    let fields = index_fields(query);
    if fields.is_empty() {
        return String::new();
    }

    let (major, minor) = query
        .component::<HasTargetCluster>()
        .and_then(HasTargetCluster::major_minor)
        .unwrap_or(DEFAULT_DOCS_VERSION);
    let (database, collection) = match query.namespace().filter(|ns| ns.is_valid()) {
        Some(namespace) => (quote(&namespace.database), quote(&namespace.collection)),
        None => (quote("<database>"), quote("<collection>")),
    };
    let keys: Vec<String> = (1..=fields.len())
        .map(|i| format!("{}: 1", quote(&format!("<your_field_{i}>"))))
        .collect();

    format!(
        "// Potential fields to consider indexing: {}\n\
         // Learn about creating an index: https://www.mongodb.com/docs/v{major}.{minor}/core/data-model-operations/#indexes\n\
         db.getSiblingDB({database}).getCollection({collection})\n  .createIndex({{ {} }})",
        fields.join(", "),
        keys.join(", ")
    )
}

fn rank(role: QueryRole) -> Option<u8> {
    match role {
        QueryRole::Equality => Some(0),
        QueryRole::Sort => Some(1),
        QueryRole::Range => Some(2),
        QueryRole::Union | QueryRole::Irrelevant => None,
    }
}

fn index_fields<S>(query: &Node<S>) -> Vec<String> {
    let sorts = query
        .component::<HasSorts<S>>()
        .map(|sorts| sorts.children.as_slice())
        .unwrap_or_default();
    let candidates = query
        .all_filters_recursively()
        .into_iter()
        .chain(sorts.iter())
        .filter_map(|node| {
            let role = node.name()?.role();
            let Some(HasFieldReference {
                reference: FieldReference::FromSchema { field_name, .. },
            }) = node.component::<HasFieldReference<S>>()
            else {
                return None;
            };
            Some((field_name.as_str(), rank(role)?))
        });

    let mut fields: Vec<(&str, u8)> = Vec::new();
    for (field, rank) in candidates {
        match fields.iter_mut().find(|(existing, _)| *existing == field) {
            Some((_, best)) => *best = (*best).min(rank),
            None => fields.push((field, rank)),
        }
    }
    fields.sort_by_key(|(_, rank)| *rank);
    fields.into_iter().map(|(field, _)| field.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mql_analyzer_ir::{
        CollectionReference, HasCollectionReference, HasFilter, Name, Named, Namespace,
    };

    fn on(name: Name, field: &str) -> Node<()> {
        Node::new(
            (),
            [
                Named::new(name).into(),
                HasFieldReference::new(FieldReference::from_schema((), field)).into(),
            ],
        )
    }

    #[test]
    fn test_fields_ordered_by_role() {
        let query = Node::new(
            (),
            [
                HasCollectionReference::new(CollectionReference::known(
                    None,
                    (),
                    Namespace::new("shop", "orders"),
                ))
                .into(),
                HasFilter::new(vec![on(Name::Gt, "total"), on(Name::Eq, "status")]).into(),
                HasSorts::new(vec![on(Name::Descending, "createdAt")]).into(),
            ],
        )
        .with_target_cluster("8.0.1");

        assert_eq!(
            index_command(&query),
            "// Potential fields to consider indexing: status, createdAt, total\n\
             // Learn about creating an index: https://www.mongodb.com/docs/v8.0/core/data-model-operations/#indexes\n\
             db.getSiblingDB(\"shop\").getCollection(\"orders\")\n  \
             .createIndex({ \"<your_field_1>\": 1, \"<your_field_2>\": 1, \"<your_field_3>\": 1 })"
        );
    }

    #[test]
    fn test_repeated_field_keeps_best_role() {
        let query = Node::new(
            (),
            [HasFilter::new(vec![on(Name::Lt, "age"), on(Name::Eq, "age"), on(Name::Gt, "score")])
                .into()],
        );
        let command = index_command(&query);
        assert!(command.starts_with("// Potential fields to consider indexing: age, score\n"));
        assert!(command.contains("db.getSiblingDB(\"<database>\").getCollection(\"<collection>\")"));
        assert!(command.contains("/docs/v7.0/"));
    }

    #[test]
    fn test_no_candidate_fields() {
        let query = Node::new((), [HasFilter::new(vec![on(Name::Exists, "deletedAt")]).into()]);
        assert_eq!(index_command(&query), "");
    }
}
