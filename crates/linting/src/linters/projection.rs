// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Projections mixing inclusion and exclusion

use std::sync::Arc;

use mql_analyzer_ir::{FieldReference, HasAggregation, HasFieldReference, HasProjections, Name, Node};

use crate::insight::{Insight, InsightKind, InsightSink};
use crate::linter::{Inspection, Linter};
use crate::metadata::LintInput;

const ID_FIELD: &str = "_id";

/// Reports inclusions inside a projection that also excludes a field other than `_id`
///
/// Both the query projection and every `$project` stage are checked. Each offending
/// inclusion is reported on its own source.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidProjectionLinter;

impl<S: Clone> Linter<S> for InvalidProjectionLinter {
    fn inspection(&self) -> Inspection {
        Inspection::InvalidProjection
    }

    fn run(&self, query: &Arc<Node<S>>, _input: &LintInput, sink: &mut InsightSink<S>) {
        let stages = query
            .component::<HasAggregation<S>>()
            .map(|aggregation| aggregation.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter(|stage| stage.name() == Some(Name::Project));

        let projections = query
            .component::<HasProjections<S>>()
            .into_iter()
            .chain(stages.filter_map(|stage| stage.component::<HasProjections<S>>()));

        for projection in projections {
            check_projection(query, projection, sink);
        }
    }
}

fn schema_fields<S>(projection: &HasProjections<S>, name: Name) -> Vec<(&str, &S)> {
    projection
        .children
        .iter()
        .filter(|child| child.name() == Some(name))
        .filter_map(|child| match child.component::<HasFieldReference<S>>() {
            Some(HasFieldReference {
                reference: FieldReference::FromSchema {
                    source, field_name, ..
                },
            }) if field_name != ID_FIELD => Some((field_name.as_str(), source)),
            _ => None,
        })
        .collect()
}

fn check_projection<S: Clone>(
    query: &Arc<Node<S>>,
    projection: &HasProjections<S>,
    sink: &mut InsightSink<S>,
) {
    let included = schema_fields(projection, Name::Include);
    let excluded = schema_fields(projection, Name::Exclude);
    if included.is_empty() || excluded.is_empty() {
        return;
    }

    for (field, source) in included {
        sink.register(
            Insight::new(query.clone(), source.clone(), InsightKind::InvalidProjection)
                .with_argument(field),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mql_analyzer_ir::Named;

    fn field(name: Name, source: u32, field: &str) -> Node<u32> {
        Node::new(
            source,
            [
                Named::new(name).into(),
                HasFieldReference::new(FieldReference::from_schema(source, field)).into(),
            ],
        )
    }

    fn project(children: Vec<Node<u32>>) -> Node<u32> {
        Node::new(
            1,
            [Named::new(Name::Project).into(), HasProjections::new(children).into()],
        )
    }

    fn run(query: Node<u32>) -> Vec<Insight<u32>> {
        let mut sink = InsightSink::new();
        InvalidProjectionLinter.run(&Arc::new(query), &LintInput::not_applicable(), &mut sink);
        sink.into_insights()
    }

    #[test]
    fn test_mixed_stage_reports_each_inclusion() {
        let stage = project(vec![
            field(Name::Include, 10, "name"),
            field(Name::Include, 11, "email"),
            field(Name::Exclude, 12, "password"),
        ]);
        let insights = run(Node::new(0, [HasAggregation::new(vec![stage]).into()]));
        let reported: Vec<(u32, &str)> = insights
            .iter()
            .map(|insight| (insight.source, insight.arguments[0].as_str()))
            .collect();
        assert_eq!(reported, vec![(10, "name"), (11, "email")]);
    }

    #[test]
    fn test_excluding_id_is_allowed() {
        let stage = project(vec![
            field(Name::Include, 10, "name"),
            field(Name::Exclude, 12, "_id"),
        ]);
        assert!(run(Node::new(0, [HasAggregation::new(vec![stage]).into()])).is_empty());
    }

    #[test]
    fn test_query_level_projection() {
        let projection = HasProjections::new(vec![
            field(Name::Exclude, 5, "password"),
            field(Name::Include, 6, "name"),
        ]);
        let insights = run(Node::new(0, [projection.into()]));
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].source, 6);
    }
}
