// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Dialect Registry
//!
//! Several client libraries can be used side by side in one program. The registry holds
//! their dialects in priority order and routes every expression to the first dialect
//! that recognises it.

use mql_analyzer_ir::Node;
use mql_analyzer_lowering::{Dialect, LoweringContext};
use mql_analyzer_syntax::{ExprId, Program};

use crate::cache::QueryParser;
use crate::config::AnalyzerConfig;

/// Ordered set of dialects
#[derive(Clone)]
pub struct DialectRegistry {
    dialects: Vec<Dialect>,
}

impl Default for DialectRegistry {
    /// Java driver first, then Spring criteria
    fn default() -> Self {
        Self::new()
            .with_dialect(Dialect::java_driver())
            .with_dialect(Dialect::spring_criteria())
    }
}

impl DialectRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            dialects: Vec::new(),
        }
    }

    /// Append `dialect` with the lowest priority so far
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialects.push(dialect);
        self
    }

    pub fn dialects(&self) -> &[Dialect] {
        &self.dialects
    }

    /// The dialect owning `expr` and the anchor of its query
    ///
    /// Ids that don't belong to `program` have no owner.
    pub fn anchor_of(&self, program: &Program, expr: ExprId) -> Option<(&Dialect, ExprId)> {
        program.get_expr(expr)?;
        self.dialects.iter().find_map(|dialect| {
            let parser = dialect.parser();
            parser
                .is_candidate(program, expr)
                .then(|| (dialect, parser.anchor(program, expr)))
        })
    }

    /// The first dialect whose query is anchored exactly at `anchor`
    pub fn dialect_for(&self, program: &Program, anchor: ExprId) -> Option<&Dialect> {
        program.get_expr(anchor)?;
        self.dialects.iter().find(|dialect| {
            let parser = dialect.parser();
            parser.is_candidate(program, anchor) && parser.anchor(program, anchor) == anchor
        })
    }

    /// Parse the query at `anchor` with the limits of `config`
    ///
    /// Lowering problems are logged; a query that lowered partially is still returned.
    pub fn parse(
        &self,
        program: &Program,
        anchor: ExprId,
        config: &AnalyzerConfig,
    ) -> Option<Node<ExprId>> {
        let dialect = self.dialect_for(program, anchor)?;
        let mut ctx = LoweringContext::with_limits(
            dialect.id(),
            config.max_resolution_depth,
            config.max_namespace_hops,
        );

        match dialect.parser().parse(&mut ctx, program, anchor) {
            Ok(query) => {
                if ctx.has_errors() {
                    tracing::debug!(
                        dialect = %dialect.id(),
                        errors = ctx.errors().len(),
                        "Query lowered partially"
                    );
                }
                Some(query)
            }
            Err(err) => {
                tracing::debug!(dialect = %dialect.id(), error = %err, "Query not lowered");
                None
            }
        }
    }

    /// A [`QueryParser`] over `program`
    pub fn parser_for<'a>(
        &'a self,
        program: &'a Program,
        config: &'a AnalyzerConfig,
    ) -> ProgramQueries<'a> {
        ProgramQueries {
            registry: self,
            program,
            config,
        }
    }
}

/// The queries of one program, parsed through a [`DialectRegistry`]
pub struct ProgramQueries<'a> {
    registry: &'a DialectRegistry,
    program: &'a Program,
    config: &'a AnalyzerConfig,
}

impl QueryParser<ExprId> for ProgramQueries<'_> {
    fn parse(&self, anchor: ExprId) -> Option<Node<ExprId>> {
        self.registry.parse(self.program, anchor, self.config)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use mql_analyzer_ir::SourceDialect;
    use mql_analyzer_lowering::types::driver;
    use mql_analyzer_lowering::{
        DialectParser, JavaTypeFormatter, LoweringError, LoweringResult,
    };
    use mql_analyzer_syntax::{ProgramBuilder, TypeRef};

    /// Claims every expression but anchors all of them at the first one
    struct Greedy;

    impl DialectParser for Greedy {
        fn dialect(&self) -> SourceDialect {
            SourceDialect::SpringCriteria
        }

        fn is_candidate(&self, _program: &Program, _expr: ExprId) -> bool {
            true
        }

        fn anchor(&self, program: &Program, expr: ExprId) -> ExprId {
            program.exprs().next().map(|(id, _)| id).unwrap_or(expr)
        }

        fn parse(
            &self,
            _ctx: &mut LoweringContext,
            _program: &Program,
            anchor: ExprId,
        ) -> LoweringResult<Node<ExprId>> {
            Err(LoweringError::NotACandidate {
                dialect: SourceDialect::SpringCriteria,
                expr: anchor.to_string(),
            })
        }

        fn is_reference_to_database(&self, _program: &Program, _expr: ExprId) -> bool {
            false
        }

        fn is_reference_to_collection(&self, _program: &Program, _expr: ExprId) -> bool {
            false
        }

        fn is_reference_to_field(&self, _program: &Program, _expr: ExprId) -> bool {
            false
        }
    }

    fn find_with_first() -> (Program, ExprId, ExprId) {
        let mut b = ProgramBuilder::new();
        let file = b.file("Repository.java");
        let class = b.class(file, "com.example.Repository");
        let method = b.method(class, "query", None);
        let collection = b.param(method, "users", TypeRef::named(driver::MONGO_COLLECTION));
        let collection = b.local_ref(collection);
        let find = b.call(collection, driver::MONGO_COLLECTION, "find", vec![]);
        let first = b.call(find, driver::FIND_ITERABLE, "first", vec![]);
        (b.build(), find, first)
    }

    #[test]
    fn test_anchor_of_routes_to_first_candidate() {
        let (program, find, first) = find_with_first();
        let registry = DialectRegistry::default();

        let (dialect, anchor) = registry.anchor_of(&program, find).unwrap();
        assert_eq!(dialect.id(), SourceDialect::JavaDriver);
        assert_eq!(anchor, first);

        assert!(registry.dialect_for(&program, find).is_none());
        assert!(registry.dialect_for(&program, first).is_some());
    }

    #[test]
    fn test_parse_only_at_anchor() {
        let (program, find, first) = find_with_first();
        let registry = DialectRegistry::default();
        let config = AnalyzerConfig::default();

        assert!(registry.parse(&program, find, &config).is_none());
        let query = registry.parser_for(&program, &config).parse(first).unwrap();
        assert_eq!(query.source, first);
    }

    #[test]
    fn test_empty_registry() {
        let (program, find, _) = find_with_first();
        let registry = DialectRegistry::new();
        assert!(registry.anchor_of(&program, find).is_none());
        assert!(registry.dialects().is_empty());
    }

    #[test]
    fn test_dialect_for_skips_candidates_anchored_elsewhere() {
        let (program, _, first) = find_with_first();
        let registry = DialectRegistry::new()
            .with_dialect(Dialect::new(Arc::new(Greedy), Arc::new(JavaTypeFormatter)))
            .with_dialect(Dialect::java_driver());

        let (greedy, anchor) = registry.anchor_of(&program, first).unwrap();
        assert_eq!(greedy.id(), SourceDialect::SpringCriteria);
        assert_ne!(anchor, first);

        let owner = registry.dialect_for(&program, first).unwrap();
        assert_eq!(owner.id(), SourceDialect::JavaDriver);
        assert!(
            registry
                .parse(&program, first, &AnalyzerConfig::default())
                .is_some()
        );
    }

    #[test]
    fn test_ids_of_other_programs_have_no_owner() {
        let (program, _, _) = find_with_first();
        let mut larger = ProgramBuilder::new();
        let file = larger.file("Other.java");
        let class = larger.class(file, "com.example.Other");
        larger.method(class, "m", None);
        let foreign = (0..16).map(|i| larger.int(i)).last().unwrap();

        let registry = DialectRegistry::default();
        assert!(registry.anchor_of(&program, foreign).is_none());
        assert!(registry.dialect_for(&program, foreign).is_none());
        assert!(
            registry
                .parse(&program, foreign, &AnalyzerConfig::default())
                .is_none()
        );
    }
}
