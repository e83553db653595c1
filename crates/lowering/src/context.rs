// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Lowering context for tracking state during conversion

use crate::error::{LoweringError, LoweringOutcome, LoweringResult};
use mql_analyzer_ir::SourceDialect;

/// Default bound for recursive resolution (helper methods, variable chains)
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 50;

/// Default bound for the interprocedural namespace search
pub const DEFAULT_MAX_NAMESPACE_HOPS: usize = 50;

/// Context for tracking state while lowering host syntax to a query
///
/// The context maintains:
/// - Accumulated errors for partial success mode
/// - Recursion depth tracking
/// - The bounds used by the resolver and the namespace extractor
/// - Dialect information
#[derive(Debug, Clone)]
pub struct LoweringContext {
    /// Dialect being parsed
    dialect: SourceDialect,

    /// Accumulated errors during lowering (for partial success)
    errors: Vec<LoweringError>,

    /// Current recursion depth
    recursion_depth: usize,

    /// Maximum recursion depth allowed
    max_recursion_depth: usize,

    /// Maximum number of worklist pops of the contextual namespace pass
    max_namespace_hops: usize,
}

impl LoweringContext {
    /// Create a new lowering context
    pub fn new(dialect: SourceDialect) -> Self {
        Self {
            dialect,
            errors: Vec::new(),
            recursion_depth: 0,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            max_namespace_hops: DEFAULT_MAX_NAMESPACE_HOPS,
        }
    }

    /// Create a new lowering context with custom bounds
    pub fn with_limits(dialect: SourceDialect, max_depth: usize, max_namespace_hops: usize) -> Self {
        Self {
            max_recursion_depth: max_depth,
            max_namespace_hops,
            ..Self::new(dialect)
        }
    }

    /// Get the dialect being parsed
    pub fn dialect(&self) -> SourceDialect {
        self.dialect
    }

    /// Add an error to the context (for partial success mode)
    pub fn add_error(&mut self, error: LoweringError) {
        self.errors.push(error);
    }

    /// Get all accumulated errors
    pub fn errors(&self) -> &[LoweringError] {
        &self.errors
    }

    /// Check if any errors were accumulated
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get the lowering outcome based on accumulated errors
    pub fn outcome(&self) -> LoweringOutcome {
        if self.errors.is_empty() {
            LoweringOutcome::Success
        } else {
            LoweringOutcome::Partial(self.errors.clone())
        }
    }

    /// Enter a recursive context (e.g. a helper method body)
    ///
    /// Returns an error if the maximum depth is exceeded.
    pub fn enter_recursive_context(&mut self, context: &str) -> LoweringResult<()> {
        if self.recursion_depth >= self.max_recursion_depth {
            return Err(LoweringError::RecursionLimitExceeded {
                context: context.to_string(),
                depth: self.recursion_depth,
                limit: self.max_recursion_depth,
            });
        }
        self.recursion_depth += 1;
        Ok(())
    }

    /// Exit a recursive context
    pub fn exit_recursive_context(&mut self) {
        self.recursion_depth = self.recursion_depth.saturating_sub(1);
    }

    /// Get current recursion depth
    pub fn recursion_depth(&self) -> usize {
        self.recursion_depth
    }

    pub fn max_recursion_depth(&self) -> usize {
        self.max_recursion_depth
    }

    pub fn max_namespace_hops(&self) -> usize {
        self.max_namespace_hops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_creation() {
        let ctx = LoweringContext::new(SourceDialect::JavaDriver);
        assert_eq!(ctx.dialect(), SourceDialect::JavaDriver);
        assert!(!ctx.has_errors());
        assert_eq!(ctx.recursion_depth(), 0);
        assert_eq!(ctx.max_namespace_hops(), DEFAULT_MAX_NAMESPACE_HOPS);
    }

    #[test]
    fn test_error_accumulation() {
        let mut ctx = LoweringContext::new(SourceDialect::SpringCriteria);
        ctx.add_error(LoweringError::Generic {
            message: "first".to_string(),
        });
        ctx.add_error(LoweringError::Generic {
            message: "second".to_string(),
        });

        assert_eq!(ctx.errors().len(), 2);
        assert!(matches!(ctx.outcome(), LoweringOutcome::Partial(errors) if errors.len() == 2));
    }

    #[test]
    fn test_recursion_tracking() {
        let mut ctx = LoweringContext::with_limits(SourceDialect::JavaDriver, 2, 10);

        assert!(ctx.enter_recursive_context("helper").is_ok());
        assert!(ctx.enter_recursive_context("helper").is_ok());
        let err = ctx.enter_recursive_context("helper");
        assert!(matches!(
            err,
            Err(LoweringError::RecursionLimitExceeded { depth: 2, limit: 2, .. })
        ));

        ctx.exit_recursive_context();
        assert_eq!(ctx.recursion_depth(), 1);
        ctx.exit_recursive_context();
        ctx.exit_recursive_context();
        assert_eq!(ctx.recursion_depth(), 0);
    }
}
