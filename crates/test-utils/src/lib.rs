// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for MQL Analyzer
//!
//! This crate provides common testing components including:
//! - A mock read model with failure injection and call counting
//! - Host program fixtures containing driver and Spring queries
//! - Query and insight assertions
//! - Test logging setup

pub mod assertions;
pub mod fixtures;
pub mod mock_read_model;

// Re-exports for convenience
pub use assertions::{InsightAssertions, QueryAssertions};
pub use fixtures::{QueryFixture, QueryFixtures};
pub use mock_read_model::{MockCall, MockReadModel, MockReadModelBuilder};

/// Route `tracing` output to the test harness; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
