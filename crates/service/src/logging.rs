// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Logging bootstrap

use tracing_subscriber::EnvFilter;

use crate::config::{AnalyzerConfig, ConfigError};

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` wins over [`AnalyzerConfig::log_filter`]. Returns `Ok(false)` when a
/// subscriber was already installed, which is the case in most test binaries.
pub fn init(config: &AnalyzerConfig) -> Result<bool, ConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter)
            .map_err(|e| ConfigError::InvalidLogFilter(e.to_string()))?,
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        tracing::info!(filter = %config.log_filter, "Logging initialized");
    }
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        let config = AnalyzerConfig::default();
        assert!(init(&config).is_ok());
        assert_eq!(init(&config), Ok(false));
    }
}
