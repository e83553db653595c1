// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Analyzer Configuration
//!
//! This module provides configuration management for the analysis service.
//!
//! ## Configuration Structure
//!
//! The analyzer configuration includes:
//! - Schema sampling size
//! - Traversal limits of namespace extraction and constant resolution
//! - Enabled inspections and explain plan verbosity
//! - Log filter and a default database for queries that don't name one
//!
//! Settings arrive from the editor as JSON or from a YAML file:
//!
//! ```yaml
//! sampleSize: 100
//! explainPlan: full
//! enabledInspections: [namespace-check, field-check]
//! defaultDatabase: shop
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use mql_analyzer_service::AnalyzerConfig;
//!
//! let config = AnalyzerConfig {
//!     sample_size: 200,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use mql_analyzer_ir::ExplainPlanType;
use mql_analyzer_linting::{DEFAULT_SAMPLE_SIZE, Inspection};

/// Key of the analyzer settings in an editor settings payload
pub const SETTINGS_KEY: &str = "mqlAnalyzer";

/// Default hop and depth limit of the lowering traversals
pub const DEFAULT_TRAVERSAL_LIMIT: usize = 50;

/// Main analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzerConfig {
    /// Number of documents sampled to infer a collection schema
    pub sample_size: usize,

    /// Upper bound of methods visited while inferring a namespace
    pub max_namespace_hops: usize,

    /// Upper bound of nested expressions followed while resolving constants
    pub max_resolution_depth: usize,

    /// Inspections run on every query
    pub enabled_inspections: Vec<Inspection>,

    /// Verbosity of the explain plan requested for index checks
    pub explain_plan: ExplainPlanType,

    /// Fallback `tracing` filter when `RUST_LOG` is unset
    pub log_filter: String,

    /// Database assumed for every query, replacing the inferred one
    pub default_database: Option<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            max_namespace_hops: DEFAULT_TRAVERSAL_LIMIT,
            max_resolution_depth: DEFAULT_TRAVERSAL_LIMIT,
            enabled_inspections: Inspection::ALL.to_vec(),
            explain_plan: ExplainPlanType::Safe,
            log_filter: "info".to_string(),
            default_database: None,
        }
    }
}

impl AnalyzerConfig {
    /// Parse the analyzer config from an editor settings payload
    ///
    /// Expected shape:
    /// {
    ///   "mqlAnalyzer": {
    ///     "sampleSize": 50,
    ///     "explainPlan": "safe",
    ///     ...
    ///   }
    /// }
    ///
    /// A payload without the `mqlAnalyzer` key yields the default configuration; missing
    /// fields take their default value.
    pub fn from_settings(settings: &Value) -> Result<Self, ConfigError> {
        let config = match settings.get(SETTINGS_KEY) {
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse the analyzer config from a YAML document holding the settings object itself
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Checks that:
    /// - Sample size and traversal limits are positive
    /// - The log filter is a valid `EnvFilter` directive
    /// - The default database, when set, is a valid database name
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("sampleSize", self.sample_size),
            ("maxNamespaceHops", self.max_namespace_hops),
            ("maxResolutionDepth", self.max_resolution_depth),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be > 0".to_string(),
                });
            }
        }

        EnvFilter::try_new(&self.log_filter)
            .map_err(|e| ConfigError::InvalidLogFilter(e.to_string()))?;

        if let Some(database) = &self.default_database
            && (database.is_empty() || database.contains(['/', '\\', '.', ' ', '"', '$']))
        {
            return Err(ConfigError::InvalidValue {
                field: "defaultDatabase",
                reason: format!("'{database}' is not a valid database name"),
            });
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A setting is out of range
    #[error("Invalid setting {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// The log filter directive could not be parsed
    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),

    /// The settings payload is malformed
    #[error("Failed to parse settings: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.sample_size, 50);
        assert_eq!(config.max_namespace_hops, 50);
        assert_eq!(config.explain_plan, ExplainPlanType::Safe);
        assert_eq!(config.enabled_inspections.len(), Inspection::ALL.len());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_settings() {
        let settings = json!({
            "mqlAnalyzer": {
                "sampleSize": 10,
                "explainPlan": "full",
                "enabledInspections": ["index-check", "field-check"],
                "defaultDatabase": "shop"
            }
        });
        let config = AnalyzerConfig::from_settings(&settings).unwrap();
        assert_eq!(config.sample_size, 10);
        assert_eq!(config.explain_plan, ExplainPlanType::Full);
        assert_eq!(
            config.enabled_inspections,
            vec![Inspection::IndexCheck, Inspection::FieldCheck]
        );
        assert_eq!(config.default_database.as_deref(), Some("shop"));
        assert_eq!(config.max_resolution_depth, 50);
    }

    #[test]
    fn test_from_settings_without_key() {
        let config = AnalyzerConfig::from_settings(&json!({ "other": {} })).unwrap();
        assert_eq!(config, AnalyzerConfig::default());
    }

    #[test]
    fn test_from_settings_rejects_unknown_inspection() {
        let settings = json!({ "mqlAnalyzer": { "enabledInspections": ["spell-check"] } });
        assert!(matches!(
            AnalyzerConfig::from_settings(&settings),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_yaml_str() {
        let config = AnalyzerConfig::from_yaml_str(
            "sampleSize: 5\nexplainPlan: none\nlogFilter: mql_analyzer_service=debug\n",
        )
        .unwrap();
        assert_eq!(config.sample_size, 5);
        assert_eq!(config.explain_plan, ExplainPlanType::None);
        assert_eq!(config.log_filter, "mql_analyzer_service=debug");
    }

    #[test]
    fn test_validate() {
        let config = AnalyzerConfig {
            max_namespace_hops: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "maxNamespaceHops",
                reason: "must be > 0".to_string()
            })
        );

        let config = AnalyzerConfig {
            default_database: Some("my.db".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "defaultDatabase",
                ..
            })
        ));

        let config = AnalyzerConfig {
            log_filter: "mql_analyzer=loud".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLogFilter(_))
        ));
    }
}
