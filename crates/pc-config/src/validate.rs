//! Configuration errors and semantic validation.

use crate::config::{CleanerConfig, FilterSpec};
use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Upper bound accepted for `max_depth`.
pub const MAX_DEPTH_LIMIT: usize = pc_clean::MAX_SUPPORTED_DEPTH;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("Unknown preset '{0}'. Available: default, strict, none")]
    UnknownPreset(String),
}

impl ConfigError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ConfigError::IoError(_) => 60,
            ConfigError::ParseError(_) => 61,
            ConfigError::InvalidValue { .. } => 65,
            ConfigError::VersionMismatch { .. } => 66,
            ConfigError::UnknownPreset(_) => 67,
        }
    }
}

/// Validate a cleaner configuration semantically.
pub fn validate_config(config: &CleanerConfig) -> ConfigResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ConfigError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    for (i, filter) in config.filters.iter().enumerate() {
        match filter {
            FilterSpec::Literal(fragment) if fragment.is_empty() => {
                // An empty fragment is contained in every key.
                return Err(ConfigError::InvalidValue {
                    field: format!("filters[{i}]"),
                    message: "literal filter must not be empty".to_string(),
                });
            }
            FilterSpec::Pattern(source) => {
                regex::Regex::new(source).map_err(|e| ConfigError::InvalidValue {
                    field: format!("filters[{i}]"),
                    message: e.to_string(),
                })?;
            }
            FilterSpec::Literal(_) => {}
        }
    }

    if config.max_depth == 0 || config.max_depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::InvalidValue {
            field: "max_depth".to_string(),
            message: format!("must be in 1..={MAX_DEPTH_LIMIT}, got {}", config.max_depth),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            ConfigError::IoError(String::new()),
            ConfigError::ParseError(String::new()),
            ConfigError::InvalidValue {
                field: String::new(),
                message: String::new(),
            },
            ConfigError::VersionMismatch {
                expected: String::new(),
                actual: String::new(),
            },
            ConfigError::UnknownPreset(String::new()),
        ];
        let mut codes: Vec<u32> = errors.iter().map(ConfigError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_default_config_is_valid() {
        validate_config(&CleanerConfig::default()).unwrap();
    }

    #[test]
    fn test_rejects_bad_pattern() {
        let mut config = CleanerConfig::default();
        config.filters.push(FilterSpec::Pattern("(".to_string()));
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "filters[0]"));
    }

    #[test]
    fn test_rejects_empty_literal() {
        let mut config = CleanerConfig::default();
        config.filters.push(FilterSpec::Literal(String::new()));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_version_mismatch() {
        let config = CleanerConfig {
            schema_version: "0.9.0".to_string(),
            ..CleanerConfig::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::VersionMismatch { .. }));
        assert_eq!(err.code(), 66);
    }

    #[test]
    fn test_rejects_depth_out_of_range() {
        for depth in [0, MAX_DEPTH_LIMIT + 1] {
            let config = CleanerConfig {
                max_depth: depth,
                ..CleanerConfig::default()
            };
            assert!(validate_config(&config).is_err());
        }
    }
}
