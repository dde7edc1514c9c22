//! Cleaner configuration file model.
//!
//! ```json
//! {
//!   "schema_version": "1.0.0",
//!   "filters": [{"literal": "password"}, {"pattern": "(?i)cookie"}],
//!   "scopes_to_filter": ["events.metaData"],
//!   "max_depth": 256
//! }
//! ```

use crate::validate::{validate_config, ConfigError, ConfigResult};
use pc_clean::{Cleaner, FilterRule, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One filter rule as written in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterSpec {
    /// Substring match.
    Literal(String),
    /// Regex search.
    Pattern(String),
}

impl FilterSpec {
    /// Compile into an engine rule.
    pub fn to_rule(&self) -> pc_clean::Result<FilterRule> {
        match self {
            FilterSpec::Literal(fragment) => Ok(FilterRule::literal(fragment.clone())),
            FilterSpec::Pattern(source) => FilterRule::pattern(source),
        }
    }
}

/// Cleaner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanerConfig {
    /// Schema version.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Filter rules, applied to keys (and to scopes for deep patterns).
    #[serde(default)]
    pub filters: Vec<FilterSpec>,

    /// Scope prefixes under which filtering is enabled.
    #[serde(default)]
    pub scopes_to_filter: Vec<String>,

    /// Cap on composite nesting.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            filters: Vec::new(),
            scopes_to_filter: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CleanerConfig {
    /// Load configuration from a file; `.toml` files are parsed as TOML,
    /// everything else as JSON.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::parse_toml(&content)
        } else {
            Self::parse_json(&content)
        }
    }

    /// Parse configuration from a JSON string.
    pub fn parse_json(json: &str) -> ConfigResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ConfigError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(text: &str) -> ConfigResult<Self> {
        toml::from_str(text).map_err(|e| ConfigError::ParseError(format!("Invalid TOML: {}", e)))
    }

    /// Serialize as pretty JSON.
    pub fn to_json_pretty(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Compile the filter rules.
    pub fn rules(&self) -> ConfigResult<Vec<FilterRule>> {
        self.filters
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                spec.to_rule().map_err(|e| ConfigError::InvalidValue {
                    field: format!("filters[{i}]"),
                    message: e.to_string(),
                })
            })
            .collect()
    }

    /// Validate and build a cleaner.
    pub fn build_cleaner(&self) -> ConfigResult<Cleaner> {
        validate_config(self)?;
        let rules = self.rules()?;
        debug!(
            filters = rules.len(),
            scopes = self.scopes_to_filter.len(),
            max_depth = self.max_depth,
            "building cleaner from config"
        );
        Ok(Cleaner::new(rules, self.scopes_to_filter.clone()).with_max_depth(self.max_depth))
    }
}
