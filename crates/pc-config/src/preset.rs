//! Built-in configuration presets.
//!
//! Provides pre-built configurations for:
//! - Default: the filter set error-report notifiers ship with
//! - Strict: default plus tokens, API keys and sessions, over request data too
//! - None: no filtering at all (string repair and cycle safety still apply)

use crate::config::{CleanerConfig, FilterSpec};
use crate::validate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Available configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// Notifier default filters over event metadata
    Default,
    /// Broader filters over event metadata and request data
    Strict,
    /// No filters
    None,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] =
        &[PresetName::Default, PresetName::Strict, PresetName::None];

    /// Get preset name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Default => "default",
            PresetName::Strict => "strict",
            PresetName::None => "none",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "default" | "standard" => Some(PresetName::Default),
            "strict" | "paranoid" => Some(PresetName::Strict),
            "none" | "off" | "passthrough" => Some(PresetName::None),
            _ => None,
        }
    }

    /// Get a description of the preset.
    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Default => {
                "Authorization, cookie, password and secret keys under event metadata"
            }
            PresetName::Strict => "Default plus tokens, API keys and sessions, including request data",
            PresetName::None => "No filtering; values are only repaired and made cycle-safe",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

/// Get the configuration for a preset.
pub fn get_preset(name: PresetName) -> CleanerConfig {
    match name {
        PresetName::Default => default_preset(),
        PresetName::Strict => strict_preset(),
        PresetName::None => CleanerConfig::default(),
    }
}

/// List presets with their descriptions.
pub fn list_presets() -> Vec<(PresetName, &'static str)> {
    PresetName::ALL
        .iter()
        .map(|p| (*p, p.description()))
        .collect()
}

fn pattern(source: &str) -> FilterSpec {
    FilterSpec::Pattern(source.to_string())
}

fn default_preset() -> CleanerConfig {
    CleanerConfig {
        filters: vec![
            pattern("(?i)authorization"),
            pattern("(?i)cookie"),
            pattern("(?i)password"),
            pattern("(?i)secret"),
            pattern(r"warden\.user\.([^.]+)\.key"),
            FilterSpec::Literal("rack.request.form_vars".to_string()),
        ],
        scopes_to_filter: vec![
            "events.metaData".to_string(),
            "events.breadcrumbs.metaData".to_string(),
        ],
        ..CleanerConfig::default()
    }
}

fn strict_preset() -> CleanerConfig {
    let mut config = default_preset();
    config.filters.extend([
        pattern("(?i)token"),
        pattern("(?i)api[_-]?key"),
        pattern("(?i)session"),
    ]);
    config.scopes_to_filter.extend([
        "events.request".to_string(),
        "request".to_string(),
    ]);
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_config;

    #[test]
    fn test_all_presets_validate() {
        for name in PresetName::ALL {
            validate_config(&get_preset(*name))
                .unwrap_or_else(|e| panic!("preset {name} invalid: {e}"));
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(PresetName::parse("DEFAULT"), Some(PresetName::Default));
        assert_eq!(PresetName::parse("paranoid"), Some(PresetName::Strict));
        assert_eq!(PresetName::parse("off"), Some(PresetName::None));
        assert_eq!(PresetName::parse("bogus"), None);
        assert!(matches!(
            "bogus".parse::<PresetName>(),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_strict_extends_default() {
        let default = get_preset(PresetName::Default);
        let strict = get_preset(PresetName::Strict);
        assert!(default.filters.iter().all(|f| strict.filters.contains(f)));
        assert!(strict.filters.len() > default.filters.len());
    }

    #[test]
    fn test_none_filters_nothing() {
        let cleaner = get_preset(PresetName::None).build_cleaner().unwrap();
        let input = serde_json::json!({"events": {"metaData": {"password": "p"}}});
        assert_eq!(cleaner.clean_json(&input), input);
    }

    #[test]
    fn test_list_presets() {
        let presets = list_presets();
        assert_eq!(presets.len(), PresetName::ALL.len());
        assert!(presets.iter().all(|(_, desc)| !desc.is_empty()));
    }
}
