//! Payload cleaner configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for cleaner configuration files (JSON or TOML)
//! - Built-in presets
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation, including pattern compilation

pub mod config;
pub mod preset;
pub mod resolve;
pub mod validate;

pub use config::{CleanerConfig, FilterSpec};
pub use preset::{get_preset, PresetName};
pub use resolve::{load_config, resolve_config, ConfigSource, LoadOptions, LoadedConfig};
pub use validate::{validate_config, ConfigError, ConfigResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
