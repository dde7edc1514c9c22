//! Configuration resolution and loading.
//!
//! Resolution order: CLI argument → preset → environment variables → XDG paths
//! → system config → built-in default preset.

use crate::config::CleanerConfig;
use crate::preset::{get_preset, PresetName};
use crate::validate::{validate_config, ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where a configuration came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Named preset selected on the command line.
    Preset(PresetName),

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/payload-cleaner/.
    SystemConfig,

    /// Using the built-in default preset.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Preset(name) => write!(f, "preset '{}'", name),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "PC_CONFIG";
pub const ENV_CONFIG_DIR: &str = "PC_CONFIG_DIR";

/// Standard config file names, in lookup order.
const CONFIG_FILENAMES: &[&str] = &["cleaner.json", "cleaner.toml"];

/// Application name for XDG directories.
const APP_NAME: &str = "payload-cleaner";

/// Options controlling [`load_config`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file; must exist when set.
    pub config_path: Option<PathBuf>,

    /// Preset to use when no explicit file is given.
    pub preset: Option<PresetName>,
}

/// A loaded, validated configuration.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The configuration itself.
    pub config: CleanerConfig,

    /// Where it came from.
    pub source: ConfigSource,

    /// File it was read from, if any.
    pub path: Option<PathBuf>,
}

/// Resolve a configuration file path.
///
/// Resolution order:
/// 1. Explicit CLI path (if it exists)
/// 2. PC_CONFIG environment variable
/// 3. PC_CONFIG_DIR environment variable + filename
/// 4. XDG config directory (~/.config/payload-cleaner/)
/// 5. System config (/etc/payload-cleaner/)
/// 6. Built-in default (None)
pub fn resolve_config(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    if let Some(path) = cli_path {
        if path.exists() {
            return (Some(path.to_path_buf()), ConfigSource::CliArgument);
        }
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        if let Some(path) = find_in_dir(Path::new(&config_dir)) {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Some(path) = xdg_config_dir().and_then(|dir| find_in_dir(&dir)) {
        return (Some(path), ConfigSource::XdgConfig);
    }

    if let Some(path) = find_in_dir(&system_config_dir()) {
        return (Some(path), ConfigSource::SystemConfig);
    }

    (None, ConfigSource::BuiltinDefault)
}

fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Load and validate the effective configuration.
///
/// An explicit path that does not exist is an error rather than a fallthrough.
pub fn load_config(options: &LoadOptions) -> ConfigResult<LoadedConfig> {
    if let Some(path) = &options.config_path {
        if !path.exists() {
            return Err(ConfigError::IoError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return load_file(path, ConfigSource::CliArgument);
    }

    if let Some(preset) = options.preset {
        debug!(preset = %preset, "using preset config");
        return Ok(LoadedConfig {
            config: get_preset(preset),
            source: ConfigSource::Preset(preset),
            path: None,
        });
    }

    match resolve_config(None) {
        (Some(path), source) => load_file(&path, source),
        (None, source) => {
            debug!("no config file found, using default preset");
            Ok(LoadedConfig {
                config: get_preset(PresetName::Default),
                source,
                path: None,
            })
        }
    }
}

fn load_file(path: &Path, source: ConfigSource) -> ConfigResult<LoadedConfig> {
    let config = CleanerConfig::from_file(path)?;
    validate_config(&config)?;
    info!(path = %path.display(), source = %source, "loaded cleaner config");
    Ok(LoadedConfig {
        config,
        source,
        path: Some(path.to_path_buf()),
    })
}

/// Get the XDG config directory for payload-cleaner.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(
            format!("{}", ConfigSource::Preset(PresetName::Strict)),
            "preset 'strict'"
        );
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(format!("{}", ConfigSource::XdgConfig), "XDG config");
        assert_eq!(format!("{}", ConfigSource::SystemConfig), "system config");
        assert_eq!(
            format!("{}", ConfigSource::BuiltinDefault),
            "builtin default"
        );
    }

    #[test]
    fn test_cli_path_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, "{}").unwrap();
        let (resolved, source) = resolve_config(Some(&path));
        assert_eq!(resolved, Some(path));
        assert_eq!(source, ConfigSource::CliArgument);
    }

    #[test]
    fn test_find_in_dir_prefers_json() {
        let dir = TempDir::new().unwrap();
        assert!(find_in_dir(dir.path()).is_none());
        fs::write(dir.path().join("cleaner.toml"), "").unwrap();
        assert!(find_in_dir(dir.path()).unwrap().ends_with("cleaner.toml"));
        fs::write(dir.path().join("cleaner.json"), "{}").unwrap();
        assert!(find_in_dir(dir.path()).unwrap().ends_with("cleaner.json"));
    }

    #[test]
    fn test_load_missing_explicit_path_errors() {
        let options = LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/cleaner.json")),
            preset: None,
        };
        let err = load_config(&options).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_load_explicit_file_over_preset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cleaner.toml");
        fs::write(&path, "filters = [{ literal = \"pin\" }]\n").unwrap();
        let loaded = load_config(&LoadOptions {
            config_path: Some(path.clone()),
            preset: Some(PresetName::Strict),
        })
        .unwrap();
        assert_eq!(loaded.source, ConfigSource::CliArgument);
        assert_eq!(loaded.path, Some(path));
        assert_eq!(loaded.config.filters.len(), 1);
    }

    #[test]
    fn test_load_preset() {
        let loaded = load_config(&LoadOptions {
            config_path: None,
            preset: Some(PresetName::None),
        })
        .unwrap();
        assert_eq!(loaded.source, ConfigSource::Preset(PresetName::None));
        assert!(loaded.config.filters.is_empty());
        assert!(loaded.path.is_none());
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cleaner.json");
        fs::write(&path, r#"{"max_depth": 0}"#).unwrap();
        let err = load_config(&LoadOptions {
            config_path: Some(path),
            preset: None,
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_system_config_dir() {
        assert_eq!(system_config_dir(), PathBuf::from("/etc/payload-cleaner"));
    }
}
