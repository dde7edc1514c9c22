//! Command implementations.
//!
//! Every command takes its input and output streams explicitly so it can be
//! driven from tests without spawning the binary.

use crate::exit_codes::ExitCode;
use pc_clean::{CleanError, Cleaner, Tree};
use pc_config::{validate_config, CleanerConfig, ConfigError, LoadedConfig};
use serde::Serialize;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors surfaced by CLI commands.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read input: {0}")]
    Read(std::io::Error),

    #[error("invalid JSON input: {0}")]
    InvalidJson(serde_json::Error),

    #[error("url #{index}: {source}")]
    InvalidUrl { index: usize, source: CleanError },

    #[error("failed to write output: {0}")]
    Write(#[from] std::io::Error),

    #[error("failed to encode output: {0}")]
    Encode(serde_json::Error),
}

impl CliError {
    /// Exit code reported for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Config(_) => ExitCode::ConfigError,
            CliError::Read(_) | CliError::InvalidJson(_) | CliError::InvalidUrl { .. } => {
                ExitCode::InputError
            }
            CliError::Write(_) | CliError::Encode(_) => ExitCode::InternalError,
        }
    }
}

/// Clean one JSON payload from `input` and write it to `output`.
///
/// Input bytes that are not valid UTF-8 are repaired before parsing.
pub fn run_clean<R: Read, W: Write>(
    cleaner: &Cleaner,
    mut input: R,
    mut output: W,
    pretty: bool,
) -> CliResult<()> {
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes).map_err(CliError::Read)?;

    let text = String::from_utf8_lossy(&bytes);
    if matches!(text, std::borrow::Cow::Owned(_)) {
        warn!("input contained invalid UTF-8; replaced before parsing");
    }

    let json: serde_json::Value = serde_json::from_str(&text).map_err(CliError::InvalidJson)?;
    let tree = Tree::from_json(&json);
    debug!(nodes = tree.len(), "payload parsed");

    let cleaned = cleaner.clean(&tree);
    write_json(&mut output, &cleaned, pretty)
}

/// Clean each URL and write one result per line.
///
/// Stops at the first malformed URL; lines already written stay written.
pub fn run_url<W: Write>(cleaner: &Cleaner, urls: &[String], mut output: W) -> CliResult<()> {
    for (index, url) in urls.iter().enumerate() {
        let cleaned = cleaner
            .clean_url(url)
            .map_err(|source| CliError::InvalidUrl { index, source })?;
        writeln!(output, "{cleaned}")?;
    }
    Ok(())
}

#[derive(Serialize)]
struct ConfigReport<'a> {
    source: String,
    path: Option<String>,
    config: &'a CleanerConfig,
}

/// Print the effective configuration and where it came from.
pub fn run_config_show<W: Write>(loaded: &LoadedConfig, mut output: W) -> CliResult<()> {
    let report = ConfigReport {
        source: loaded.source.to_string(),
        path: loaded.path.as_ref().map(|p| p.display().to_string()),
        config: &loaded.config,
    };
    write_json(&mut output, &report, true)
}

#[derive(Serialize)]
struct ValidationReport {
    valid: bool,
    path: String,
    filters: usize,
    scopes: usize,
    max_depth: usize,
}

/// Validate a config file and print a summary.
pub fn run_config_validate<W: Write>(path: &Path, mut output: W) -> CliResult<()> {
    let config = CleanerConfig::from_file(path)?;
    validate_config(&config)?;
    info!(path = %path.display(), "config valid");

    let report = ValidationReport {
        valid: true,
        path: path.display().to_string(),
        filters: config.filters.len(),
        scopes: config.scopes_to_filter.len(),
        max_depth: config.max_depth,
    };
    write_json(&mut output, &report, true)
}

fn write_json<W: Write, T: Serialize>(output: &mut W, value: &T, pretty: bool) -> CliResult<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *output, value).map_err(CliError::Encode)?;
    } else {
        serde_json::to_writer(&mut *output, value).map_err(CliError::Encode)?;
    }
    writeln!(output)?;
    Ok(())
}
