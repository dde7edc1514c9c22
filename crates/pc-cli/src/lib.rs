//! Command-line front end for the payload cleaner.
//!
//! The `pc` binary is a thin shell over this library: argument parsing lives
//! in `main.rs`, everything testable lives here.

pub mod commands;
pub mod exit_codes;
pub mod logging;

pub use commands::{
    run_clean, run_config_show, run_config_validate, run_url, CliError, CliResult,
};
pub use exit_codes::ExitCode;
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
