//! Error types for the payload cleaner.
//!
//! Tree cleaning never fails; these errors only surface from rule
//! construction and URL filtering.

use thiserror::Error;

/// Result type for cleaner operations.
pub type Result<T> = std::result::Result<T, CleanError>;

/// Errors that can occur while building rules or filtering URLs.
#[derive(Error, Debug)]
pub enum CleanError {
    /// The URL handed to the query filter could not be parsed.
    ///
    /// The message never contains the URL itself, which may carry secrets.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A filter pattern failed to compile.
    #[error("pattern error: {0}")]
    PatternError(String),
}
