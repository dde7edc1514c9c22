//! Sensitive-data redaction engine for error-report payloads.
//!
//! This crate cleans arbitrary payload trees (request params, headers,
//! session data, user objects) before they leave the process, and filters
//! sensitive query parameters out of URLs.
//!
//! # Key Features
//!
//! - **Scope-qualified filtering**: a key is only filtered when its dotted
//!   path starts with a configured scope prefix, so `request.params.password`
//!   can be redacted while `app.password_policy` stays readable.
//! - **Deep filters**: regex rules written against dotted paths
//!   (`params\.secret`) are also tested against the full scope.
//! - **Cycle safety**: composites are tracked by arena handle; a cycle is cut
//!   with `[RECURSION]`, a shared reference is cleaned once and shared.
//! - **Never fails**: failing renders, failing keys and excessive depth all
//!   turn into markers instead of errors.
//! - **String repair**: malformed or foreign-encoded text comes out as UTF-8.
//!
//! # Example
//!
//! ```
//! use pc_clean::{Cleaner, FilterRule, Tree};
//! use serde_json::json;
//!
//! let cleaner = Cleaner::new(
//!     vec![FilterRule::literal("password")],
//!     vec!["request.params".to_string()],
//! );
//!
//! let tree = Tree::from_json(&json!({
//!     "request": {"params": {"password": "hunter2", "page": 2}}
//! }));
//! let cleaned = cleaner.clean(&tree).to_json();
//! assert_eq!(cleaned["request"]["params"]["password"], "[FILTERED]");
//! assert_eq!(cleaned["request"]["params"]["page"], 2);
//! ```

pub mod cleaner;
pub mod error;
pub mod filter;
pub mod markers;
pub mod query;
pub mod repair;
pub mod value;

pub use cleaner::{Cleaner, DEFAULT_MAX_DEPTH, MAX_SUPPORTED_DEPTH};
pub use error::{CleanError, Result};
pub use filter::{key_matches, scope_is_filterable, FilterMatcher, FilterRule};
pub use query::clean_url;
pub use repair::{repair, CANONICAL_ENCODING};
pub use value::{Cleaned, Key, Node, NodeId, Number, Opaque, Render, RenderError, Text, Tree, Value};
