//! Tree sanitizer.
//!
//! The [`Cleaner`] walks a payload [`Tree`] depth-first and produces a
//! [`Cleaned`] copy in which filtered values are replaced by markers,
//! strings are repaired, opaque values are rendered under guard, and
//! cycles are cut. Cleaning never fails: every internal failure becomes a
//! marker.

use crate::filter::{FilterMatcher, FilterRule};
use crate::markers::{FILTERED, OBJECT, RAISED, RECURSION};
use crate::repair::repair;
use crate::value::{Cleaned, Key, Node, NodeId, Opaque, RenderError, Text, Tree, Value};
use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Default cap on composite nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Largest nesting cap a cleaner accepts.
///
/// Traversal recurses once per level; this bound keeps a full-depth walk
/// inside a default 2 MiB thread stack, unoptimized builds included.
pub const MAX_SUPPORTED_DEPTH: usize = 384;

// Default object renderings look like `#<Type:0x... ...>`.
static DEFAULT_RENDERING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#<.*>").expect("default rendering pattern is valid"));

/// Why a mapping entry could not be cleaned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryFailure {
    /// The key or value failed to render.
    Raised,
    /// The depth limit was exhausted below this entry.
    Overflow,
}

impl EntryFailure {
    fn reserved_key(self) -> &'static str {
        match self {
            EntryFailure::Raised => RAISED,
            EntryFailure::Overflow => RECURSION,
        }
    }
}

impl From<RenderError> for EntryFailure {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Raised(_) => EntryFailure::Raised,
            RenderError::Overflow => EntryFailure::Overflow,
        }
    }
}

/// Traversal state of a composite.
enum Visit {
    InProgress,
    Done(Cleaned),
}

/// Redaction engine for payload trees and URLs.
///
/// Configuration is fixed at construction; a `Cleaner` can be shared across
/// threads and every call owns its own traversal state.
#[derive(Debug, Clone)]
pub struct Cleaner {
    matcher: FilterMatcher,
    max_depth: usize,
}

impl Cleaner {
    /// Create a cleaner from rules and filterable scope prefixes.
    pub fn new(rules: Vec<FilterRule>, scope_prefixes: Vec<String>) -> Self {
        Self::with_matcher(FilterMatcher::new(rules, scope_prefixes))
    }

    /// Create a cleaner around an existing matcher.
    pub fn with_matcher(matcher: FilterMatcher) -> Self {
        debug!(
            rules = matcher.rules().len(),
            scopes = matcher.scope_prefixes().len(),
            deep_filters = matcher.has_deep_filters(),
            "cleaner configured"
        );
        Self {
            matcher,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the nesting cap; values above [`MAX_SUPPORTED_DEPTH`] are clamped.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        if max_depth > MAX_SUPPORTED_DEPTH {
            debug!(requested = max_depth, max = MAX_SUPPORTED_DEPTH, "max_depth clamped");
        }
        self.max_depth = max_depth.min(MAX_SUPPORTED_DEPTH);
        self
    }

    pub fn matcher(&self) -> &FilterMatcher {
        &self.matcher
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Clean a whole tree, starting at its root.
    pub fn clean(&self, tree: &Tree) -> Cleaned {
        self.clean_value(tree, tree.root())
    }

    /// Clean `value`, resolving composites against `tree`.
    pub fn clean_value(&self, tree: &Tree, value: &Value) -> Cleaned {
        let mut traversal = Traversal {
            matcher: &self.matcher,
            tree,
            max_depth: self.max_depth,
            seen: HashMap::new(),
        };

        match traversal.traverse(value, None, 0) {
            Ok(cleaned) => cleaned,
            Err(failure) => {
                warn!(marker = failure.reserved_key(), "root value replaced");
                Cleaned::marker(failure.reserved_key())
            }
        }
    }

    /// Clean a JSON document.
    pub fn clean_json(&self, json: &serde_json::Value) -> serde_json::Value {
        self.clean(&Tree::from_json(json)).to_json()
    }

    /// Filter sensitive query parameters out of `url`.
    pub fn clean_url(&self, url: &str) -> Result<String> {
        crate::query::clean_url(url, &self.matcher)
    }
}

/// Per-call traversal state.
struct Traversal<'a> {
    matcher: &'a FilterMatcher,
    tree: &'a Tree,
    max_depth: usize,
    seen: HashMap<NodeId, Visit>,
}

impl Traversal<'_> {
    fn traverse(
        &mut self,
        value: &Value,
        scope: Option<&str>,
        depth: usize,
    ) -> std::result::Result<Cleaned, EntryFailure> {
        match value {
            Value::Null => Ok(Cleaned::Null),
            Value::Bool(b) => Ok(Cleaned::Bool(*b)),
            Value::Number(n) => Ok(Cleaned::Number(n.clone())),
            Value::String(text) => Ok(Cleaned::String(repair(text.clone()))),
            Value::Sequence(id) | Value::Mapping(id) => self.traverse_node(*id, scope, depth),
            Value::Opaque(opaque) => Ok(clean_opaque(opaque)),
        }
    }

    fn traverse_node(
        &mut self,
        id: NodeId,
        scope: Option<&str>,
        depth: usize,
    ) -> std::result::Result<Cleaned, EntryFailure> {
        match self.seen.get(&id) {
            Some(Visit::Done(cleaned)) => return Ok(cleaned.clone()),
            Some(Visit::InProgress) => return Ok(Cleaned::marker(RECURSION)),
            None => {}
        }

        if depth >= self.max_depth {
            warn!(depth, scope = scope.unwrap_or(""), "depth limit reached");
            return Err(EntryFailure::Overflow);
        }

        let tree = self.tree;
        let Some(node) = tree.node(id) else {
            // Handle from a different arena.
            return Err(EntryFailure::Raised);
        };

        self.seen.insert(id, Visit::InProgress);
        let cleaned = match node {
            Node::Sequence(items) => self.clean_sequence(items, scope, depth),
            Node::Mapping(entries) => {
                Ok(Cleaned::Mapping(self.clean_mapping(entries, scope, depth).into()))
            }
        };
        match cleaned {
            Ok(cleaned) => {
                self.seen.insert(id, Visit::Done(cleaned.clone()));
                Ok(cleaned)
            }
            Err(failure) => {
                // Not a cycle: a later reference gets its own attempt.
                self.seen.remove(&id);
                Err(failure)
            }
        }
    }

    fn clean_sequence(
        &mut self,
        items: &[Value],
        scope: Option<&str>,
        depth: usize,
    ) -> std::result::Result<Cleaned, EntryFailure> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(self.traverse(item, scope, depth + 1)?);
        }
        Ok(Cleaned::Sequence(out.into()))
    }

    fn clean_mapping(
        &mut self,
        entries: &[(Key, Value)],
        scope: Option<&str>,
        depth: usize,
    ) -> Vec<(String, Cleaned)> {
        let mut out = MappingBuilder::with_capacity(entries.len());
        for (key, value) in entries {
            match self.clean_entry(key, value, scope, depth) {
                Ok((key, cleaned)) => out.insert(key, cleaned),
                Err(failure) => {
                    warn!(
                        scope = scope.unwrap_or(""),
                        marker = failure.reserved_key(),
                        "mapping entry replaced"
                    );
                    out.insert(failure.reserved_key().to_string(), Cleaned::marker(FILTERED));
                }
            }
        }
        out.finish()
    }

    fn clean_entry(
        &mut self,
        key: &Key,
        value: &Value,
        scope: Option<&str>,
        depth: usize,
    ) -> std::result::Result<(String, Cleaned), EntryFailure> {
        let key = key.to_text()?;
        let child_scope = match scope {
            Some(parent) => format!("{parent}.{key}"),
            None => key.clone(),
        };

        if self.matcher.deep_match(&key, &child_scope) {
            trace!(scope = %child_scope, "filtered");
            return Ok((key, Cleaned::marker(FILTERED)));
        }

        let cleaned = self.traverse(value, Some(&child_scope), depth + 1)?;
        Ok((key, cleaned))
    }
}

/// Render an opaque value under guard and hide default object renderings.
fn clean_opaque(opaque: &Opaque) -> Cleaned {
    let text = match opaque.render() {
        Ok(text) => text,
        Err(RenderError::Raised(_)) => RAISED.to_string(),
        Err(RenderError::Overflow) => RECURSION.to_string(),
    };

    if DEFAULT_RENDERING.is_match(&text) {
        Cleaned::marker(OBJECT)
    } else {
        Cleaned::String(repair(Text::Utf8(text)))
    }
}

/// Ordered mapping output with unique keys; a repeated key overwrites the
/// earlier value in place.
struct MappingBuilder {
    entries: Vec<(String, Cleaned)>,
    index: HashMap<String, usize>,
}

impl MappingBuilder {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    fn insert(&mut self, key: String, value: Cleaned) {
        if let Some(&i) = self.index.get(&key) {
            self.entries[i].1 = value;
            return;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
    }

    fn finish(self) -> Vec<(String, Cleaned)> {
        self.entries
    }
}
