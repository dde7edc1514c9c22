//! Filter matching.
//!
//! Decides whether a key, or the scope a key lives under, is sensitive.
//! Literal rules match by substring containment, pattern rules by regex
//! search. A scope must also start with one of the configured prefixes
//! before anything under it can be filtered.

use crate::{CleanError, Result};
use regex::Regex;
use tracing::trace;

/// Leading scope segment stripped when retrying scope-aware patterns.
///
/// Pattern rules authored against flattened parameter names (for example
/// `^user\.password`) do not expect the nested path built by the cleaner.
pub const REQUEST_PARAMS_PREFIX: &str = "request.params.";

/// A single filter rule.
#[derive(Debug, Clone)]
pub enum FilterRule {
    /// Matches any text containing this fragment.
    Literal(String),
    /// Matches any text the regex finds a match in.
    Pattern(Regex),
}

impl FilterRule {
    /// Create a literal rule.
    pub fn literal(fragment: impl Into<String>) -> Self {
        FilterRule::Literal(fragment.into())
    }

    /// Compile a pattern rule.
    pub fn pattern(source: &str) -> Result<Self> {
        Regex::new(source)
            .map(FilterRule::Pattern)
            .map_err(|e| CleanError::PatternError(format!("{source}: {e}")))
    }

    /// Test the rule against a key or scope.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            FilterRule::Literal(fragment) => text.contains(fragment.as_str()),
            FilterRule::Pattern(re) => re.is_match(text),
        }
    }

    /// Whether this rule targets a dotted path rather than a bare key.
    ///
    /// Only patterns containing an escaped dot (`\.`) qualify.
    pub fn is_scope_aware(&self) -> bool {
        match self {
            FilterRule::Literal(_) => false,
            FilterRule::Pattern(re) => re.as_str().contains(r"\."),
        }
    }
}

impl From<&str> for FilterRule {
    fn from(fragment: &str) -> Self {
        FilterRule::Literal(fragment.to_string())
    }
}

impl From<String> for FilterRule {
    fn from(fragment: String) -> Self {
        FilterRule::Literal(fragment)
    }
}

impl From<Regex> for FilterRule {
    fn from(re: Regex) -> Self {
        FilterRule::Pattern(re)
    }
}

/// Whether any rule matches `key`.
pub fn key_matches(key: &str, rules: &[FilterRule]) -> bool {
    rules.iter().any(|rule| rule.matches(key))
}

/// Whether `scope` starts with at least one of `prefixes`.
///
/// Always false for an empty prefix set.
pub fn scope_is_filterable<S: AsRef<str>>(scope: &str, prefixes: &[S]) -> bool {
    prefixes.iter().any(|prefix| scope.starts_with(prefix.as_ref()))
}

/// Immutable rule set plus the scope prefixes that gate it.
#[derive(Debug, Clone, Default)]
pub struct FilterMatcher {
    rules: Vec<FilterRule>,
    scope_prefixes: Vec<String>,
    deep_filters: bool,
}

impl FilterMatcher {
    /// Build a matcher. Scope awareness of the rules is computed once here.
    pub fn new(rules: Vec<FilterRule>, scope_prefixes: Vec<String>) -> Self {
        let deep_filters = rules.iter().any(FilterRule::is_scope_aware);
        Self {
            rules,
            scope_prefixes,
            deep_filters,
        }
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    pub fn scope_prefixes(&self) -> &[String] {
        &self.scope_prefixes
    }

    /// Whether at least one rule is scope-aware.
    pub fn has_deep_filters(&self) -> bool {
        self.deep_filters
    }

    /// Whether any rule matches `key`.
    pub fn key_matches(&self, key: &str) -> bool {
        key_matches(key, &self.rules)
    }

    /// Whether `scope` is eligible for filtering at all.
    pub fn scope_is_filterable(&self, scope: &str) -> bool {
        scope_is_filterable(scope, &self.scope_prefixes)
    }

    /// Decide whether the value stored under `key` at `scope` is filtered.
    ///
    /// `scope` is the full path of the key itself. When a scope-aware rule
    /// exists, the scope is also tested verbatim and with
    /// [`REQUEST_PARAMS_PREFIX`] stripped.
    pub fn deep_match(&self, key: &str, scope: &str) -> bool {
        if !self.scope_is_filterable(scope) {
            return false;
        }
        if self.key_matches(key) {
            return true;
        }
        if !self.deep_filters {
            return false;
        }

        let short = scope.strip_prefix(REQUEST_PARAMS_PREFIX).unwrap_or(scope);
        let matched = self.key_matches(scope) || self.key_matches(short);
        if matched {
            trace!(scope, "scope matched a scope-aware filter");
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(rules: Vec<FilterRule>, prefixes: &[&str]) -> FilterMatcher {
        FilterMatcher::new(rules, prefixes.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn test_literal_substring() {
        let rules = vec![FilterRule::literal("pass")];
        assert!(key_matches("password", &rules));
        assert!(key_matches("user_passphrase", &rules));
        assert!(!key_matches("PASSWORD", &rules));
        assert!(!key_matches("name", &rules));
    }

    #[test]
    fn test_pattern_search() {
        let rules = vec![FilterRule::pattern("(?i)secret").unwrap()];
        assert!(key_matches("client_SECRET", &rules));
        assert!(!key_matches("public", &rules));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = FilterRule::pattern("(unclosed").unwrap_err();
        assert!(matches!(err, CleanError::PatternError(_)));
    }

    #[test]
    fn test_empty_rules_match_nothing() {
        assert!(!key_matches("password", &[]));
    }

    #[test]
    fn test_scope_is_filterable() {
        assert!(scope_is_filterable("request.params.x", &["request.params"]));
        assert!(!scope_is_filterable("other.x", &["request.params"]));
        assert!(!scope_is_filterable::<&str>("request.params.x", &[]));
        assert!(!scope_is_filterable::<&str>("", &[]));
    }

    #[test]
    fn test_scope_awareness() {
        assert!(FilterRule::pattern(r"params\.secret").unwrap().is_scope_aware());
        assert!(!FilterRule::pattern("params.secret").unwrap().is_scope_aware());
        assert!(!FilterRule::literal(r"a\.b").is_scope_aware());
    }

    #[test]
    fn test_deep_match_requires_filterable_scope() {
        let m = matcher(vec!["password".into()], &["request.params"]);
        assert!(m.deep_match("password", "request.params.password"));
        assert!(!m.deep_match("password", "other.password"));
    }

    #[test]
    fn test_deep_match_empty_prefixes_filter_nothing() {
        let m = matcher(vec!["password".into()], &[]);
        assert!(!m.deep_match("password", "password"));
    }

    #[test]
    fn test_deep_match_scope_fallback() {
        let rule = FilterRule::pattern(r"params\.secret").unwrap();
        let m = matcher(vec![rule], &["request"]);
        assert!(m.has_deep_filters());
        assert!(m.deep_match("secret", "request.params.secret"));
        assert!(!m.deep_match("secret", "request.headers.secret"));
    }

    #[test]
    fn test_deep_match_strips_request_params() {
        let rule = FilterRule::pattern(r"^user\.password$").unwrap();
        let m = matcher(vec![rule], &["request.params"]);
        assert!(m.deep_match("password", "request.params.user.password"));
        assert!(!m.deep_match("password", "request.params.admin.password"));
    }

    #[test]
    fn test_scope_not_tested_without_deep_filters() {
        // A plain literal that only appears in the scope path.
        let m = matcher(vec!["params".into()], &["request"]);
        assert!(!m.has_deep_filters());
        assert!(!m.deep_match("name", "request.params.name"));
    }
}
