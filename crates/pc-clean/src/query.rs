//! URL query filtering.
//!
//! Replaces the values of sensitive query parameters. Matching uses the
//! bare parameter name only; queries have no nested scope.

use crate::filter::FilterMatcher;
use crate::markers::FILTERED;
use crate::Result;
use tracing::trace;
use url::Url;

/// Filter the query string of `url`.
///
/// Returns the input untouched when there are no rules or no query. A URL
/// that cannot be parsed is an error; callers decide what to do with it.
pub fn clean_url(url: &str, matcher: &FilterMatcher) -> Result<String> {
    if matcher.rules().is_empty() {
        return Ok(url.to_string());
    }

    let mut parsed = Url::parse(url)?;
    let Some(query) = parsed.query() else {
        return Ok(url.to_string());
    };

    let cleaned = query
        .split('&')
        .map(|pair| clean_pair(pair, matcher))
        .collect::<Vec<_>>()
        .join("&");

    parsed.set_query(Some(&cleaned));
    Ok(parsed.to_string())
}

// Pairs that do not match are returned as written, including `flag`,
// `a=b=c` and the empty pair after a trailing `&`.
fn clean_pair(pair: &str, matcher: &FilterMatcher) -> String {
    let key = pair.split_once('=').map_or(pair, |(key, _)| key);
    if matcher.key_matches(key) {
        trace!(key, "query parameter filtered");
        format!("{key}={FILTERED}")
    } else {
        pair.to_string()
    }
}
