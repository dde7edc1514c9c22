//! Fixed sentinel strings substituted for redacted or unsafe data.

/// Replaces a value whose key or scope matched a filter rule.
pub const FILTERED: &str = "[FILTERED]";

/// Replaces a composite that is already being cleaned (a reference cycle),
/// and keys entries whose cleaning exhausted the depth limit.
pub const RECURSION: &str = "[RECURSION]";

/// Replaces an opaque value whose text looks like a default object rendering.
pub const OBJECT: &str = "[OBJECT]";

/// Stands in for an opaque value whose rendering failed, and keys entries
/// whose key or value failed to render.
pub const RAISED: &str = "[RAISED]";

/// Every marker, in declaration order.
pub const ALL: [&str; 4] = [FILTERED, RECURSION, OBJECT, RAISED];

/// Returns whether `text` is one of the markers.
pub fn is_marker(text: &str) -> bool {
    ALL.contains(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_are_distinct() {
        for (i, a) in ALL.iter().enumerate() {
            for b in &ALL[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_is_marker() {
        assert!(is_marker("[FILTERED]"));
        assert!(is_marker(RAISED));
        assert!(!is_marker("FILTERED"));
        assert!(!is_marker(""));
    }
}
