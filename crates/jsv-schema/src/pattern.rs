//! Pluggable regular expressions for `pattern`, `patternProperties` and the
//! `regex` format.
//!
//! Matching has search semantics: a pattern matches if it matches anywhere in
//! the input, so `"^a"` must be anchored explicitly. A pattern the engine
//! cannot compile is reported as [`InvalidPattern`]; the validator logs it and
//! skips the check instead of failing the instance.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use regex::Regex;
use thiserror::Error;

/// The pattern text could not be compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid regular expression {pattern:?}: {reason}")]
pub struct InvalidPattern {
    /// The pattern as written in the schema.
    pub pattern: String,
    /// Engine diagnostic.
    pub reason: String,
}

/// A compiled pattern.
pub trait Matcher: Send + Sync {
    /// Returns true if the pattern matches somewhere in `input`.
    fn matches(&self, input: &str) -> bool;
}

impl Matcher for Regex {
    fn matches(&self, input: &str) -> bool {
        self.is_match(input)
    }
}

/// Compiles pattern text into [`Matcher`]s.
pub trait PatternMatcher: Send + Sync {
    /// Compile `pattern`.
    fn compile(&self, pattern: &str) -> Result<Arc<dyn Matcher>, InvalidPattern>;
}

/// Default [`PatternMatcher`] backed by the `regex` crate.
///
/// Compiled patterns, and patterns found to be invalid, are cached for the
/// lifetime of the matcher. The cache is shared across threads.
#[derive(Default)]
pub struct RegexMatcher {
    cache: RwLock<HashMap<String, Result<Arc<Regex>, InvalidPattern>>>,
}

impl RegexMatcher {
    /// Create a matcher with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct patterns compiled so far.
    pub fn cached(&self) -> usize {
        self.cache.read().map(|cache| cache.len()).unwrap_or(0)
    }

    fn build(pattern: &str) -> Result<Arc<Regex>, InvalidPattern> {
        Regex::new(pattern).map(Arc::new).map_err(|e| InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Debug for RegexMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexMatcher")
            .field("cached", &self.cached())
            .finish()
    }
}

impl PatternMatcher for RegexMatcher {
    fn compile(&self, pattern: &str) -> Result<Arc<dyn Matcher>, InvalidPattern> {
        if let Ok(cache) = self.cache.read() {
            if let Some(entry) = cache.get(pattern) {
                return entry.clone().map(|regex| regex as Arc<dyn Matcher>);
            }
        }
        let entry = Self::build(pattern);
        // A poisoned lock only costs the cache entry.
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(pattern.to_string(), entry.clone());
        }
        entry.map(|regex| regex as Arc<dyn Matcher>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_semantics() {
        let matcher = RegexMatcher::new();
        let m = matcher.compile("b+").unwrap();
        assert!(m.matches("abbbc"));
        assert!(!m.matches("ac"));
        let anchored = matcher.compile("^b").unwrap();
        assert!(!anchored.matches("ab"));
    }

    #[test]
    fn test_invalid_pattern() {
        let matcher = RegexMatcher::new();
        let err = matcher.compile("([a-z]").err().unwrap();
        assert_eq!(err.pattern, "([a-z]");
        assert!(!err.reason.is_empty());
    }

    #[test]
    fn test_cache_holds_valid_and_invalid_entries() {
        let matcher = RegexMatcher::new();
        matcher.compile("^x$").unwrap();
        matcher.compile("^x$").unwrap();
        assert!(matcher.compile("(").is_err());
        assert!(matcher.compile("(").is_err());
        assert_eq!(matcher.cached(), 2);
    }

    #[test]
    fn test_unicode_classes() {
        let matcher = RegexMatcher::new();
        let m = matcher.compile(r"^\p{L}+$").unwrap();
        assert!(m.matches("\u{00e9}t\u{00e9}"));
        assert!(!m.matches("abc1"));
    }
}
