//! Literal-string redaction over plain text and arbitrary JSON values.

use regex::bytes::{NoExpand, Regex};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

/// Placeholder substituted for every redacted occurrence.
pub const SENTINEL: &str = "[FILTERED]";

/// Ordered set of literal strings that must never reach the agent.
///
/// Matching is a case-sensitive substring search. Filters are applied one
/// after another in configured order, so a later filter also sees text
/// produced by an earlier replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    filters: Vec<String>,
}

/// Result of redacting a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionOutcome {
    /// The text with every filter occurrence replaced by [`SENTINEL`].
    pub content: String,
    /// Whether any filter was found.
    pub matched: bool,
}

impl FilterSet {
    /// Builds a set from literal strings; empty strings are dropped.
    pub fn new<I, S>(filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            filters: filters
                .into_iter()
                .map(Into::into)
                .filter(|f| !f.is_empty())
                .collect(),
        }
    }

    /// Parses the newline-delimited filter file format: each line trimmed,
    /// blank lines dropped, order preserved.
    pub fn parse(contents: &str) -> Self {
        Self::new(contents.lines().map(str::trim))
    }

    /// Loads the filter file. A missing or unreadable file yields an empty
    /// set, which disables redaction.
    pub fn load(path: &Path) -> Self {
        match std::fs::read(path) {
            Ok(bytes) => {
                let set = Self::parse(&String::from_utf8_lossy(&bytes));
                debug!(path = %path.display(), filters = set.len(), "Loaded filter file");
                set
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No filter file");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Filter file unreadable, redaction disabled");
                Self::default()
            }
        }
    }

    /// True when no filters are configured.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Iterates over the filters in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(String::as_str)
    }

    /// True when `text` contains at least one filter.
    pub fn contains_any(&self, text: &str) -> bool {
        self.iter().any(|f| text.contains(f))
    }

    /// Replaces every occurrence of every filter with [`SENTINEL`].
    pub fn redact_text(&self, text: &str) -> RedactionOutcome {
        let mut content = text.to_string();
        let mut matched = false;
        for filter in self.iter() {
            if content.contains(filter) {
                matched = true;
                content = content.replace(filter, SENTINEL);
            }
        }
        RedactionOutcome { content, matched }
    }

    /// Redacts a raw byte stream. Valid UTF-8 goes through [`Self::redact_text`];
    /// anything else is matched byte-wise so non-text content passes through
    /// unaltered apart from the replacements.
    pub fn redact_bytes(&self, data: &[u8]) -> Vec<u8> {
        if let Ok(text) = std::str::from_utf8(data) {
            return self.redact_text(text).content.into_bytes();
        }
        let mut out = data.to_vec();
        for filter in self.iter() {
            match Regex::new(&regex::escape(filter)) {
                Ok(literal) => {
                    out = literal
                        .replace_all(&out, NoExpand(SENTINEL.as_bytes()))
                        .into_owned();
                }
                Err(e) => warn!(error = %e, "Filter too large to match as bytes"),
            }
        }
        out
    }

    /// Redacts every string leaf of `value`, preserving its shape: object keys,
    /// array lengths and order, and non-string leaves are left as they are.
    pub fn redact_value(&self, value: &Value) -> Value {
        if self.is_empty() {
            return value.clone();
        }
        match value {
            Value::String(s) => Value::String(self.redact_text(s).content),
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.redact_value(item)).collect())
            }
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), self.redact_value(item)))
                    .collect(),
            ),
            Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_drops_blank_lines() {
        let set = FilterSet::parse("alpha\n\n   \n  beta  \r\ngamma\n");
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_new_drops_empty_filters() {
        let set = FilterSet::new(["", "x"]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_redact_text_replaces_all_occurrences() {
        let set = FilterSet::new(["secret"]);
        let out = set.redact_text("secret and secret again");
        assert!(out.matched);
        assert_eq!(out.content, "[FILTERED] and [FILTERED] again");
    }

    #[test]
    fn test_redact_text_is_case_sensitive() {
        let set = FilterSet::new(["Secret"]);
        let out = set.redact_text("secret SECRET");
        assert!(!out.matched);
        assert_eq!(out.content, "secret SECRET");
    }

    #[test]
    fn test_redact_text_is_sequential() {
        // the first replacement joins "ab" and "cd" into a new occurrence
        let set = FilterSet::new(["XX", "b[FILTERED]c"]);
        let out = set.redact_text("abXXcd");
        assert_eq!(out.content, "a[FILTERED]d");
    }

    #[test]
    fn test_redact_bytes() {
        let set = FilterSet::new(["key"]);
        assert_eq!(set.redact_bytes(b"a key b"), b"a [FILTERED] b".to_vec());
        let binary = [0xff, b'k', b'e', b'y', 0xfe, b'\n'];
        let mut expected = vec![0xff];
        expected.extend_from_slice(SENTINEL.as_bytes());
        expected.extend_from_slice(&[0xfe, b'\n']);
        assert_eq!(set.redact_bytes(&binary), expected);
    }

    #[test]
    fn test_empty_set_never_matches() {
        let set = FilterSet::default();
        assert!(set.is_empty());
        assert!(!set.contains_any("anything"));
        let out = set.redact_text("anything");
        assert!(!out.matched);
        assert_eq!(out.content, "anything");
    }

    #[test]
    fn test_redact_value_preserves_shape() {
        let set = FilterSet::new(["tok3n"]);
        let input = json!({
            "text": "the tok3n is here",
            "count": 3,
            "ok": true,
            "none": null,
            "items": ["tok3n", {"nested": "a tok3n b"}, 1.5],
        });
        let out = set.redact_value(&input);
        assert_eq!(
            out,
            json!({
                "text": "the [FILTERED] is here",
                "count": 3,
                "ok": true,
                "none": null,
                "items": ["[FILTERED]", {"nested": "a [FILTERED] b"}, 1.5],
            })
        );
    }

    #[test]
    fn test_redact_value_keys_untouched() {
        let set = FilterSet::new(["key"]);
        let out = set.redact_value(&json!({"key": "key"}));
        assert_eq!(out, json!({"key": "[FILTERED]"}));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(FilterSet::load(&tmp.path().join("absent.txt")).is_empty());
    }

    #[test]
    fn test_load_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("filters.txt");
        std::fs::write(&path, "one\n\ntwo\n").unwrap();
        assert_eq!(FilterSet::load(&path), FilterSet::new(["one", "two"]));
    }
}
