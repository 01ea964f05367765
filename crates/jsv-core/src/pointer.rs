//! # JSON Pointers (RFC 6901)
//!
//! `JsonPointer` addresses a value inside a JSON document as a list of
//! unescaped reference tokens. It is used for instance locations reported in
//! validation errors and for schema locations inside a document, where it is
//! carried in the fragment of the schema's canonical URI.
//!
//! Escaping (`~0`, `~1`) is applied only when rendering, and URI fragment
//! percent-encoding only in [`JsonPointer::to_fragment`] /
//! [`JsonPointer::from_fragment`].

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::PointerError;

/// A parsed JSON Pointer. The empty pointer addresses the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsonPointer(Vec<String>);

impl JsonPointer {
    /// The pointer to the document root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse RFC 6901 text such as `/definitions/a~1b`.
    pub fn parse(text: &str) -> Result<Self, PointerError> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = text.strip_prefix('/') else {
            return Err(PointerError::MissingLeadingSlash(text.to_string()));
        };
        rest.split('/')
            .map(|token| unescape(token).ok_or_else(|| PointerError::InvalidEscape(text.to_string())))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Parse the raw (percent-encoded) fragment of a URI.
    pub fn from_fragment(fragment: &str) -> Result<Self, PointerError> {
        let decoded = percent_decode(fragment)
            .ok_or_else(|| PointerError::InvalidPercentEncoding(fragment.to_string()))?;
        Self::parse(&decoded)
    }

    /// Returns a new pointer with `token` appended.
    pub fn join(&self, token: impl Into<String>) -> Self {
        let mut tokens = self.0.clone();
        tokens.push(token.into());
        Self(tokens)
    }

    /// Returns a new pointer with each of `tokens` appended in order.
    pub fn join_all<I, T>(&self, tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut joined = self.0.clone();
        joined.extend(tokens.into_iter().map(Into::into));
        Self(joined)
    }

    /// Returns the pointer one level up, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, head) = self.0.split_last()?;
        Some(Self(head.to_vec()))
    }

    /// The unescaped reference tokens.
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    /// Returns true for the empty pointer.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if `prefix` addresses this location or one of its ancestors.
    pub fn starts_with(&self, prefix: &JsonPointer) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Locate the addressed value in `document`.
    ///
    /// Array tokens must be canonical decimal indices (`0`, `12`, not `01`).
    pub fn resolve<'v>(&self, document: &'v Value) -> Option<&'v Value> {
        self.0.iter().try_fold(document, |current, token| match current {
            Value::Object(map) => map.get(token),
            Value::Array(items) => parse_index(token).and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Render as a URI fragment (without the leading `#`), percent-encoding
    /// characters that may not appear in a fragment.
    pub fn to_fragment(&self) -> String {
        percent_encode(&self.to_string())
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.0 {
            write!(f, "/{}", escape(token))?;
        }
        Ok(())
    }
}

impl Serialize for JsonPointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JsonPointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape(token: &str) -> Option<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Characters left as-is in a fragment. Everything else is `%XX`-encoded.
fn is_fragment_safe(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'-' | b'.' | b'_' | b'~' | b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+'
                | b',' | b';' | b'=' | b':' | b'@' | b'/' | b'?'
        )
}

fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for b in text.bytes() {
        if is_fragment_safe(b) {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

fn percent_decode(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = text.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_and_display_round_trip() {
        let p = JsonPointer::parse("/definitions/a~1b/c~0d").unwrap();
        assert_eq!(p.tokens(), &["definitions", "a/b", "c~d"]);
        assert_eq!(p.to_string(), "/definitions/a~1b/c~0d");
    }

    #[test]
    fn test_root() {
        let p = JsonPointer::parse("").unwrap();
        assert!(p.is_root());
        assert_eq!(p.to_string(), "");
        assert_eq!(p.parent(), None);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            JsonPointer::parse("a/b"),
            Err(PointerError::MissingLeadingSlash("a/b".into()))
        );
        assert!(matches!(
            JsonPointer::parse("/a~2"),
            Err(PointerError::InvalidEscape(_))
        ));
    }

    #[test]
    fn test_resolve() {
        let doc = json!({"a": [10, {"b/c": true}], "": 5});
        let p = JsonPointer::root().join("a").join("1").join("b/c");
        assert_eq!(p.resolve(&doc), Some(&json!(true)));
        assert_eq!(JsonPointer::parse("/").unwrap().resolve(&doc), Some(&json!(5)));
        assert_eq!(JsonPointer::parse("/a/01").unwrap().resolve(&doc), None);
        assert_eq!(JsonPointer::parse("/a/9").unwrap().resolve(&doc), None);
        assert_eq!(JsonPointer::root().resolve(&doc), Some(&doc));
    }

    #[test]
    fn test_fragment_encoding() {
        let p = JsonPointer::root().join("properties").join("a b%\"c");
        let fragment = p.to_fragment();
        assert_eq!(fragment, "/properties/a%20b%25%22c");
        assert_eq!(JsonPointer::from_fragment(&fragment).unwrap(), p);
    }

    #[test]
    fn test_fragment_unicode() {
        let p = JsonPointer::root().join("prop\u{00e9}");
        assert_eq!(JsonPointer::from_fragment(&p.to_fragment()).unwrap(), p);
    }

    #[test]
    fn test_invalid_percent_encoding() {
        assert!(matches!(
            JsonPointer::from_fragment("/a%2"),
            Err(PointerError::InvalidPercentEncoding(_))
        ));
    }

    #[test]
    fn test_starts_with_and_parent() {
        let p = JsonPointer::parse("/a/b/c").unwrap();
        assert!(p.starts_with(&JsonPointer::parse("/a").unwrap()));
        assert!(!p.starts_with(&JsonPointer::parse("/b").unwrap()));
        assert_eq!(p.parent(), Some(JsonPointer::parse("/a/b").unwrap()));
    }

    #[test]
    fn test_join_all() {
        let p = JsonPointer::root().join_all(["items", "0"]);
        assert_eq!(p.to_string(), "/items/0");
    }

    #[test]
    fn test_serde_as_string() {
        let p = JsonPointer::parse("/x/0").unwrap();
        assert_eq!(serde_json::to_value(&p).unwrap(), json!("/x/0"));
        let back: JsonPointer = serde_json::from_value(json!("/x/0")).unwrap();
        assert_eq!(back, p);
    }
}
