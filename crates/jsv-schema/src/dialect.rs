//! # Dialects — Which JSON Schema Draft a Document Speaks
//!
//! The schema model parses the superset of every supported draft's keywords;
//! the dialect decides how a handful of them behave:
//!
//! - **Integer detection.** Draft-3 and draft-4 decide `"integer"` by number
//!   representation (`1.0` is not an integer); later drafts decide by value.
//! - **Content keywords.** `contentEncoding`/`contentMediaType` are assertions
//!   up to draft-7 and annotations afterwards. The list of asserting dialects
//!   is configuration data ([`DEFAULT_CONTENT_ASSERTION_DIALECTS`]), not logic.
//! - **Formats.** Several formats exist only from a given draft onwards.
//! - **Identifiers.** Draft-3/4 spell `$id` as `id`.
//!
//! ## Detection
//!
//! A root document's dialect comes from its `$schema` keyword. Documents
//! without one (or with an unrecognized URI) are fingerprinted by keywords
//! that exist in only some drafts; see [`Dialect::detect`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A supported JSON Schema dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dialect {
    /// draft-03.
    #[serde(rename = "draft-03")]
    Draft3,
    /// draft-04.
    #[serde(rename = "draft-04")]
    Draft4,
    /// draft-06.
    #[serde(rename = "draft-06")]
    Draft6,
    /// draft-07.
    #[serde(rename = "draft-07")]
    Draft7,
    /// 2019-09.
    #[serde(rename = "2019-09")]
    Draft2019_09,
    /// 2020-12.
    #[serde(rename = "2020-12")]
    Draft2020_12,
}

/// Dialects under which `contentEncoding` and `contentMediaType` assert.
pub const DEFAULT_CONTENT_ASSERTION_DIALECTS: &[Dialect] = &[
    Dialect::Draft3,
    Dialect::Draft4,
    Dialect::Draft6,
    Dialect::Draft7,
];

impl Dialect {
    /// Every supported dialect, oldest first.
    pub const ALL: [Dialect; 6] = [
        Dialect::Draft3,
        Dialect::Draft4,
        Dialect::Draft6,
        Dialect::Draft7,
        Dialect::Draft2019_09,
        Dialect::Draft2020_12,
    ];

    /// The meta-schema URI that identifies this dialect.
    pub const fn uri(self) -> &'static str {
        match self {
            Dialect::Draft3 => "http://json-schema.org/draft-03/schema#",
            Dialect::Draft4 => "http://json-schema.org/draft-04/schema#",
            Dialect::Draft6 => "http://json-schema.org/draft-06/schema#",
            Dialect::Draft7 => "http://json-schema.org/draft-07/schema#",
            Dialect::Draft2019_09 => "https://json-schema.org/draft/2019-09/schema",
            Dialect::Draft2020_12 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    /// Recognize a `$schema` value. Scheme (`http`/`https`) and a trailing
    /// empty fragment are not significant.
    pub fn from_uri(uri: &str) -> Option<Dialect> {
        let normalized = normalize_uri(uri);
        Self::ALL
            .into_iter()
            .find(|dialect| normalize_uri(dialect.uri()) == normalized)
    }

    /// Returns true if `"integer"` is decided by number representation
    /// rather than by value.
    pub fn integer_by_representation(self) -> bool {
        matches!(self, Dialect::Draft3 | Dialect::Draft4)
    }

    /// The keyword that declares a base URI in this dialect.
    pub fn id_keyword(self) -> &'static str {
        match self {
            Dialect::Draft3 | Dialect::Draft4 => "id",
            _ => "$id",
        }
    }

    /// The dialect named by a root document's `$schema`, if recognized.
    pub fn declared(root: &Value) -> Option<Dialect> {
        let declared = root.get("$schema").and_then(Value::as_str)?;
        let dialect = Dialect::from_uri(declared);
        if dialect.is_none() {
            tracing::warn!(schema = declared, "unrecognized $schema");
        }
        dialect
    }

    /// Guess a dialect from keywords that exist in only some drafts.
    ///
    /// Returns the oldest draft consistent with the keywords seen, or `None`
    /// if nothing distinguishes one draft from another.
    pub fn fingerprint(root: &Value) -> Option<Dialect> {
        let mut evidence = Evidence::default();
        evidence.scan(root);
        evidence.verdict()
    }

    /// Determine the dialect of a root document.
    ///
    /// Returns `None` when the document neither declares a known `$schema`
    /// nor contains any keyword that pins down a draft.
    pub fn detect(root: &Value) -> Option<Dialect> {
        Self::declared(root).or_else(|| Self::fingerprint(root))
    }

    /// Like [`Dialect::detect`], falling back to `default`.
    ///
    /// Draft-06 and draft-07 keywords remain valid in every later draft, so
    /// fingerprints pointing at either only rule out older drafts: a newer
    /// `default` is kept.
    pub fn detect_or(root: &Value, default: Dialect) -> Dialect {
        if let Some(declared) = Self::declared(root) {
            return declared;
        }
        match Self::fingerprint(root) {
            Some(found @ (Dialect::Draft6 | Dialect::Draft7)) if default > found => default,
            Some(found) => found,
            None => default,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}

fn normalize_uri(uri: &str) -> String {
    let uri = uri.trim_end_matches('#');
    let uri = uri
        .strip_prefix("https://")
        .or_else(|| uri.strip_prefix("http://"))
        .unwrap_or(uri);
    uri.to_string()
}

/// Keywords seen while fingerprinting, one flag per distinguishing draft.
#[derive(Debug, Default)]
struct Evidence {
    draft3: bool,
    draft4: bool,
    draft6: bool,
    draft7: bool,
    draft2019: bool,
    draft2020: bool,
}

impl Evidence {
    fn scan(&mut self, value: &Value) {
        match value {
            Value::Object(map) => {
                self.inspect(map);
                for (key, child) in map {
                    if matches!(key.as_str(), "enum" | "const" | "default" | "examples") {
                        continue;
                    }
                    self.scan(child);
                }
            }
            Value::Array(items) => items.iter().for_each(|item| self.scan(item)),
            _ => {}
        }
    }

    fn inspect(&mut self, map: &Map<String, Value>) {
        let has = |key: &str| map.contains_key(key);

        if has("prefixItems") || has("$dynamicRef") || has("$dynamicAnchor") {
            self.draft2020 = true;
        }
        if has("$recursiveRef")
            || has("$recursiveAnchor")
            || has("unevaluatedProperties")
            || has("unevaluatedItems")
            || has("dependentRequired")
            || has("dependentSchemas")
            || has("$anchor")
            || has("minContains")
            || has("maxContains")
        {
            self.draft2019 = true;
        }
        if has("extends")
            || has("disallow")
            || has("divisibleBy")
            || matches!(map.get("required"), Some(Value::Bool(_)))
            || matches!(map.get("type"), Some(Value::Array(types)) if types.iter().any(Value::is_object))
        {
            self.draft3 = true;
        }
        if matches!(map.get("exclusiveMinimum"), Some(Value::Bool(_)))
            || matches!(map.get("exclusiveMaximum"), Some(Value::Bool(_)))
            || matches!(map.get("id"), Some(Value::String(_)))
        {
            self.draft4 = true;
        }
        if has("if") || has("then") || has("else") || has("$comment") || has("contentMediaType") {
            self.draft7 = true;
        }
        if has("const")
            || has("contains")
            || has("propertyNames")
            || has("$id")
            || matches!(map.get("exclusiveMinimum"), Some(Value::Number(_)))
            || matches!(map.get("exclusiveMaximum"), Some(Value::Number(_)))
        {
            self.draft6 = true;
        }
    }

    /// Newest-draft-specific evidence wins, except that draft-3-only
    /// keywords outrank draft-4 ones, which share boolean exclusive bounds.
    fn verdict(&self) -> Option<Dialect> {
        if self.draft2020 {
            Some(Dialect::Draft2020_12)
        } else if self.draft2019 {
            Some(Dialect::Draft2019_09)
        } else if self.draft3 {
            Some(Dialect::Draft3)
        } else if self.draft4 {
            Some(Dialect::Draft4)
        } else if self.draft7 {
            Some(Dialect::Draft7)
        } else if self.draft6 {
            Some(Dialect::Draft6)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_uri_ignores_scheme_and_fragment() {
        assert_eq!(
            Dialect::from_uri("http://json-schema.org/draft-07/schema#"),
            Some(Dialect::Draft7)
        );
        assert_eq!(
            Dialect::from_uri("https://json-schema.org/draft-07/schema"),
            Some(Dialect::Draft7)
        );
        assert_eq!(
            Dialect::from_uri("https://json-schema.org/draft/2020-12/schema#"),
            Some(Dialect::Draft2020_12)
        );
        assert_eq!(Dialect::from_uri("https://example.com/custom"), None);
    }

    #[test]
    fn test_declared_schema_wins() {
        let doc = json!({"$schema": "http://json-schema.org/draft-04/schema#", "prefixItems": []});
        assert_eq!(Dialect::detect(&doc), Some(Dialect::Draft4));
    }

    #[test]
    fn test_fingerprint_draft3() {
        let doc = json!({"properties": {"a": {"type": "string", "required": true}}});
        assert_eq!(Dialect::detect(&doc), Some(Dialect::Draft3));
        let doc = json!({"type": ["string", {"type": "integer"}]});
        assert_eq!(Dialect::detect(&doc), Some(Dialect::Draft3));
    }

    #[test]
    fn test_fingerprint_draft4() {
        let doc = json!({"minimum": 0, "exclusiveMinimum": true});
        assert_eq!(Dialect::detect(&doc), Some(Dialect::Draft4));
    }

    #[test]
    fn test_fingerprint_newer_drafts() {
        assert_eq!(Dialect::detect(&json!({"const": 1})), Some(Dialect::Draft6));
        assert_eq!(
            Dialect::detect(&json!({"if": {}, "then": {}})),
            Some(Dialect::Draft7)
        );
        assert_eq!(
            Dialect::detect(&json!({"$recursiveAnchor": true})),
            Some(Dialect::Draft2019_09)
        );
        assert_eq!(
            Dialect::detect(&json!({"prefixItems": [true]})),
            Some(Dialect::Draft2020_12)
        );
    }

    #[test]
    fn test_fingerprint_ignores_enum_values() {
        let doc = json!({"enum": [{"prefixItems": 1}], "default": {"extends": 2}});
        assert_eq!(Dialect::detect(&doc), None);
    }

    #[test]
    fn test_no_evidence() {
        assert_eq!(Dialect::detect(&json!({"type": "string"})), None);
        assert_eq!(Dialect::detect(&json!(true)), None);
    }

    #[test]
    fn test_detect_or_keeps_newer_default() {
        let doc = json!({"$id": "https://example.com/s", "const": 1});
        assert_eq!(Dialect::detect_or(&doc, Dialect::Draft2020_12), Dialect::Draft2020_12);
        assert_eq!(Dialect::detect_or(&doc, Dialect::Draft4), Dialect::Draft6);
        let legacy = json!({"divisibleBy": 2});
        assert_eq!(Dialect::detect_or(&legacy, Dialect::Draft2020_12), Dialect::Draft3);
        assert_eq!(Dialect::detect_or(&json!({}), Dialect::Draft7), Dialect::Draft7);
    }

    #[test]
    fn test_integer_by_representation() {
        assert!(Dialect::Draft3.integer_by_representation());
        assert!(Dialect::Draft4.integer_by_representation());
        assert!(!Dialect::Draft6.integer_by_representation());
        assert!(!Dialect::Draft2020_12.integer_by_representation());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_value(Dialect::Draft7).unwrap(), json!("draft-07"));
        let d: Dialect = serde_json::from_value(json!("2019-09")).unwrap();
        assert_eq!(d, Dialect::Draft2019_09);
    }
}
