//! # Schema Model
//!
//! A [`Schema`] is the parsed form of one schema location: either a boolean
//! schema or an object whose recognized keywords are grouped into families
//! ([`NumericKeywords`], [`StringKeywords`], [`ArrayKeywords`],
//! [`ObjectKeywords`], [`GenericKeywords`], [`Applicators`], [`References`],
//! [`Metadata`]). The keyword set is the superset of every supported draft;
//! legacy spellings are normalized while parsing (`extends` joins `allOf`,
//! `dependencies` splits into `dependent_required` and `dependent_schemas`).
//!
//! Sub-schemas are held as [`SchemaId`]s into the owning
//! [`SchemaSet`](crate::SchemaSet) arena, so cyclic references are plain
//! indices and never ownership cycles.
//!
//! ## Invariants
//!
//! - A node is identified by its [`SchemaUri`]: the document it lives in and
//!   a JSON Pointer to it. A sub-schema's URI is its parent's URI with the
//!   keyword (and index or property name) appended.
//! - Boolean nodes carry no keywords.
//! - Nodes are immutable once the set hands them out. The only lazily filled
//!   field is the resolved dialect.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use indexmap::IndexMap;
use jsv_core::JsonPointer;
use once_cell::sync::OnceCell;
use serde_json::{Number, Value};
use url::Url;

use crate::dialect::Dialect;

/// Index of a node in a [`SchemaSet`](crate::SchemaSet).
///
/// Only meaningful for the set that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(pub(crate) usize);

impl SchemaId {
    /// Position of the node in its set.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Canonical identity of a schema location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaUri {
    document: Url,
    pointer: JsonPointer,
}

impl SchemaUri {
    /// A location inside `document`. Any fragment on `document` is dropped.
    pub fn new(mut document: Url, pointer: JsonPointer) -> Self {
        document.set_fragment(None);
        Self { document, pointer }
    }

    /// The URI of the containing document, without fragment.
    pub fn document(&self) -> &Url {
        &self.document
    }

    /// A URI that names no location: an unknown anchor or an unusable
    /// fragment. Never resolves to a value.
    pub(crate) fn unresolved(target: Url) -> Self {
        Self {
            document: target,
            pointer: JsonPointer::root(),
        }
    }

    /// Location of the node inside its document.
    pub fn pointer(&self) -> &JsonPointer {
        &self.pointer
    }

    /// The location of a sub-schema.
    pub fn join<I, T>(&self, tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            document: self.document.clone(),
            pointer: self.pointer.join_all(tokens),
        }
    }

    /// The full URI with the pointer as fragment.
    pub fn to_url(&self) -> Url {
        let mut url = self.document.clone();
        url.set_fragment(Some(&self.pointer.to_fragment()));
        url
    }
}

impl fmt::Display for SchemaUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.document.fragment().is_some() {
            return write!(f, "{}", self.document);
        }
        write!(f, "{}#{}", self.document, self.pointer.to_fragment())
    }
}

/// One schema location.
#[derive(Debug)]
pub struct Schema {
    pub(crate) id: SchemaId,
    pub(crate) uri: SchemaUri,
    pub(crate) body: SchemaBody,
    pub(crate) declared_dialect: Option<Dialect>,
    pub(crate) dialect: OnceCell<Dialect>,
}

/// Content of a node.
#[derive(Debug, Clone)]
pub enum SchemaBody {
    /// `true` accepts every instance, `false` none.
    Bool(bool),
    /// An object schema.
    Keywords(Box<Keywords>),
}

impl Schema {
    pub(crate) fn placeholder(id: SchemaId, uri: SchemaUri) -> Self {
        Self {
            id,
            uri,
            body: SchemaBody::Bool(true),
            declared_dialect: None,
            dialect: OnceCell::new(),
        }
    }

    /// Arena index of this node.
    pub fn id(&self) -> SchemaId {
        self.id
    }

    /// Canonical location.
    pub fn uri(&self) -> &SchemaUri {
        &self.uri
    }

    /// Boolean or keyword content.
    pub fn body(&self) -> &SchemaBody {
        &self.body
    }

    /// The keywords of an object schema; `None` for boolean schemas.
    pub fn keywords(&self) -> Option<&Keywords> {
        match &self.body {
            SchemaBody::Keywords(keywords) => Some(keywords),
            SchemaBody::Bool(_) => None,
        }
    }

    /// Returns true for the `false` schema.
    pub fn is_false(&self) -> bool {
        matches!(self.body, SchemaBody::Bool(false))
    }

    /// Returns true for the `true` schema.
    pub fn is_true(&self) -> bool {
        matches!(self.body, SchemaBody::Bool(true))
    }

    /// The dialect named by this node's own `$schema`, if any.
    pub fn declared_dialect(&self) -> Option<Dialect> {
        self.declared_dialect
    }

    /// Declares `$recursiveAnchor: true`.
    pub fn is_recursive_anchor(&self) -> bool {
        self.keywords()
            .is_some_and(|k| k.references.recursive_anchor)
    }

    /// Legacy per-property `required: true`.
    pub fn is_required(&self) -> bool {
        self.keywords().is_some_and(|k| k.object.required_flag)
    }
}

/// Every recognized keyword of an object schema.
#[derive(Debug, Clone, Default)]
pub struct Keywords {
    pub numeric: NumericKeywords,
    pub string: StringKeywords,
    pub array: ArrayKeywords,
    pub object: ObjectKeywords,
    pub generic: GenericKeywords,
    pub applicators: Applicators,
    pub references: References,
    pub metadata: Metadata,
}

/// An exclusive bound. Draft-4 and earlier spell it as a flag that modifies
/// `minimum`/`maximum`; later drafts as a standalone limit.
#[derive(Debug, Clone, PartialEq)]
pub enum Exclusive {
    Flag(bool),
    Limit(Number),
}

#[derive(Debug, Clone, Default)]
pub struct NumericKeywords {
    pub multiple_of: Option<Number>,
    pub maximum: Option<Number>,
    pub exclusive_maximum: Option<Exclusive>,
    pub minimum: Option<Number>,
    pub exclusive_minimum: Option<Exclusive>,
    /// draft-03.
    pub divisible_by: Option<Number>,
}

#[derive(Debug, Clone, Default)]
pub struct StringKeywords {
    pub max_length: Option<u64>,
    pub min_length: Option<u64>,
    pub pattern: Option<String>,
    pub format: Option<String>,
    pub content_encoding: Option<String>,
    pub content_media_type: Option<String>,
}

/// `items` as a single schema or, before 2020-12, a positional tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Items {
    Single(SchemaId),
    Tuple(Vec<SchemaId>),
}

#[derive(Debug, Clone, Default)]
pub struct ArrayKeywords {
    pub prefix_items: Option<Vec<SchemaId>>,
    pub items: Option<Items>,
    pub additional_items: Option<SchemaId>,
    pub unevaluated_items: Option<SchemaId>,
    pub max_items: Option<u64>,
    pub min_items: Option<u64>,
    pub unique_items: bool,
    pub contains: Option<SchemaId>,
    pub min_contains: Option<u64>,
    pub max_contains: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectKeywords {
    pub max_properties: Option<u64>,
    pub min_properties: Option<u64>,
    /// `required` as a list of names.
    pub required: Vec<String>,
    /// `required: true` on a property schema (draft-03).
    pub required_flag: bool,
    /// Keyed by name, in declaration order.
    pub properties: IndexMap<String, SchemaId>,
    /// Declaration order.
    pub pattern_properties: Vec<(String, SchemaId)>,
    pub additional_properties: Option<SchemaId>,
    pub unevaluated_properties: Option<SchemaId>,
    pub property_names: Option<SchemaId>,
    /// From `dependentRequired` and list- or string-valued `dependencies`.
    pub dependent_required: BTreeMap<String, Vec<String>>,
    /// From `dependentSchemas` and schema-valued `dependencies`.
    pub dependent_schemas: BTreeMap<String, SchemaId>,
}

impl ObjectKeywords {
    /// The schema declared for `name` under `properties`.
    pub fn property(&self, name: &str) -> Option<SchemaId> {
        self.properties.get(name).copied()
    }
}

/// The `type` keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSet {
    /// Primitive type names, plus `"any"` in draft-03.
    pub names: BTreeSet<String>,
    /// Inline schemas allowed as type entries in draft-03.
    pub schemas: Vec<SchemaId>,
}

#[derive(Debug, Clone, Default)]
pub struct GenericKeywords {
    /// `Some(Value::Null)` for `"const": null`.
    pub constant: Option<Value>,
    pub enumeration: Option<Vec<Value>>,
    pub types: Option<TypeSet>,
    /// draft-03 `disallow`, type names.
    pub disallow: BTreeSet<String>,
    /// draft-03 `disallow`, inline schemas.
    pub disallow_schemas: Vec<SchemaId>,
}

#[derive(Debug, Clone, Default)]
pub struct Applicators {
    pub condition: Option<SchemaId>,
    pub then_branch: Option<SchemaId>,
    pub else_branch: Option<SchemaId>,
    /// Includes draft-03 `extends`.
    pub all_of: Vec<SchemaId>,
    pub any_of: Option<Vec<SchemaId>>,
    pub one_of: Option<Vec<SchemaId>>,
    pub not: Option<SchemaId>,
}

#[derive(Debug, Clone, Default)]
pub struct References {
    pub reference: Option<SchemaId>,
    pub recursive_reference: Option<SchemaId>,
    pub recursive_anchor: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub examples: Option<Vec<Value>>,
}

/// Name of the JSON kind of `value`, as used by the `type` keyword.
pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_join_and_display() {
        let base = SchemaUri::new(
            Url::parse("https://example.com/s.json#ignored").unwrap(),
            JsonPointer::root(),
        );
        let child = base.join(["properties", "a b"]);
        assert_eq!(child.to_string(), "https://example.com/s.json#/properties/a%20b");
        assert_eq!(child.pointer().tokens(), &["properties", "a b"]);
        assert_eq!(
            child.to_url().as_str(),
            "https://example.com/s.json#/properties/a%20b"
        );
    }

    #[test]
    fn test_root_uri_has_empty_fragment() {
        let root = SchemaUri::new(Url::parse("jsv://memory/0.json").unwrap(), JsonPointer::root());
        assert_eq!(root.to_string(), "jsv://memory/0.json#");
    }

    #[test]
    fn test_placeholder_is_true() {
        let uri = SchemaUri::new(Url::parse("jsv://memory/0.json").unwrap(), JsonPointer::root());
        let node = Schema::placeholder(SchemaId(0), uri);
        assert!(node.is_true());
        assert!(node.keywords().is_none());
        assert!(!node.is_recursive_anchor());
    }

    #[test]
    fn test_property_lookup() {
        let object = ObjectKeywords {
            properties: [("b".into(), SchemaId(2)), ("a".into(), SchemaId(1))]
                .into_iter()
                .collect(),
            ..ObjectKeywords::default()
        };
        assert_eq!(object.property("b"), Some(SchemaId(2)));
        assert_eq!(object.property("c"), None);
        let order: Vec<&str> = object.properties.keys().map(String::as_str).collect();
        assert_eq!(order, ["b", "a"]);
    }
}
