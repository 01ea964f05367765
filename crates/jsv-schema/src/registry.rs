//! # Schema Registry
//!
//! [`SchemaSet`] owns every loaded document and every built [`Schema`] node.
//! Nodes live in an arena and refer to each other by [`SchemaId`]; the set is
//! the only place that creates them.
//!
//! ## Resolution
//!
//! A URI is located in three steps:
//!
//! 1. A plain-name fragment (`#foo`) is looked up among the anchors declared
//!    with `$anchor` or a fragment-only `$id`.
//! 2. The URI without fragment is looked up among the base URIs declared by
//!    embedded `$id`s (`id` in draft-03/04), then among loaded documents.
//!    Unknown documents are fetched through the [`DocumentSource`].
//! 3. A JSON Pointer fragment is appended to the location found in step 2.
//!
//! The result is a [`SchemaUri`]: document plus pointer. Two URIs that reach
//! the same place resolve to the same node.
//!
//! ## Invariants
//!
//! - One node per [`SchemaUri`]. A node is indexed before its keywords are
//!   parsed, so a reference cycle finds the half-built node instead of
//!   recursing.
//! - A node has at most one structural parent (the node whose keyword
//!   contains it). `$ref` targets are not children of the referrer.
//! - A failed [`SchemaSet::resolve`] removes every node it created.

use std::collections::HashMap;
use std::fmt;
use std::ops::Index;
use std::path::Path;
use std::sync::Arc;

use jsv_core::JsonPointer;
use serde_json::Value;
use url::Url;

use crate::dialect::Dialect;
use crate::error::{SchemaError, ValidationViolations};
use crate::schema::{Schema, SchemaId, SchemaUri};
use crate::source::{DocumentSource, FileSource, SourceError};
use crate::validator::{ValidationOptions, Validator};

/// A loaded document and its detected dialect.
#[derive(Debug)]
pub(crate) struct Document {
    pub(crate) value: Value,
    pub(crate) dialect: Dialect,
}

/// Registry of schema documents and the nodes built from them.
pub struct SchemaSet {
    source: Box<dyn DocumentSource>,
    default_dialect: Dialect,
    documents: HashMap<Url, Arc<Document>>,
    unavailable: HashMap<Url, SourceError>,
    /// Embedded base URIs and named anchors.
    locations: HashMap<Url, SchemaUri>,
    pub(crate) nodes: Vec<Schema>,
    pub(crate) index: HashMap<SchemaUri, SchemaId>,
    parents: HashMap<SchemaId, SchemaId>,
    anonymous: usize,
}

impl fmt::Debug for SchemaSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaSet")
            .field("default_dialect", &self.default_dialect)
            .field("documents", &self.documents.len())
            .field("nodes", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

impl Default for SchemaSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaSet {
    /// A set that reads `file:` URIs from disk.
    pub fn new() -> Self {
        Self::with_source(FileSource)
    }

    /// A set that fetches documents from `source`.
    pub fn with_source(source: impl DocumentSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            default_dialect: Dialect::Draft2020_12,
            documents: HashMap::new(),
            unavailable: HashMap::new(),
            locations: HashMap::new(),
            nodes: Vec::new(),
            index: HashMap::new(),
            parents: HashMap::new(),
            anonymous: 0,
        }
    }

    /// Dialect assumed for documents that neither declare nor imply one.
    ///
    /// Only affects documents loaded afterwards.
    pub fn with_default_dialect(mut self, dialect: Dialect) -> Self {
        self.default_dialect = dialect;
        self
    }

    /// The configured fallback dialect.
    pub fn default_dialect(&self) -> Dialect {
        self.default_dialect
    }

    /// Register an in-memory document under `uri`. Returns the parsed URI.
    ///
    /// Replaces a document previously registered under the same URI; nodes
    /// already built from the old document are kept.
    pub fn add_document(&mut self, uri: &str, value: Value) -> Result<Url, SchemaError> {
        let mut url = parse_uri(uri)?;
        url.set_fragment(None);
        self.insert_document(url.clone(), value);
        Ok(url)
    }

    /// Register `value` as a new document and build its root schema.
    ///
    /// The document is addressed by its `$id` (`id` in draft-03/04) when that
    /// is an absolute URI, otherwise by a generated `jsv://memory/` URI.
    pub fn load_value(&mut self, value: Value) -> Result<SchemaId, SchemaError> {
        let declared = ["$id", "id"]
            .into_iter()
            .filter_map(|keyword| value.get(keyword).and_then(Value::as_str))
            .find_map(|id| Url::parse(id).ok());
        let url = match declared {
            Some(mut url) => {
                url.set_fragment(None);
                url
            }
            None => {
                let url = parse_uri(&format!("jsv://memory/{}.json", self.anonymous))?;
                self.anonymous += 1;
                url
            }
        };
        self.insert_document(url.clone(), value);
        self.resolve_url(&url)
    }

    /// Build the schema stored in a file.
    pub fn load_path(&mut self, path: &Path) -> Result<SchemaId, SchemaError> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| SchemaError::InvalidUri {
                    uri: path.display().to_string(),
                    reason: e.to_string(),
                })?
                .join(path)
        };
        let url = Url::from_file_path(&absolute).map_err(|()| SchemaError::InvalidUri {
            uri: path.display().to_string(),
            reason: "not a valid file path".to_string(),
        })?;
        self.resolve_url(&url)
    }

    /// Build (or look up) the schema at `uri`.
    pub fn resolve(&mut self, uri: &str) -> Result<SchemaId, SchemaError> {
        let url = parse_uri(uri)?;
        self.resolve_url(&url)
    }

    /// Build (or look up) the schema at `url`.
    ///
    /// Fails if the containing document cannot be loaded, if any reachable
    /// location is not a schema, or if an `examples` entry is invalid. On
    /// failure no node built by this call remains in the set.
    pub fn resolve_url(&mut self, url: &Url) -> Result<SchemaId, SchemaError> {
        let location = self.locate(url);
        let mut document = url.clone();
        document.set_fragment(None);
        if !self.documents.contains_key(&document) && !self.locations.contains_key(&document) {
            let source = self
                .unavailable
                .get(&document)
                .cloned()
                .unwrap_or_else(|| SourceError::NotFound {
                    uri: document.to_string(),
                });
            return Err(SchemaError::DocumentUnavailable {
                uri: document.to_string(),
                source,
            });
        }

        let mark = self.nodes.len();
        let result = self
            .build(location)
            .and_then(|id| self.verify_examples(mark).map(|()| id));
        if result.is_err() {
            self.rollback(mark);
        }
        result
    }

    /// The raw JSON value at `url`, loading its document if needed.
    pub fn raw_value(&mut self, url: &Url) -> Option<Value> {
        let location = self.locate(url);
        self.documents
            .get(location.document())
            .and_then(|document| location.pointer().resolve(&document.value))
            .cloned()
    }

    /// The dialect of the document at `url`, loading it if needed.
    pub fn document_dialect(&mut self, url: &Url) -> Result<Dialect, SchemaError> {
        let mut document = url.clone();
        document.set_fragment(None);
        self.ensure_document(&document)
            .map_err(|source| SchemaError::DocumentUnavailable {
                uri: document.to_string(),
                source,
            })?;
        Ok(self
            .documents
            .get(&document)
            .map_or(self.default_dialect, |d| d.dialect))
    }

    /// The node with this id.
    pub fn get(&self, id: SchemaId) -> Option<&Schema> {
        self.nodes.get(id.0)
    }

    /// The id of an already built node.
    pub fn lookup(&self, uri: &SchemaUri) -> Option<SchemaId> {
        self.index.get(uri).copied()
    }

    /// The node whose keyword directly contains `id`.
    pub fn parent(&self, id: SchemaId) -> Option<SchemaId> {
        self.parents.get(&id).copied()
    }

    /// The dialect governing node `id`: its own `$schema` if declared, else
    /// its document's. Computed once per node.
    pub fn dialect(&self, id: SchemaId) -> Dialect {
        let Some(node) = self.nodes.get(id.0) else {
            return self.default_dialect;
        };
        *node.dialect.get_or_init(|| {
            node.declared_dialect
                .or_else(|| {
                    self.documents
                        .get(node.uri.document())
                        .map(|document| document.dialect)
                })
                .unwrap_or(self.default_dialect)
        })
    }

    /// Number of built nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node has been built.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All built nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Schema> {
        self.nodes.iter()
    }

    pub(crate) fn assign_parent(
        &mut self,
        child: SchemaId,
        parent: SchemaId,
    ) -> Result<(), SchemaError> {
        match self.parents.get(&child) {
            Some(&existing) if existing != parent => Err(SchemaError::ParentAlreadyAssigned {
                child: self.describe(child),
                existing: self.describe(existing),
                parent: self.describe(parent),
            }),
            Some(_) => Ok(()),
            None => {
                self.parents.insert(child, parent);
                Ok(())
            }
        }
    }

    fn describe(&self, id: SchemaId) -> String {
        self.nodes
            .get(id.0)
            .map_or_else(|| id.to_string(), |node| node.uri.to_string())
    }

    pub(crate) fn document(&self, url: &Url) -> Option<Arc<Document>> {
        self.documents.get(url).cloned()
    }

    /// Map a URI to the canonical location it names.
    ///
    /// Never fails: a location that cannot be found yields a URI that
    /// resolves to nothing, for which the builder synthesizes a permissive
    /// node.
    pub(crate) fn locate(&mut self, target: &Url) -> SchemaUri {
        if let Some(location) = self.locations.get(target) {
            return location.clone();
        }
        let mut document = target.clone();
        document.set_fragment(None);
        let fragment = target.fragment().unwrap_or("");

        if !fragment.is_empty() && !fragment.starts_with('/') {
            self.ensure_document(&document).ok();
            return match self.locations.get(target) {
                Some(location) => location.clone(),
                None => {
                    tracing::warn!(uri = %target, "unknown anchor");
                    SchemaUri::unresolved(target.clone())
                }
            };
        }

        let pointer = match JsonPointer::from_fragment(fragment) {
            Ok(pointer) => pointer,
            Err(e) => {
                tracing::warn!(uri = %target, error = %e, "unusable fragment");
                return SchemaUri::unresolved(target.clone());
            }
        };
        let base = match self.locations.get(&document) {
            Some(location) => location.clone(),
            None => {
                self.ensure_document(&document).ok();
                match self.locations.get(&document) {
                    Some(location) => location.clone(),
                    None => SchemaUri::new(document, JsonPointer::root()),
                }
            }
        };
        base.join(pointer.tokens().iter().cloned())
    }

    /// The base URI in effect at `uri`: the document URI, rebased by every
    /// `$id` on the path from the document root.
    pub(crate) fn base_uri(&self, uri: &SchemaUri) -> Url {
        self.resource(uri).0
    }

    /// The URI of node `id` relative to the innermost enclosing resource: its
    /// base URI with the remaining pointer as fragment.
    pub fn resource_uri(&self, id: SchemaId) -> Option<Url> {
        let node = self.nodes.get(id.0)?;
        let (mut url, start) = self.resource(&node.uri);
        let tokens = node.uri.pointer().tokens().get(start..).unwrap_or_default();
        let pointer = JsonPointer::root().join_all(tokens.iter().cloned());
        url.set_fragment(Some(&pointer.to_fragment()));
        Some(url)
    }

    /// Base URI in effect at `uri`, and how many pointer tokens lead to the
    /// `$id` that established it.
    fn resource(&self, uri: &SchemaUri) -> (Url, usize) {
        let mut base = uri.document().clone();
        let Some(document) = self.documents.get(uri.document()) else {
            return (base, 0);
        };
        let keyword = document.dialect.id_keyword();
        let mut current = &document.value;
        let mut start = 0;
        rebase(&mut base, current, keyword);
        for (depth, token) in uri.pointer().tokens().iter().enumerate() {
            let next = match current {
                Value::Object(map) => map.get(token),
                Value::Array(items) => token.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            let Some(next) = next else { break };
            current = next;
            if rebase(&mut base, current, keyword) {
                start = depth + 1;
            }
        }
        (base, start)
    }

    fn ensure_document(&mut self, url: &Url) -> Result<(), SourceError> {
        if self.documents.contains_key(url) {
            return Ok(());
        }
        if let Some(err) = self.unavailable.get(url) {
            return Err(err.clone());
        }
        match self.source.fetch(url) {
            Ok(value) => {
                self.insert_document(url.clone(), value);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(uri = %url, error = %err, "document unavailable");
                self.unavailable.insert(url.clone(), err.clone());
                Err(err)
            }
        }
    }

    fn insert_document(&mut self, url: Url, value: Value) {
        let dialect = Dialect::detect_or(&value, self.default_dialect);
        tracing::debug!(uri = %url, %dialect, "registered schema document");
        let mut locations = Vec::new();
        collect_locations(
            &value,
            &url,
            &url,
            JsonPointer::root(),
            dialect.id_keyword(),
            &mut locations,
        );
        for (key, location) in locations {
            self.locations.entry(key).or_insert(location);
        }
        self.unavailable.remove(&url);
        self.documents
            .insert(url, Arc::new(Document { value, dialect }));
    }

    fn verify_examples(&self, from: usize) -> Result<(), SchemaError> {
        let validator = Validator::new(self, ValidationOptions::default());
        for node in self.nodes.iter().skip(from) {
            let Some(examples) = node
                .keywords()
                .and_then(|keywords| keywords.metadata.examples.as_ref())
            else {
                continue;
            };
            for (index, example) in examples.iter().enumerate() {
                let errors = validator.errors(node.id, example);
                if !errors.is_empty() {
                    return Err(SchemaError::InvalidExample {
                        uri: node.uri.to_string(),
                        index,
                        violations: ValidationViolations::from_errors(&errors),
                    });
                }
            }
        }
        Ok(())
    }

    fn rollback(&mut self, mark: usize) {
        tracing::debug!(removed = self.nodes.len() - mark, "rolling back failed schema build");
        self.nodes.truncate(mark);
        self.index.retain(|_, id| id.0 < mark);
        self.parents
            .retain(|child, parent| child.0 < mark && parent.0 < mark);
    }
}

impl Index<SchemaId> for SchemaSet {
    type Output = Schema;

    /// Panics if `id` was issued by another set.
    fn index(&self, id: SchemaId) -> &Schema {
        &self.nodes[id.0]
    }
}

fn parse_uri(uri: &str) -> Result<Url, SchemaError> {
    Url::parse(uri).map_err(|e| SchemaError::InvalidUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })
}

/// Apply a non-fragment `$id` of `value` to `base`. Returns true if `base`
/// changed.
fn rebase(base: &mut Url, value: &Value, keyword: &str) -> bool {
    let Some(id) = value.get(keyword).and_then(Value::as_str) else {
        return false;
    };
    if id.starts_with('#') {
        return false;
    }
    match base.join(id) {
        Ok(mut joined) => {
            joined.set_fragment(None);
            *base = joined;
            true
        }
        Err(_) => false,
    }
}

/// Walk a document recording embedded base URIs and anchors.
fn collect_locations(
    value: &Value,
    document: &Url,
    base: &Url,
    pointer: JsonPointer,
    keyword: &str,
    out: &mut Vec<(Url, SchemaUri)>,
) {
    match value {
        Value::Object(map) => {
            let here = SchemaUri::new(document.clone(), pointer.clone());
            let mut base = base.clone();
            if let Some(id) = map.get(keyword).and_then(Value::as_str) {
                if let Ok(joined) = base.join(id) {
                    match joined.fragment() {
                        Some(anchor) if !anchor.is_empty() => {
                            out.push((joined.clone(), here.clone()));
                        }
                        _ => {}
                    }
                    if !id.starts_with('#') {
                        let mut resource = joined;
                        resource.set_fragment(None);
                        out.push((resource.clone(), here.clone()));
                        base = resource;
                    }
                }
            }
            if let Some(anchor) = map.get("$anchor").and_then(Value::as_str) {
                let mut named = base.clone();
                named.set_fragment(Some(anchor));
                out.push((named, here));
            }
            for (key, child) in map {
                if matches!(key.as_str(), "enum" | "const" | "examples" | "default") {
                    continue;
                }
                collect_locations(child, document, &base, pointer.join(key.as_str()), keyword, out);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_locations(item, document, base, pointer.join(i.to_string()), keyword, out);
            }
        }
        _ => {}
    }
}
