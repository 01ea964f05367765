//! # Document Sources
//!
//! The registry never performs I/O itself. Raw schema documents are fetched
//! through a [`DocumentSource`], which is consulted only while schemas are
//! being built, never during validation.
//!
//! Two sources ship with the crate:
//!
//! - [`FileSource`] reads `file:` URIs from disk. `.yaml`/`.yml` files are
//!   parsed as YAML and converted to the JSON data model; everything else is
//!   parsed as JSON.
//! - [`MapSource`] serves documents from an in-memory map, for tests and for
//!   embedding schemas in a binary.
//!
//! Network retrieval is deliberately absent. Callers that need it can
//! implement [`DocumentSource`] themselves.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Failure to produce the raw JSON value for a document URI.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source cannot serve URIs with this scheme.
    #[error("unsupported uri scheme '{scheme}' in {uri}")]
    UnsupportedScheme {
        /// The offending URI.
        uri: String,
        /// Its scheme.
        scheme: String,
    },

    /// The source has no document under this URI.
    #[error("no document registered for {uri}")]
    NotFound {
        /// The URI that was requested.
        uri: String,
    },

    /// The document exists but could not be read.
    #[error("cannot read {uri}: {reason}")]
    Io {
        /// The URI that was requested.
        uri: String,
        /// Underlying I/O error text.
        reason: String,
    },

    /// The document was read but is not valid JSON or YAML.
    #[error("cannot parse {uri}: {reason}")]
    Parse {
        /// The URI that was requested.
        uri: String,
        /// Parser error text.
        reason: String,
    },
}

/// Fetches the raw JSON value of a whole document.
///
/// Implementations receive URIs without a fragment.
pub trait DocumentSource: Send + Sync {
    /// Return the document stored at `uri`.
    fn fetch(&self, uri: &Url) -> Result<Value, SourceError>;
}

/// Reads `file:` URIs from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl DocumentSource for FileSource {
    fn fetch(&self, uri: &Url) -> Result<Value, SourceError> {
        if uri.scheme() != "file" {
            return Err(SourceError::UnsupportedScheme {
                uri: uri.to_string(),
                scheme: uri.scheme().to_string(),
            });
        }
        let path = uri.to_file_path().map_err(|()| SourceError::NotFound {
            uri: uri.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loading schema document");
        load_path(&path).map_err(|reason| match reason {
            LoadFailure::Io(reason) => SourceError::Io {
                uri: uri.to_string(),
                reason,
            },
            LoadFailure::Parse(reason) => SourceError::Parse {
                uri: uri.to_string(),
                reason,
            },
        })
    }
}

/// Serves documents from memory.
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    documents: HashMap<Url, Value>,
}

impl MapSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` under `uri`. Any fragment on `uri` is ignored.
    pub fn insert(&mut self, mut uri: Url, value: Value) {
        uri.set_fragment(None);
        self.documents.insert(uri, value);
    }

    /// Builder-style [`MapSource::insert`].
    pub fn with(mut self, uri: Url, value: Value) -> Self {
        self.insert(uri, value);
        self
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if no documents are registered.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentSource for MapSource {
    fn fetch(&self, uri: &Url) -> Result<Value, SourceError> {
        self.documents
            .get(uri)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                uri: uri.to_string(),
            })
    }
}

pub(crate) enum LoadFailure {
    Io(String),
    Parse(String),
}

/// Read a JSON or YAML file, choosing the parser from the extension.
pub(crate) fn load_path(path: &Path) -> Result<Value, LoadFailure> {
    let content = std::fs::read_to_string(path).map_err(|e| LoadFailure::Io(e.to_string()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "yaml" | "yml" => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
                .map_err(|e| LoadFailure::Parse(format!("invalid YAML: {e}")))?;
            yaml_to_json_value(&yaml).map_err(LoadFailure::Parse)
        }
        _ => serde_json::from_str(&content)
            .map_err(|e| LoadFailure::Parse(format!("invalid JSON: {e}"))),
    }
}

/// Convert a `serde_yaml::Value` into the JSON data model.
///
/// Tags are dropped; scalar map keys are stringified.
pub(crate) fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}
