//! Validator configuration loaded from YAML or JSON.
//!
//! ```yaml
//! default_dialect: draft-07
//! format_assertions: false
//! content_assertion_dialects: [draft-06, draft-07]
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::dialect::{Dialect, DEFAULT_CONTENT_ASSERTION_DIALECTS};
use crate::format::NoFormatChecker;
use crate::registry::SchemaSet;
use crate::source::{self, LoadFailure};
use crate::validator::ValidationOptions;

/// Failure to load a [`ValidatorConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {reason}")]
    Load { path: String, reason: String },

    #[error("invalid config '{path}': {reason}")]
    Invalid { path: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Dialect for documents that neither declare nor imply one.
    pub default_dialect: Dialect,
    /// Assert `format` through the format checker.
    pub format_assertions: bool,
    /// Dialects under which `contentEncoding` and `contentMediaType` assert.
    pub content_assertion_dialects: Vec<Dialect>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            default_dialect: Dialect::Draft2020_12,
            format_assertions: true,
            content_assertion_dialects: DEFAULT_CONTENT_ASSERTION_DIALECTS.to_vec(),
        }
    }
}

impl ValidatorConfig {
    /// Load from a `.yaml`, `.yml` or `.json` file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let value = source::load_path(path).map_err(|failure| match failure {
            LoadFailure::Io(reason) => ConfigError::Load {
                path: path.display().to_string(),
                reason,
            },
            LoadFailure::Parse(reason) => ConfigError::Invalid {
                path: path.display().to_string(),
                reason,
            },
        })?;
        Self::from_value(value).map_err(|e| ConfigError::Invalid {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        // An empty YAML file parses to null.
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
    }

    /// The validator options this configuration describes.
    pub fn options(&self) -> ValidationOptions {
        let options = ValidationOptions::default()
            .with_content_assertion_dialects(self.content_assertion_dialects.clone());
        if self.format_assertions {
            options
        } else {
            options.with_formats(Arc::new(NoFormatChecker))
        }
    }

    /// An empty schema set using the configured default dialect.
    pub fn schema_set(&self) -> SchemaSet {
        SchemaSet::new().with_default_dialect(self.default_dialect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Validator;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ValidatorConfig::from_value(json!({})).unwrap();
        assert_eq!(config, ValidatorConfig::default());
        assert_eq!(config.default_dialect, Dialect::Draft2020_12);
        assert!(config.format_assertions);
        assert_eq!(config.content_assertion_dialects.len(), 4);
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jsv.yaml");
        std::fs::write(
            &path,
            "default_dialect: draft-04\nformat_assertions: false\ncontent_assertion_dialects: []\n",
        )
        .unwrap();
        let config = ValidatorConfig::from_path(&path).unwrap();
        assert_eq!(config.default_dialect, Dialect::Draft4);
        assert!(!config.format_assertions);
        assert!(config.content_assertion_dialects.is_empty());
    }

    #[test]
    fn test_empty_yaml_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yml");
        std::fs::write(&path, "").unwrap();
        assert_eq!(
            ValidatorConfig::from_path(&path).unwrap(),
            ValidatorConfig::default()
        );
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"default_dialect": "draft-05"}"#).unwrap();
        assert!(matches!(
            ValidatorConfig::from_path(&path),
            Err(ConfigError::Invalid { .. })
        ));
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            ValidatorConfig::from_path(&missing),
            Err(ConfigError::Load { .. })
        ));
    }

    #[test]
    fn test_options_disable_formats() {
        let config = ValidatorConfig {
            format_assertions: false,
            ..ValidatorConfig::default()
        };
        let mut set = config.schema_set();
        let id = set.load_value(json!({"format": "email"})).unwrap();
        let validator = Validator::new(&set, config.options());
        assert!(validator.is_valid(id, &json!("not an email")));

        let strict = Validator::new(&set, ValidatorConfig::default().options());
        assert!(!strict.is_valid(id, &json!("not an email")));
    }

    #[test]
    fn test_default_dialect_applies_to_unmarked_schemas() {
        let config = ValidatorConfig {
            default_dialect: Dialect::Draft4,
            ..ValidatorConfig::default()
        };
        let mut set = config.schema_set();
        let id = set.load_value(json!({"type": "integer"})).unwrap();
        assert_eq!(set.dialect(id), Dialect::Draft4);
        let validator = Validator::new(&set, config.options());
        assert!(!validator.is_valid(id, &json!(1.0)));
    }
}
