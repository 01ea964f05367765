//! # jsv-cli — Command-Line Front End
//!
//! Wires the `jsv-schema` library to files on disk.
//!
//! ## Subcommands
//!
//! - `jsv validate`: Validate documents against a schema.
//! - `jsv dialect`: Print the dialect a schema document speaks.
//!
//! ```bash
//! jsv validate --schema person.schema.json alice.json bob.yaml
//! jsv validate --schema https://example.com/s.json --format json doc.json
//! jsv --config jsv.yaml dialect legacy.schema.json
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; validation logic lives in `jsv-schema`.
//! - Handlers return an exit code: 0 valid, 1 invalid. Operational failures
//!   surface as errors and exit with 2.

pub mod dialect;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use url::Url;

use jsv_schema::{SchemaId, SchemaSet, ValidatorConfig};

/// Load the configuration file, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<ValidatorConfig> {
    match path {
        Some(path) => ValidatorConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ValidatorConfig::default()),
    }
}

/// Build the schema named on the command line.
///
/// Absolute URIs are resolved through the set's document source; anything
/// else is a file path.
pub fn load_schema(set: &mut SchemaSet, schema: &str) -> Result<SchemaId> {
    match Url::parse(schema) {
        // Single-letter schemes are Windows drive letters.
        Ok(url) if url.scheme().len() > 1 => set
            .resolve_url(&url)
            .with_context(|| format!("failed to load schema {schema}")),
        _ => set
            .load_path(Path::new(schema))
            .with_context(|| format!("failed to load schema {schema}")),
    }
}
