//! # Dialect Subcommand
//!
//! Prints the meta-schema URI of the dialect a schema document speaks,
//! whether declared through `$schema` or inferred from its keywords.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use jsv_schema::{load_document, Dialect, ValidatorConfig};

/// Arguments for the `jsv dialect` subcommand.
#[derive(Args, Debug)]
pub struct DialectArgs {
    /// Schema document (.json, .yaml or .yml).
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,
}

/// Execute the dialect subcommand.
pub fn run_dialect(args: &DialectArgs, config: &ValidatorConfig) -> Result<u8> {
    let document = load_document(&args.schema)
        .with_context(|| format!("failed to load {}", args.schema.display()))?;
    println!("{}", detect(&document, config));
    Ok(0)
}

fn detect(document: &serde_json::Value, config: &ValidatorConfig) -> Dialect {
    let dialect = Dialect::detect_or(document, config.default_dialect);
    if Dialect::declared(document).is_none() {
        tracing::debug!(%dialect, "no recognized $schema; dialect inferred");
    }
    dialect
}
