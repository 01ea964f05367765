//! # Validate Subcommand
//!
//! Validates one or more JSON or YAML documents against a single schema.
//! Text output lists each document with its rendered errors; JSON output
//! prints one output report per document, keyed by path.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde_json::{Map, Value};

use jsv_schema::{load_document, ValidatorConfig, Validator};

/// Output style for `jsv validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One line per document, followed by its errors.
    #[default]
    Text,
    /// Output reports as a JSON object keyed by document path.
    Json,
}

/// Arguments for the `jsv validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schema file path or absolute URI.
    #[arg(long, short)]
    pub schema: String,

    /// Documents to validate (.json, .yaml or .yml).
    #[arg(value_name = "DOCUMENT", required = true)]
    pub documents: Vec<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 if every document is valid, 1 otherwise.
pub fn run_validate(args: &ValidateArgs, config: &ValidatorConfig) -> Result<u8> {
    let mut set = config.schema_set();
    let id = crate::load_schema(&mut set, &args.schema)?;
    let validator = Validator::new(&set, config.options());

    tracing::info!(
        schema = %set[id].uri(),
        dialect = %set.dialect(id),
        nodes = set.len(),
        "loaded schema"
    );

    let mut failed = 0usize;
    let mut reports = Map::new();
    for path in &args.documents {
        let document =
            load_document(path).with_context(|| format!("failed to load {}", path.display()))?;

        match args.format {
            OutputFormat::Text => {
                let errors = validator.errors(id, &document);
                if errors.is_empty() {
                    println!("OK: {}", path.display());
                } else {
                    failed += 1;
                    println!("FAIL: {} ({} errors)", path.display(), errors.len());
                    for error in &errors {
                        println!("  {error}");
                    }
                }
            }
            OutputFormat::Json => {
                let report = validator
                    .validate_with_output(id, &document)
                    .with_context(|| format!("failed to report on {}", path.display()))?;
                if !report.valid {
                    failed += 1;
                }
                reports.insert(path.display().to_string(), serde_json::to_value(&report)?);
            }
        }
    }

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&Value::Object(reports))?);
    } else if failed > 0 {
        println!(
            "\n{failed} of {} document(s) failed validation.",
            args.documents.len()
        );
    }

    Ok(u8::from(failed > 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn args(schema: &Path, documents: Vec<PathBuf>, format: OutputFormat) -> ValidateArgs {
        ValidateArgs {
            schema: schema.display().to_string(),
            documents,
            format,
        }
    }

    #[test]
    fn test_valid_documents_exit_zero() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(dir.path(), "s.json", r#"{"required": ["name"]}"#);
        let json = write(dir.path(), "a.json", r#"{"name": "a"}"#);
        let yaml = write(dir.path(), "b.yaml", "name: b\n");
        let code = run_validate(
            &args(&schema, vec![json, yaml], OutputFormat::Text),
            &ValidatorConfig::default(),
        )
        .unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_invalid_document_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(dir.path(), "s.json", r#"{"required": ["name"]}"#);
        let good = write(dir.path(), "good.json", r#"{"name": "a"}"#);
        let bad = write(dir.path(), "bad.json", "{}");
        for format in [OutputFormat::Text, OutputFormat::Json] {
            let code = run_validate(
                &args(&schema, vec![good.clone(), bad.clone()], format),
                &ValidatorConfig::default(),
            )
            .unwrap();
            assert_eq!(code, 1);
        }
    }

    #[test]
    fn test_unreadable_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(dir.path(), "s.json", "true");
        let missing = dir.path().join("missing.json");
        let err = run_validate(
            &args(&schema, vec![missing], OutputFormat::Text),
            &ValidatorConfig::default(),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("missing.json"));
    }

    #[test]
    fn test_config_disables_formats() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(dir.path(), "s.json", r#"{"format": "email"}"#);
        let doc = write(dir.path(), "d.json", r#""not an email""#);
        let config = ValidatorConfig {
            format_assertions: false,
            ..ValidatorConfig::default()
        };
        let code = run_validate(&args(&schema, vec![doc.clone()], OutputFormat::Text), &config)
            .unwrap();
        assert_eq!(code, 0);
        let code = run_validate(
            &args(&schema, vec![doc], OutputFormat::Text),
            &ValidatorConfig::default(),
        )
        .unwrap();
        assert_eq!(code, 1);
    }
}
