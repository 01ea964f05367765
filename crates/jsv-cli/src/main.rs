//! # jsv CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jsv_cli::dialect::{run_dialect, DialectArgs};
use jsv_cli::validate::{run_validate, ValidateArgs};

/// JSON Schema validator for drafts 3, 4, 6, 7, 2019-09 and 2020-12.
#[derive(Parser, Debug)]
#[command(name = "jsv", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML or JSON validator configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate documents against a schema.
    Validate(ValidateArgs),

    /// Print the dialect of a schema document.
    Dialect(DialectArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = jsv_cli::load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Validate(args) => run_validate(&args, &config),
        Commands::Dialect(args) => run_dialect(&args, &config),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_validate() {
        let cli = Cli::try_parse_from(["jsv", "validate", "--schema", "s.json", "a.json", "b.yaml"])
            .unwrap();
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.schema, "s.json");
                assert_eq!(args.documents.len(), 2);
                assert_eq!(args.format, jsv_cli::validate::OutputFormat::Text);
            }
            other => panic!("expected validate, got {other:?}"),
        }
    }

    #[test]
    fn cli_parse_validate_json_format() {
        let cli = Cli::try_parse_from([
            "jsv", "validate", "-s", "s.json", "--format", "json", "a.json",
        ])
        .unwrap();
        if let Commands::Validate(args) = cli.command {
            assert_eq!(args.format, jsv_cli::validate::OutputFormat::Json);
        } else {
            panic!("expected validate");
        }
    }

    #[test]
    fn cli_parse_validate_requires_documents() {
        assert!(Cli::try_parse_from(["jsv", "validate", "--schema", "s.json"]).is_err());
        assert!(Cli::try_parse_from(["jsv", "validate", "a.json"]).is_err());
    }

    #[test]
    fn cli_parse_dialect() {
        let cli = Cli::try_parse_from(["jsv", "dialect", "s.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Dialect(_)));
    }

    #[test]
    fn cli_parse_verbose_levels() {
        let cli0 = Cli::try_parse_from(["jsv", "dialect", "s.json"]).unwrap();
        assert_eq!(cli0.verbose, 0);

        let cli2 = Cli::try_parse_from(["jsv", "-vv", "dialect", "s.json"]).unwrap();
        assert_eq!(cli2.verbose, 2);

        let cli3 = Cli::try_parse_from(["jsv", "dialect", "s.json", "-vvv"]).unwrap();
        assert_eq!(cli3.verbose, 3);
    }

    #[test]
    fn cli_parse_config_option() {
        let cli = Cli::try_parse_from(["jsv", "--config", "jsv.yaml", "dialect", "s.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("jsv.yaml")));
    }

    #[test]
    fn cli_parse_no_subcommand_errors() {
        assert!(Cli::try_parse_from(["jsv"]).is_err());
    }
}
