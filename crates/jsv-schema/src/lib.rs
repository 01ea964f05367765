//! # jsv-schema — JSON Schema Registry & Validator
//!
//! Builds schemas written in any of draft-03, draft-04, draft-06, draft-07,
//! 2019-09 and 2020-12 into an arena of typed nodes, and validates JSON
//! instances against them.
//!
//! ## Building (`registry`, `schema`)
//!
//! [`SchemaSet`] owns documents and nodes. [`SchemaSet::load_value`],
//! [`SchemaSet::load_path`] and [`SchemaSet::resolve`] build a root node and
//! everything reachable from it, resolving `$ref` and `$recursiveRef` through
//! embedded `$id`s, `$anchor`s and the configured [`DocumentSource`].
//! Construction errors are [`SchemaError`]s; a missing `$ref` target is not
//! one (it becomes a permissive node and a warning).
//!
//! ## Validating (`validator`, `output`)
//!
//! [`Validator`] walks a node and an instance and reports each violation as
//! a [`ValidationError`]:
//!
//! - [`Validator::validate`] streams errors to a sink.
//! - [`Validator::validate_document`] folds them into one
//!   [`SchemaValidationError::ValidationFailed`].
//! - [`Validator::validate_with_output`] returns an [`OutputReport`].
//!
//! Regular expressions and format checks are injected through
//! [`ValidationOptions`] as [`PatternMatcher`] and [`FormatChecker`]
//! implementations.
//!
//! ## Crate Policy
//!
//! - Depends only on `jsv-core` internally.
//! - Validation never returns `Err` for a bad instance; only construction
//!   and document loading do.
//! - Nodes are read-only after construction, so one [`SchemaSet`] can back
//!   concurrent validations.

mod build;
pub mod config;
pub mod dialect;
pub mod error;
pub mod format;
pub mod output;
pub mod pattern;
pub mod registry;
pub mod schema;
pub mod source;
pub mod validator;

pub use config::{ConfigError, ValidatorConfig};
pub use dialect::{Dialect, DEFAULT_CONTENT_ASSERTION_DIALECTS};
pub use error::{
    SchemaError, SchemaValidationError, ValidationError, ValidationErrorKind,
    ValidationViolations, Violation,
};
pub use format::{BasicFormatChecker, FormatChecker, NoFormatChecker};
pub use output::{OutputReport, OutputUnit};
pub use pattern::{InvalidPattern, Matcher, PatternMatcher, RegexMatcher};
pub use registry::SchemaSet;
pub use schema::{Schema, SchemaBody, SchemaId, SchemaUri};
pub use source::{DocumentSource, FileSource, MapSource, SourceError};
pub use validator::{load_document, ErrorFilter, ValidationOptions, Validator};

// Re-exported so callers can build pointers without depending on jsv-core.
pub use jsv_core::JsonPointer;
