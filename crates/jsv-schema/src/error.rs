//! # Error Types
//!
//! Two tiers, kept apart:
//!
//! - **Construction.** [`SchemaError`] is returned when a schema cannot be
//!   built: the value at a location is not a schema, a reference cannot be
//!   resolved, an `examples` entry fails, or a document cannot be loaded.
//!   A failed build leaves no partial nodes behind.
//! - **Validation.** Rule violations are [`ValidationError`] values handed to
//!   a sink; validation itself never fails. [`SchemaValidationError`] wraps a
//!   non-empty batch of them (as [`ValidationViolations`]) for callers that
//!   want a single `Result`.

use std::borrow::Cow;
use std::fmt;

use jsv_core::JsonPointer;
use serde_json::{Number, Value};
use thiserror::Error;

use crate::schema::Schema;
use crate::source::SourceError;

/// Longest instance excerpt quoted in a rendered error, in characters.
const EXCERPT_LIMIT: usize = 20;

/// What rule an instance broke.
#[derive(Error, Debug, Clone)]
pub enum ValidationErrorKind<'a> {
    #[error("false schema always fails")]
    FalseSchema,

    #[error("does not match any of the {} alternatives", .branches.len())]
    AnyOf {
        /// Errors of every alternative, in declaration order.
        branches: Vec<Vec<ValidationError<'a>>>,
    },

    #[error("{} of the {} alternatives passed; exactly one must", .passed.len(), .branches.len())]
    OneOf {
        /// Indices of the alternatives that passed.
        passed: Vec<usize>,
        /// Errors of every alternative, in declaration order.
        branches: Vec<Vec<ValidationError<'a>>>,
    },

    #[error("must not match the 'not' schema")]
    Not,

    #[error("matches a disallowed schema")]
    Disallow,

    #[error("must be a multiple of {multiple_of}")]
    MultipleOf { multiple_of: Number },

    #[error("must be {} {limit}", upper_bound(.exclusive))]
    Maximum { limit: Number, exclusive: bool },

    #[error("must be less than {limit}")]
    ExclusiveMaximum { limit: Number },

    #[error("must be {} {limit}", lower_bound(.exclusive))]
    Minimum { limit: Number, exclusive: bool },

    #[error("must be greater than {limit}")]
    ExclusiveMinimum { limit: Number },

    #[error("must be divisible by {divisor}")]
    DivisibleBy { divisor: Number },

    #[error("must be at most {limit} characters long")]
    MaxLength { limit: u64 },

    #[error("must be at least {limit} characters long")]
    MinLength { limit: u64 },

    #[error("does not match pattern {pattern:?}")]
    Pattern { pattern: String },

    #[error("{message}")]
    Format { format: String, message: String },

    #[error("content is not valid {encoding}: {reason}")]
    ContentEncoding { encoding: String, reason: String },

    #[error("content is not valid {media_type}: {reason}")]
    ContentMediaType { media_type: String, reason: String },

    #[error("must contain at most {limit} matching items, found {found}")]
    MaxContains { limit: u64, found: u64 },

    #[error("must contain at least {limit} matching items, found {found}")]
    MinContains { limit: u64, found: u64 },

    #[error("must have at most {limit} items")]
    MaxItems { limit: u64 },

    #[error("must have at least {limit} items")]
    MinItems { limit: u64 },

    #[error("items must be unique")]
    UniqueItems,

    #[error("must have at most {limit} properties")]
    MaxProperties { limit: u64 },

    #[error("must have at least {limit} properties")]
    MinProperties { limit: u64 },

    #[error("missing required property {property:?}")]
    MissingProperty { property: String },

    #[error("property {property:?} requires property {dependency:?}")]
    Dependency { property: String, dependency: String },

    #[error("type {} is not one of [{}]", .found.join("/"), .expected.join(", "))]
    Type {
        /// Declared type names.
        expected: Vec<String>,
        /// Type names the instance satisfies.
        found: Vec<String>,
    },

    #[error("type {} is disallowed", .types.join("/"))]
    TypeDisallowed { types: Vec<String> },

    #[error("does not equal the constant")]
    Const,

    #[error("is not one of the enumerated values")]
    Enum,
}

fn upper_bound(exclusive: &bool) -> &'static str {
    if *exclusive {
        "less than"
    } else {
        "at most"
    }
}

fn lower_bound(exclusive: &bool) -> &'static str {
    if *exclusive {
        "greater than"
    } else {
        "at least"
    }
}

/// One rule violation at one instance location.
///
/// Borrows the instance document and the schema node; the offending value is
/// looked up from the document on demand.
#[derive(Debug, Clone)]
pub struct ValidationError<'a> {
    pointer: JsonPointer,
    property_name: Option<String>,
    document: &'a Value,
    schema: &'a Schema,
    kind: ValidationErrorKind<'a>,
}

impl<'a> ValidationError<'a> {
    pub(crate) fn new(
        pointer: JsonPointer,
        property_name: Option<String>,
        document: &'a Value,
        schema: &'a Schema,
        kind: ValidationErrorKind<'a>,
    ) -> Self {
        Self {
            pointer,
            property_name,
            document,
            schema,
            kind,
        }
    }

    /// Location of the failing instance within the document.
    pub fn pointer(&self) -> &JsonPointer {
        &self.pointer
    }

    /// Set when the failing instance is a property name (`propertyNames`).
    /// [`pointer`](Self::pointer) then locates the object holding the key.
    pub fn property_name(&self) -> Option<&str> {
        self.property_name.as_deref()
    }

    /// The whole instance document.
    pub fn document(&self) -> &'a Value {
        self.document
    }

    /// The schema node that failed.
    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// The rule that was broken.
    pub fn kind(&self) -> &ValidationErrorKind<'a> {
        &self.kind
    }

    /// The variant-specific message, without location.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// The offending value, if the location still resolves.
    pub fn instance(&self) -> Option<Cow<'a, Value>> {
        match &self.property_name {
            Some(name) => Some(Cow::Owned(Value::String(name.clone()))),
            None => self.pointer.resolve(self.document).map(Cow::Borrowed),
        }
    }

    /// Instance location as a URI fragment, including the leading `#`.
    pub fn instance_location(&self) -> String {
        format!("#{}", self.pointer.to_fragment())
    }
}

impl fmt::Display for ValidationError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let excerpt = match self.instance().as_deref() {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        if excerpt.chars().count() <= EXCERPT_LIMIT {
            write!(f, "\"{excerpt}\" ")?;
        }
        if !self.pointer.is_root() {
            write!(f, "at {} ", self.instance_location())?;
        }
        write!(f, "failed against {} with \"{}\"", self.schema.uri(), self.kind)
    }
}

/// Failure to build a schema.
#[derive(Error, Debug, Clone)]
pub enum SchemaError {
    /// A URI given to the registry could not be parsed.
    #[error("invalid uri {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },

    /// The root document of a requested schema could not be loaded.
    #[error("cannot load document {uri}: {source}")]
    DocumentUnavailable { uri: String, source: SourceError },

    /// The value at a schema location is neither an object nor a boolean.
    #[error("value at {uri} is {found}, not a schema")]
    NotASchema { uri: String, found: &'static str },

    /// A `$ref` or `$recursiveRef` string could not be resolved to a URI.
    #[error("cannot resolve {keyword} {reference:?} in {uri}: {reason}")]
    InvalidReference {
        uri: String,
        keyword: &'static str,
        reference: String,
        reason: String,
    },

    /// An `examples` entry does not validate against its own schema.
    #[error("example {index} of {uri} is invalid:\n{violations}")]
    InvalidExample {
        uri: String,
        index: usize,
        violations: ValidationViolations,
    },

    /// A node was claimed as the direct sub-schema of two parents.
    #[error("schema {child} already belongs to {existing}, cannot also belong to {parent}")]
    ParentAlreadyAssigned {
        child: String,
        existing: String,
        parent: String,
    },
}

/// Error from the batch validation entry points.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The document did not conform to the schema.
    #[error("validation failed against schema '{schema}':\n{violations}")]
    ValidationFailed {
        /// Canonical URI of the schema that was validated against.
        schema: String,
        /// Every violation, in discovery order.
        violations: ValidationViolations,
    },

    /// An instance document could not be read or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoadError {
        /// Path of the document.
        path: String,
        /// Human-readable cause.
        reason: String,
    },

    /// The schema could not be built.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The output report did not validate against the output schema.
    #[error("output report failed its self-check:\n{violations}")]
    OutputSelfCheck { violations: ValidationViolations },

    /// The output report could not be converted to JSON.
    #[error("cannot serialize output report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A single validation violation with structured context.
///
/// Owned; unlike [`ValidationError`] it does not borrow the document or the
/// schema set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer to the violating value in the instance.
    pub instance_path: String,
    /// Canonical URI of the schema node that failed.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl From<&ValidationError<'_>> for Violation {
    fn from(error: &ValidationError<'_>) -> Self {
        Self {
            instance_path: error.pointer().to_string(),
            schema_path: error.schema().uri().to_string(),
            message: error.message(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Convert borrowed errors into owned violations.
    pub fn from_errors(errors: &[ValidationError<'_>]) -> Self {
        Self {
            violations: errors.iter().map(Violation::from).collect(),
        }
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}
