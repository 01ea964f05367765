//! # Validation
//!
//! [`Validator`] walks a schema node and an instance together and reports
//! every rule the instance breaks as a [`ValidationError`]. Validation never
//! fails as such: a malformed instance produces errors, not a Rust `Err`.
//!
//! ## Order of evaluation
//!
//! For an object schema, one call runs:
//!
//! 1. `$recursiveRef`, then `$recursiveAnchor` activation.
//! 2. `if` / `then` / `else`, `$ref`, `allOf`, `anyOf`, `oneOf`, `not`, and
//!    draft-03 schema-valued `disallow`.
//! 3. The keywords for the instance's kind, including the `type` check.
//! 4. `const` and `enum`.
//!
//! ## Evaluated properties and items
//!
//! Each call keeps an `Evaluated` set of the property names and array
//! indices that some keyword applied a sub-schema to. Applicators that run at
//! the same instance location (`$ref`, `allOf`, `then`, passing `anyOf`
//! branches, ...) write into the caller's set, so `unevaluatedProperties` and
//! `unevaluatedItems`, which run last, see everything their siblings touched.
//! `not` and failing `if` / `anyOf` branches are isolated and discarded.
//!
//! ## Recursive anchors
//!
//! The active `$recursiveAnchor` is an explicit argument of every call. The
//! first anchor entered stays active for the whole subtree; a
//! `$recursiveRef` whose static target is itself an anchor is redirected to
//! the active one.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use jsv_core::{CanonicalValue, Decimal, JsonPointer};
use serde_json::{Map, Number, Value};

use crate::dialect::{Dialect, DEFAULT_CONTENT_ASSERTION_DIALECTS};
use crate::error::{
    SchemaValidationError, ValidationError, ValidationErrorKind, ValidationViolations,
};
use crate::format::{BasicFormatChecker, FormatChecker};
use crate::pattern::{Matcher, PatternMatcher, RegexMatcher};
use crate::registry::SchemaSet;
use crate::schema::{
    ArrayKeywords, Exclusive, Items, Keywords, ObjectKeywords, Schema, SchemaBody, SchemaId,
    StringKeywords,
};
use crate::source::{self, LoadFailure};

const BASE64_LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const BASE64_STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, BASE64_LENIENT);
const BASE64_URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, BASE64_LENIENT);

/// Predicate deciding whether an error is reported. Returning `false` drops
/// the error.
pub type ErrorFilter = Arc<dyn Fn(&ValidationError<'_>) -> bool + Send + Sync>;

/// Collaborators and switches for a [`Validator`].
#[derive(Clone)]
pub struct ValidationOptions {
    patterns: Arc<dyn PatternMatcher>,
    formats: Arc<dyn FormatChecker>,
    content_assertion_dialects: Vec<Dialect>,
    error_filter: Option<ErrorFilter>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        let patterns: Arc<dyn PatternMatcher> = Arc::new(RegexMatcher::new());
        Self {
            formats: Arc::new(BasicFormatChecker::new(Arc::clone(&patterns))),
            patterns,
            content_assertion_dialects: DEFAULT_CONTENT_ASSERTION_DIALECTS.to_vec(),
            error_filter: None,
        }
    }
}

impl fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationOptions")
            .field("content_assertion_dialects", &self.content_assertion_dialects)
            .field("error_filter", &self.error_filter.is_some())
            .finish_non_exhaustive()
    }
}

impl ValidationOptions {
    /// Use `patterns` for `pattern` and `patternProperties`.
    pub fn with_patterns(mut self, patterns: Arc<dyn PatternMatcher>) -> Self {
        self.patterns = patterns;
        self
    }

    /// Use `formats` for the `format` keyword.
    pub fn with_formats(mut self, formats: Arc<dyn FormatChecker>) -> Self {
        self.formats = formats;
        self
    }

    /// Dialects under which `contentEncoding` and `contentMediaType` assert.
    pub fn with_content_assertion_dialects(mut self, dialects: Vec<Dialect>) -> Self {
        self.content_assertion_dialects = dialects;
        self
    }

    /// Report only the errors for which `filter` returns true.
    pub fn with_error_filter(
        mut self,
        filter: impl Fn(&ValidationError<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.error_filter = Some(Arc::new(filter));
        self
    }

    pub fn patterns(&self) -> &Arc<dyn PatternMatcher> {
        &self.patterns
    }

    pub fn formats(&self) -> &Arc<dyn FormatChecker> {
        &self.formats
    }

    pub fn content_assertion_dialects(&self) -> &[Dialect] {
        &self.content_assertion_dialects
    }
}

/// Property names and array indices evaluated at one instance location.
#[derive(Debug, Default)]
struct Evaluated {
    properties: HashSet<String>,
    items: HashSet<usize>,
}

impl Evaluated {
    fn merge(&mut self, other: Evaluated) {
        self.properties.extend(other.properties);
        self.items.extend(other.items);
    }
}

/// Where an instance sits in its document. `property_name` is set while
/// validating a key against `propertyNames`.
#[derive(Debug, Clone)]
struct Location {
    pointer: JsonPointer,
    property_name: Option<String>,
}

impl Location {
    fn child(&self, token: impl Into<String>) -> Self {
        Self {
            pointer: self.pointer.join(token),
            property_name: None,
        }
    }
}

/// Validates instances against the nodes of one [`SchemaSet`].
///
/// Holds no per-call state; one validator may serve any number of
/// concurrent validations.
#[derive(Debug)]
pub struct Validator<'s> {
    schemas: &'s SchemaSet,
    options: ValidationOptions,
}

impl<'s> Validator<'s> {
    pub fn new(schemas: &'s SchemaSet, options: ValidationOptions) -> Self {
        Self { schemas, options }
    }

    pub fn schemas(&self) -> &'s SchemaSet {
        self.schemas
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validate `document` against node `id`, handing each error to `sink`
    /// in discovery order.
    pub fn validate<'d>(
        &self,
        id: SchemaId,
        document: &'d Value,
        sink: &mut dyn FnMut(ValidationError<'d>),
    ) where
        's: 'd,
    {
        self.validate_at(id, document, &JsonPointer::root(), sink);
    }

    /// Validate the value at `pointer` inside `document`. Reported locations
    /// are relative to the whole document. Nothing is reported if `pointer`
    /// does not resolve.
    pub fn validate_at<'d>(
        &self,
        id: SchemaId,
        document: &'d Value,
        pointer: &JsonPointer,
        sink: &mut dyn FnMut(ValidationError<'d>),
    ) where
        's: 'd,
    {
        let Some(instance) = pointer.resolve(document) else {
            tracing::warn!(%pointer, "instance location does not resolve");
            return;
        };
        let walk = Walk {
            schemas: self.schemas,
            options: &self.options,
            document,
        };
        let location = Location {
            pointer: pointer.clone(),
            property_name: None,
        };
        let mut errors = Vec::new();
        walk.validate(
            id,
            instance,
            &location,
            &mut errors,
            &mut Evaluated::default(),
            None,
        );
        errors.into_iter().for_each(sink);
    }

    /// Every error of `document` against node `id`.
    pub fn errors<'d>(&self, id: SchemaId, document: &'d Value) -> Vec<ValidationError<'d>>
    where
        's: 'd,
    {
        let mut errors = Vec::new();
        self.validate(id, document, &mut |error| errors.push(error));
        errors
    }

    /// Returns true if `document` produces no errors against node `id`.
    pub fn is_valid(&self, id: SchemaId, document: &Value) -> bool {
        self.errors(id, document).is_empty()
    }

    /// Validate and fold every error into a single batch failure.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError::ValidationFailed`] if there is at
    /// least one error.
    pub fn validate_document(
        &self,
        id: SchemaId,
        document: &Value,
    ) -> Result<(), SchemaValidationError> {
        let errors = self.errors(id, document);
        if errors.is_empty() {
            return Ok(());
        }
        Err(SchemaValidationError::ValidationFailed {
            schema: self.schemas[id].uri().to_string(),
            violations: ValidationViolations::from_errors(&errors),
        })
    }

    /// Validate a JSON or YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError::DocumentLoadError`] if the file cannot
    /// be read or parsed, [`SchemaValidationError::ValidationFailed`] if the
    /// document does not conform.
    pub fn validate_file(&self, id: SchemaId, path: &Path) -> Result<(), SchemaValidationError> {
        let document = load_document(path)?;
        self.validate_document(id, &document)
            .map_err(|e| match e {
                SchemaValidationError::ValidationFailed { schema, violations } => {
                    SchemaValidationError::ValidationFailed {
                        schema: format!("{schema} ({})", path.display()),
                        violations,
                    }
                }
                other => other,
            })
    }
}

/// Read a JSON or YAML instance document from disk.
///
/// YAML is chosen by a `.yaml`/`.yml` extension.
pub fn load_document(path: &Path) -> Result<Value, SchemaValidationError> {
    source::load_path(path).map_err(|failure| {
        let reason = match failure {
            LoadFailure::Io(e) => format!("cannot read file: {e}"),
            LoadFailure::Parse(e) => e,
        };
        SchemaValidationError::DocumentLoadError {
            path: path.display().to_string(),
            reason,
        }
    })
}

/// State shared by every call of one validation.
struct Walk<'d, 'o> {
    schemas: &'d SchemaSet,
    options: &'o ValidationOptions,
    document: &'d Value,
}

/// The node, location and active anchor of one call.
#[derive(Clone, Copy)]
struct Scope<'a, 'd> {
    schema: &'d Schema,
    at: &'a Location,
    anchor: Option<SchemaId>,
}

impl<'d> Walk<'d, '_> {
    fn validate(
        &self,
        id: SchemaId,
        instance: &Value,
        at: &Location,
        errors: &mut Vec<ValidationError<'d>>,
        evaluated: &mut Evaluated,
        anchor: Option<SchemaId>,
    ) {
        let Some(schema) = self.schemas.get(id) else {
            return;
        };
        let keywords = match schema.body() {
            SchemaBody::Bool(true) => return,
            SchemaBody::Bool(false) => {
                let scope = Scope { schema, at, anchor };
                self.report(errors, scope, ValidationErrorKind::FalseSchema);
                return;
            }
            SchemaBody::Keywords(keywords) => keywords.as_ref(),
        };
        let mut local = Evaluated::default();
        let mut anchor = anchor;

        if let Some(target) = keywords.references.recursive_reference {
            let dynamic = match anchor {
                Some(active) if self.schemas[target].is_recursive_anchor() => active,
                _ => target,
            };
            self.validate(dynamic, instance, at, errors, &mut local, None);
        }
        if anchor.is_none() && keywords.references.recursive_anchor {
            anchor = Some(id);
        }
        let scope = Scope { schema, at, anchor };

        self.applicators(keywords, scope, instance, errors, &mut local);

        let dialect = self.schemas.dialect(id);
        match instance {
            Value::Number(n) => {
                self.number(keywords, scope, n, errors);
                self.type_check(keywords, scope, instance, dialect, errors);
            }
            Value::String(s) => {
                self.string(&keywords.string, scope, s, dialect, errors);
                self.type_check(keywords, scope, instance, dialect, errors);
            }
            Value::Array(items) => {
                self.type_check(keywords, scope, instance, dialect, errors);
                self.array(&keywords.array, scope, items, errors, &mut local);
            }
            Value::Object(map) => {
                self.type_check(keywords, scope, instance, dialect, errors);
                self.object(&keywords.object, scope, instance, map, errors, &mut local);
            }
            Value::Bool(_) | Value::Null => {
                self.type_check(keywords, scope, instance, dialect, errors);
            }
        }

        if let Some(constant) = &keywords.generic.constant {
            if !CanonicalValue::equal(constant, instance) {
                self.report(errors, scope, ValidationErrorKind::Const);
            }
        }
        if let Some(values) = &keywords.generic.enumeration {
            if !values.iter().any(|v| CanonicalValue::equal(v, instance)) {
                self.report(errors, scope, ValidationErrorKind::Enum);
            }
        }

        evaluated.merge(local);
    }

    /// Validate without contributing evaluated properties or items.
    fn validate_isolated(
        &self,
        id: SchemaId,
        instance: &Value,
        at: &Location,
        errors: &mut Vec<ValidationError<'d>>,
        anchor: Option<SchemaId>,
    ) {
        self.validate(id, instance, at, errors, &mut Evaluated::default(), anchor);
    }

    fn applicators(
        &self,
        keywords: &Keywords,
        scope: Scope<'_, 'd>,
        instance: &Value,
        errors: &mut Vec<ValidationError<'d>>,
        local: &mut Evaluated,
    ) {
        let applicators = &keywords.applicators;
        let Scope { at, anchor, .. } = scope;

        if let Some(condition) = applicators.condition {
            let mut trial_errors = Vec::new();
            let mut trial = Evaluated::default();
            self.validate(condition, instance, at, &mut trial_errors, &mut trial, anchor);
            if trial_errors.is_empty() {
                local.merge(trial);
                if let Some(then_branch) = applicators.then_branch {
                    self.validate(then_branch, instance, at, errors, local, anchor);
                }
            } else if let Some(else_branch) = applicators.else_branch {
                self.validate(else_branch, instance, at, errors, local, anchor);
            }
        }

        if let Some(target) = keywords.references.reference {
            self.validate(target, instance, at, errors, local, anchor);
        }

        for &member in &applicators.all_of {
            self.validate(member, instance, at, errors, local, anchor);
        }

        if let Some(any_of) = &applicators.any_of {
            let mut branches = Vec::with_capacity(any_of.len());
            let mut passed = 0usize;
            for &member in any_of {
                let mut branch_errors = Vec::new();
                let mut branch = Evaluated::default();
                self.validate(member, instance, at, &mut branch_errors, &mut branch, anchor);
                if branch_errors.is_empty() {
                    passed += 1;
                    local.merge(branch);
                }
                branches.push(branch_errors);
            }
            if passed == 0 {
                self.report(errors, scope, ValidationErrorKind::AnyOf { branches });
            }
        }

        if let Some(one_of) = &applicators.one_of {
            let mut branches = Vec::with_capacity(one_of.len());
            let mut passed = Vec::new();
            for (index, &member) in one_of.iter().enumerate() {
                let mut branch_errors = Vec::new();
                self.validate(member, instance, at, &mut branch_errors, local, anchor);
                if branch_errors.is_empty() {
                    passed.push(index);
                }
                branches.push(branch_errors);
            }
            if passed.len() != 1 {
                self.report(errors, scope, ValidationErrorKind::OneOf { passed, branches });
            }
        }

        if let Some(not) = applicators.not {
            let mut not_errors = Vec::new();
            self.validate_isolated(not, instance, at, &mut not_errors, anchor);
            if not_errors.is_empty() {
                self.report(errors, scope, ValidationErrorKind::Not);
            }
        }

        for &disallowed in &keywords.generic.disallow_schemas {
            let mut disallow_errors = Vec::new();
            self.validate(disallowed, instance, at, &mut disallow_errors, local, anchor);
            if disallow_errors.is_empty() {
                self.report(errors, scope, ValidationErrorKind::Disallow);
            }
        }
    }

    fn number(
        &self,
        keywords: &Keywords,
        scope: Scope<'_, 'd>,
        n: &Number,
        errors: &mut Vec<ValidationError<'d>>,
    ) {
        let numeric = &keywords.numeric;

        if let Some(multiple_of) = &numeric.multiple_of {
            if !is_multiple(n, multiple_of) {
                let multiple_of = multiple_of.clone();
                self.report(errors, scope, ValidationErrorKind::MultipleOf { multiple_of });
            }
        }

        if let Some(limit) = &numeric.maximum {
            let exclusive = matches!(numeric.exclusive_maximum, Some(Exclusive::Flag(true)));
            let ordering = compare(n, limit);
            if ordering == Ordering::Greater || (exclusive && ordering == Ordering::Equal) {
                let limit = limit.clone();
                self.report(errors, scope, ValidationErrorKind::Maximum { limit, exclusive });
            }
        }
        if let Some(Exclusive::Limit(limit)) = &numeric.exclusive_maximum {
            if compare(n, limit) != Ordering::Less {
                let limit = limit.clone();
                self.report(errors, scope, ValidationErrorKind::ExclusiveMaximum { limit });
            }
        }

        if let Some(limit) = &numeric.minimum {
            let exclusive = matches!(numeric.exclusive_minimum, Some(Exclusive::Flag(true)));
            let ordering = compare(n, limit);
            if ordering == Ordering::Less || (exclusive && ordering == Ordering::Equal) {
                let limit = limit.clone();
                self.report(errors, scope, ValidationErrorKind::Minimum { limit, exclusive });
            }
        }
        if let Some(Exclusive::Limit(limit)) = &numeric.exclusive_minimum {
            if compare(n, limit) != Ordering::Greater {
                let limit = limit.clone();
                self.report(errors, scope, ValidationErrorKind::ExclusiveMinimum { limit });
            }
        }

        if let Some(divisor) = &numeric.divisible_by {
            if !is_multiple(n, divisor) {
                let divisor = divisor.clone();
                self.report(errors, scope, ValidationErrorKind::DivisibleBy { divisor });
            }
        }
    }

    fn string(
        &self,
        string: &StringKeywords,
        scope: Scope<'_, 'd>,
        s: &str,
        dialect: Dialect,
        errors: &mut Vec<ValidationError<'d>>,
    ) {
        let length = s.chars().count() as u64;
        if let Some(limit) = string.max_length {
            if length > limit {
                self.report(errors, scope, ValidationErrorKind::MaxLength { limit });
            }
        }
        if let Some(limit) = string.min_length {
            if length < limit {
                self.report(errors, scope, ValidationErrorKind::MinLength { limit });
            }
        }

        if let Some(pattern) = &string.pattern {
            if let Some(matcher) = self.compile(pattern) {
                if !matcher.matches(s) {
                    let pattern = pattern.clone();
                    self.report(errors, scope, ValidationErrorKind::Pattern { pattern });
                }
            }
        }

        if let Some(format) = &string.format {
            match self.options.formats.check(s, format, dialect) {
                Some(message) if !message.is_empty() => {
                    let format = format.clone();
                    self.report(errors, scope, ValidationErrorKind::Format { format, message });
                }
                _ => {}
            }
        }

        if self.options.content_assertion_dialects.contains(&dialect) {
            self.content(string, scope, s, errors);
        }
    }

    fn content(
        &self,
        string: &StringKeywords,
        scope: Scope<'_, 'd>,
        s: &str,
        errors: &mut Vec<ValidationError<'d>>,
    ) {
        let decoded = match string.content_encoding.as_deref() {
            Some(encoding) if encoding.eq_ignore_ascii_case("base64") => {
                match BASE64_STANDARD
                    .decode(s)
                    .or_else(|_| BASE64_URL_SAFE.decode(s))
                {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let kind = ValidationErrorKind::ContentEncoding {
                            encoding: encoding.to_string(),
                            reason: e.to_string(),
                        };
                        self.report(errors, scope, kind);
                        return;
                    }
                }
            }
            _ => s.as_bytes().to_vec(),
        };

        if let Some(media_type) = &string.content_media_type {
            if media_type.eq_ignore_ascii_case("application/json") {
                if let Err(e) = serde_json::from_slice::<Value>(&decoded) {
                    let kind = ValidationErrorKind::ContentMediaType {
                        media_type: media_type.clone(),
                        reason: e.to_string(),
                    };
                    self.report(errors, scope, kind);
                }
            }
        }
    }

    fn array(
        &self,
        array: &ArrayKeywords,
        scope: Scope<'_, 'd>,
        items: &[Value],
        errors: &mut Vec<ValidationError<'d>>,
        local: &mut Evaluated,
    ) {
        let Scope { at, anchor, .. } = scope;
        let mut apply = |id: SchemaId, index: usize, errors: &mut Vec<ValidationError<'d>>| {
            if let Some(item) = items.get(index) {
                let location = at.child(index.to_string());
                self.validate_isolated(id, item, &location, errors, anchor);
                local.items.insert(index);
            }
        };

        let mut item_start = 0;
        if let Some(prefix_items) = &array.prefix_items {
            for (index, &id) in prefix_items.iter().enumerate() {
                apply(id, index, errors);
            }
            item_start = prefix_items.len();
        } else if let Some(Items::Tuple(tuple)) = &array.items {
            if let Some(additional) = array.additional_items {
                for index in tuple.len()..items.len() {
                    apply(additional, index, errors);
                }
            }
            for (index, &id) in tuple.iter().enumerate() {
                apply(id, index, errors);
            }
        }
        if let Some(Items::Single(id)) = array.items {
            for index in item_start..items.len() {
                apply(id, index, errors);
            }
        }

        if let Some(contains) = array.contains {
            let mut found = 0u64;
            for (index, item) in items.iter().enumerate() {
                let mut item_errors = Vec::new();
                let location = at.child(index.to_string());
                self.validate_isolated(contains, item, &location, &mut item_errors, anchor);
                if item_errors.is_empty() {
                    found += 1;
                    local.items.insert(index);
                }
            }
            let min = array.min_contains.unwrap_or(1);
            if found < min {
                self.report(errors, scope, ValidationErrorKind::MinContains { limit: min, found });
            }
            if let Some(max) = array.max_contains {
                if found > max {
                    let kind = ValidationErrorKind::MaxContains { limit: max, found };
                    self.report(errors, scope, kind);
                }
            }
        }

        if let Some(unevaluated) = array.unevaluated_items {
            for (index, item) in items.iter().enumerate() {
                if local.items.contains(&index) {
                    continue;
                }
                let location = at.child(index.to_string());
                self.validate_isolated(unevaluated, item, &location, errors, anchor);
                local.items.insert(index);
            }
        }

        let count = items.len() as u64;
        if let Some(limit) = array.max_items {
            if count > limit {
                self.report(errors, scope, ValidationErrorKind::MaxItems { limit });
            }
        }
        if let Some(limit) = array.min_items {
            if count < limit {
                self.report(errors, scope, ValidationErrorKind::MinItems { limit });
            }
        }

        if array.unique_items {
            let mut seen = HashSet::with_capacity(items.len());
            let mut duplicate = false;
            for item in items {
                if !seen.insert(CanonicalValue::new(item)) {
                    duplicate = true;
                }
            }
            if duplicate {
                self.report(errors, scope, ValidationErrorKind::UniqueItems);
            }
        }
    }

    fn object(
        &self,
        object: &ObjectKeywords,
        scope: Scope<'_, 'd>,
        instance: &Value,
        map: &Map<String, Value>,
        errors: &mut Vec<ValidationError<'d>>,
        local: &mut Evaluated,
    ) {
        let Scope { at, anchor, .. } = scope;
        let count = map.len() as u64;
        if let Some(limit) = object.max_properties {
            if count > limit {
                self.report(errors, scope, ValidationErrorKind::MaxProperties { limit });
            }
        }
        if let Some(limit) = object.min_properties {
            if count < limit {
                self.report(errors, scope, ValidationErrorKind::MinProperties { limit });
            }
        }

        for property in &object.required {
            if !map.contains_key(property) {
                let property = property.clone();
                self.report(errors, scope, ValidationErrorKind::MissingProperty { property });
            }
        }
        for (property, id) in &object.properties {
            if !map.contains_key(property) && self.schemas[*id].is_required() {
                let property = property.clone();
                self.report(errors, scope, ValidationErrorKind::MissingProperty { property });
            }
        }

        let patterns: Vec<(Arc<dyn Matcher>, SchemaId)> = object
            .pattern_properties
            .iter()
            .filter_map(|(pattern, id)| self.compile(pattern).map(|matcher| (matcher, *id)))
            .collect();

        let mut matched: HashSet<&str> = HashSet::new();
        for (key, value) in map {
            let location = at.child(key.as_str());
            if let Some(id) = object.property(key) {
                self.validate_isolated(id, value, &location, errors, anchor);
                matched.insert(key);
                local.properties.insert(key.clone());
            }
            for (matcher, id) in &patterns {
                if matcher.matches(key) {
                    self.validate_isolated(*id, value, &location, errors, anchor);
                    matched.insert(key);
                    local.properties.insert(key.clone());
                }
            }
            if let Some(names) = object.property_names {
                let name = Value::String(key.clone());
                let name_location = Location {
                    pointer: at.pointer.clone(),
                    property_name: Some(key.clone()),
                };
                self.validate_isolated(names, &name, &name_location, errors, anchor);
            }
        }

        for (property, &id) in &object.dependent_schemas {
            if map.contains_key(property) {
                self.validate(id, instance, at, errors, local, anchor);
            }
        }

        if let Some(additional) = object.additional_properties {
            for (key, value) in map {
                if matched.contains(key.as_str()) {
                    continue;
                }
                let location = at.child(key.as_str());
                self.validate_isolated(additional, value, &location, errors, anchor);
                local.properties.insert(key.clone());
            }
        }

        if let Some(unevaluated) = object.unevaluated_properties {
            for (key, value) in map {
                if local.properties.contains(key) {
                    continue;
                }
                let location = at.child(key.as_str());
                self.validate_isolated(unevaluated, value, &location, errors, anchor);
                local.properties.insert(key.clone());
            }
        }

        for (property, dependencies) in &object.dependent_required {
            if !map.contains_key(property) {
                continue;
            }
            for dependency in dependencies {
                if !map.contains_key(dependency) {
                    let kind = ValidationErrorKind::Dependency {
                        property: property.clone(),
                        dependency: dependency.clone(),
                    };
                    self.report(errors, scope, kind);
                }
            }
        }
    }

    /// The `type` and draft-03 `disallow` name checks shared by every kind.
    fn type_check(
        &self,
        keywords: &Keywords,
        scope: Scope<'_, 'd>,
        instance: &Value,
        dialect: Dialect,
        errors: &mut Vec<ValidationError<'d>>,
    ) {
        let generic = &keywords.generic;
        let found = instance_types(instance, dialect);

        let disallowed: Vec<String> = found
            .iter()
            .filter(|name| generic.disallow.contains(**name))
            .map(|name| name.to_string())
            .collect();
        if !disallowed.is_empty() {
            self.report(errors, scope, ValidationErrorKind::TypeDisallowed { types: disallowed });
        }

        let Some(types) = &generic.types else {
            return;
        };
        for &type_schema in &types.schemas {
            let mut type_errors = Vec::new();
            self.validate_isolated(type_schema, instance, scope.at, &mut type_errors, None);
            if type_errors.is_empty() {
                return;
            }
        }
        if types.names.contains("any") || (types.names.is_empty() && types.schemas.is_empty()) {
            return;
        }
        if !found.iter().any(|name| types.names.contains(*name)) {
            let kind = ValidationErrorKind::Type {
                expected: types.names.iter().cloned().collect(),
                found: found.iter().map(|name| name.to_string()).collect(),
            };
            self.report(errors, scope, kind);
        }
    }

    fn compile(&self, pattern: &str) -> Option<Arc<dyn Matcher>> {
        match self.options.patterns.compile(pattern) {
            Ok(matcher) => Some(matcher),
            Err(e) => {
                tracing::warn!(error = %e, "skipping invalid pattern");
                None
            }
        }
    }

    fn report(
        &self,
        errors: &mut Vec<ValidationError<'d>>,
        scope: Scope<'_, 'd>,
        kind: ValidationErrorKind<'d>,
    ) {
        let error = ValidationError::new(
            scope.at.pointer.clone(),
            scope.at.property_name.clone(),
            self.document,
            scope.schema,
            kind,
        );
        let keep = self
            .options
            .error_filter
            .as_ref()
            .map_or(true, |filter| filter(&error));
        if keep {
            errors.push(error);
        }
    }
}

/// The type names `instance` satisfies under `dialect`.
fn instance_types(instance: &Value, dialect: Dialect) -> Vec<&'static str> {
    match instance {
        Value::Null => vec!["null"],
        Value::Bool(_) => vec!["boolean"],
        Value::String(_) => vec!["string"],
        Value::Array(_) => vec!["array"],
        Value::Object(_) => vec!["object"],
        Value::Number(n) => {
            let integer = if dialect.integer_by_representation() {
                !n.is_f64()
            } else {
                Decimal::from_number(n).is_some_and(|d| d.is_integer())
            };
            if integer {
                vec!["number", "integer"]
            } else {
                vec!["number"]
            }
        }
    }
}

fn compare(a: &Number, b: &Number) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x.cmp(&y);
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

/// Exact decimal divisibility. A zero divisor constrains nothing.
fn is_multiple(value: &Number, divisor: &Number) -> bool {
    match (Decimal::from_number(value), Decimal::from_number(divisor)) {
        (Some(v), Some(d)) => v.is_multiple_of(&d).unwrap_or(true),
        _ => true,
    }
}
