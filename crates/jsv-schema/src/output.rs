//! Machine-readable validation output.
//!
//! [`Validator::validate_with_output`] produces an [`OutputReport`] in the
//! "basic" output shape: a `valid` flag plus a flat list of errors. The report
//! is checked against the bundled output schema before it is returned.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SchemaError, SchemaValidationError, ValidationError, ValidationViolations};
use crate::registry::SchemaSet;
use crate::schema::SchemaId;
use crate::source::{MapSource, SourceError};
use crate::validator::{ValidationOptions, Validator};

const OUTPUT_SCHEMA_URI: &str = "https://json-schema.org/draft/2019-09/output/schema";
const OUTPUT_SCHEMA: &str = include_str!("../schemas/output.schema.json");

static OUTPUT_SET: Lazy<Result<(SchemaSet, SchemaId), SchemaError>> = Lazy::new(|| {
    let value: Value =
        serde_json::from_str(OUTPUT_SCHEMA).map_err(|e| SchemaError::DocumentUnavailable {
            uri: OUTPUT_SCHEMA_URI.to_string(),
            source: SourceError::Parse {
                uri: OUTPUT_SCHEMA_URI.to_string(),
                reason: e.to_string(),
            },
        })?;
    let mut set = SchemaSet::with_source(MapSource::new());
    let id = set.load_value(value)?;
    Ok((set, id))
});

/// Result of one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputReport {
    pub valid: bool,
    /// Absent from the JSON form when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<OutputUnit>,
}

/// One error in an [`OutputReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputUnit {
    /// Rendered error.
    pub error: String,
    /// Canonical URI of the failing schema node.
    pub keyword_location: String,
    /// URI of the failing node relative to its nearest `$id`.
    pub absolute_keyword_location: String,
    /// Instance location as a URI fragment, `#` for the root.
    pub instance_location: String,
}

impl OutputUnit {
    fn new(schemas: &SchemaSet, error: &ValidationError<'_>) -> Self {
        let schema = error.schema();
        let keyword_location = schema.uri().to_string();
        let absolute_keyword_location = schemas
            .resource_uri(schema.id())
            .map_or_else(|| keyword_location.clone(), |url| url.to_string());
        Self {
            error: error.to_string(),
            keyword_location,
            absolute_keyword_location,
            instance_location: error.instance_location(),
        }
    }
}

impl Validator<'_> {
    /// Validate `document` and describe the outcome as an [`OutputReport`].
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError::OutputSelfCheck`] if the report does
    /// not conform to the output schema.
    pub fn validate_with_output(
        &self,
        id: SchemaId,
        document: &Value,
    ) -> Result<OutputReport, SchemaValidationError> {
        let errors = self.errors(id, document);
        let report = OutputReport {
            valid: errors.is_empty(),
            errors: errors
                .iter()
                .map(|error| OutputUnit::new(self.schemas(), error))
                .collect(),
        };
        check_report(&report)?;
        Ok(report)
    }
}

fn check_report(report: &OutputReport) -> Result<(), SchemaValidationError> {
    let (set, id) = OUTPUT_SET
        .as_ref()
        .map_err(|e| SchemaValidationError::Schema(e.clone()))?;
    let value = serde_json::to_value(report)?;
    let checker = Validator::new(set, ValidationOptions::default());
    let errors = checker.errors(*id, &value);
    if errors.is_empty() {
        return Ok(());
    }
    tracing::warn!(errors = errors.len(), "output report failed its self-check");
    Err(SchemaValidationError::OutputSelfCheck {
        violations: ValidationViolations::from_errors(&errors),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_report_omits_errors() {
        let mut set = SchemaSet::new();
        let id = set.load_value(json!({"type": "string"})).unwrap();
        let validator = Validator::new(&set, ValidationOptions::default());
        let report = validator.validate_with_output(id, &json!("ok")).unwrap();
        assert!(report.valid);
        assert_eq!(serde_json::to_value(&report).unwrap(), json!({"valid": true}));
    }

    #[test]
    fn test_invalid_report_lists_errors() {
        let mut set = SchemaSet::new();
        let id = set
            .load_value(json!({
                "$id": "https://example.com/person.json",
                "properties": {"age": {"type": "integer"}}
            }))
            .unwrap();
        let validator = Validator::new(&set, ValidationOptions::default());
        let report = validator
            .validate_with_output(id, &json!({"age": "old"}))
            .unwrap();
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        let unit = &report.errors[0];
        assert_eq!(unit.instance_location, "#/age");
        assert_eq!(
            unit.keyword_location,
            "https://example.com/person.json#/properties/age"
        );
        assert_eq!(unit.absolute_keyword_location, unit.keyword_location);

        let value = serde_json::to_value(&report).unwrap();
        assert!(value["errors"][0].get("instanceLocation").is_some());
        assert!(value["errors"][0].get("absoluteKeywordLocation").is_some());
    }

    #[test]
    fn test_self_check_rejects_inconsistent_report() {
        let report = OutputReport {
            valid: true,
            errors: vec![OutputUnit {
                error: "x".to_string(),
                keyword_location: "https://example.com/s.json#".to_string(),
                absolute_keyword_location: "https://example.com/s.json#".to_string(),
                instance_location: "#".to_string(),
            }],
        };
        assert!(matches!(
            check_report(&report),
            Err(SchemaValidationError::OutputSelfCheck { .. })
        ));
    }

    #[test]
    fn test_report_round_trips_through_serde() {
        let text = r##"{"valid": false, "errors": [{"error": "e", "keywordLocation": "k",
            "absoluteKeywordLocation": "a", "instanceLocation": "#"}]}"##;
        let report: OutputReport = serde_json::from_str(text).unwrap();
        assert_eq!(report.errors[0].absolute_keyword_location, "a");
    }
}
