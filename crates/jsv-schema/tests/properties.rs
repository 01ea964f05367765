//! Behavioral properties of the validator, checked through the public API.

use proptest::prelude::*;
use serde_json::{json, Value};

use jsv_schema::{Dialect, SchemaSet, ValidationErrorKind, ValidationOptions, Validator};

fn errors(schema: Value, instance: &Value) -> Vec<String> {
    let mut set = SchemaSet::new();
    let id = set.load_value(schema).unwrap();
    let validator = Validator::new(&set, ValidationOptions::default());
    validator
        .errors(id, instance)
        .iter()
        .map(|e| e.instance_location())
        .collect()
}

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        (-1.0e6f64..1.0e6).prop_map(|f| json!(f)),
        "[a-zA-Z0-9_ ~/%]{0,16}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z~/]{1,6}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

#[test]
fn test_canonical_equality_for_const_and_enum() {
    assert!(errors(json!({"const": 1}), &json!(1.0)).is_empty());
    assert!(errors(
        json!({"enum": [{"a": 1, "b": 2}]}),
        &json!({"b": 2, "a": 1})
    )
    .is_empty());
    assert_eq!(errors(json!({"const": [1, 2]}), &json!([2, 1])).len(), 1);
}

#[test]
fn test_unique_items_across_representations() {
    assert_eq!(errors(json!({"uniqueItems": true}), &json!([1, 1.0])).len(), 1);
    assert!(errors(json!({"uniqueItems": true}), &json!([1, "1"])).is_empty());
}

#[test]
fn test_any_of_passing_branch_marks_evaluated() {
    let schema = json!({
        "anyOf": [{"type": "string"}, {"type": "number"}]
    });
    assert!(errors(schema, &json!("x")).is_empty());

    let schema = json!({
        "anyOf": [
            {"properties": {"a": true}},
            {"type": "number"}
        ],
        "unevaluatedProperties": false
    });
    assert!(errors(schema, &json!({"a": 1})).is_empty());
}

#[test]
fn test_one_of_with_two_passing_branches() {
    let mut set = SchemaSet::new();
    let id = set
        .load_value(json!({"oneOf": [{"type": "integer"}, {"minimum": 0}]}))
        .unwrap();
    let validator = Validator::new(&set, ValidationOptions::default());
    let instance = json!(5);
    let errors = validator.errors(id, &instance);
    assert_eq!(errors.len(), 1);
    match errors[0].kind() {
        ValidationErrorKind::OneOf { passed, .. } => assert_eq!(passed, &vec![0, 1]),
        other => panic!("expected a oneOf error, got {other:?}"),
    }
}

#[test]
fn test_unevaluated_properties_reports_only_unknown() {
    let schema = json!({
        "properties": {"a": true},
        "patternProperties": {"^b": true},
        "unevaluatedProperties": false
    });
    assert_eq!(
        errors(schema, &json!({"a": 1, "bx": 2, "c": 3})),
        vec!["#/c".to_string()]
    );
}

#[test]
fn test_self_recursive_anchor_terminates() {
    let schema = json!({
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "$recursiveAnchor": true,
        "type": "object",
        "properties": {"next": {"$recursiveRef": "#"}}
    });
    assert!(errors(schema.clone(), &json!({})).is_empty());
    assert!(errors(schema.clone(), &json!({"next": {"next": {"next": {}}}})).is_empty());
    assert_eq!(
        errors(schema, &json!({"next": {"next": 3}})),
        vec!["#/next/next".to_string()]
    );
}

#[test]
fn test_integer_detection_by_dialect() {
    for dialect in [Dialect::Draft3, Dialect::Draft4] {
        let schema = json!({"$schema": dialect.uri(), "type": "integer"});
        assert_eq!(errors(schema, &json!(1.0)).len(), 1, "{dialect}");
    }
    for dialect in [Dialect::Draft6, Dialect::Draft7, Dialect::Draft2019_09, Dialect::Draft2020_12] {
        let schema = json!({"$schema": dialect.uri(), "type": "integer"});
        assert!(errors(schema, &json!(1.0)).is_empty(), "{dialect}");
    }
}

#[test]
fn test_missing_property_has_no_offending_value() {
    let mut set = SchemaSet::new();
    let id = set
        .load_value(json!({"properties": {"a": {"required": ["b"]}}}))
        .unwrap();
    let validator = Validator::new(&set, ValidationOptions::default());
    let document = json!({"a": {}});
    let errors = validator.errors(id, &document);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0].kind(),
        ValidationErrorKind::MissingProperty { .. }
    ));
    assert_eq!(errors[0].pointer().resolve(&document), Some(&json!({})));
}

#[test]
fn test_property_names_error_points_at_the_object() {
    let mut set = SchemaSet::new();
    let id = set
        .load_value(json!({
            "properties": {"inner": {"propertyNames": {"maxLength": 3}}}
        }))
        .unwrap();
    let validator = Validator::new(&set, ValidationOptions::default());
    let document = json!({"inner": {"abcd": 1, "ab": 2}});
    let errors = validator.errors(id, &document);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].instance_location(), "#/inner");
    assert_eq!(errors[0].property_name(), Some("abcd"));
    assert_eq!(
        errors[0].pointer().resolve(&document),
        Some(&json!({"abcd": 1, "ab": 2}))
    );
}

#[test]
fn test_multiple_of_is_exact() {
    let cases = [
        (json!(0.0001), json!(0.0075), true),
        (json!(0.0001), json!(0.00751), false),
        (json!(0.01), json!(19.99), true),
        (json!(0.1), json!(0.3), true),
        (json!(0.5), json!(1e308), true),
        (json!(3), json!(1e308), false),
        (json!(1e-300), json!(-1.5e300), true),
        (json!(5), json!(u64::MAX), true),
        (json!(7), json!(u64::MAX), false),
    ];
    for (divisor, instance, expected) in cases {
        let found = errors(json!({"multipleOf": divisor}), &instance);
        assert_eq!(found.is_empty(), expected, "{instance} multipleOf {divisor}");
    }
}

proptest! {
    /// The true schema accepts everything.
    #[test]
    fn true_schema_accepts_everything(instance in json_value()) {
        prop_assert!(errors(json!(true), &instance).is_empty());
    }

    /// The false schema yields exactly one error, at the root.
    #[test]
    fn false_schema_rejects_everything_once(instance in json_value()) {
        prop_assert_eq!(errors(json!(false), &instance), vec!["#".to_string()]);
    }

    /// Every reported pointer resolves in the validated document. A
    /// `propertyNames` error points at the object holding the key.
    #[test]
    fn error_pointers_resolve(instance in json_value()) {
        let mut set = SchemaSet::new();
        let id = set
            .load_value(json!({
                "type": ["object", "array", "string"],
                "items": {"type": "integer"},
                "additionalProperties": {"type": "string", "maxLength": 3},
                "propertyNames": {"pattern": "^[a-z]+$"}
            }))
            .unwrap();
        let validator = Validator::new(&set, ValidationOptions::default());
        for error in validator.errors(id, &instance) {
            let resolved = error.pointer().resolve(&instance);
            let reported = error.instance();
            prop_assert!(resolved.is_some(), "dangling pointer {}", error.instance_location());
            match error.property_name() {
                Some(name) => {
                    let holder = resolved.and_then(Value::as_object);
                    prop_assert!(holder.is_some_and(|object| object.contains_key(name)));
                    let key = json!(name);
                    prop_assert_eq!(reported.as_deref(), Some(&key));
                }
                None => prop_assert_eq!(reported.as_deref(), resolved),
            }
        }
    }
}
