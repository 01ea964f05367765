//! # Canonical Values — Equality and Hashing for JSON Values
//!
//! This module defines `CanonicalValue`, the only representation used when
//! the validator asks whether two JSON values are "the same": `const`, `enum`
//! and `uniqueItems` all compare canonical forms.
//!
//! ## Equality Rules
//!
//! The coercion rules follow JSON Schema's definition of instance equality:
//!
//! 1. **Numbers compare numerically**: `1`, `1.0` and `1e0` are equal. Numbers
//!    are converted through [`Decimal`], so equality is exact rather than
//!    subject to `f64` rounding.
//! 2. **Objects ignore key order**: keys are held in a `BTreeMap`.
//! 3. **Arrays respect element order**: `[1, 2]` and `[2, 1]` differ.
//! 4. **Kinds never cross**: `1` and `"1"` differ, as do `false` and `0`.
//!
//! ## Invariants
//!
//! - `CanonicalValue` derives `Eq` and `Hash`; both are consistent with the
//!   rules above, so canonical values can be placed in a `HashSet` to detect
//!   duplicates.

use std::collections::BTreeMap;

use serde_json::{Number, Value};

use crate::number::Decimal;

/// A JSON number in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CanonicalNumber {
    /// The exact decimal value. Every number `serde_json` produces fits here.
    Exact(Decimal),
    /// Bit pattern of the `f64` for numbers whose text could not be parsed
    /// as a decimal.
    Approximate(u64),
}

impl CanonicalNumber {
    fn new(number: &Number) -> Self {
        match Decimal::from_number(number) {
            Some(decimal) => Self::Exact(decimal),
            None => {
                let f = number.as_f64().unwrap_or(f64::NAN);
                // Fold -0.0 onto 0.0 so the bit patterns agree.
                let f = if f == 0.0 { 0.0 } else { f };
                Self::Approximate(f.to_bits())
            }
        }
    }
}

/// A JSON value normalized for deep equality and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CanonicalValue {
    /// `null`.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// Any number, integer or float.
    Number(CanonicalNumber),
    /// A string, compared by code points.
    String(String),
    /// An ordered list.
    Array(Vec<CanonicalValue>),
    /// A string-keyed map with key order erased.
    Object(BTreeMap<String, CanonicalValue>),
}

impl CanonicalValue {
    /// Convert a decoded JSON value into canonical form.
    pub fn new(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(CanonicalNumber::new(n)),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Array(items.iter().map(Self::new).collect()),
            Value::Object(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::new(v)))
                    .collect(),
            ),
        }
    }

    /// Returns true if two JSON values are equal under the canonical rules.
    pub fn equal(a: &Value, b: &Value) -> bool {
        Self::new(a) == Self::new(b)
    }
}

impl From<&Value> for CanonicalValue {
    fn from(value: &Value) -> Self {
        Self::new(value)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for generating arbitrary JSON values with integer numbers.
    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| serde_json::json!(n)),
            "[a-z0-9 ]{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..6).prop_map(|m| {
                    let map: serde_json::Map<String, Value> = m.into_iter().collect();
                    Value::Object(map)
                }),
            ]
        })
    }

    /// Replace every integer with the equivalent float.
    fn floatify(value: &Value) -> Value {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(|i| serde_json::json!(i as f64))
                .unwrap_or_else(|| value.clone()),
            Value::Array(items) => Value::Array(items.iter().map(floatify).collect()),
            Value::Object(map) => Value::Object(
                map.iter().map(|(k, v)| (k.clone(), floatify(v))).collect(),
            ),
            other => other.clone(),
        }
    }

    /// Reverse insertion order of every object.
    fn reverse_keys(value: &Value) -> Value {
        match value {
            Value::Array(items) => Value::Array(items.iter().map(reverse_keys).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .rev()
                    .map(|(k, v)| (k.clone(), reverse_keys(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    proptest! {
        /// Every value equals itself.
        #[test]
        fn canonical_reflexive(value in json_value()) {
            prop_assert!(CanonicalValue::equal(&value, &value));
        }

        /// Numeric representation does not affect equality.
        #[test]
        fn canonical_ignores_number_representation(value in json_value()) {
            prop_assert!(CanonicalValue::equal(&value, &floatify(&value)));
        }

        /// Object insertion order does not affect equality.
        #[test]
        fn canonical_ignores_key_order(value in json_value()) {
            prop_assert!(CanonicalValue::equal(&value, &reverse_keys(&value)));
        }
    }
}
