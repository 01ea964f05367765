//! # jsv-core — Foundational Types for the jsv Schema Engine
//!
//! This crate is the leaf of the jsv workspace. It defines the value-level
//! primitives that the schema model and the validator are built on, and it
//! depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One equality for JSON values.** `const`, `enum` and `uniqueItems` all
//!    compare through [`CanonicalValue`]. Integer `1` and float `1.0` are the
//!    same value; object key order is irrelevant; array order is not.
//!
//! 2. **Exact decimal arithmetic.** `multipleOf`, `divisibleBy` and integer
//!    detection go through [`Decimal`], which works on the shortest decimal
//!    representation of a number instead of its binary `f64` approximation.
//!
//! 3. **Typed locations.** Schema and instance locations are [`JsonPointer`]s,
//!    never bare strings, so escaping is applied in exactly one place.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `jsv-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod error;
pub mod number;
pub mod pointer;

// Re-export primary types for ergonomic imports.
pub use canonical::{CanonicalNumber, CanonicalValue};
pub use error::{ParseDecimalError, PointerError};
pub use number::Decimal;
pub use pointer::JsonPointer;
