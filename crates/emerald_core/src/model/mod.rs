//! Ledger domain model for lots, counterparties and trades.
//!
//! # Responsibility
//! - Define canonical data structures used by repository and report logic.
//! - Provide create payloads, partial-update patches and validation rules.
//!
//! # Invariants
//! - Ids are assigned by the store and are never part of a create or patch
//!   payload.
//! - Enumerated columns are closed Rust enums, tagged by their upper-case
//!   name in JSON and in storage.
//! - Create payloads and merged patch results are validated before any SQL
//!   mutation.

use serde::{de, Deserialize, Deserializer};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod counterparty;
pub mod lot;
pub mod trade;

/// Rejected input for a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Payload field name as it appears in JSON.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid `{}`: {}", self.field, self.message)
    }
}

impl Error for ValidationError {}

/// Unknown enum tag, either from user input or from a persisted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTag {
    pub kind: &'static str,
    pub value: String,
}

impl Display for UnknownTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {} `{}`", self.kind, self.value)
    }
}

impl Error for UnknownTag {}

pub(crate) fn require_non_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be blank"));
    }
    Ok(())
}

pub(crate) fn require_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::new(field, "must be a finite number"));
    }
    Ok(())
}

/// Distinguishes an absent JSON field (`None`) from an explicit `null`
/// (`Some(None)`) for nullable patch fields.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Rejects an explicit `null` for patch fields backed by non-nullable
/// columns. Only called when the key is present.
pub(crate) fn non_null<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    match Option::<T>::deserialize(deserializer)? {
        Some(value) => Ok(Some(value)),
        None => Err(de::Error::custom("field must not be null")),
    }
}

pub(crate) fn merge<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}
