//! Emerald lot domain model.
//!
//! # Responsibility
//! - Define the physical inventory parcel record and its payload shapes.
//! - Merge partial updates field by field.
//!
//! # Invariants
//! - `lot_code` is non-blank and unique across lots (uniqueness is enforced
//!   by the store).
//! - `carat` is finite and strictly positive.
//! - `status` is a manual flag; trades never change it.

use super::{
    double_option, merge, non_null, require_finite, require_non_blank, UnknownTag,
    ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Store-assigned lot identifier.
pub type LotId = i64;

/// Stock state of a lot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotStatus {
    #[default]
    InStock,
    Sold,
}

impl LotStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "IN_STOCK",
            Self::Sold => "SOLD",
        }
    }
}

impl FromStr for LotStatus {
    type Err = UnknownTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "IN_STOCK" => Ok(Self::InStock),
            "SOLD" => Ok(Self::Sold),
            other => Err(UnknownTag {
                kind: "lot status",
                value: other.to_string(),
            }),
        }
    }
}

impl Display for LotStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted emerald lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmeraldLot {
    pub id: LotId,
    /// Externally issued code, unique across lots.
    pub lot_code: String,
    pub carat: f64,
    pub shape: Option<String>,
    pub color_grade: Option<String>,
    pub clarity: Option<String>,
    pub treatment: Option<String>,
    pub origin: Option<String>,
    /// Lab certificate reference, e.g. a GIA report number.
    pub certificate_id: Option<String>,
    pub status: LotStatus,
}

impl EmeraldLot {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_lot(&self.lot_code, self.carat)
    }
}

/// Create payload for a lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmeraldLot {
    pub lot_code: String,
    pub carat: f64,
    #[serde(default)]
    pub shape: Option<String>,
    #[serde(default)]
    pub color_grade: Option<String>,
    #[serde(default)]
    pub clarity: Option<String>,
    #[serde(default)]
    pub treatment: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub certificate_id: Option<String>,
    #[serde(default)]
    pub status: LotStatus,
}

impl NewEmeraldLot {
    /// Creates a payload with only the required fields set and status
    /// `IN_STOCK`.
    pub fn new(lot_code: impl Into<String>, carat: f64) -> Self {
        Self {
            lot_code: lot_code.into(),
            carat,
            shape: None,
            color_grade: None,
            clarity: None,
            treatment: None,
            origin: None,
            certificate_id: None,
            status: LotStatus::InStock,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_lot(&self.lot_code, self.carat)
    }
}

/// Partial update for a lot. Absent fields keep their stored value.
///
/// Nullable columns use `Option<Option<_>>`: `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmeraldLotPatch {
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub lot_code: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub carat: Option<f64>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub shape: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub color_grade: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub clarity: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub treatment: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub origin: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub certificate_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub status: Option<LotStatus>,
}

impl EmeraldLotPatch {
    /// Overwrites only the fields present in this patch. `id` is untouched.
    pub fn apply_to(&self, lot: &mut EmeraldLot) {
        merge(&mut lot.lot_code, &self.lot_code);
        merge(&mut lot.carat, &self.carat);
        merge(&mut lot.shape, &self.shape);
        merge(&mut lot.color_grade, &self.color_grade);
        merge(&mut lot.clarity, &self.clarity);
        merge(&mut lot.treatment, &self.treatment);
        merge(&mut lot.origin, &self.origin);
        merge(&mut lot.certificate_id, &self.certificate_id);
        merge(&mut lot.status, &self.status);
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn validate_lot(lot_code: &str, carat: f64) -> Result<(), ValidationError> {
    require_non_blank("lot_code", lot_code)?;
    require_finite("carat", carat)?;
    if carat <= 0.0 {
        return Err(ValidationError::new("carat", "must be greater than zero"));
    }
    Ok(())
}
