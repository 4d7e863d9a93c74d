//! Counterparty domain model.
//!
//! # Invariants
//! - `name` is non-blank and unique across counterparties (uniqueness is
//!   enforced by the store).

use super::{double_option, merge, non_null, require_non_blank, UnknownTag, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Store-assigned counterparty identifier.
pub type CounterpartyId = i64;

/// Role a counterparty plays in trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounterpartyType {
    Supplier,
    Buyer,
    Both,
}

impl CounterpartyType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Supplier => "SUPPLIER",
            Self::Buyer => "BUYER",
            Self::Both => "BOTH",
        }
    }
}

impl FromStr for CounterpartyType {
    type Err = UnknownTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "SUPPLIER" => Ok(Self::Supplier),
            "BUYER" => Ok(Self::Buyer),
            "BOTH" => Ok(Self::Both),
            other => Err(UnknownTag {
                kind: "counterparty type",
                value: other.to_string(),
            }),
        }
    }
}

impl Display for CounterpartyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted trading partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub id: CounterpartyId,
    pub name: String,
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub kind: CounterpartyType,
    pub contact_info: Option<String>,
    pub country: Option<String>,
    /// Free-form know-your-customer notes.
    pub kyc_notes: Option<String>,
}

impl Counterparty {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("name", &self.name)
    }
}

/// Create payload for a counterparty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCounterparty {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CounterpartyType,
    #[serde(default)]
    pub contact_info: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub kyc_notes: Option<String>,
}

impl NewCounterparty {
    pub fn new(name: impl Into<String>, kind: CounterpartyType) -> Self {
        Self {
            name: name.into(),
            kind,
            contact_info: None,
            country: None,
            kyc_notes: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("name", &self.name)
    }
}

/// Partial update for a counterparty. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartyPatch {
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "non_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<CounterpartyType>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_info: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub country: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub kyc_notes: Option<Option<String>>,
}

impl CounterpartyPatch {
    pub fn apply_to(&self, counterparty: &mut Counterparty) {
        merge(&mut counterparty.name, &self.name);
        merge(&mut counterparty.kind, &self.kind);
        merge(&mut counterparty.contact_info, &self.contact_info);
        merge(&mut counterparty.country, &self.country);
        merge(&mut counterparty.kyc_notes, &self.kyc_notes);
    }
}

#[cfg(test)]
mod tests {
    use super::{Counterparty, CounterpartyPatch, CounterpartyType};

    #[test]
    fn patch_keeps_omitted_fields() {
        let mut counterparty = Counterparty {
            id: 1,
            name: "Test Supplier".to_string(),
            kind: CounterpartyType::Supplier,
            contact_info: Some("test@example.com".to_string()),
            country: Some("Colombia".to_string()),
            kyc_notes: Some("Verified supplier".to_string()),
        };
        let patch = CounterpartyPatch {
            name: Some("Updated Supplier".to_string()),
            country: Some(Some("Brazil".to_string())),
            ..CounterpartyPatch::default()
        };

        patch.apply_to(&mut counterparty);

        assert_eq!(counterparty.name, "Updated Supplier");
        assert_eq!(counterparty.country.as_deref(), Some("Brazil"));
        assert_eq!(counterparty.kind, CounterpartyType::Supplier);
        assert_eq!(counterparty.contact_info.as_deref(), Some("test@example.com"));
        assert_eq!(counterparty.kyc_notes.as_deref(), Some("Verified supplier"));
    }
}
