//! Trade domain model.
//!
//! # Responsibility
//! - Define purchase/sale events linking one lot to one counterparty.
//!
//! # Invariants
//! - `emerald_lot_id` and `counterparty_id` are non-owning references;
//!   their existence is checked by the store, not here.
//! - `total_price` is authoritative for reporting and is never recomputed
//!   from `unit_price`.

use super::counterparty::CounterpartyId;
use super::lot::LotId;
use super::{
    double_option, merge, non_null, require_finite, require_non_blank, UnknownTag,
    ValidationError,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Store-assigned trade identifier.
pub type TradeId = i64;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeType {
    Purchase,
    Sale,
}

impl TradeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "PURCHASE",
            Self::Sale => "SALE",
        }
    }
}

impl FromStr for TradeType {
    type Err = UnknownTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "PURCHASE" => Ok(Self::Purchase),
            "SALE" => Ok(Self::Sale),
            other => Err(UnknownTag {
                kind: "trade type",
                value: other.to_string(),
            }),
        }
    }
}

impl Display for TradeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    #[serde(rename = "type")]
    pub kind: TradeType,
    pub date: NaiveDate,
    /// Currency code as entered, e.g. `USD`. Not normalized.
    pub currency: String,
    pub unit_price: f64,
    pub total_price: f64,
    pub location: Option<String>,
    pub emerald_lot_id: LotId,
    pub counterparty_id: CounterpartyId,
}

impl Trade {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_trade(&self.currency, self.unit_price, self.total_price)
    }
}

/// Create payload for a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrade {
    #[serde(rename = "type")]
    pub kind: TradeType,
    pub date: NaiveDate,
    pub currency: String,
    pub unit_price: f64,
    pub total_price: f64,
    #[serde(default)]
    pub location: Option<String>,
    pub emerald_lot_id: LotId,
    pub counterparty_id: CounterpartyId,
}

impl NewTrade {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_trade(&self.currency, self.unit_price, self.total_price)
    }
}

/// Partial update for a trade. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradePatch {
    #[serde(
        rename = "type",
        default,
        deserialize_with = "non_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<TradeType>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub emerald_lot_id: Option<LotId>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub counterparty_id: Option<CounterpartyId>,
}

impl TradePatch {
    pub fn apply_to(&self, trade: &mut Trade) {
        merge(&mut trade.kind, &self.kind);
        merge(&mut trade.date, &self.date);
        merge(&mut trade.currency, &self.currency);
        merge(&mut trade.unit_price, &self.unit_price);
        merge(&mut trade.total_price, &self.total_price);
        merge(&mut trade.location, &self.location);
        merge(&mut trade.emerald_lot_id, &self.emerald_lot_id);
        merge(&mut trade.counterparty_id, &self.counterparty_id);
    }
}

fn validate_trade(currency: &str, unit_price: f64, total_price: f64) -> Result<(), ValidationError> {
    require_non_blank("currency", currency)?;
    require_finite("unit_price", unit_price)?;
    require_finite("total_price", total_price)
}

#[cfg(test)]
mod tests {
    use super::{NewTrade, TradeType};
    use chrono::NaiveDate;

    fn purchase() -> NewTrade {
        NewTrade {
            kind: TradeType::Purchase,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            currency: "USD".to_string(),
            unit_price: 1000.0,
            total_price: 2500.0,
            location: Some("New York".to_string()),
            emerald_lot_id: 1,
            counterparty_id: 1,
        }
    }

    #[test]
    fn valid_trade_passes() {
        assert!(purchase().validate().is_ok());
    }

    #[test]
    fn blank_currency_is_rejected() {
        let mut trade = purchase();
        trade.currency = " ".to_string();
        assert_eq!(trade.validate().unwrap_err().field, "currency");
    }

    #[test]
    fn non_finite_total_is_rejected() {
        let mut trade = purchase();
        trade.total_price = f64::NAN;
        assert_eq!(trade.validate().unwrap_err().field, "total_price");
    }

    #[test]
    fn negative_prices_are_accepted() {
        let mut trade = purchase();
        trade.unit_price = -5.0;
        trade.total_price = -12.5;
        assert!(trade.validate().is_ok());
    }
}
