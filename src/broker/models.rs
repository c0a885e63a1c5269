//! Wire models for the consumed API surface
//!
//! The API serializes every monetary amount as a decimal string; fields this
//! crate reads are typed, everything else rides along in `extra` so the
//! accounts listing can echo the full record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Paginated envelope used by the list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub buying_power: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioProfile {
    #[serde(default)]
    pub equity: Option<String>,
    #[serde(default)]
    pub market_value: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Opaque instrument reference, resolved separately to a ticker symbol.
    #[serde(default)]
    pub instrument: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub average_buy_price: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_account_profile_keeps_unmodeled_fields() {
        let profile: AccountProfile = serde_json::from_value(json!({
            "account_number": "5PY12345",
            "buying_power": "1200.50",
            "cash": "300.00",
            "type": "cash"
        }))
        .unwrap();

        assert_eq!(profile.account_number.as_deref(), Some("5PY12345"));
        assert_eq!(profile.buying_power.as_deref(), Some("1200.50"));
        assert_eq!(profile.extra["cash"], json!("300.00"));

        // The full record survives a round trip into the accounts listing.
        let echoed = serde_json::to_value(&profile).unwrap();
        assert_eq!(echoed["type"], json!("cash"));
    }

    #[test]
    fn test_paginated_defaults() {
        let page: Paginated<Position> = serde_json::from_value(json!({})).unwrap();
        assert!(page.results.is_empty());
        assert!(page.next.is_none());
    }

    #[test]
    fn test_position_fields_are_optional() {
        let position: Position = serde_json::from_value(json!({
            "quantity": "2.0000"
        }))
        .unwrap();
        assert_eq!(position.quantity.as_deref(), Some("2.0000"));
        assert!(position.instrument.is_none());
        assert!(position.average_buy_price.is_none());
    }
}
