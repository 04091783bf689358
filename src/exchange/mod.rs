use std::fmt;

use serde::Deserialize;

use crate::config::Config;
use crate::error::{ClientError, GatewayError};
use crate::logging::Logger;

mod binance;
pub mod signing;

pub use binance::BinanceFutures;

/// The single venue capability the submitter needs.
pub trait OrderGateway {
    fn create_order(&mut self, fields: &OrderFields) -> Result<OrderResponse, GatewayError>;
}

/// Builds an authenticated futures session from `cfg`.
pub fn get_session(cfg: &Config, logger: &Logger) -> Result<BinanceFutures, ClientError> {
    BinanceFutures::connect(cfg, logger)
}

/// Outbound order parameters, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFields {
    pairs: Vec<(&'static str, String)>,
}

impl OrderFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &'static str, value: impl Into<String>) {
        self.pairs.push((key, value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.pairs.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn to_query(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// A scalar the venue may send either as a JSON string or a JSON number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Text(String),
    Number(serde_json::Number),
}

impl WireValue {
    /// Finite numeric value; `NaN` and infinities count as non-numeric.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            WireValue::Text(s) => s.trim().parse::<f64>().ok(),
            WireValue::Number(n) => n.as_f64(),
        };
        value.filter(|v| v.is_finite())
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireValue::Text(s) => f.write_str(s),
            WireValue::Number(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FillRecord {
    pub qty: WireValue,
    pub price: WireValue,
}

/// The subset of the order-creation response this crate reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: WireValue,
    pub status: String,
    pub executed_qty: WireValue,
    #[serde(default)]
    pub avg_price: Option<WireValue>,
    #[serde(default)]
    pub price: Option<WireValue>,
    #[serde(default)]
    pub fills: Vec<FillRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_keep_order() {
        let mut fields = OrderFields::new();
        fields.push("symbol", "BTCUSDT");
        fields.push("side", "SELL");
        fields.push("timeInForce", "GTC");
        assert_eq!(fields.to_query(), "symbol=BTCUSDT&side=SELL&timeInForce=GTC");
        assert_eq!(fields.get("side"), Some("SELL"));
        assert!(!fields.contains("price"));
    }

    #[test]
    fn test_response_accepts_strings_or_numbers() {
        let body = r#"{
            "orderId": 4021,
            "status": "FILLED",
            "executedQty": "0.002",
            "fills": [{"qty": 1, "price": "100.5"}]
        }"#;
        let resp: OrderResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.order_id.to_string(), "4021");
        assert_eq!(resp.executed_qty.to_string(), "0.002");
        assert!(resp.avg_price.is_none());
        assert_eq!(resp.fills[0].qty.as_f64(), Some(1.0));
        assert_eq!(resp.fills[0].price.as_f64(), Some(100.5));
    }

    #[test]
    fn test_non_finite_text_is_not_numeric() {
        for raw in ["NaN", "inf", "-inf", "infinity"] {
            assert_eq!(WireValue::Text(raw.into()).as_f64(), None, "raw={}", raw);
        }
        assert_eq!(WireValue::Text(" 2.5 ".into()).as_f64(), Some(2.5));
    }

    #[test]
    fn test_response_without_fills() {
        let body = r#"{"orderId":"abc","status":"NEW","executedQty":"0","avgPrice":"0.00000","price":"50000"}"#;
        let resp: OrderResponse = serde_json::from_str(body).unwrap();
        assert!(resp.fills.is_empty());
        assert_eq!(resp.avg_price.unwrap().to_string(), "0.00000");
        assert_eq!(resp.order_id, WireValue::Text("abc".into()));
    }
}
