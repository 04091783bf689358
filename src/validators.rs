//! Input validation for order parameters.
//!
//! Pure functions turning raw CLI strings into an [`OrderRequest`].

use std::fmt;

use crate::error::ValidationError;

/// Quote asset every tradable symbol must be denominated in.
pub const QUOTE_SUFFIX: &str = "USDT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pricing {
    Market,
    Limit { price: f64 },
}

/// A validated order. A price exists exactly when the order is LIMIT.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    symbol: String,
    side: Side,
    quantity: f64,
    pricing: Pricing,
}

impl OrderRequest {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn order_type(&self) -> OrderType {
        match self.pricing {
            Pricing::Market => OrderType::Market,
            Pricing::Limit { .. } => OrderType::Limit,
        }
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn price(&self) -> Option<f64> {
        match self.pricing {
            Pricing::Market => None,
            Pricing::Limit { price } => Some(price),
        }
    }
}

fn required<'a>(field: &'static str, raw: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    Ok(trimmed)
}

fn parse_positive(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    let value: f64 = raw.parse().map_err(|_| ValidationError::NotANumber {
        field,
        value: raw.to_string(),
    })?;
    if !value.is_finite() {
        return Err(ValidationError::NotANumber { field, value: raw.to_string() });
    }
    if value <= 0.0 {
        return Err(ValidationError::NotPositive { field, value: raw.to_string() });
    }
    Ok(value)
}

pub fn validate_symbol(raw: &str) -> Result<String, ValidationError> {
    let symbol = required("Symbol", raw)?.to_uppercase();
    if !symbol.ends_with(QUOTE_SUFFIX) {
        return Err(ValidationError::InvalidSymbol(symbol));
    }
    Ok(symbol)
}

pub fn validate_side(raw: &str) -> Result<Side, ValidationError> {
    let side = required("Side", raw)?.to_uppercase();
    match side.as_str() {
        "BUY" => Ok(Side::Buy),
        "SELL" => Ok(Side::Sell),
        _ => Err(ValidationError::InvalidSide(side)),
    }
}

pub fn validate_order_type(raw: &str) -> Result<OrderType, ValidationError> {
    let order_type = required("Order type", raw)?.to_uppercase();
    match order_type.as_str() {
        "MARKET" => Ok(OrderType::Market),
        "LIMIT" => Ok(OrderType::Limit),
        _ => Err(ValidationError::InvalidOrderType(order_type)),
    }
}

pub fn validate_quantity(raw: &str) -> Result<f64, ValidationError> {
    parse_positive("quantity", required("Quantity", raw)?)
}

/// MARKET orders never carry a price; whatever was supplied is dropped.
pub fn validate_price(raw: Option<&str>, order_type: OrderType) -> Result<Option<f64>, ValidationError> {
    match order_type {
        OrderType::Market => Ok(None),
        OrderType::Limit => {
            let raw = raw.map(str::trim).unwrap_or_default();
            if raw.is_empty() {
                return Err(ValidationError::MissingLimitPrice);
            }
            parse_positive("price", raw).map(Some)
        }
    }
}

/// Validate all five fields, surfacing the first failure in the order
/// order_type, symbol, side, quantity, price.
pub fn validate_order_params(
    symbol: &str,
    side: &str,
    order_type: &str,
    quantity: &str,
    price: Option<&str>,
) -> Result<OrderRequest, ValidationError> {
    let order_type = validate_order_type(order_type)?;
    let symbol = validate_symbol(symbol)?;
    let side = validate_side(side)?;
    let quantity = validate_quantity(quantity)?;
    let pricing = match validate_price(price, order_type)? {
        Some(price) => Pricing::Limit { price },
        None => Pricing::Market,
    };

    Ok(OrderRequest { symbol, side, quantity, pricing })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_uppercased_and_suffix_checked() {
        assert_eq!(validate_symbol("btcusdt").unwrap(), "BTCUSDT");
        assert_eq!(validate_symbol("BTCUSDT").unwrap(), "BTCUSDT");
        assert!(matches!(validate_symbol("ETHBTC"), Err(ValidationError::InvalidSymbol(s)) if s == "ETHBTC"));
        assert!(matches!(validate_symbol(""), Err(ValidationError::Missing { .. })));
    }

    #[test]
    fn test_side_and_type_case_insensitive() {
        assert_eq!(validate_side("sell").unwrap(), Side::Sell);
        assert_eq!(validate_order_type("Limit").unwrap(), OrderType::Limit);
        assert!(matches!(validate_side("HOLD"), Err(ValidationError::InvalidSide(s)) if s == "HOLD"));
        assert!(matches!(validate_order_type("stop"), Err(ValidationError::InvalidOrderType(s)) if s == "STOP"));
    }

    #[test]
    fn test_non_finite_quantity_rejected() {
        assert!(matches!(validate_quantity("inf"), Err(ValidationError::NotANumber { .. })));
        assert!(matches!(validate_quantity("NaN"), Err(ValidationError::NotANumber { .. })));
    }

    #[test]
    fn test_market_request_has_no_price() {
        let req = validate_order_params("btcusdt", "buy", "market", "1", Some("123")).unwrap();
        assert_eq!(req.order_type(), OrderType::Market);
        assert_eq!(req.price(), None);
    }

    #[test]
    fn test_first_failure_follows_evaluation_order() {
        // Both type and symbol are bad: type is checked first.
        let err = validate_order_params("ETHBTC", "BUY", "STOP", "1", None).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidOrderType(_)));

        // Bad side and bad quantity: side wins.
        let err = validate_order_params("BTCUSDT", "up", "MARKET", "abc", None).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidSide(_)));

        // Bad symbol and bad side: symbol wins.
        let err = validate_order_params("ETHBTC", "up", "MARKET", "1", None).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidSymbol(_)));

        // Bad quantity and bad price: quantity wins.
        let err = validate_order_params("BTCUSDT", "BUY", "LIMIT", "0", Some("-5")).unwrap_err();
        assert!(matches!(err, ValidationError::NotPositive { field: "quantity", .. }));

        // Bad type and missing limit price: type wins.
        let err = validate_order_params("BTCUSDT", "BUY", "STOP", "1", None).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidOrderType(_)));
    }
}
