//! Error families surfaced by the order pipeline.
//!
//! Three disjoint kinds reach the driver: [`ValidationError`] before any
//! network call, [`ClientError`] while building a session, and [`OrderError`]
//! during submission. [`GatewayError`] is the transport-level failure that the
//! submitter folds into an [`OrderError`].

use thiserror::Error;

/// Rejected user input. Messages name the offending value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} is required.")]
    Missing { field: &'static str },

    #[error("Invalid symbol '{0}'. Only USDT-M pairs are supported (e.g., BTCUSDT).")]
    InvalidSymbol(String),

    #[error("Invalid side '{0}'. Must be one of: BUY, SELL.")]
    InvalidSide(String),

    #[error("Invalid order type '{0}'. Must be one of: MARKET, LIMIT.")]
    InvalidOrderType(String),

    #[error("Invalid {field} '{value}'. Must be a number.")]
    NotANumber { field: &'static str, value: String },

    #[error("Invalid {field} '{value}'. Must be greater than zero.")]
    NotPositive { field: &'static str, value: String },

    #[error("Price is required for LIMIT orders.")]
    MissingLimitPrice,
}

/// Session construction failures.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(
        "Missing API credentials. Please set BINANCE_API_KEY and BINANCE_API_SECRET in your .env file."
    )]
    MissingCredentials,

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Failed to connect to Binance: {0}")]
    Connect(String),
}

/// Coarse tag for [`OrderError`], handy for callers that branch on the class only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderErrorKind {
    Rejected,
    Api,
    Network,
    Unexpected,
}

/// Submission failures.
#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: Unable to connect to Binance. Please check your internet connection.")]
    Network,

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl OrderError {
    pub fn kind(&self) -> OrderErrorKind {
        match self {
            OrderError::Rejected(_) => OrderErrorKind::Rejected,
            OrderError::Api(_) => OrderErrorKind::Api,
            OrderError::Network => OrderErrorKind::Network,
            OrderError::Unexpected(_) => OrderErrorKind::Unexpected,
        }
    }
}

/// Failures raised by an [`crate::exchange::OrderGateway`].
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Venue refused the order on business rules (margin, filters, precision).
    #[error("venue rejected order {code}: {msg}")]
    Rejected { code: i64, msg: String },

    /// Any other venue-side error payload (auth, signature, malformed request).
    #[error("venue error {code}: {msg}")]
    Api { code: i64, msg: String },

    /// No usable response reached us.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The request could not be prepared locally (e.g. signing).
    #[error("request preparation failed: {0}")]
    Request(String),

    #[error("undecodable response: {0}")]
    Decode(String),
}
