//! Single-order entry for Binance USDT-M futures.
//!
//! Raw flags are checked by [`validators`], placed by [`orders::OrderSubmitter`]
//! through an [`exchange::OrderGateway`], and reported by [`cli`].

pub mod cli;
pub mod config;
pub mod error;
pub mod exchange;
pub mod logging;
pub mod orders;
pub mod validators;
