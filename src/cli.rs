//! Command-line driver: flags in, one order out, human-readable report.

use std::io::Write;
use std::sync::Arc;

use serde_json::json;
use thiserror::Error;

use crate::config::Config;
use crate::error::ClientError;
use crate::exchange::{get_session, OrderGateway};
use crate::logging::{obj, v_str, Domain, JsonlFileSink, LogSink, Logger, NullSink};
use crate::orders::{OrderResult, OrderSubmitter};
use crate::validators::{validate_order_params, OrderRequest};

pub const USAGE: &str = "\
Usage: orderbot --symbol <SYMBOL> --side <BUY|SELL> --type <MARKET|LIMIT> --quantity <QTY> [--price <PRICE>]

Examples:
  Market order:  orderbot --symbol BTCUSDT --side BUY --type MARKET --quantity 0.001
  Limit order:   orderbot --symbol BTCUSDT --side SELL --type LIMIT --quantity 0.001 --price 50000";

#[derive(Error, Debug, PartialEq)]
pub enum UsageError {
    #[error("help requested")]
    HelpRequested,
    #[error("unknown argument '{0}'")]
    UnknownArgument(String),
    #[error("missing value for {0}")]
    MissingValue(&'static str),
    #[error("the following arguments are required: {0}")]
    MissingFlags(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub quantity: String,
    pub price: Option<String>,
}

impl CliArgs {
    /// Parses flags (without the program name). Accepts `--flag value` and `--flag=value`.
    pub fn parse<I>(args: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut symbol = None;
        let mut side = None;
        let mut order_type = None;
        let mut quantity = None;
        let mut price = None;

        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            if arg == "-h" || arg == "--help" {
                return Err(UsageError::HelpRequested);
            }
            let (flag, inline) = match arg.split_once('=') {
                Some((f, v)) => (f.to_string(), Some(v.to_string())),
                None => (arg.clone(), None),
            };
            let (name, slot): (&'static str, &mut Option<String>) = match flag.as_str() {
                "--symbol" => ("--symbol", &mut symbol),
                "--side" => ("--side", &mut side),
                "--type" => ("--type", &mut order_type),
                "--quantity" => ("--quantity", &mut quantity),
                "--price" => ("--price", &mut price),
                _ => return Err(UsageError::UnknownArgument(arg)),
            };
            let value = match inline {
                Some(v) => v,
                None => iter.next().ok_or(UsageError::MissingValue(name))?,
            };
            *slot = Some(value);
        }

        let missing: Vec<&str> = [
            ("--symbol", symbol.is_none()),
            ("--side", side.is_none()),
            ("--type", order_type.is_none()),
            ("--quantity", quantity.is_none()),
        ]
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| *name)
        .collect();
        if !missing.is_empty() {
            return Err(UsageError::MissingFlags(missing.join(", ")));
        }

        Ok(Self {
            symbol: symbol.unwrap_or_default(),
            side: side.unwrap_or_default(),
            order_type: order_type.unwrap_or_default(),
            quantity: quantity.unwrap_or_default(),
            price,
        })
    }
}

pub fn print_request_summary<W: Write>(out: &mut W, request: &OrderRequest) -> std::io::Result<()> {
    writeln!(out, "\n=== ORDER REQUEST ===")?;
    writeln!(out, "Symbol:   {}", request.symbol())?;
    writeln!(out, "Side:     {}", request.side())?;
    writeln!(out, "Type:     {}", request.order_type())?;
    writeln!(out, "Quantity: {}", request.quantity())?;
    if let Some(price) = request.price() {
        writeln!(out, "Price:    {}", price)?;
    }
    writeln!(out)
}

pub fn print_response<W: Write>(out: &mut W, result: &OrderResult) -> std::io::Result<()> {
    writeln!(out, "=== ORDER RESPONSE ===")?;
    writeln!(out, "Order ID:     {}", result.order_id)?;
    writeln!(out, "Status:       {}", result.status)?;
    writeln!(out, "Executed Qty: {}", result.executed_quantity)?;
    writeln!(out, "Avg Price:    {}", result.avg_price)?;
    writeln!(out, "\n=== ORDER PLACED SUCCESSFULLY ===\n")
}

pub fn print_error<W: Write>(out: &mut W, message: &str) -> std::io::Result<()> {
    writeln!(out, "\n=== ORDER FAILED ===")?;
    writeln!(out, "Error: {}", message)?;
    writeln!(out)
}

fn build_logger(cfg: &Config) -> Logger {
    let sink: Arc<dyn LogSink> = match JsonlFileSink::open(&cfg.log_file) {
        Ok(sink) => Arc::new(sink),
        Err(err) => {
            eprintln!("[log] {:#}; continuing without a log file", err);
            Arc::new(NullSink)
        }
    };
    Logger::new(sink, cfg.log_level)
}

/// Runs one invocation against the live session factory.
pub fn run<I, W>(args: I, out: &mut W) -> i32
where
    I: IntoIterator<Item = String>,
    W: Write,
{
    run_with(args, out, Config::from_env(), get_session)
}

/// Exit codes: 0 placed, 1 validation/session/order failure, 2 usage error.
pub fn run_with<I, W, S, G>(args: I, out: &mut W, cfg: Config, connect: S) -> i32
where
    I: IntoIterator<Item = String>,
    W: Write,
    S: FnOnce(&Config, &Logger) -> Result<G, ClientError>,
    G: OrderGateway,
{
    let args = match CliArgs::parse(args) {
        Ok(args) => args,
        Err(UsageError::HelpRequested) => {
            let _ = writeln!(out, "{}", USAGE);
            return 0;
        }
        Err(err) => {
            let _ = writeln!(out, "error: {}\n\n{}", err, USAGE);
            return 2;
        }
    };

    let logger = build_logger(&cfg);
    logger.info(
        Domain::System,
        "run_start",
        obj(&[("base", v_str(&cfg.fapi_base)), ("testnet", json!(cfg.testnet))]),
    );
    let code = execute(&args, out, &cfg, &logger, connect);
    logger.info(Domain::System, "run_finished", obj(&[("exit_code", json!(code))]));
    code
}

fn execute<W, S, G>(args: &CliArgs, out: &mut W, cfg: &Config, logger: &Logger, connect: S) -> i32
where
    W: Write,
    S: FnOnce(&Config, &Logger) -> Result<G, ClientError>,
    G: OrderGateway,
{
    let request = match validate_order_params(
        &args.symbol,
        &args.side,
        &args.order_type,
        &args.quantity,
        args.price.as_deref(),
    ) {
        Ok(request) => request,
        Err(err) => {
            logger.warn(Domain::Validation, "invalid_params", obj(&[("msg", v_str(&err.to_string()))]));
            let _ = print_error(out, &err.to_string());
            return 1;
        }
    };

    let _ = print_request_summary(out, &request);

    let mut session = match connect(cfg, logger) {
        Ok(session) => session,
        Err(err) => {
            let _ = print_error(out, &err.to_string());
            return 1;
        }
    };

    match OrderSubmitter::new(logger.clone()).submit(&mut session, &request) {
        Ok(result) => {
            let _ = print_response(out, &result);
            0
        }
        Err(err) => {
            let _ = print_error(out, &err.to_string());
            1
        }
    }
}
