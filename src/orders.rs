//! Order submission and response normalization.

use serde_json::json;

use crate::error::{GatewayError, OrderError};
use crate::exchange::{FillRecord, OrderFields, OrderGateway, OrderResponse};
use crate::logging::{obj, v_num, v_str, Domain, Logger};
use crate::validators::{OrderRequest, OrderType};

/// Reported when neither fills nor a direct price are available.
pub const AVG_PRICE_UNAVAILABLE: &str = "N/A";

/// The only time-in-force sent with LIMIT orders.
pub const TIME_IN_FORCE_GTC: &str = "GTC";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderResult {
    pub order_id: String,
    pub status: String,
    pub executed_quantity: String,
    pub avg_price: String,
}

pub struct OrderSubmitter {
    logger: Logger,
}

impl OrderSubmitter {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// Places one order and normalizes the reply. No retries.
    pub fn submit<G>(&self, session: &mut G, request: &OrderRequest) -> Result<OrderResult, OrderError>
    where
        G: OrderGateway + ?Sized,
    {
        let fields = build_order_fields(request);
        self.logger.info(
            Domain::Exec,
            "order_submit",
            obj(&[
                ("msg", v_str(&format!("Placing order: {}", fields.to_query()))),
                ("symbol", v_str(request.symbol())),
                ("side", v_str(request.side().as_str())),
                ("type", v_str(request.order_type().as_str())),
                ("quantity", v_num(request.quantity())),
                ("price", request.price().map(v_num).unwrap_or(serde_json::Value::Null)),
            ]),
        );

        let response = session.create_order(&fields).map_err(|err| self.map_failure(err))?;

        let avg_price = derive_avg_price(&response, |fill| {
            self.logger.warn(
                Domain::Exec,
                "fill_skipped",
                obj(&[("qty", v_str(&fill.qty.to_string())), ("price", v_str(&fill.price.to_string()))]),
            );
        });
        let result = OrderResult {
            order_id: response.order_id.to_string(),
            status: response.status.clone(),
            executed_quantity: response.executed_qty.to_string(),
            avg_price,
        };

        self.logger.info(
            Domain::Exec,
            "order_response",
            obj(&[
                ("order_id", v_str(&result.order_id)),
                ("symbol", v_str(request.symbol())),
                ("status", v_str(&result.status)),
                ("executed_qty", v_str(&result.executed_quantity)),
                ("avg_price", v_str(&result.avg_price)),
                ("fills", json!(response.fills.len())),
            ]),
        );
        Ok(result)
    }

    fn map_failure(&self, err: GatewayError) -> OrderError {
        let detail = err.to_string();
        let (event, mapped) = match err {
            GatewayError::Rejected { msg, .. } => ("order_rejected", OrderError::Rejected(msg)),
            GatewayError::Api { msg, .. } => ("api_error", OrderError::Api(msg)),
            GatewayError::Transport(_) => ("network_error", OrderError::Network),
            other => ("unexpected_error", OrderError::Unexpected(other.to_string())),
        };
        self.logger.error(
            Domain::Exec,
            event,
            obj(&[("msg", v_str(&mapped.to_string())), ("detail", v_str(&detail))]),
        );
        mapped
    }
}

/// Base fields for every order; LIMIT adds `price` and a GTC time-in-force.
pub fn build_order_fields(request: &OrderRequest) -> OrderFields {
    let mut fields = OrderFields::new();
    fields.push("symbol", request.symbol());
    fields.push("side", request.side().as_str());
    fields.push("type", request.order_type().as_str());
    fields.push("quantity", request.quantity().to_string());

    if let (OrderType::Limit, Some(price)) = (request.order_type(), request.price()) {
        fields.push("price", price.to_string());
        fields.push("timeInForce", TIME_IN_FORCE_GTC);
    }
    fields
}

/// Average fill price, by precedence: volume-weighted fills, then the
/// venue's `avgPrice`, then its `price`, then [`AVG_PRICE_UNAVAILABLE`].
///
/// `on_skipped` sees every fill whose quantity or price is not numeric.
pub fn derive_avg_price<F>(response: &OrderResponse, mut on_skipped: F) -> String
where
    F: FnMut(&FillRecord),
{
    if !response.fills.is_empty() {
        let (total_qty, total_cost) = response.fills.iter().fold((0.0f64, 0.0f64), |(q, c), fill| {
            match (fill.qty.as_f64(), fill.price.as_f64()) {
                (Some(fq), Some(fp)) => (q + fq, c + fq * fp),
                _ => {
                    on_skipped(fill);
                    (q, c)
                }
            }
        });
        if total_qty > 0.0 {
            return format_price(round2(total_cost / total_qty));
        }
    }

    response
        .avg_price
        .as_ref()
        .or(response.price.as_ref())
        .map(|p| p.to_string())
        .unwrap_or_else(|| AVG_PRICE_UNAVAILABLE.to_string())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whole numbers keep one decimal place ("101.0").
fn format_price(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
