use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::runtime::{Builder, Runtime};

use crate::config::{Config, Credentials};
use crate::error::{ClientError, GatewayError};
use crate::exchange::signing::signed_query;
use crate::exchange::{OrderFields, OrderGateway, OrderResponse};
use crate::logging::{obj, v_str, Domain, Level, Logger};

/// Authenticated USDT-M futures session.
///
/// Requests are async under the hood; each call blocks on a private
/// current-thread runtime until the venue answers.
pub struct BinanceFutures {
    client: Client,
    base: String,
    credentials: Credentials,
    recv_window_ms: u64,
    runtime: Runtime,
    logger: Logger,
}

#[derive(Deserialize, Debug)]
struct BinanceError {
    code: i64,
    msg: String,
}

impl BinanceFutures {
    pub fn connect(cfg: &Config, logger: &Logger) -> Result<Self, ClientError> {
        let session = match Self::new(cfg, logger) {
            Ok(session) => session,
            Err(err) => {
                logger.error(Domain::Session, "client_init_failed", obj(&[("msg", v_str(&err.to_string()))]));
                return Err(err);
            }
        };

        if let Err(err) = session.ping() {
            logger.error(Domain::Session, "client_init_failed", obj(&[("msg", v_str(&err.to_string()))]));
            return Err(err);
        }

        logger.info(
            Domain::Session,
            "client_init",
            obj(&[
                ("msg", v_str("Binance futures client initialized")),
                ("base", v_str(&session.base)),
                ("testnet", json!(cfg.testnet)),
            ]),
        );
        Ok(session)
    }

    fn new(cfg: &Config, logger: &Logger) -> Result<Self, ClientError> {
        let credentials = cfg.credentials()?;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ClientError::Connect(e.to_string()))?;
        let client = Client::builder()
            .build()
            .map_err(|e| ClientError::Connect(e.to_string()))?;

        Ok(Self {
            client,
            base: cfg.fapi_base.clone(),
            credentials,
            recv_window_ms: cfg.recv_window_ms,
            runtime,
            logger: logger.clone(),
        })
    }

    fn timestamp_ms() -> u64 {
        chrono::Utc::now().timestamp_millis() as u64
    }

    fn ping(&self) -> Result<(), ClientError> {
        let url = format!("{}/fapi/v1/ping", self.base);
        let outcome = self.runtime.block_on(async {
            let resp = self.client.get(&url).send().await?;
            let status = resp.status().as_u16();
            let body = resp.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        });

        match outcome {
            Ok((status, body)) => interpret_ping_reply(status, &body),
            Err(e) => Err(ClientError::Connect(e.to_string())),
        }
    }

    async fn create_order_async(&self, fields: &OrderFields) -> Result<OrderResponse, GatewayError> {
        let query = signed_query(
            &fields.to_query(),
            &self.credentials.api_secret,
            Self::timestamp_ms(),
            self.recv_window_ms,
        )
        .map_err(GatewayError::Request)?;
        let url = format!("{}/fapi/v1/order?{}", self.base, query);

        let resp = self
            .client
            .post(&url)
            .header("X-MBX-APIKEY", &self.credentials.api_key)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        self.logger.log(
            Level::Debug,
            Domain::Exec,
            "http_response",
            obj(&[("path", v_str("/fapi/v1/order")), ("status", json!(status)), ("body", v_str(&body))]),
        );

        interpret_order_reply(status, &body)
    }
}

impl OrderGateway for BinanceFutures {
    fn create_order(&mut self, fields: &OrderFields) -> Result<OrderResponse, GatewayError> {
        self.runtime.block_on(self.create_order_async(fields))
    }
}

/// Business-rule refusals: filter failures, precision, margin/balance,
/// would-trigger, and the futures order-parameter range.
fn is_order_rejection(code: i64) -> bool {
    matches!(code, -1013 | -1111 | -2010 | -2028..=-2018 | -4999..=-4000)
}

fn classify_error_body(status: u16, body: &str) -> GatewayError {
    match serde_json::from_str::<BinanceError>(body) {
        Ok(err) if is_order_rejection(err.code) => GatewayError::Rejected { code: err.code, msg: err.msg },
        Ok(err) => GatewayError::Api { code: err.code, msg: err.msg },
        Err(_) => {
            let trimmed = body.trim();
            let msg = if trimmed.is_empty() {
                format!("HTTP {}", status)
            } else {
                trimmed.to_string()
            };
            GatewayError::Api { code: -1, msg }
        }
    }
}

/// Any venue error on the connectivity check means the session is unusable.
fn interpret_ping_reply(status: u16, body: &str) -> Result<(), ClientError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    match classify_error_body(status, body) {
        GatewayError::Rejected { msg, .. } | GatewayError::Api { msg, .. } => {
            Err(ClientError::Authentication(msg))
        }
        other => Err(ClientError::Authentication(other.to_string())),
    }
}

fn interpret_order_reply(status: u16, body: &str) -> Result<OrderResponse, GatewayError> {
    if !(200..300).contains(&status) {
        return Err(classify_error_body(status, body));
    }
    match serde_json::from_str::<OrderResponse>(body) {
        Ok(order) => Ok(order),
        Err(decode_err) => match serde_json::from_str::<BinanceError>(body) {
            Ok(err) if err.code < 0 => Err(classify_error_body(status, body)),
            _ => Err(GatewayError::Decode(decode_err.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg_with_base(base: &str) -> Config {
        Config {
            api_key: Some("key".into()),
            api_secret: Some("secret".into()),
            fapi_base: base.to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_rejection_codes() {
        assert!(is_order_rejection(-2019)); // margin is insufficient
        assert!(is_order_rejection(-1013)); // filter failure
        assert!(is_order_rejection(-4014)); // price not increased by tick size
        assert!(!is_order_rejection(-1022)); // bad signature
        assert!(!is_order_rejection(-2015)); // invalid key / permissions
    }

    #[test]
    fn test_error_bodies_classified() {
        let body = r#"{"code":-2019,"msg":"Margin is insufficient."}"#;
        match interpret_order_reply(400, body) {
            Err(GatewayError::Rejected { code, msg }) => {
                assert_eq!(code, -2019);
                assert_eq!(msg, "Margin is insufficient.");
            }
            other => panic!("unexpected: {:?}", other),
        }

        let body = r#"{"code":-1022,"msg":"Signature for this request is not valid."}"#;
        assert!(matches!(interpret_order_reply(400, body), Err(GatewayError::Api { code: -1022, .. })));

        assert!(matches!(
            interpret_order_reply(502, "<html>Bad Gateway</html>"),
            Err(GatewayError::Api { code: -1, .. })
        ));
        match interpret_order_reply(503, "") {
            Err(GatewayError::Api { msg, .. }) => assert_eq!(msg, "HTTP 503"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_success_bodies() {
        let body = r#"{"orderId":325078477,"symbol":"BTCUSDT","status":"NEW","executedQty":"0","avgPrice":"0.00","price":"50000"}"#;
        let order = interpret_order_reply(200, body).unwrap();
        assert_eq!(order.order_id.to_string(), "325078477");
        assert_eq!(order.status, "NEW");

        let body = r#"{"code":-2010,"msg":"Order would immediately match and take."}"#;
        assert!(matches!(interpret_order_reply(200, body), Err(GatewayError::Rejected { .. })));

        assert!(matches!(interpret_order_reply(200, "{}"), Err(GatewayError::Decode(_))));
    }

    #[test]
    fn test_missing_credentials_fail_before_network() {
        let cfg = Config { api_secret: None, ..cfg_with_base("http://venue.invalid") };
        assert!(matches!(
            BinanceFutures::connect(&cfg, &Logger::null()),
            Err(ClientError::MissingCredentials)
        ));
    }

    #[test]
    fn test_ping_reply() {
        assert!(interpret_ping_reply(200, "{}").is_ok());

        let body = r#"{"code":-2015,"msg":"Invalid API-key, IP, or permissions for action."}"#;
        match interpret_ping_reply(401, body) {
            Err(ClientError::Authentication(msg)) => {
                assert_eq!(msg, "Invalid API-key, IP, or permissions for action.")
            }
            other => panic!("unexpected: {:?}", other),
        }

        match interpret_ping_reply(503, "") {
            Err(ClientError::Authentication(msg)) => assert_eq!(msg, "HTTP 503"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
