use crate::error::ClientError;
use crate::logging::Level;

pub const TESTNET_FAPI_BASE: &str = "https://testnet.binancefuture.com";
pub const LIVE_FAPI_BASE: &str = "https://fapi.binance.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub testnet: bool,
    pub fapi_base: String,
    pub recv_window_ms: u64,
    pub log_file: String,
    pub log_level: Level,
}

/// API key pair, both values known to be non-blank.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            testnet: true,
            fapi_base: TESTNET_FAPI_BASE.to_string(),
            recv_window_ms: 5000,
            log_file: "trading.log".to_string(),
            log_level: Level::Info,
        }
    }
}

impl Config {
    /// Reads the process environment, after loading `.env` when one exists.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset or malformed values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let testnet = lookup("BINANCE_TESTNET")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(defaults.testnet);
        let fapi_base = lookup("BINANCE_FAPI_BASE").unwrap_or_else(|| {
            let base = if testnet { TESTNET_FAPI_BASE } else { LIVE_FAPI_BASE };
            base.to_string()
        });

        Self {
            api_key: lookup("BINANCE_API_KEY"),
            api_secret: lookup("BINANCE_API_SECRET"),
            testnet,
            fapi_base: fapi_base.trim_end_matches('/').to_string(),
            recv_window_ms: lookup("BINANCE_RECV_WINDOW")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.recv_window_ms),
            log_file: lookup("LOG_FILE").unwrap_or(defaults.log_file),
            log_level: lookup("LOG_LEVEL")
                .and_then(|v| Level::parse(&v))
                .unwrap_or(defaults.log_level),
        }
    }

    pub fn credentials(&self) -> Result<Credentials, ClientError> {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        match (non_blank(&self.api_key), non_blank(&self.api_secret)) {
            (Some(api_key), Some(api_secret)) => Ok(Credentials { api_key, api_secret }),
            _ => Err(ClientError::MissingCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_point_at_testnet() {
        let cfg = Config::from_lookup(lookup_from(&[]));
        assert!(cfg.testnet);
        assert_eq!(cfg.fapi_base, TESTNET_FAPI_BASE);
        assert_eq!(cfg.recv_window_ms, 5000);
        assert_eq!(cfg.log_file, "trading.log");
        assert_eq!(cfg.log_level, Level::Info);
    }

    #[test]
    fn test_live_and_overrides() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("BINANCE_TESTNET", "false"),
            ("BINANCE_RECV_WINDOW", "bogus"),
            ("LOG_LEVEL", "debug"),
        ]));
        assert!(!cfg.testnet);
        assert_eq!(cfg.fapi_base, LIVE_FAPI_BASE);
        assert_eq!(cfg.recv_window_ms, 5000);
        assert_eq!(cfg.log_level, Level::Debug);

        let cfg = Config::from_lookup(lookup_from(&[("BINANCE_FAPI_BASE", "http://127.0.0.1:9/")]));
        assert_eq!(cfg.fapi_base, "http://127.0.0.1:9");
    }

    #[test]
    fn test_credentials_required() {
        let cfg = Config::from_lookup(lookup_from(&[("BINANCE_API_KEY", "key")]));
        assert!(matches!(cfg.credentials(), Err(ClientError::MissingCredentials)));

        let cfg = Config::from_lookup(lookup_from(&[
            ("BINANCE_API_KEY", "key"),
            ("BINANCE_API_SECRET", "  "),
        ]));
        assert!(matches!(cfg.credentials(), Err(ClientError::MissingCredentials)));

        let cfg = Config::from_lookup(lookup_from(&[
            ("BINANCE_API_KEY", "key"),
            ("BINANCE_API_SECRET", "secret"),
        ]));
        let creds = cfg.credentials().unwrap();
        assert_eq!(creds.api_key, "key");
        assert!(!format!("{:?}", creds).contains("secret"));
    }
}
