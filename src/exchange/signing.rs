use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 over a query string, hex-encoded (Binance `signature` param).
pub fn sign_query(query: &str, secret: &str) -> Result<String, String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| format!("HMAC error: {}", e))?;
    mac.update(query.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Appends `timestamp` and `recvWindow` to `query` and signs the result.
pub fn signed_query(query: &str, secret: &str, timestamp_ms: u64, recv_window_ms: u64) -> Result<String, String> {
    let full = if query.is_empty() {
        format!("timestamp={}&recvWindow={}", timestamp_ms, recv_window_ms)
    } else {
        format!("{}&timestamp={}&recvWindow={}", query, timestamp_ms, recv_window_ms)
    };
    let signature = sign_query(&full, secret)?;
    Ok(format!("{}&signature={}", full, signature))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        // Published example from the Binance API docs.
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            sign_query(query, secret).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_signed_query_layout() {
        let q = signed_query("symbol=BTCUSDT&side=BUY", "s", 1700000000000, 5000).unwrap();
        assert!(q.starts_with("symbol=BTCUSDT&side=BUY&timestamp=1700000000000&recvWindow=5000&signature="));
        let sig = q.rsplit("signature=").next().unwrap();
        assert_eq!(sig.len(), 64);
    }
}
