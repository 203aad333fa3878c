//! REST quote fetcher for the CoinGecko simple price endpoint.

use crate::error::FeedError;
use async_trait::async_trait;
use ratewatch_core::{AssetPair, PriceSnapshot};
use std::time::Duration;
use tracing::debug;

/// Source of a single price snapshot. One call, no retries.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quotes(&self, pair: &AssetPair) -> Result<PriceSnapshot, FeedError>;
}

/// CoinGecko `simple/price` client.
pub struct CoinGeckoClient {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub const BASE_URL: &'static str = "https://api.coingecko.com/api/v3";

    /// Create a client against the public API with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, FeedError> {
        Self::with_base_url(Self::BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl QuoteProvider for CoinGeckoClient {
    async fn fetch_quotes(&self, pair: &AssetPair) -> Result<PriceSnapshot, FeedError> {
        let url = format!("{}/simple/price", self.base_url);
        let params = [
            ("ids", pair.ids_param()),
            ("vs_currencies", pair.vs_currencies_param()),
        ];

        let response = self.client.get(&url).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(FeedError::HttpStatus(response.status().as_u16()));
        }

        let json: serde_json::Value = response.json().await?;
        let snapshot = parse_simple_price(&json, pair)?;

        debug!(
            base_usd = snapshot.base_usd,
            quote_usd = snapshot.quote_usd,
            base_in_quote = snapshot.base_in_quote,
            "CoinGecko: fetched quotes"
        );
        Ok(snapshot)
    }
}

/// Extract the three prices from a `simple/price` response.
///
/// Response shape: `{"ergo":{"usd":1.2,"eth":0.0003},"ethereum":{"usd":4000}}`.
/// All three leaves must be present, otherwise nothing is returned.
pub fn parse_simple_price(
    json: &serde_json::Value,
    pair: &AssetPair,
) -> Result<PriceSnapshot, FeedError> {
    let leaf = |asset: &str, currency: &str| {
        json[asset][currency].as_f64().ok_or_else(|| {
            FeedError::ParseError(format!("missing {}.{} in quote response", asset, currency))
        })
    };

    let base_usd = leaf(&pair.base_id, &pair.fiat)?;
    let quote_usd = leaf(&pair.quote_id, &pair.fiat)?;
    let base_in_quote = leaf(&pair.base_id, &pair.quote_currency)?;

    Ok(PriceSnapshot::new(base_usd, quote_usd, base_in_quote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_simple_price() {
        let json = json!({
            "ergo": {"usd": 1, "eth": 0.00025},
            "ethereum": {"usd": 4000}
        });
        let snapshot = parse_simple_price(&json, &AssetPair::erg_eth()).unwrap();
        assert_eq!(snapshot, PriceSnapshot::new(1.0, 4000.0, 0.00025));
        assert!((snapshot.cross_rate() - 4000.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_missing_leaf() {
        let json = json!({
            "ergo": {"usd": 1.1},
            "ethereum": {"usd": 4000}
        });
        let err = parse_simple_price(&json, &AssetPair::erg_eth()).unwrap_err();
        assert!(matches!(err, FeedError::ParseError(ref msg) if msg.contains("ergo.eth")));
    }

    #[test]
    fn test_parse_non_numeric_leaf() {
        let json = json!({
            "ergo": {"usd": "1.1", "eth": 0.0003},
            "ethereum": {"usd": 4000}
        });
        assert!(parse_simple_price(&json, &AssetPair::erg_eth()).is_err());
    }

    /// Answer a single HTTP request with `status_line` and `body`.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_rate_limited_response_is_transient_status_error() {
        let base_url = serve_once("429 Too Many Requests", "").await;
        let client = CoinGeckoClient::with_base_url(base_url, Duration::from_secs(5)).unwrap();

        let err = client.fetch_quotes(&AssetPair::erg_eth()).await.unwrap_err();
        assert!(matches!(err, FeedError::HttpStatus(429)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_fetch_quotes_over_http() {
        let base_url = serve_once(
            "200 OK",
            r#"{"ergo":{"usd":1.0,"eth":0.00025},"ethereum":{"usd":4000.0}}"#,
        )
        .await;
        let client = CoinGeckoClient::with_base_url(base_url, Duration::from_secs(5)).unwrap();

        let snapshot = client.fetch_quotes(&AssetPair::erg_eth()).await.unwrap();
        assert_eq!(snapshot, PriceSnapshot::new(1.0, 4000.0, 0.00025));
    }
}
