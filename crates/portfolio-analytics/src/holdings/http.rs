//! HTTP Holdings Provider
//!
//! Talks to a chain-scan service exposing
//! `GET {base_url}/wallets/{wallet}/holdings`.

use std::time::Duration;

use async_trait::async_trait;

use super::HoldingsProvider;
use crate::error::{AnalyticsError, Result};
use crate::model::{Holdings, WalletId};

/// Holdings provider backed by a REST chain-scan service
pub struct HttpHoldingsProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpHoldingsProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Transport-level timeout; the analytics facade applies its own on top
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Use a preconfigured client (proxies, TLS, default headers)
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create from `HOLDINGS_API_URL`
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("HOLDINGS_API_URL")
            .map_err(|_| AnalyticsError::Config("HOLDINGS_API_URL not set".into()))?;
        Self::new(base_url)
    }

    fn holdings_url(&self, wallet: &WalletId) -> String {
        format!("{}/wallets/{}/holdings", self.base_url, wallet)
    }
}

#[async_trait]
impl HoldingsProvider for HttpHoldingsProvider {
    async fn fetch_holdings(&self, wallet: &WalletId) -> Result<Holdings> {
        let url = self.holdings_url(wallet);
        tracing::debug!(%url, "Fetching holdings");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AnalyticsError::DataUnavailable(format!(
                "holdings service answered {status} for {wallet}"
            )));
        }

        let holdings: Holdings = response.json().await?;
        if holdings.assets.is_empty() {
            return Err(AnalyticsError::DataUnavailable(format!(
                "holdings service returned no assets for {wallet}"
            )));
        }

        Ok(holdings)
    }

    fn name(&self) -> &str {
        "HttpHoldings"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer a single request with a canned response
    async fn serve_once(status: &'static str, body: &'static str) -> HttpHoldingsProvider {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = vec![0u8; 8192];
            let mut read = 0;
            while !request[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut request[read..]).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => read += n,
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpHoldingsProvider::with_client(client, format!("http://{addr}"))
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let provider = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let wallet = WalletId::parse("0xabc").unwrap();

        let result = provider.fetch_holdings(&wallet).await;
        assert!(matches!(result, Err(AnalyticsError::DataUnavailable(_))));
    }

    #[tokio::test]
    async fn test_empty_assets_is_unavailable() {
        let provider = serve_once("200 OK", r#"{"totalValue":"0","assets":[]}"#).await;
        let wallet = WalletId::parse("0xabc").unwrap();

        let result = provider.fetch_holdings(&wallet).await;
        assert!(matches!(result, Err(AnalyticsError::DataUnavailable(_))));
    }

    #[tokio::test]
    async fn test_holdings_parsed() {
        let provider = serve_once(
            "200 OK",
            r#"{"totalValue":"5000","assets":[{"symbol":"USDC","name":"USD Coin","balance":"5000","usdValue":"5000","price":"1","chainId":137,"chainName":"Polygon","change24h":0.01}]}"#,
        )
        .await;
        let wallet = WalletId::parse("0xabc").unwrap();

        let holdings = provider.fetch_holdings(&wallet).await.unwrap();
        assert_eq!(holdings.total_value, dec!(5000));
        assert_eq!(holdings.assets[0].chain_id, 137);
        assert_eq!(holdings.assets[0].volatility, None);
    }

    #[test]
    fn test_url_building() {
        let provider = HttpHoldingsProvider::new("http://scanner.local/api/").unwrap();
        let wallet = WalletId::parse("0xABC").unwrap();
        assert_eq!(
            provider.holdings_url(&wallet),
            "http://scanner.local/api/wallets/0xabc/holdings"
        );
    }
}
