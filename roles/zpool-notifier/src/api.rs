//! Clients for the pool wallet endpoint and the USD price quote endpoint.

use std::fmt;
use std::time::Duration;

use hashrate_history::WorkerRecord;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::config::Config;
use crate::error::ApiError;

/// A coin amount as the pool sent it. The text is kept for display and the
/// parsed value is used for USD conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Amount {
    value: f64,
    text: String,
}

impl Amount {
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::from(0.0)
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Self {
            value,
            text: value.to_string(),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(serde_json::Number),
    Text(String),
    Null,
}

impl<'de> Deserialize<'de> for Amount {
    /// Accepts a JSON number, a numeric string or null (zero).
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawAmount::deserialize(deserializer)? {
            RawAmount::Number(number) => {
                let value = number
                    .as_f64()
                    .ok_or_else(|| serde::de::Error::custom("amount out of range"))?;
                Ok(Self {
                    value,
                    text: number.to_string(),
                })
            }
            RawAmount::Text(text) => {
                let text = text.trim().to_string();
                let value = text.parse::<f64>().map_err(serde::de::Error::custom)?;
                Ok(Self { value, text })
            }
            RawAmount::Null => Ok(Self::default()),
        }
    }
}

/// Wallet payload returned by the pool's `walletEX` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WalletStats {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub balance: Amount,
    #[serde(default)]
    pub unsold: Amount,
    #[serde(default)]
    pub paid24h: Amount,
    #[serde(default)]
    pub paidtotal: Amount,
    #[serde(default)]
    pub miners: Vec<WorkerRecord>,
}

/// Shared HTTP client with the configured timeouts.
pub fn build_http_client(config: &Config) -> Result<reqwest::Client, ApiError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
        .pool_max_idle_per_host(1)
        .build()?;
    Ok(client)
}

async fn get_text(request: reqwest::RequestBuilder) -> Result<String, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    let url = response.url().to_string();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ApiError::Status {
            url,
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

pub struct PoolApi {
    client: reqwest::Client,
    base_url: String,
}

impl PoolApi {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub async fn fetch_wallet_stats(&self, wallet_address: &str) -> Result<WalletStats, ApiError> {
        let url = format!("{}/api/walletEX", self.base_url.trim_end_matches('/'));
        let body = get_text(self.client.get(&url).query(&[("address", wallet_address)])).await?;
        let stats: WalletStats = serde_json::from_str(&body)?;
        debug!(
            "Fetched stats for {}: {} miner(s) reported",
            wallet_address,
            stats.miners.len()
        );
        Ok(stats)
    }
}

pub struct PriceApi {
    client: reqwest::Client,
    base_url: String,
}

impl PriceApi {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Current USD price of `coin`. A quote missing from the response is `0.0`.
    pub async fn fetch_coin_to_usd(&self, coin: &str) -> Result<f64, ApiError> {
        let url = format!("{}/api/v3/simple/price", self.base_url.trim_end_matches('/'));
        let body = get_text(
            self.client
                .get(&url)
                .query(&[("ids", coin), ("vs_currencies", "usd")]),
        )
        .await?;
        let quotes: serde_json::Value = serde_json::from_str(&body)?;
        let price = quotes
            .get(coin)
            .and_then(|quote| quote.get("usd"))
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(0.0);
        debug!("{} price: ${}", coin, price);
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockServer;

    const WALLET_JSON: &str = r#"{
        "currency": "RVN",
        "unsold": 0.5,
        "balance": "12.25",
        "unpaid": 12.75,
        "paid24h": 3,
        "total": 15.75,
        "paidtotal": "100.125",
        "miners": [
            {"version": "kawpowminer", "algo": "kawpow", "accepted": 2500000, "rejected": 0},
            {"version": "kawpowminer", "algo": "kawpow", "accepted": "1500000", "rejected": 0},
            {"version": "cpuminer", "algo": "yespower", "accepted": 0, "rejected": 0}
        ]
    }"#;

    #[test]
    fn test_wallet_stats_deserialization() {
        let stats: WalletStats = serde_json::from_str(WALLET_JSON).unwrap();
        assert_eq!(stats.currency.as_deref(), Some("RVN"));
        assert_eq!(stats.balance.value(), 12.25);
        assert_eq!(stats.unsold.value(), 0.5);
        assert_eq!(stats.paid24h.value(), 3.0);
        assert_eq!(stats.paidtotal.value(), 100.125);
        assert_eq!(stats.paidtotal.as_str(), "100.125");
        assert_eq!(stats.miners.len(), 3);
        assert_eq!(stats.miners[1].accepted, 1_500_000.0);
    }

    #[test]
    fn test_wallet_stats_without_miners() {
        let stats: WalletStats = serde_json::from_str(r#"{"balance": 1}"#).unwrap();
        assert!(stats.miners.is_empty());
        assert_eq!(stats.unsold.value(), 0.0);
        assert_eq!(stats.unsold.as_str(), "0");
    }

    #[test]
    fn test_amount_keeps_pool_text() {
        let stats: WalletStats = serde_json::from_str(
            r#"{"balance": "0.00012000", "unsold": 7, "paid24h": null, "paidtotal": 1.5}"#,
        )
        .unwrap();
        assert_eq!(stats.balance.as_str(), "0.00012000");
        assert_eq!(stats.balance.value(), 0.00012);
        assert_eq!(stats.unsold.as_str(), "7");
        assert_eq!(stats.paid24h.as_str(), "0");
        assert_eq!(stats.paidtotal.to_string(), "1.5");
    }

    #[test]
    fn test_amount_rejects_non_numeric_text() {
        let result = serde_json::from_str::<WalletStats>(r#"{"balance": "n/a"}"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_wallet_stats() {
        let server = MockServer::start(|_| (200, WALLET_JSON.to_string())).await;
        let api = PoolApi::new(reqwest::Client::new(), server.url());

        let stats = api.fetch_wallet_stats("RWallet1").await.unwrap();
        assert_eq!(stats.balance.as_str(), "12.25");

        let requests = server.requests();
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].target, "/api/walletEX?address=RWallet1");
    }

    #[tokio::test]
    async fn test_fetch_wallet_stats_error_status() {
        let server = MockServer::start(|_| (503, "maintenance".to_string())).await;
        let api = PoolApi::new(reqwest::Client::new(), server.url());

        let result = api.fetch_wallet_stats("RWallet1").await;
        assert!(matches!(result, Err(ApiError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_fetch_wallet_stats_bad_body() {
        let server = MockServer::start(|_| (200, "<html>".to_string())).await;
        let api = PoolApi::new(reqwest::Client::new(), server.url());

        let result = api.fetch_wallet_stats("RWallet1").await;
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_fetch_coin_to_usd() {
        let server =
            MockServer::start(|_| (200, r#"{"ravencoin":{"usd":0.0215}}"#.to_string())).await;
        let api = PriceApi::new(reqwest::Client::new(), format!("{}/", server.url()));

        let price = api.fetch_coin_to_usd("ravencoin").await.unwrap();
        assert_eq!(price, 0.0215);
        assert_eq!(
            server.requests()[0].target,
            "/api/v3/simple/price?ids=ravencoin&vs_currencies=usd"
        );
    }

    #[tokio::test]
    async fn test_fetch_coin_to_usd_missing_quote() {
        let server = MockServer::start(|_| (200, "{}".to_string())).await;
        let api = PriceApi::new(reqwest::Client::new(), server.url());

        assert_eq!(api.fetch_coin_to_usd("notacoin").await.unwrap(), 0.0);
    }
}
