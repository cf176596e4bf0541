//! Alpaca REST API client.

use std::time::Duration;

use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use zeroize::Zeroizing;

use super::types::{AccountInfo, ApiError, LatestTrade, PositionInfo};
use crate::error::BrokerError;

pub const PAPER_TRADING_URL: &str = "https://paper-api.alpaca.markets";
pub const LIVE_TRADING_URL: &str = "https://api.alpaca.markets";
pub const DATA_URL: &str = "https://data.alpaca.markets";

/// Blocking Alpaca REST client covering the trading and market data APIs.
pub struct AlpacaClient {
    client: Client,
    key_id: String,
    secret_key: Zeroizing<String>,
    trading_url: String,
    data_url: String,
}

impl AlpacaClient {
    /// Create a new Alpaca client.
    pub fn new(
        key_id: &str,
        secret_key: &str,
        trading_url: &str,
        data_url: &str,
        timeout: Duration,
    ) -> Result<Self, BrokerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BrokerError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            key_id: key_id.to_string(),
            secret_key: Zeroizing::new(secret_key.to_string()),
            trading_url: trading_url.trim_end_matches('/').to_string(),
            data_url: data_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get account information (GET /v2/account).
    pub fn account(&self) -> Result<AccountInfo, BrokerError> {
        self.get(&format!("{}/v2/account", self.trading_url), "account")
    }

    /// Get all open positions (GET /v2/positions).
    pub fn positions(&self) -> Result<Vec<PositionInfo>, BrokerError> {
        self.get(&format!("{}/v2/positions", self.trading_url), "positions")
    }

    /// Get the latest trade for a symbol (GET /v2/stocks/{symbol}/trades/latest).
    pub fn latest_trade(&self, symbol: &str) -> Result<LatestTrade, BrokerError> {
        if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
            return Err(BrokerError::InvalidSymbol(symbol.to_string()));
        }
        self.get(
            &format!("{}/v2/stocks/{symbol}/trades/latest", self.data_url),
            "latest trade",
        )
    }

    fn get<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T, BrokerError> {
        debug!("GET {url}");
        let resp = self
            .client
            .get(url)
            .header("APCA-API-KEY-ID", &self.key_id)
            .header("APCA-API-SECRET-KEY", self.secret_key.as_str())
            .send()
            .map_err(|e| BrokerError::Connection(format!("{what} request failed: {e}")))?;

        let resp = check_status(resp, what)?;
        resp.json::<T>()
            .map_err(|e| BrokerError::Parse(format!("failed to parse {what}: {e}")))
    }
}

fn check_status(resp: Response, what: &str) -> Result<Response, BrokerError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|e| e.message)
        .unwrap_or(body);

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            BrokerError::Auth(format!("{what} returned {status}: {message}"))
        }
        StatusCode::TOO_MANY_REQUESTS => BrokerError::RateLimit,
        StatusCode::NOT_FOUND => BrokerError::Other(format!("{what} not found: {message}")),
        _ => BrokerError::Connection(format!("{what} returned {status}: {message}")),
    })
}
