//! Alpaca-specific API response types.
//!
//! The trading API reports money and quantities as decimal strings; they are
//! kept as strings here and parsed by the broker.

use serde::Deserialize;

/// Alpaca account response (GET /v2/account).
#[derive(Debug, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub currency: String,
    pub cash: String,
    pub equity: String,
    pub buying_power: String,
    #[serde(default)]
    pub trading_blocked: bool,
}

/// Alpaca position entry (GET /v2/positions).
#[derive(Debug, Deserialize)]
pub struct PositionInfo {
    pub symbol: String,
    /// Signed share count; negative for shorts.
    pub qty: String,
    pub avg_entry_price: String,
    pub market_value: String,
    #[serde(default)]
    pub unrealized_pl: Option<String>,
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub current_price: Option<String>,
}

/// Latest trade wrapper (GET /v2/stocks/{symbol}/trades/latest).
#[derive(Debug, Deserialize)]
pub struct LatestTrade {
    pub symbol: String,
    pub trade: TradeInfo,
}

/// A single trade print from the market data API.
#[derive(Debug, Deserialize)]
pub struct TradeInfo {
    /// RFC 3339 timestamp.
    #[serde(rename = "t")]
    pub timestamp: String,
    #[serde(rename = "p")]
    pub price: f64,
    #[serde(rename = "s", default)]
    pub size: f64,
}

/// Error body returned by Alpaca on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<u64>,
    pub message: String,
}
