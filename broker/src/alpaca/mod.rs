//! Alpaca broker implementation.
//!
//! Positions and account come from the trading API (paper or live); quotes
//! come from the market data API's latest trade.

pub mod client;
pub mod types;

use std::time::Duration;

use driftbook::Ticker;
use log::warn;

use crate::Broker;
use crate::error::BrokerError;
use crate::types::*;
use client::AlpacaClient;
use types::{AccountInfo, LatestTrade, PositionInfo};

/// Alpaca broker implementing the generic Broker trait.
///
/// Uses REST for all operations. Blocking (sync) via reqwest::blocking.
pub struct AlpacaBroker {
    key_id: String,
    secret_key: zeroize::Zeroizing<String>,
    trading_url: String,
    data_url: String,
    timeout: Duration,
    client: Option<AlpacaClient>,
}

impl AlpacaBroker {
    /// Create a new Alpaca broker handle (not yet connected).
    pub fn new(key_id: &str, secret_key: &str, paper: bool) -> Self {
        let trading_url = if paper {
            client::PAPER_TRADING_URL
        } else {
            client::LIVE_TRADING_URL
        };
        Self {
            key_id: key_id.to_string(),
            secret_key: zeroize::Zeroizing::new(secret_key.to_string()),
            trading_url: trading_url.to_string(),
            data_url: client::DATA_URL.to_string(),
            timeout: Duration::from_secs(10),
            client: None,
        }
    }

    /// Override the trading and data API base URLs.
    pub fn with_base_urls(mut self, trading_url: &str, data_url: &str) -> Self {
        self.trading_url = trading_url.to_string();
        self.data_url = data_url.to_string();
        self
    }

    /// Set the per-request timeout (default 10s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn require_client(&self) -> Result<&AlpacaClient, BrokerError> {
        self.client.as_ref().ok_or(BrokerError::NotConnected)
    }
}

impl Broker for AlpacaBroker {
    fn connect(&mut self) -> Result<(), BrokerError> {
        let client = AlpacaClient::new(
            &self.key_id,
            &self.secret_key,
            &self.trading_url,
            &self.data_url,
            self.timeout,
        )?;
        let info = client.account()?;
        if info.trading_blocked {
            warn!("Alpaca account {} has trading blocked", info.account_number);
        }
        self.client = Some(client);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), BrokerError> {
        self.client = None;
        Ok(())
    }

    fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        let client = self.require_client()?;
        client
            .positions()?
            .iter()
            .filter_map(|info| parse_position(info).transpose())
            .collect()
    }

    fn account(&self) -> Result<Account, BrokerError> {
        let client = self.require_client()?;
        parse_account(&client.account()?)
    }

    fn quote(&self, ticker: &Ticker) -> Result<Quote, BrokerError> {
        let client = self.require_client()?;
        let latest = client.latest_trade(ticker.as_str())?;
        Ok(parse_latest_trade(ticker, &latest))
    }
}

/// Convert an Alpaca position. Returns `Ok(None)` for entries with a blank symbol.
pub fn parse_position(info: &PositionInfo) -> Result<Option<Position>, BrokerError> {
    let Some(ticker) = Ticker::new(&info.symbol) else {
        return Ok(None);
    };
    let unrealized_pnl = match &info.unrealized_pl {
        Some(s) => parse_decimal(s, "unrealized_pl")?,
        None => 0.0,
    };
    Ok(Some(Position {
        ticker,
        quantity: parse_decimal(&info.qty, "qty")?,
        avg_cost: parse_decimal(&info.avg_entry_price, "avg_entry_price")?,
        market_value: parse_decimal(&info.market_value, "market_value")?,
        unrealized_pnl,
    }))
}

/// Convert an Alpaca account summary.
pub fn parse_account(info: &AccountInfo) -> Result<Account, BrokerError> {
    Ok(Account {
        equity: parse_decimal(&info.equity, "equity")?,
        cash: parse_decimal(&info.cash, "cash")?,
        buying_power: parse_decimal(&info.buying_power, "buying_power")?,
    })
}

/// The latest trade as a quote. Alpaca's trade print carries no bid/ask.
pub fn parse_latest_trade(ticker: &Ticker, latest: &LatestTrade) -> Quote {
    Quote {
        ticker: ticker.clone(),
        bid: 0.0,
        ask: 0.0,
        last: latest.trade.price,
    }
}

/// Parse a decimal string (e.g. "185.50") into dollars.
pub fn parse_decimal(s: &str, field: &str) -> Result<f64, BrokerError> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| BrokerError::Parse(format!("{field}: expected a decimal, got {s:?}")))
}
