//! Mock broker for testing. Implements the `Broker` trait with configurable behavior.
//!
//! Use this in tests to simulate broker responses without network calls.
//!
//! ```
//! use driftbook_broker::mock::{MockBroker, QuoteMode};
//! use driftbook_broker::Broker;
//!
//! let mut broker = MockBroker::builder()
//!     .quote_mode(QuoteMode::Available)
//!     .with_position("VTI", 30.0, 250.0)
//!     .with_quote("VTI", 249.9, 250.1, 250.0)
//!     .with_account(10_000.0, 2_500.0)
//!     .build();
//! broker.connect().unwrap();
//! assert_eq!(broker.positions().unwrap().len(), 1);
//! ```

use std::sync::{Mutex, MutexGuard};

use driftbook::Ticker;

use crate::Broker;
use crate::error::BrokerError;
use crate::types::*;

/// How the mock broker answers quote requests.
#[derive(Clone, Debug, Default)]
pub enum QuoteMode {
    /// Configured quotes are returned; unknown tickers fail.
    #[default]
    Available,
    /// Every quote request fails, as during a market-data outage.
    Unavailable,
}

/// Builder for `MockBroker`.
pub struct MockBrokerBuilder {
    quote_mode: QuoteMode,
    positions: Vec<Position>,
    quotes: Vec<Quote>,
    equity: f64,
    cash: f64,
}

impl MockBrokerBuilder {
    pub fn quote_mode(mut self, mode: QuoteMode) -> Self {
        self.quote_mode = mode;
        self
    }

    /// Add a long position valued at `quantity * price`. Blank tickers are ignored.
    pub fn with_position(mut self, ticker: &str, quantity: f64, price: f64) -> Self {
        if let Some(ticker) = Ticker::new(ticker) {
            self.positions.push(Position {
                ticker,
                quantity,
                avg_cost: price,
                market_value: quantity * price,
                unrealized_pnl: 0.0,
            });
        }
        self
    }

    pub fn with_quote(mut self, ticker: &str, bid: f64, ask: f64, last: f64) -> Self {
        if let Some(ticker) = Ticker::new(ticker) {
            self.quotes.push(Quote {
                ticker,
                bid,
                ask,
                last,
            });
        }
        self
    }

    pub fn with_account(mut self, equity: f64, cash: f64) -> Self {
        self.equity = equity;
        self.cash = cash;
        self
    }

    pub fn build(self) -> MockBroker {
        MockBroker {
            connected: false,
            quote_mode: self.quote_mode,
            positions: self.positions,
            quotes: self.quotes,
            equity: self.equity,
            cash: self.cash,
            quote_requests: Mutex::new(Vec::new()),
        }
    }
}

/// A mock broker that records quote requests and returns configurable responses.
pub struct MockBroker {
    connected: bool,
    quote_mode: QuoteMode,
    positions: Vec<Position>,
    quotes: Vec<Quote>,
    equity: f64,
    cash: f64,
    quote_requests: Mutex<Vec<Ticker>>,
}

impl MockBroker {
    pub fn builder() -> MockBrokerBuilder {
        MockBrokerBuilder {
            quote_mode: QuoteMode::Available,
            positions: Vec::new(),
            quotes: Vec::new(),
            equity: 100_000.0,
            cash: 100_000.0,
        }
    }

    /// Tickers that were quoted, in request order (for assertion in tests).
    pub fn quote_requests(&self) -> Vec<Ticker> {
        self.requests().clone()
    }

    fn requests(&self) -> MutexGuard<'_, Vec<Ticker>> {
        self.quote_requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn require_connected(&self) -> Result<(), BrokerError> {
        if self.connected {
            Ok(())
        } else {
            Err(BrokerError::NotConnected)
        }
    }
}

impl Broker for MockBroker {
    fn connect(&mut self) -> Result<(), BrokerError> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), BrokerError> {
        self.connected = false;
        Ok(())
    }

    fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        self.require_connected()?;
        Ok(self.positions.clone())
    }

    fn account(&self) -> Result<Account, BrokerError> {
        self.require_connected()?;
        Ok(Account {
            equity: self.equity,
            cash: self.cash,
            buying_power: self.cash,
        })
    }

    fn quote(&self, ticker: &Ticker) -> Result<Quote, BrokerError> {
        self.require_connected()?;
        self.requests().push(ticker.clone());

        match self.quote_mode {
            QuoteMode::Unavailable => {
                Err(BrokerError::Connection("mock: market data offline".into()))
            }
            QuoteMode::Available => self
                .quotes
                .iter()
                .find(|q| &q.ticker == ticker)
                .cloned()
                .ok_or_else(|| BrokerError::NoQuote(ticker.to_string())),
        }
    }
}
