//! Broker trait and implementations for driftbook.
//!
//! Provides a generic `Broker` trait that abstracts over different brokerages,
//! plus the glue that turns a broker into engine inputs:
//!
//! - [`BrokerPrices`]: any connected broker as a [`driftbook::PriceSource`]
//! - [`holdings_from_positions`]: broker positions and cash as engine holdings
//!
//! Implementations:
//!
//! - **Mock** (always available): configurable in-memory broker for tests
//! - **Alpaca** (feature `alpaca`): Alpaca trading and market data REST APIs

pub mod error;
pub mod mock;
pub mod prices;
pub mod types;

#[cfg(feature = "alpaca")]
pub mod alpaca;

pub use error::BrokerError;
pub use prices::{BrokerPrices, holdings_from_positions};
pub use types::*;

use driftbook::Ticker;

/// A read-only broker connection: positions, account and quotes.
pub trait Broker {
    /// Connect to the broker.
    fn connect(&mut self) -> Result<(), BrokerError>;

    /// Disconnect gracefully.
    fn disconnect(&mut self) -> Result<(), BrokerError>;

    /// Get all current positions.
    fn positions(&self) -> Result<Vec<Position>, BrokerError>;

    /// Get account summary (equity, cash, buying power).
    fn account(&self) -> Result<Account, BrokerError>;

    /// Get current quote for a ticker.
    fn quote(&self, ticker: &Ticker) -> Result<Quote, BrokerError>;
}

impl<B: Broker + ?Sized> Broker for Box<B> {
    fn connect(&mut self) -> Result<(), BrokerError> {
        (**self).connect()
    }

    fn disconnect(&mut self) -> Result<(), BrokerError> {
        (**self).disconnect()
    }

    fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        (**self).positions()
    }

    fn account(&self) -> Result<Account, BrokerError> {
        (**self).account()
    }

    fn quote(&self, ticker: &Ticker) -> Result<Quote, BrokerError> {
        (**self).quote(ticker)
    }
}
