//! Glue between a broker and the rebalance engine.

use driftbook::{Holding, IgnoreSet, PriceSource, PriceUnavailable, Ticker};
use log::debug;

use crate::Broker;
use crate::error::BrokerError;
use crate::types::Position;

/// Any broker as a live [`PriceSource`].
///
/// Uses the quote's last trade, falling back to the bid/ask midpoint. Unknown
/// symbols become [`PriceUnavailable::NotFound`]; any other broker failure is
/// [`PriceUnavailable::Source`], and the engine keeps a notional-only trade.
pub struct BrokerPrices<B> {
    broker: B,
}

impl<B: Broker> BrokerPrices<B> {
    /// Wrap a broker. It must already be connected.
    pub fn new(broker: B) -> Self {
        Self { broker }
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    pub fn into_inner(self) -> B {
        self.broker
    }
}

impl<B: Broker> PriceSource for BrokerPrices<B> {
    fn current_price(&self, ticker: &Ticker) -> Result<f64, PriceUnavailable> {
        let quote = self.broker.quote(ticker).map_err(|e| match e {
            BrokerError::NoQuote(t) | BrokerError::InvalidSymbol(t) => {
                PriceUnavailable::NotFound(t)
            }
            other => PriceUnavailable::Source(other.to_string()),
        })?;
        debug!(
            "quote {ticker}: bid={} ask={} last={}",
            quote.bid, quote.ask, quote.last
        );
        quote
            .reference_price()
            .ok_or_else(|| PriceUnavailable::NotFound(ticker.to_string()))
    }
}

/// Build engine holdings from broker positions plus the account's cash.
///
/// Positions are valued at the broker's reported market value. A positive
/// cash balance becomes a `CASH` holding so it counts toward the weight base.
pub fn holdings_from_positions(positions: &[Position], cash: f64) -> Vec<Holding> {
    let mut holdings: Vec<Holding> = positions
        .iter()
        .map(|p| Holding::new(p.ticker.as_str(), p.market_value))
        .collect();
    if cash.is_finite() && cash > 0.0 {
        holdings.push(Holding::new(IgnoreSet::CASH, cash));
    }
    holdings
}
