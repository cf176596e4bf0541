//! Price sources for converting trade notionals into share counts.
//!
//! The engine prefers prices supplied with the request and only then asks a
//! [`PriceSource`]. A failed lookup is a value, not an error: the trade keeps
//! its notional and reports no price.

use log::{debug, warn};

use crate::types::{PriceMap, Ticker};

/// Why a price could not be produced.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PriceUnavailable {
    /// No live source is configured.
    #[error("no price source configured")]
    NoSource,

    /// The source has no quote for this ticker.
    #[error("no quote for {0}")]
    NotFound(String),

    /// The source answered with a zero, negative or non-finite price.
    #[error("invalid price {price} for {ticker}")]
    Invalid { ticker: String, price: f64 },

    /// Transport or upstream failure.
    #[error("price source error: {0}")]
    Source(String),
}

/// A live price lookup (brokerage quote, market-data API, ...).
///
/// Implementations must not panic; every failure maps to [`PriceUnavailable`].
pub trait PriceSource {
    /// Current per-share price in dollars.
    fn current_price(&self, ticker: &Ticker) -> Result<f64, PriceUnavailable>;
}

impl<P: PriceSource + ?Sized> PriceSource for &P {
    fn current_price(&self, ticker: &Ticker) -> Result<f64, PriceUnavailable> {
        (**self).current_price(ticker)
    }
}

impl<P: PriceSource + ?Sized> PriceSource for Box<P> {
    fn current_price(&self, ticker: &Ticker) -> Result<f64, PriceUnavailable> {
        (**self).current_price(ticker)
    }
}

/// A fixed table of prices, e.g. end-of-day closes loaded from a file.
impl PriceSource for PriceMap {
    fn current_price(&self, ticker: &Ticker) -> Result<f64, PriceUnavailable> {
        match self.get(ticker) {
            Some(&price) => validate(ticker, price),
            None => Err(PriceUnavailable::NotFound(ticker.to_string())),
        }
    }
}

/// Source that never resolves a price. Trades carry notionals only.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPriceSource;

impl PriceSource for NoPriceSource {
    fn current_price(&self, _ticker: &Ticker) -> Result<f64, PriceUnavailable> {
        Err(PriceUnavailable::NoSource)
    }
}

/// Check that a quoted price can be divided into a notional.
pub fn validate(ticker: &Ticker, price: f64) -> Result<f64, PriceUnavailable> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(PriceUnavailable::Invalid {
            ticker: ticker.to_string(),
            price,
        })
    }
}

/// Resolve a price: caller-supplied map first, then the live source.
///
/// Returns `None` when neither yields a usable price.
pub fn resolve<P: PriceSource + ?Sized>(
    ticker: &Ticker,
    supplied: Option<&PriceMap>,
    source: &P,
) -> Option<f64> {
    if let Some(prices) = supplied {
        match prices.current_price(ticker) {
            Ok(price) => return Some(price),
            Err(PriceUnavailable::NotFound(_)) => {}
            Err(e) => debug!("ignoring supplied price: {e}"),
        }
    }

    match source.current_price(ticker) {
        Ok(price) => match validate(ticker, price) {
            Ok(price) => Some(price),
            Err(e) => {
                warn!("live price rejected: {e}");
                None
            }
        },
        Err(e @ PriceUnavailable::Source(_)) => {
            warn!("live price lookup failed for {ticker}: {e}");
            None
        }
        Err(e) => {
            debug!("no price for {ticker}: {e}");
            None
        }
    }
}
