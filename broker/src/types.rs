//! Shared broker types: positions, accounts, quotes.
//!
//! Amounts are dollars as reported by the broker. Quantities are `f64` since
//! equity brokers hand out fractional shares.

use driftbook::Ticker;

/// Broker-level position.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub ticker: Ticker,
    /// Positive = long, negative = short.
    pub quantity: f64,
    pub avg_cost: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
}

/// Account summary from the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub equity: f64,
    pub cash: f64,
    pub buying_power: f64,
}

/// Live quote from the broker. Zero means "not reported".
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub ticker: Ticker,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
}

impl Quote {
    /// Last trade price, falling back to the bid/ask midpoint.
    pub fn reference_price(&self) -> Option<f64> {
        if self.last > 0.0 && self.last.is_finite() {
            return Some(self.last);
        }
        if self.bid > 0.0 && self.ask > 0.0 {
            let mid = (self.bid + self.ask) / 2.0;
            if mid.is_finite() {
                return Some(mid);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(bid: f64, ask: f64, last: f64) -> Quote {
        Quote {
            ticker: Ticker::new("VTI").unwrap(),
            bid,
            ask,
            last,
        }
    }

    #[test]
    fn last_preferred() {
        assert_eq!(quote(99.0, 101.0, 100.5).reference_price(), Some(100.5));
    }

    #[test]
    fn midpoint_fallback() {
        assert_eq!(quote(99.0, 101.0, 0.0).reference_price(), Some(100.0));
    }

    #[test]
    fn one_sided_book_has_no_price() {
        assert_eq!(quote(99.0, 0.0, 0.0).reference_price(), None);
        assert_eq!(quote(0.0, 0.0, f64::NAN).reference_price(), None);
    }
}
