//! Holdings and the weight/value extractor.
//!
//! Turns a list of raw positions into per-ticker dollar values and percentage
//! weights. Duplicate tickers are aggregated; blank tickers are dropped.

use rustc_hash::FxHashMap;

use crate::types::{Ticker, ValueMap, WeightMap, round_to};

/// A current position as reported by the portfolio layer.
///
/// `ticker` is kept raw; normalization happens in [`extract`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Holding {
    pub ticker: String,
    /// Current market value in dollars.
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: f64,
    /// Fallback weight (0–100) used when the portfolio has no dollar valuation.
    #[cfg_attr(feature = "serde", serde(default))]
    pub percentage: Option<f64>,
}

impl Holding {
    pub fn new(ticker: impl Into<String>, value: f64) -> Self {
        Self {
            ticker: ticker.into(),
            value,
            percentage: None,
        }
    }

    /// Attach a fallback percentage weight.
    pub fn with_percentage(mut self, percentage: f64) -> Self {
        self.percentage = Some(percentage);
        self
    }
}

/// Current weights and dollar values derived from holdings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Valuation {
    /// Ticker → weight in percent, rounded to 6 decimals.
    pub weights: WeightMap,
    /// Ticker → aggregated dollar value.
    pub values: ValueMap,
    /// Sum of all aggregated values (ignored symbols included).
    pub total: f64,
}

impl Valuation {
    /// True when weights came from the holdings' own `percentage` fields
    /// because no positive dollar valuation was available.
    pub fn is_degraded(&self) -> bool {
        self.total <= 0.0 && !self.values.is_empty()
    }
}

/// Derive per-ticker weights and values from a list of holdings.
///
/// With a positive total, each weight is `100 * value / total`. Otherwise each
/// ticker's supplied `percentage` is used as-is (0 when absent).
pub fn extract(holdings: &[Holding]) -> Valuation {
    let mut values: FxHashMap<Ticker, f64> = FxHashMap::default();
    let mut fallback: FxHashMap<Ticker, f64> = FxHashMap::default();

    for holding in holdings {
        let Some(ticker) = Ticker::new(&holding.ticker) else {
            continue;
        };
        *values.entry(ticker.clone()).or_insert(0.0) += holding.value;
        *fallback.entry(ticker).or_insert(0.0) += holding.percentage.unwrap_or(0.0);
    }

    // Sum in ticker order so the total doesn't depend on holding order
    let values: ValueMap = values.into_iter().collect();
    let total: f64 = values.values().sum();

    let weights: WeightMap = if total > 0.0 {
        values
            .iter()
            .map(|(t, v)| (t.clone(), round_to(100.0 * v / total, 6)))
            .collect()
    } else {
        fallback.into_iter().collect()
    };

    Valuation {
        weights,
        values,
        total,
    }
}
