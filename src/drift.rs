//! Drift calculator: current weight minus target weight, per ticker.

use std::collections::BTreeSet;

use crate::types::{IgnoreSet, Ticker, WeightMap, round_to};

/// Per-ticker drift and the largest absolute deviation.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DriftReport {
    /// Ticker → (current % − target %), rounded to 6 decimals.
    pub drift_map: WeightMap,
    /// Largest |drift| in percentage points.
    pub max_abs_drift: f64,
    /// Ticker holding `max_abs_drift`; empty when no tickers participate.
    pub max_drift_symbol: String,
}

/// Compute drift over the union of current and target tickers.
///
/// Tickers in `ignored` are skipped entirely. A ticker missing from one side
/// counts as 0% on that side.
///
/// Ties on magnitude go to the overweight ticker (positive drift); any tie
/// left after that resolves to the lexically smallest ticker.
pub fn compute_drift(current: &WeightMap, target: &WeightMap, ignored: &IgnoreSet) -> DriftReport {
    let universe: BTreeSet<&Ticker> = current
        .keys()
        .chain(target.keys())
        .filter(|t| !ignored.contains(t))
        .collect();

    let mut report = DriftReport::default();
    let mut best: Option<(&Ticker, f64)> = None;

    for ticker in universe {
        let cur = current.get(ticker).copied().unwrap_or(0.0);
        let tgt = target.get(ticker).copied().unwrap_or(0.0);
        let drift = round_to(cur - tgt, 6);
        report.drift_map.insert(ticker.clone(), drift);

        let replace = match best {
            None => true,
            Some((_, best_drift)) => {
                let (mag, best_mag) = (drift.abs(), best_drift.abs());
                mag > best_mag || (mag == best_mag && drift > best_drift)
            }
        };
        if replace {
            best = Some((ticker, drift));
        }
    }

    if let Some((ticker, drift)) = best {
        report.max_abs_drift = drift.abs();
        report.max_drift_symbol = ticker.to_string();
    }
    report
}
