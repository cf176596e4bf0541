//! Snapshot and targets file loading.
//!
//! A snapshot carries everything a check needs:
//!
//! ```json
//! {
//!   "account": "household-42",
//!   "timestamp": "2026-03-02T21:00:00Z",
//!   "holdings": [{ "ticker": "VTI", "value": 8000 }, { "ticker": "BND", "value": 2000 }],
//!   "allocations": { "VTI": 60, "BND": 40 },
//!   "prices": { "VTI": 100, "BND": 50 }
//! }
//! ```
//!
//! A targets file carries only `account`, `timestamp` and `allocations`;
//! holdings come from the broker. In both, allocations stored as fractions
//! are scaled to percentages before they reach the engine. The shape of
//! `holdings` and `allocations` is left for the engine to judge, so a
//! malformed file yields an error decision rather than a load failure.

use std::path::Path;

use chrono::{DateTime, Utc};
use driftbook::json::prices_from_json;
use driftbook::{Holding, PriceMap};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Weights summing to at most this are read as fractions.
const FRACTION_SUM_TOLERANCE: f64 = 1e-6;

/// A full portfolio snapshot.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub account: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    /// `{ "holdings": ..., "allocations": ... }`, allocations in percent.
    pub portfolio: Value,
    pub prices: Option<PriceMap>,
}

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    account: Option<String>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    holdings: Value,
    #[serde(default)]
    allocations: Value,
    #[serde(default)]
    prices: Value,
}

impl Snapshot {
    /// Load a snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::SnapshotRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string (useful for testing).
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawSnapshot = serde_json::from_str(json)?;
        let prices = match raw.prices {
            Value::Null => None,
            other => Some(prices_from_json(&other).map_err(|e| Error::Snapshot(e.to_string()))?),
        };

        let mut portfolio = Map::new();
        portfolio.insert("holdings".into(), raw.holdings);
        portfolio.insert("allocations".into(), normalize_allocations(raw.allocations));

        Ok(Self {
            account: non_blank(raw.account),
            timestamp: raw.timestamp,
            portfolio: Value::Object(portfolio),
            prices,
        })
    }
}

/// Target allocations for broker-sourced holdings.
#[derive(Debug, Clone)]
pub struct TargetsFile {
    pub account: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    /// Allocations in percent.
    pub allocations: Value,
}

#[derive(Deserialize)]
struct RawTargets {
    #[serde(default)]
    account: Option<String>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    allocations: Value,
}

impl TargetsFile {
    /// Load a targets file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::SnapshotRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string (useful for testing).
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawTargets = serde_json::from_str(json)?;
        Ok(Self {
            account: non_blank(raw.account),
            timestamp: raw.timestamp,
            allocations: normalize_allocations(raw.allocations),
        })
    }

    /// Combine with broker holdings into an engine snapshot body.
    pub fn with_holdings(&self, holdings: &[Holding]) -> Result<Value> {
        let mut portfolio = Map::new();
        portfolio.insert("holdings".into(), serde_json::to_value(holdings)?);
        portfolio.insert("allocations".into(), self.allocations.clone());
        Ok(Value::Object(portfolio))
    }
}

/// Scale fractional allocations (every weight in [0, 1], summing to at most 1)
/// to percentages. Anything else passes through untouched.
pub fn normalize_allocations(allocations: Value) -> Value {
    let Value::Object(map) = allocations else {
        return allocations;
    };

    let weights: Option<Vec<f64>> = map.values().map(as_number).collect();
    let is_fraction = match &weights {
        Some(w) if !w.is_empty() => {
            w.iter().all(|v| (0.0..=1.0).contains(v))
                && w.iter().sum::<f64>() <= 1.0 + FRACTION_SUM_TOLERANCE
        }
        _ => false,
    };
    if !is_fraction {
        return Value::Object(map);
    }

    log::debug!("allocations look like fractions; scaling by 100");
    Value::Object(
        map.into_iter()
            .map(|(ticker, v)| {
                let pct = as_number(&v).map_or(v, |w| Value::from(w * 100.0));
                (ticker, pct)
            })
            .collect(),
    )
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}
