//! Trade generator: dollar deltas → buy/sell instructions.
//!
//! Deltas are sized against portfolio value, uniformly scaled down when gross
//! turnover would exceed the cap, filtered by a minimum notional, and
//! converted to share counts when a price can be resolved.

use std::collections::BTreeSet;
use std::fmt;

use crate::price::{self, PriceSource};
use crate::types::{IgnoreSet, PriceMap, Ticker, ValueMap, WeightMap, round_to};

/// Trade direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.pad("buy"),
            Side::Sell => f.pad("sell"),
        }
    }
}

/// One proposed trade.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TradeInstruction {
    pub ticker: Ticker,
    pub side: Side,
    /// Absolute dollar amount, rounded to cents.
    pub notional: f64,
    /// Per-share price used for sizing, if one was resolved.
    pub price: Option<f64>,
    /// Share count derived from `notional / price`.
    pub shares: Option<f64>,
}

/// Inputs to [`generate_trades`].
#[derive(Clone, Debug)]
pub struct TradeRequest<'a> {
    /// Current dollar value per ticker.
    pub values: &'a ValueMap,
    /// Target weight per ticker, 0–100.
    pub targets: &'a WeightMap,
    /// Total portfolio value `V`.
    pub portfolio_value: f64,
    /// Max gross trade value as a fraction of `V`. `None` or `<= 0` disables the cap.
    pub turnover_cap: Option<f64>,
    pub min_trade_usd: f64,
    /// Allow fractional share counts (3 decimals) instead of whole shares.
    pub fractional: bool,
    pub ignored: &'a IgnoreSet,
}

/// Result of trade generation.
#[derive(Clone, Debug, PartialEq)]
pub struct TradePlan {
    /// Sells first, then buys; lexical ticker order within each side.
    pub trades: Vec<TradeInstruction>,
    /// Gross pre-scaling delta divided by `V`.
    pub turnover: f64,
    pub scaled: bool,
    /// Multiplier applied to every delta; always in (0, 1].
    pub scale_factor: f64,
    /// Every price resolved during generation.
    pub prices: PriceMap,
}

impl TradePlan {
    /// A plan with no trades, as produced for `V <= 0` or a no-action decision.
    pub fn empty() -> Self {
        Self {
            trades: Vec::new(),
            turnover: 0.0,
            scaled: false,
            scale_factor: 1.0,
            prices: PriceMap::new(),
        }
    }

    /// Sum of trade notionals.
    pub fn gross_notional(&self) -> f64 {
        self.trades.iter().map(|t| t.notional).sum()
    }
}

/// Generate trade instructions moving `values` toward `targets`.
///
/// Prices come from `supplied` first and `source` second. Symbols whose
/// scaled delta is below `min_trade_usd` are dropped, not emitted as zero
/// trades.
pub fn generate_trades<P: PriceSource + ?Sized>(
    request: &TradeRequest<'_>,
    supplied: Option<&PriceMap>,
    source: &P,
) -> TradePlan {
    let v = request.portfolio_value;
    if v.is_nan() || v <= 0.0 {
        return TradePlan::empty();
    }

    let universe: BTreeSet<&Ticker> = request
        .values
        .keys()
        .chain(request.targets.keys())
        .filter(|t| !request.ignored.contains(t))
        .collect();

    let raw: Vec<(&Ticker, f64)> = universe
        .into_iter()
        .map(|t| {
            let target_pct = request.targets.get(t).copied().unwrap_or(0.0);
            let current = request.values.get(t).copied().unwrap_or(0.0);
            (t, v * target_pct / 100.0 - current)
        })
        .collect();

    let gross: f64 = raw.iter().map(|(_, d)| d.abs()).sum();
    let turnover = gross / v;
    let scale_factor = turnover_scale(gross, v, request.turnover_cap);

    let mut prices = PriceMap::new();
    let mut sells = Vec::new();
    let mut buys = Vec::new();

    for (ticker, raw_delta) in raw {
        let delta = raw_delta * scale_factor;
        if delta == 0.0 {
            continue;
        }

        let price = price::resolve(ticker, supplied, source);
        if let Some(p) = price {
            prices.insert(ticker.clone(), p);
        }

        let notional = delta.abs();
        // Sub-cent residue rounds to a zero notional
        if notional < request.min_trade_usd || round_to(notional, 2) == 0.0 {
            continue;
        }

        let shares = price.map(|p| share_count(notional / p, request.fractional));
        let (side, bucket) = if delta > 0.0 {
            (Side::Buy, &mut buys)
        } else {
            (Side::Sell, &mut sells)
        };
        bucket.push(TradeInstruction {
            ticker: ticker.clone(),
            side,
            notional: round_to(notional, 2),
            price,
            shares,
        });
    }

    sells.append(&mut buys);

    TradePlan {
        trades: sells,
        turnover,
        scaled: scale_factor < 1.0,
        scale_factor,
        prices,
    }
}

/// Uniform scale that brings gross trade value down to `cap * value`.
fn turnover_scale(gross: f64, value: f64, cap: Option<f64>) -> f64 {
    match cap {
        Some(cap) if cap > 0.0 => {
            let limit = cap * value;
            if gross > limit { limit / gross } else { 1.0 }
        }
        _ => 1.0,
    }
}

fn share_count(raw: f64, fractional: bool) -> f64 {
    if fractional {
        round_to(raw, 3)
    } else {
        raw.floor()
    }
}
