//! Rebalance engine: snapshot → drift → decision → trades → hashed result.

use crate::drift::{self, DriftReport};
use crate::error::InputError;
use crate::hash::{self, DecisionInputs};
use crate::holding::{self, Holding};
use crate::policy::{self, Decision};
use crate::price::{NoPriceSource, PriceSource};
use crate::trade::{self, TradeInstruction, TradePlan, TradeRequest};
use crate::types::{IgnoreSet, PriceMap, WeightMap, round_to};

/// Tunables for a rebalance check.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalanceParams {
    /// Max tolerated drift as a fraction (0.03 = 3 percentage points).
    pub drift_threshold: f64,
    /// Trades with a smaller dollar notional are dropped.
    pub min_trade_usd: f64,
    /// Max gross trade value as a fraction of portfolio value; `None` disables.
    pub turnover_cap: Option<f64>,
    /// Permit fractional share counts.
    pub fractional: bool,
    /// Symbols kept out of drift and trading.
    pub ignored: IgnoreSet,
}

impl RebalanceParams {
    pub const DEFAULT_DRIFT_THRESHOLD: f64 = 0.03;
    pub const DEFAULT_MIN_TRADE_USD: f64 = 50.0;
    pub const DEFAULT_TURNOVER_CAP: f64 = 0.15;

    /// Validate the params. Returns `Err` with a description if any field is nonsensical.
    pub fn validate(&self) -> Result<(), String> {
        if !self.drift_threshold.is_finite() || self.drift_threshold < 0.0 {
            return Err(format!(
                "drift_threshold must be >= 0 and finite, got {}",
                self.drift_threshold
            ));
        }
        if !self.min_trade_usd.is_finite() || self.min_trade_usd < 0.0 {
            return Err(format!(
                "min_trade_usd must be >= 0 and finite, got {}",
                self.min_trade_usd
            ));
        }
        if let Some(cap) = self.turnover_cap {
            if !cap.is_finite() {
                return Err(format!("turnover_cap must be finite, got {cap}"));
            }
        }
        Ok(())
    }
}

impl Default for RebalanceParams {
    fn default() -> Self {
        Self {
            drift_threshold: Self::DEFAULT_DRIFT_THRESHOLD,
            min_trade_usd: Self::DEFAULT_MIN_TRADE_USD,
            turnover_cap: Some(Self::DEFAULT_TURNOVER_CAP),
            fractional: true,
            ignored: IgnoreSet::default(),
        }
    }
}

/// A portfolio snapshot: current holdings plus the approved target allocation.
///
/// `allocations` are percentages (0–100) summing nominally to 100. The engine
/// does not rescale them; callers holding fractions convert first.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Portfolio {
    pub holdings: Vec<Holding>,
    pub allocations: WeightMap,
}

impl Portfolio {
    pub fn new(holdings: Vec<Holding>, allocations: WeightMap) -> Self {
        Self {
            holdings,
            allocations,
        }
    }
}

/// The engine's answer for an accepted request.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RebalanceDecision {
    pub decision: Decision,
    pub max_drift_pct: f64,
    pub max_drift_symbol: String,
    /// Threshold in percentage points (`drift_threshold * 100`).
    pub drift_threshold_pct: f64,
    pub drift_map: WeightMap,
    pub portfolio_value: f64,
    /// Gross pre-scaling trade value over portfolio value.
    pub turnover: f64,
    pub scaled: bool,
    pub scale_factor: f64,
    pub trades: Vec<TradeInstruction>,
    pub prices: PriceMap,
    pub decision_hash: String,
    pub summary: String,
}

impl RebalanceDecision {
    pub fn needs_rebalance(&self) -> bool {
        self.decision == Decision::Rebalance
    }
}

/// Either a decision or the input error that prevented one.
#[derive(Clone, Debug, PartialEq)]
pub enum RebalanceOutcome {
    Decided(RebalanceDecision),
    Rejected(InputError),
}

impl RebalanceOutcome {
    pub fn decision(&self) -> Decision {
        match self {
            RebalanceOutcome::Decided(d) => d.decision,
            RebalanceOutcome::Rejected(_) => Decision::Error,
        }
    }

    pub fn as_decided(&self) -> Option<&RebalanceDecision> {
        match self {
            RebalanceOutcome::Decided(d) => Some(d),
            RebalanceOutcome::Rejected(_) => None,
        }
    }

    pub fn into_result(self) -> Result<RebalanceDecision, InputError> {
        match self {
            RebalanceOutcome::Decided(d) => Ok(d),
            RebalanceOutcome::Rejected(e) => Err(e),
        }
    }
}

/// Serializes as the decision object, or `{"decision":"error","error":"..."}`.
#[cfg(feature = "serde")]
impl serde::Serialize for RebalanceOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        match self {
            RebalanceOutcome::Decided(d) => d.serialize(serializer),
            RebalanceOutcome::Rejected(e) => {
                let mut s = serializer.serialize_struct("RebalanceError", 2)?;
                s.serialize_field("decision", &Decision::Error)?;
                s.serialize_field("error", &e.to_string())?;
                s.end()
            }
        }
    }
}

/// Stateless rebalance evaluator with a pluggable live price source.
///
/// Safe to share across threads whenever `P` is.
#[derive(Clone, Debug)]
pub struct RebalanceEngine<P = NoPriceSource> {
    params: RebalanceParams,
    source: P,
}

impl RebalanceEngine<NoPriceSource> {
    /// Engine that only uses prices supplied with each request.
    pub fn new(params: RebalanceParams) -> Self {
        Self {
            params,
            source: NoPriceSource,
        }
    }
}

impl<P: PriceSource> RebalanceEngine<P> {
    /// Swap in a live price source used for tickers the request doesn't price.
    pub fn with_price_source<Q: PriceSource>(self, source: Q) -> RebalanceEngine<Q> {
        RebalanceEngine {
            params: self.params,
            source,
        }
    }

    pub fn params(&self) -> &RebalanceParams {
        &self.params
    }

    pub fn price_source(&self) -> &P {
        &self.source
    }

    /// Evaluate a portfolio snapshot.
    ///
    /// Only empty holdings and invalid params are rejected; every other
    /// degradation (missing prices, zero valuation) still yields a decision.
    pub fn evaluate(&self, portfolio: &Portfolio, prices: Option<&PriceMap>) -> RebalanceOutcome {
        if portfolio.holdings.is_empty() {
            return RebalanceOutcome::Rejected(InputError::EmptyHoldings);
        }
        self.run(portfolio, prices)
    }

    /// Evaluate without the empty-holdings gate. Callers that filter holdings
    /// (e.g. JSON intake dropping ticker-less entries) gate on the raw input.
    pub(crate) fn run(&self, portfolio: &Portfolio, prices: Option<&PriceMap>) -> RebalanceOutcome {
        if let Err(msg) = self.params.validate() {
            return RebalanceOutcome::Rejected(InputError::InvalidParams(msg));
        }

        let params = &self.params;
        let valuation = holding::extract(&portfolio.holdings);
        let DriftReport {
            drift_map,
            max_abs_drift,
            max_drift_symbol,
        } = drift::compute_drift(&valuation.weights, &portfolio.allocations, &params.ignored);
        let decision = policy::decide(max_abs_drift, params.drift_threshold);

        let plan = if decision == Decision::Rebalance {
            let request = TradeRequest {
                values: &valuation.values,
                targets: &portfolio.allocations,
                portfolio_value: valuation.total,
                turnover_cap: params.turnover_cap,
                min_trade_usd: params.min_trade_usd,
                fractional: params.fractional,
                ignored: &params.ignored,
            };
            trade::generate_trades(&request, prices, &self.source)
        } else {
            TradePlan::empty()
        };

        let portfolio_value = round_to(valuation.total, 2);
        let decision_hash = hash::decision_hash(&DecisionInputs {
            current_weights: &valuation.weights,
            target_weights: &portfolio.allocations,
            portfolio_value,
            drift_threshold: params.drift_threshold,
            min_trade_usd: params.min_trade_usd,
            turnover_cap: params.turnover_cap,
        });

        let drift_threshold_pct = params.drift_threshold * 100.0;
        let summary = summarize(
            decision,
            max_abs_drift,
            &max_drift_symbol,
            drift_threshold_pct,
            portfolio_value,
            &plan,
            params.turnover_cap,
        );

        RebalanceOutcome::Decided(RebalanceDecision {
            decision,
            max_drift_pct: max_abs_drift,
            max_drift_symbol,
            drift_threshold_pct,
            drift_map,
            portfolio_value,
            turnover: plan.turnover,
            scaled: plan.scaled,
            scale_factor: plan.scale_factor,
            trades: plan.trades,
            prices: plan.prices,
            decision_hash,
            summary,
        })
    }
}

/// Evaluate with explicit params and no live price source.
pub fn compute_rebalance(
    portfolio: &Portfolio,
    params: &RebalanceParams,
    prices: Option<&PriceMap>,
) -> RebalanceOutcome {
    RebalanceEngine::new(params.clone()).evaluate(portfolio, prices)
}

fn summarize(
    decision: Decision,
    max_drift: f64,
    symbol: &str,
    threshold_pct: f64,
    portfolio_value: f64,
    plan: &TradePlan,
    turnover_cap: Option<f64>,
) -> String {
    let symbol = if symbol.is_empty() { "-" } else { symbol };
    match decision {
        Decision::NoAction => format!(
            "Max drift {max_drift:.2}% ({symbol}) within {threshold_pct:.2}% threshold; no action"
        ),
        Decision::Rebalance if portfolio_value <= 0.0 => format!(
            "Max drift {max_drift:.2}% ({symbol}) exceeds {threshold_pct:.2}% threshold; \
             portfolio value is zero, no trades generated"
        ),
        Decision::Rebalance => {
            let mut s = format!(
                "Max drift {max_drift:.2}% ({symbol}) exceeds {threshold_pct:.2}% threshold; \
                 {} trade(s), ${:.2} gross, turnover {:.2}%",
                plan.trades.len(),
                plan.gross_notional(),
                plan.turnover * 100.0,
            );
            if plan.scaled {
                if let Some(cap) = turnover_cap {
                    s.push_str(&format!(" scaled to {:.2}% cap", cap * 100.0));
                }
            }
            s
        }
        Decision::Error => "request rejected".to_string(),
    }
}
