//! # driftbook
//!
//! A deterministic drift-check and rebalancing decision engine.
//!
//! ## Features
//!
//! - **Drift measurement**: current weight minus target weight, per ticker
//! - **Threshold policy**: rebalance only when the largest drift strictly exceeds the threshold
//! - **Turnover cap**: uniformly scale trades so gross value stays within a fraction of
//!   the portfolio
//! - **Share sizing**: fractional (3 decimals) or whole shares from supplied or live prices
//! - **Idempotency hash**: SHA-256 over canonicalized inputs, stable across map ordering
//!
//! ## Quick Start
//!
//! ```
//! use driftbook::{
//!     Decision, Holding, Portfolio, PriceMap, RebalanceParams, Ticker, compute_rebalance,
//! };
//!
//! let portfolio = Portfolio::new(
//!     vec![Holding::new("VTI", 8_000.0), Holding::new("BND", 2_000.0)],
//!     [("VTI", 60.0), ("BND", 40.0)]
//!         .into_iter()
//!         .filter_map(|(t, w)| Some((Ticker::new(t)?, w)))
//!         .collect(),
//! );
//! let prices: PriceMap = [("VTI", 100.0), ("BND", 50.0)]
//!     .into_iter()
//!     .filter_map(|(t, p)| Some((Ticker::new(t)?, p)))
//!     .collect();
//!
//! let decision = compute_rebalance(&portfolio, &RebalanceParams::default(), Some(&prices))
//!     .into_result()
//!     .unwrap();
//!
//! assert_eq!(decision.decision, Decision::Rebalance);
//! assert_eq!(decision.max_drift_symbol, "VTI");
//! // 40% turnover is capped at 15% of $10,000
//! assert!(decision.scaled);
//! assert_eq!(decision.trades.len(), 2);
//! ```
//!
//! ## Units
//!
//! Target allocations and weights are percentages on a 0–100 scale. Callers
//! that store fractions must convert before building a [`Portfolio`]. The
//! drift threshold and turnover cap are fractions (`0.03`, `0.15`).
//!
//! ## Live prices
//!
//! Prices supplied with a request take precedence. Anything missing is asked
//! of the engine's [`PriceSource`]; failures leave the trade with a notional
//! and no share count.

pub mod drift;
pub mod engine;
pub mod error;
pub mod hash;
pub mod holding;
#[cfg(feature = "json")]
pub mod json;
pub mod policy;
pub mod price;
pub mod trade;
pub mod types;

pub use drift::{DriftReport, compute_drift};
pub use engine::{
    Portfolio, RebalanceDecision, RebalanceEngine, RebalanceOutcome, RebalanceParams,
    compute_rebalance,
};
pub use error::InputError;
pub use hash::{DecisionInputs, decision_hash};
pub use holding::{Holding, Valuation, extract};
pub use policy::{Decision, decide};
pub use price::{NoPriceSource, PriceSource, PriceUnavailable};
pub use trade::{Side, TradeInstruction, TradePlan, TradeRequest, generate_trades};
pub use types::{IgnoreSet, PriceMap, Ticker, ValueMap, WeightMap};
