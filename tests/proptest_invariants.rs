//! Property-based tests for rebalance invariants.
//!
//! These tests use proptest to verify that weight, drift, turnover and
//! hashing invariants hold across randomly generated portfolios.

use driftbook::{
    Decision, Holding, Portfolio, PriceMap, RebalanceParams, Ticker, WeightMap, compute_rebalance,
    decide, extract,
};
use proptest::prelude::*;

const UNIVERSE: &[&str] = &["VTI", "BND", "VXUS", "BNDX", "VNQ", "GLD", "CASH"];

/// Generate a ticker from a small universe so holdings and targets overlap
fn ticker_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(UNIVERSE)
}

/// Generate a list of holdings (duplicates allowed)
fn holdings_strategy() -> impl Strategy<Value = Vec<Holding>> {
    prop::collection::vec(
        (ticker_strategy(), 0.0f64..250_000.0).prop_map(|(t, v)| Holding::new(t, v)),
        1..12,
    )
}

/// Generate a target allocation summing to 100
fn targets_strategy() -> impl Strategy<Value = WeightMap> {
    prop::collection::btree_map(ticker_strategy(), 1u32..100, 1..6).prop_map(|raw| {
        let sum: u32 = raw.values().sum();
        raw.into_iter()
            .filter_map(|(t, w)| Some((Ticker::new(t)?, 100.0 * w as f64 / sum as f64)))
            .collect()
    })
}

/// Generate supplied prices for part of the universe
fn prices_strategy() -> impl Strategy<Value = PriceMap> {
    prop::collection::btree_map(ticker_strategy(), 1.0f64..1_000.0, 0..7).prop_map(|raw| {
        raw.into_iter()
            .filter_map(|(t, p)| Some((Ticker::new(t)?, p)))
            .collect()
    })
}

fn params_strategy() -> impl Strategy<Value = RebalanceParams> {
    (
        0.0f64..0.2,
        0u32..500,
        prop::option::of(0.01f64..1.0),
        any::<bool>(),
    )
        .prop_map(|(threshold, min_trade, cap, fractional)| RebalanceParams {
            drift_threshold: threshold,
            min_trade_usd: min_trade as f64,
            turnover_cap: cap,
            fractional,
            ..RebalanceParams::default()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // ========================================================================
    // WEIGHTS
    // ========================================================================

    /// Weights sum to 100 whenever the portfolio has positive value
    #[test]
    fn weights_sum_to_hundred(holdings in holdings_strategy()) {
        let valuation = extract(&holdings);
        prop_assume!(valuation.total > 0.0);
        let sum: f64 = valuation.weights.values().sum();
        prop_assert!((sum - 100.0).abs() <= 0.01, "weights sum to {}", sum);
    }

    // ========================================================================
    // IGNORED SYMBOLS
    // ========================================================================

    /// CASH never shows up in drift or trades
    #[test]
    fn cash_never_drifts_or_trades(
        holdings in holdings_strategy(),
        targets in targets_strategy(),
        params in params_strategy(),
    ) {
        let d = compute_rebalance(&Portfolio::new(holdings, targets), &params, None)
            .into_result()
            .unwrap();
        prop_assert!(!d.drift_map.contains_key("CASH"));
        prop_assert!(d.trades.iter().all(|t| t.ticker.as_str() != "CASH"));
        prop_assert_ne!(d.max_drift_symbol.as_str(), "CASH");
    }

    // ========================================================================
    // THRESHOLD
    // ========================================================================

    /// Drift equal to the threshold never rebalances
    #[test]
    fn threshold_boundary_is_no_action(threshold in 0.0f64..1.0) {
        prop_assert_eq!(decide(threshold * 100.0, threshold), Decision::NoAction);
    }

    /// Decision agrees with the reported max drift
    #[test]
    fn decision_matches_max_drift(
        holdings in holdings_strategy(),
        targets in targets_strategy(),
        params in params_strategy(),
    ) {
        let d = compute_rebalance(&Portfolio::new(holdings, targets), &params, None)
            .into_result()
            .unwrap();
        let expected = if d.max_drift_pct > params.drift_threshold * 100.0 {
            Decision::Rebalance
        } else {
            Decision::NoAction
        };
        prop_assert_eq!(d.decision, expected);
        if d.decision == Decision::NoAction {
            prop_assert!(d.trades.is_empty());
        }
    }

    // ========================================================================
    // TRADE SIZING
    // ========================================================================

    /// Gross traded value stays within the turnover cap
    #[test]
    fn turnover_cap_respected(
        holdings in holdings_strategy(),
        targets in targets_strategy(),
        params in params_strategy(),
    ) {
        let d = compute_rebalance(&Portfolio::new(holdings, targets), &params, None)
            .into_result()
            .unwrap();
        if let Some(cap) = params.turnover_cap {
            if d.portfolio_value > 0.0 && !d.trades.is_empty() {
                let gross: f64 = d.trades.iter().map(|t| t.notional).sum();
                // each notional may round up by half a cent
                let slack = 0.005 * d.trades.len() as f64 + 1e-6;
                prop_assert!(
                    gross <= cap * d.portfolio_value + slack + 0.01,
                    "gross {} over cap {} of {}", gross, cap, d.portfolio_value
                );
            }
        }
    }

    /// No trade is smaller than the minimum notional
    #[test]
    fn min_trade_respected(
        holdings in holdings_strategy(),
        targets in targets_strategy(),
        params in params_strategy(),
        prices in prices_strategy(),
    ) {
        let d = compute_rebalance(&Portfolio::new(holdings, targets), &params, Some(&prices))
            .into_result()
            .unwrap();
        for trade in &d.trades {
            prop_assert!(trade.notional >= params.min_trade_usd);
            prop_assert!(trade.notional > 0.0);
            if let (Some(price), Some(shares)) = (trade.price, trade.shares) {
                prop_assert!(price > 0.0);
                prop_assert!(shares >= 0.0);
                if !params.fractional {
                    prop_assert_eq!(shares, shares.floor());
                }
            }
        }
    }

    /// Sells are listed before buys
    #[test]
    fn sells_precede_buys(
        holdings in holdings_strategy(),
        targets in targets_strategy(),
        params in params_strategy(),
    ) {
        let d = compute_rebalance(&Portfolio::new(holdings, targets), &params, None)
            .into_result()
            .unwrap();
        let first_buy = d.trades.iter().position(|t| t.side == driftbook::Side::Buy);
        if let Some(i) = first_buy {
            prop_assert!(d.trades[i..].iter().all(|t| t.side == driftbook::Side::Buy));
        }
    }

    // ========================================================================
    // DETERMINISM
    // ========================================================================

    /// Holding order does not change the hash
    #[test]
    fn hash_ignores_holding_order(
        holdings in holdings_strategy(),
        targets in targets_strategy(),
    ) {
        let params = RebalanceParams::default();
        let mut reversed = holdings.clone();
        reversed.reverse();

        let a = compute_rebalance(&Portfolio::new(holdings, targets.clone()), &params, None)
            .into_result()
            .unwrap();
        let b = compute_rebalance(&Portfolio::new(reversed, targets), &params, None)
            .into_result()
            .unwrap();
        prop_assert_eq!(a.decision_hash, b.decision_hash);
    }

    /// A different threshold produces a different hash
    #[test]
    fn hash_tracks_threshold(
        holdings in holdings_strategy(),
        targets in targets_strategy(),
        bump in 0.001f64..0.05,
    ) {
        let base = RebalanceParams::default();
        let tighter = RebalanceParams {
            drift_threshold: base.drift_threshold + bump,
            ..base.clone()
        };
        let p = Portfolio::new(holdings, targets);
        let a = compute_rebalance(&p, &base, None).into_result().unwrap();
        let b = compute_rebalance(&p, &tighter, None).into_result().unwrap();
        prop_assert_ne!(a.decision_hash, b.decision_hash);
    }

    /// Moving one target weight produces a different hash
    #[test]
    fn hash_tracks_target_weight(
        holdings in holdings_strategy(),
        targets in targets_strategy(),
        index in any::<prop::sample::Index>(),
        bump in 0.5f64..10.0,
    ) {
        let params = RebalanceParams::default();
        let mut moved = targets.clone();
        let key = index.get(&targets.keys().cloned().collect::<Vec<_>>()).clone();
        if let Some(w) = moved.get_mut(&key) {
            *w += bump;
        }

        let a = compute_rebalance(&Portfolio::new(holdings.clone(), targets), &params, None)
            .into_result()
            .unwrap();
        let b = compute_rebalance(&Portfolio::new(holdings, moved), &params, None)
            .into_result()
            .unwrap();
        prop_assert_ne!(a.decision_hash, b.decision_hash);
    }

    /// Changing one holding's value produces a different hash
    #[test]
    fn hash_tracks_holding_value(
        holdings in holdings_strategy(),
        targets in targets_strategy(),
        index in any::<prop::sample::Index>(),
        bump in 1.0f64..10_000.0,
    ) {
        let params = RebalanceParams::default();
        let mut changed = holdings.clone();
        let i = index.index(changed.len());
        changed[i].value += bump;

        let a = compute_rebalance(&Portfolio::new(holdings, targets.clone()), &params, None)
            .into_result()
            .unwrap();
        let b = compute_rebalance(&Portfolio::new(changed, targets), &params, None)
            .into_result()
            .unwrap();
        prop_assert_ne!(a.decision_hash, b.decision_hash);
    }

    /// Repeating a call with the same inputs is bit-identical
    #[test]
    fn repeated_calls_identical(
        holdings in holdings_strategy(),
        targets in targets_strategy(),
        params in params_strategy(),
        prices in prices_strategy(),
    ) {
        let p = Portfolio::new(holdings, targets);
        let a = compute_rebalance(&p, &params, Some(&prices));
        let b = compute_rebalance(&p, &params, Some(&prices));
        prop_assert_eq!(a, b);
    }
}
