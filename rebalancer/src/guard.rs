//! Rebalance guard: duplicate and cooldown checks against the audit history.
//!
//! The engine is stateless and will happily recommend the same rebalance on
//! every call. The guard holds a `rebalance` decision when an identical one
//! was released recently, or when the account was rebalanced within the
//! configured cooldown. `no_action` and `error` outcomes always pass.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use driftbook::{Decision, RebalanceOutcome};
use serde::Serialize;

use crate::audit::DecisionRecord;
use crate::config::GuardConfig;

// About 100 years; keeps the window inside chrono's range.
const MAX_WINDOW_SECS: u64 = 100 * 365 * 86_400;

/// What the guard decided for a fresh outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum GuardVerdict {
    /// Release the decision to the caller.
    Proceed,
    /// The same inputs produced a released decision at `previous`.
    Duplicate { previous: DateTime<Utc> },
    /// The account was last rebalanced at `last`.
    Cooldown {
        last: DateTime<Utc>,
        next_eligible: DateTime<Utc>,
    },
}

impl GuardVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardVerdict::Proceed => "proceed",
            GuardVerdict::Duplicate { .. } => "duplicate",
            GuardVerdict::Cooldown { .. } => "cooldown",
        }
    }

    pub fn is_held(&self) -> bool {
        !matches!(self, GuardVerdict::Proceed)
    }
}

impl fmt::Display for GuardVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardVerdict::Proceed => write!(f, "PROCEED"),
            GuardVerdict::Duplicate { previous } => write!(
                f,
                "DUPLICATE: identical decision already released at {}",
                previous.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            GuardVerdict::Cooldown {
                last,
                next_eligible,
            } => write!(
                f,
                "COOLDOWN: last rebalance {}, next eligible {}",
                last.format("%Y-%m-%d"),
                next_eligible.format("%Y-%m-%d %H:%M UTC")
            ),
        }
    }
}

/// Judge `outcome` for `account` against released decisions in `history`.
pub fn evaluate(
    config: &GuardConfig,
    history: &[DecisionRecord],
    account: &str,
    outcome: &RebalanceOutcome,
    now: DateTime<Utc>,
) -> GuardVerdict {
    let Some(decision) = outcome.as_decided() else {
        return GuardVerdict::Proceed;
    };
    if decision.decision != Decision::Rebalance {
        return GuardVerdict::Proceed;
    }

    let released = || {
        history
            .iter()
            .filter(|r| r.account == account && r.proceeded() && r.ts <= now)
    };

    if config.dedupe_window_secs > 0 {
        let secs = config.dedupe_window_secs.min(MAX_WINDOW_SECS);
        let window = Duration::seconds(secs as i64);
        let duplicate = released()
            .filter(|r| r.decision_hash.as_deref() == Some(decision.decision_hash.as_str()))
            .filter(|r| now - r.ts <= window)
            .map(|r| r.ts)
            .max();
        if let Some(previous) = duplicate {
            return GuardVerdict::Duplicate { previous };
        }
    }

    if config.min_days_between_rebalances > 0 {
        let cooldown = Duration::days(i64::from(config.min_days_between_rebalances));
        let last = released()
            .filter(|r| r.decision == Decision::Rebalance)
            .map(|r| r.ts)
            .max();
        if let Some(last) = last {
            let next_eligible = last
                .checked_add_signed(cooldown)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            if now < next_eligible {
                return GuardVerdict::Cooldown {
                    last,
                    next_eligible,
                };
            }
        }
    }

    GuardVerdict::Proceed
}
