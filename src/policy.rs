//! Decision policy: compare the largest drift against the threshold.

use std::fmt;

/// What the engine concluded for a rebalance request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Decision {
    /// Drift exceeds the threshold.
    Rebalance,
    /// Portfolio is within tolerance. A normal, successful outcome.
    NoAction,
    /// The request was rejected before evaluation.
    Error,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Rebalance => "rebalance",
            Decision::NoAction => "no_action",
            Decision::Error => "error",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Decide whether `max_abs_drift` (percentage points) breaches `drift_threshold`
/// (a fraction, e.g. `0.03` for 3 points).
///
/// The boundary is inclusive of no-action: only a strictly larger drift
/// triggers a rebalance.
pub fn decide(max_abs_drift: f64, drift_threshold: f64) -> Decision {
    if max_abs_drift <= drift_threshold * 100.0 {
        Decision::NoAction
    } else {
        Decision::Rebalance
    }
}
