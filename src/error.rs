//! Input validation errors for rebalance requests.

/// Reasons a rebalance request is rejected before any computation runs.
///
/// These surface as [`RebalanceOutcome::Rejected`](crate::RebalanceOutcome::Rejected)
/// rather than as a panic or a propagated error.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum InputError {
    /// The portfolio carries no holdings.
    #[error("no holdings supplied")]
    EmptyHoldings,

    /// `holdings` was present but not a list.
    #[error("holdings must be a list, got {0}")]
    HoldingsNotList(String),

    /// `allocations` was missing or not a ticker → weight mapping.
    #[error("allocations must be a mapping of ticker to weight, got {0}")]
    AllocationsNotMapping(String),

    /// Supplied prices were not a ticker → price mapping.
    #[error("prices must be a mapping of ticker to price, got {0}")]
    PricesNotMapping(String),

    /// A holding or allocation carried a non-numeric amount.
    #[error("invalid number for {field} of {ticker}: {raw}")]
    InvalidNumber {
        ticker: String,
        field: &'static str,
        raw: String,
    },

    /// A rebalance parameter was out of range or non-finite.
    #[error("invalid parameter: {0}")]
    InvalidParams(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(format!("{}", InputError::EmptyHoldings), "no holdings supplied");
        assert_eq!(
            format!("{}", InputError::AllocationsNotMapping("array".into())),
            "allocations must be a mapping of ticker to weight, got array"
        );
    }

    #[test]
    fn is_error() {
        let err: Box<dyn std::error::Error> = Box::new(InputError::EmptyHoldings);
        assert!(err.to_string().contains("holdings"));
    }
}
