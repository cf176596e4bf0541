//! Loose JSON intake for snapshots coming from an HTTP layer or a database row.
//!
//! Shape errors (holdings not a list, allocations not a mapping) become
//! [`InputError`]s so the engine can answer with an error outcome instead of
//! failing the caller. Numeric fields accept JSON numbers or numeric strings.

use serde_json::Value;

use crate::engine::{Portfolio, RebalanceEngine, RebalanceOutcome};
use crate::error::InputError;
use crate::holding::Holding;
use crate::price::PriceSource;
use crate::types::{PriceMap, Ticker, WeightMap};

impl Portfolio {
    /// Parse `{ "holdings": [...], "allocations": {...} }`.
    pub fn from_json(value: &Value) -> Result<Self, InputError> {
        let holdings = match value.get("holdings") {
            None | Some(Value::Null) => return Err(InputError::EmptyHoldings),
            Some(Value::Array(items)) if items.is_empty() => {
                return Err(InputError::EmptyHoldings);
            }
            Some(Value::Array(items)) => parse_holdings(items)?,
            Some(other) => return Err(InputError::HoldingsNotList(kind(other).into())),
        };

        let allocations = match value.get("allocations") {
            Some(Value::Object(map)) => parse_amounts(map, "weight")?,
            Some(other) => return Err(InputError::AllocationsNotMapping(kind(other).into())),
            None => return Err(InputError::AllocationsNotMapping("nothing".into())),
        };

        Ok(Portfolio::new(holdings, allocations))
    }
}

impl<P: PriceSource> RebalanceEngine<P> {
    /// Validate and evaluate a JSON snapshot in one step.
    pub fn evaluate_json(&self, snapshot: &Value, prices: Option<&PriceMap>) -> RebalanceOutcome {
        match Portfolio::from_json(snapshot) {
            // from_json already rejected an empty list; ticker-less entries
            // it dropped must not turn a non-empty list into an error
            Ok(portfolio) => self.run(&portfolio, prices),
            Err(e) => RebalanceOutcome::Rejected(e),
        }
    }
}

/// Parse a `{ticker: price}` object, dropping blank tickers.
pub fn prices_from_json(value: &Value) -> Result<PriceMap, InputError> {
    match value {
        Value::Object(map) => parse_amounts(map, "price"),
        Value::Null => Ok(PriceMap::new()),
        other => Err(InputError::PricesNotMapping(kind(other).into())),
    }
}

fn parse_holdings(items: &[Value]) -> Result<Vec<Holding>, InputError> {
    let mut holdings = Vec::with_capacity(items.len());
    for item in items {
        let Some(ticker) = item.get("ticker").and_then(Value::as_str) else {
            continue;
        };
        if ticker.trim().is_empty() {
            continue;
        }
        let value = number(item.get("value"), ticker, "value")?.unwrap_or(0.0);
        let percentage = number(item.get("percentage"), ticker, "percentage")?;
        holdings.push(Holding {
            ticker: ticker.to_string(),
            value,
            percentage,
        });
    }
    Ok(holdings)
}

fn parse_amounts(
    map: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<WeightMap, InputError> {
    let mut amounts = WeightMap::new();
    for (raw, v) in map {
        let Some(ticker) = Ticker::new(raw) else {
            continue;
        };
        let amount = number(Some(v), raw, field)?.unwrap_or(0.0);
        *amounts.entry(ticker).or_insert(0.0) += amount;
    }
    Ok(amounts)
}

fn number(v: Option<&Value>, ticker: &str, field: &'static str) -> Result<Option<f64>, InputError> {
    let invalid = |raw: String| InputError::InvalidNumber {
        ticker: ticker.to_string(),
        field,
        raw,
    };
    match v {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(|| invalid(n.to_string())),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| invalid(s.clone())),
        Some(other) => Err(invalid(other.to_string())),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_holdings_and_allocations() {
        let p = Portfolio::from_json(&json!({
            "holdings": [
                {"ticker": "vti", "value": 6000},
                {"ticker": "BND", "value": "4000.50", "percentage": 40}
            ],
            "allocations": {"VTI": 60, "bnd": "40"}
        }))
        .unwrap();
        assert_eq!(p.holdings.len(), 2);
        assert_eq!(p.holdings[1].value, 4000.5);
        assert_eq!(p.holdings[1].percentage, Some(40.0));
        assert_eq!(p.allocations.get("BND"), Some(&40.0));
    }

    #[test]
    fn skips_entries_without_ticker() {
        let p = Portfolio::from_json(&json!({
            "holdings": [
                {"value": 10},
                {"ticker": "", "value": 5},
                "junk",
                {"ticker": "VTI", "value": 1}
            ],
            "allocations": {}
        }))
        .unwrap();
        assert_eq!(p.holdings.len(), 1);
    }

    #[test]
    fn allocations_list_rejected() {
        let err = Portfolio::from_json(&json!({
            "holdings": [{"ticker": "VTI", "value": 1}],
            "allocations": [["VTI", 100]]
        }))
        .unwrap_err();
        assert_eq!(err, InputError::AllocationsNotMapping("list".into()));
    }

    #[test]
    fn missing_holdings_rejected() {
        assert_eq!(
            Portfolio::from_json(&json!({"allocations": {"VTI": 100}})).unwrap_err(),
            InputError::EmptyHoldings
        );
        assert_eq!(
            Portfolio::from_json(&json!({"holdings": [], "allocations": {}})).unwrap_err(),
            InputError::EmptyHoldings
        );
        assert_eq!(
            Portfolio::from_json(&json!({"holdings": {"VTI": 1}, "allocations": {}})).unwrap_err(),
            InputError::HoldingsNotList("mapping".into())
        );
    }

    #[test]
    fn non_numeric_value_rejected() {
        let err = Portfolio::from_json(&json!({
            "holdings": [{"ticker": "VTI", "value": "lots"}],
            "allocations": {"VTI": 100}
        }))
        .unwrap_err();
        assert!(matches!(err, InputError::InvalidNumber { field: "value", .. }));
    }

    #[test]
    fn tickerless_holdings_still_decided() {
        let engine = RebalanceEngine::new(crate::RebalanceParams::default());
        let outcome = engine.evaluate_json(
            &json!({"holdings": [{"value": 10.0}], "allocations": {"VTI": 100}}),
            None,
        );
        let d = outcome.into_result().unwrap();
        assert_eq!(d.decision, crate::Decision::Rebalance);
        assert_eq!(d.portfolio_value, 0.0);
        assert!(d.trades.is_empty());

        let typed = crate::compute_rebalance(
            &Portfolio::new(
                vec![Holding::new("", 10.0)],
                [(Ticker::new("VTI").unwrap(), 100.0)].into_iter().collect(),
            ),
            &crate::RebalanceParams::default(),
            None,
        );
        assert_eq!(typed.decision(), crate::Decision::Rebalance);
    }

    #[test]
    fn prices_parse() {
        let prices = prices_from_json(&json!({"vti": 250.1, "BND": "72.5"})).unwrap();
        assert_eq!(prices.get("VTI"), Some(&250.1));
        assert_eq!(prices.get("BND"), Some(&72.5));
        assert!(prices_from_json(&Value::Null).unwrap().is_empty());
    }
}
