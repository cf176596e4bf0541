//! Idempotency hashing over a small closed value model.
//!
//! Decision inputs are lifted into [`Value`], canonicalized (map keys sorted
//! recursively, lists left in order), rendered to a compact string and hashed
//! with SHA-256. Two requests with the same logical inputs hash identically
//! regardless of the insertion order of their maps.

use std::fmt::Write as _;

use sha2::{Digest, Sha256};

use crate::types::WeightMap;

/// A hashable input value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    /// Key/value pairs in insertion order. Canonicalization sorts them.
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Build a map from pairs, preserving the given order.
    pub fn map<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Recursively sort map keys. On duplicate keys the last entry wins.
    pub fn canonicalize(&self) -> Value {
        match self {
            Value::List(items) => Value::List(items.iter().map(Value::canonicalize).collect()),
            Value::Map(pairs) => {
                let mut sorted: Vec<(String, Value)> = Vec::with_capacity(pairs.len());
                for (k, v) in pairs {
                    let v = v.canonicalize();
                    let slot = sorted.binary_search_by(|(existing, _)| existing.as_str().cmp(k));
                    match slot {
                        Ok(i) => sorted[i].1 = v,
                        Err(i) => sorted.insert(i, (k.clone(), v)),
                    }
                }
                Value::Map(sorted)
            }
            other => other.clone(),
        }
    }

    /// Compact rendering of the canonical form.
    pub fn to_canonical_string(&self) -> String {
        let mut out = String::new();
        render(&self.canonicalize(), &mut out);
        out
    }

    /// Lowercase hex SHA-256 of the canonical rendering.
    pub fn fingerprint(&self) -> String {
        sha256_hex(self.to_canonical_string().as_bytes())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Option<f64>> for Value {
    fn from(n: Option<f64>) -> Self {
        n.map_or(Value::Null, Value::Number)
    }
}

impl From<&WeightMap> for Value {
    fn from(map: &WeightMap) -> Self {
        Value::map(map.iter().map(|(t, w)| (t.as_str(), Value::Number(*w))))
    }
}

/// The inputs that identify a rebalance decision.
#[derive(Clone, Copy, Debug)]
pub struct DecisionInputs<'a> {
    pub current_weights: &'a WeightMap,
    pub target_weights: &'a WeightMap,
    /// Portfolio value, rounded to cents by the caller.
    pub portfolio_value: f64,
    pub drift_threshold: f64,
    pub min_trade_usd: f64,
    pub turnover_cap: Option<f64>,
}

impl DecisionInputs<'_> {
    pub fn to_value(&self) -> Value {
        Value::map([
            ("current_weights", Value::from(self.current_weights)),
            ("target_weights", Value::from(self.target_weights)),
            ("portfolio_value", Value::from(self.portfolio_value)),
            ("drift_threshold", Value::from(self.drift_threshold)),
            ("min_trade_usd", Value::from(self.min_trade_usd)),
            ("turnover_cap", Value::from(self.turnover_cap)),
        ])
    }
}

/// Stable hex digest identifying a rebalance decision's inputs.
pub fn decision_hash(inputs: &DecisionInputs<'_>) -> String {
    inputs.to_value().fingerprint()
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn render(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => render_number(*n, out),
        Value::String(s) => render_string(s, out),
        Value::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                render(item, out);
            }
            out.push(']');
        }
        Value::Map(pairs) => {
            out.push('{');
            for (i, (k, v)) in pairs.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                render_string(k, out);
                out.push(':');
                render(v, out);
            }
            out.push('}');
        }
    }
}

// `{:?}` on f64 is the shortest round-trip form and always carries a
// fractional part ("60.0"), so integral and float inputs render alike.
fn render_number(n: f64, out: &mut String) {
    let n = if n == 0.0 { 0.0 } else { n };
    let _ = write!(out, "{n:?}");
}

fn render_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
