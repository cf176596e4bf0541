//! Core types: Ticker, IgnoreSet, and the map aliases the engine passes around.

use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// An uppercased, trimmed instrument symbol (e.g. `"VTI"`).
///
/// Construction normalizes case so `"vti"` and `" VTI "` compare equal.
/// Empty symbols are unrepresentable.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticker(String);

impl Ticker {
    /// Normalize a raw symbol. Returns `None` for empty or whitespace-only input.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Ticker(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Ticker {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Ticker {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Ticker {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ticker::new(&raw).ok_or_else(|| serde::de::Error::custom("empty ticker"))
    }
}

/// Ticker → percentage weight (0–100 scale).
pub type WeightMap = BTreeMap<Ticker, f64>;

/// Ticker → dollar amount.
pub type ValueMap = BTreeMap<Ticker, f64>;

/// Ticker → per-share price in dollars.
pub type PriceMap = BTreeMap<Ticker, f64>;

/// Symbols excluded from drift measurement and trading.
///
/// Defaults to `{"CASH"}`. Cash still counts toward portfolio value; it is
/// only kept out of the drift map and the trade list.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IgnoreSet(BTreeSet<Ticker>);

impl IgnoreSet {
    /// The default cash-like symbol.
    pub const CASH: &'static str = "CASH";

    /// An empty set: every symbol participates.
    pub fn empty() -> Self {
        IgnoreSet(BTreeSet::new())
    }

    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.0.contains(ticker)
    }

    pub fn insert(&mut self, ticker: Ticker) -> bool {
        self.0.insert(ticker)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ticker> {
        self.0.iter()
    }
}

impl Default for IgnoreSet {
    fn default() -> Self {
        let mut set = BTreeSet::new();
        set.insert(Ticker(Self::CASH.to_string()));
        IgnoreSet(set)
    }
}

impl<S: AsRef<str>> FromIterator<S> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        IgnoreSet(
            iter.into_iter()
                .filter_map(|s| Ticker::new(s.as_ref()))
                .collect(),
        )
    }
}

/// Round half away from zero to `places` decimal places.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_normalizes_case_and_whitespace() {
        let t = Ticker::new("  vti ").unwrap();
        assert_eq!(t.as_str(), "VTI");
        assert_eq!(t, Ticker::new("VTI").unwrap());
    }

    #[test]
    fn ticker_rejects_empty() {
        assert!(Ticker::new("").is_none());
        assert!(Ticker::new("   ").is_none());
    }

    #[test]
    fn ticker_display() {
        assert_eq!(format!("{}", Ticker::new("bnd").unwrap()), "BND");
    }

    #[test]
    fn map_lookup_by_str() {
        let mut map = WeightMap::new();
        map.insert(Ticker::new("VTI").unwrap(), 60.0);
        assert_eq!(map.get("VTI"), Some(&60.0));
    }

    #[test]
    fn default_ignore_set_is_cash() {
        let set = IgnoreSet::default();
        assert_eq!(set.len(), 1);
        assert!(set.contains(&Ticker::new("cash").unwrap()));
        assert!(!set.contains(&Ticker::new("VTI").unwrap()));
    }

    #[test]
    fn ignore_set_from_strings_skips_blanks() {
        let set: IgnoreSet = ["cash", "", "usd"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Ticker::new("USD").unwrap()));
    }

    #[test]
    fn round_to_places() {
        assert_eq!(round_to(33.3333333333, 6), 33.333333);
        assert_eq!(round_to(1234.5678, 2), 1234.57);
        assert_eq!(round_to(-0.0049, 2), 0.0);
    }
}
