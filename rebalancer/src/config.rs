//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};

use driftbook::{IgnoreSet, RebalanceParams};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub guard: GuardConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// Account key for the audit trail and guard, unless a snapshot names one.
    #[serde(default = "default_account_id")]
    pub id: String,
}

fn default_account_id() -> String {
    "default".into()
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            id: default_account_id(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_drift_threshold")]
    pub drift_threshold: f64,
    #[serde(default = "default_min_trade")]
    pub min_trade_usd: f64,
    /// Zero disables the cap.
    #[serde(default = "default_turnover_cap")]
    pub turnover_cap: f64,
    #[serde(default = "default_true")]
    pub fractional: bool,
    #[serde(default = "default_ignored")]
    pub ignored_tickers: Vec<String>,
}

fn default_drift_threshold() -> f64 {
    RebalanceParams::DEFAULT_DRIFT_THRESHOLD
}
fn default_min_trade() -> f64 {
    RebalanceParams::DEFAULT_MIN_TRADE_USD
}
fn default_turnover_cap() -> f64 {
    RebalanceParams::DEFAULT_TURNOVER_CAP
}
fn default_true() -> bool {
    true
}
fn default_ignored() -> Vec<String> {
    vec![IgnoreSet::CASH.to_string()]
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            drift_threshold: default_drift_threshold(),
            min_trade_usd: default_min_trade(),
            turnover_cap: default_turnover_cap(),
            fractional: default_true(),
            ignored_tickers: default_ignored(),
        }
    }
}

impl PolicyConfig {
    /// Engine parameters for this policy.
    pub fn to_params(&self) -> RebalanceParams {
        RebalanceParams {
            drift_threshold: self.drift_threshold,
            min_trade_usd: self.min_trade_usd,
            turnover_cap: (self.turnover_cap > 0.0).then_some(self.turnover_cap),
            fractional: self.fractional,
            ignored: self.ignored_tickers.iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuardConfig {
    /// Zero disables the cooldown.
    #[serde(default = "default_min_days")]
    pub min_days_between_rebalances: u32,
    /// Zero disables duplicate detection.
    #[serde(default = "default_dedupe_window")]
    pub dedupe_window_secs: u64,
}

fn default_min_days() -> u32 {
    30
}
fn default_dedupe_window() -> u64 {
    86_400
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            min_days_between_rebalances: default_min_days(),
            dedupe_window_secs: default_dedupe_window(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerKind {
    /// Snapshot files only; no live positions or prices.
    #[default]
    None,
    Alpaca,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    #[serde(default)]
    pub kind: BrokerKind,
    /// Name of the environment variable holding the API key id.
    #[serde(default = "default_key_env")]
    pub key_env: String,
    /// Name of the environment variable holding the API secret.
    #[serde(default = "default_secret_env")]
    pub secret_env: String,
    #[serde(default = "default_true")]
    pub paper: bool,
    #[serde(default)]
    pub trading_url: Option<String>,
    #[serde(default)]
    pub data_url: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_key_env() -> String {
    "APCA_API_KEY_ID".into()
}
fn default_secret_env() -> String {
    "APCA_API_SECRET_KEY".into()
}
fn default_timeout() -> u64 {
    10
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            kind: BrokerKind::default(),
            key_env: default_key_env(),
            secret_env: default_secret_env(),
            paper: default_true(),
            trading_url: None,
            data_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse from a TOML string (useful for testing).
    pub fn from_toml(toml: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.account.id.trim().is_empty() {
            return Err(Error::Config("account id must not be empty".into()));
        }
        let p = &self.policy;
        if !(0.0..=1.0).contains(&p.drift_threshold) {
            return Err(Error::Config("drift_threshold must be in [0.0, 1.0]".into()));
        }
        if !p.min_trade_usd.is_finite() || p.min_trade_usd < 0.0 {
            return Err(Error::Config("min_trade_usd must be >= 0".into()));
        }
        if !(0.0..=2.0).contains(&p.turnover_cap) {
            return Err(Error::Config("turnover_cap must be in [0.0, 2.0]".into()));
        }
        if self.broker.kind != BrokerKind::None && self.broker.timeout_secs == 0 {
            return Err(Error::Config("broker timeout_secs must be > 0".into()));
        }
        if self.logging.audit_file.trim().is_empty() {
            return Err(Error::Config("audit_file must not be empty".into()));
        }
        self.policy
            .to_params()
            .validate()
            .map_err(Error::Config)
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}
