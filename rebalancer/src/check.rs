//! Check orchestrator: load → evaluate → guard → audit.
//!
//! This is the main workflow that ties together all components.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use driftbook::{Decision, NoPriceSource, PriceSource, RebalanceEngine, RebalanceOutcome, extract};
use driftbook_broker::alpaca::{AlpacaBroker, client as alpaca};
use driftbook_broker::{Broker, BrokerPrices, holdings_from_positions};
use log::{info, warn};
use serde::Serialize;

use crate::audit::{self, AuditLog};
use crate::config::{BrokerKind, Config};
use crate::error::{Error, Result};
use crate::guard::{self, GuardVerdict};
use crate::snapshot::{Snapshot, TargetsFile};

/// Where the holdings for a check come from.
#[derive(Debug, Clone)]
pub enum CheckSource {
    /// A snapshot file with holdings, allocations and optional prices.
    Snapshot(PathBuf),
    /// A targets file; holdings come from the broker.
    Targets(PathBuf),
}

impl fmt::Display for CheckSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckSource::Snapshot(p) => write!(f, "snapshot:{}", p.display()),
            CheckSource::Targets(p) => write!(f, "targets:{}", p.display()),
        }
    }
}

/// Options for a check run.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub source: CheckSource,
    /// Ask the broker for prices the input doesn't supply.
    pub live_prices: bool,
}

impl CheckOptions {
    fn needs_broker(&self) -> bool {
        self.live_prices || matches!(self.source, CheckSource::Targets(_))
    }
}

/// Result of one check: the engine's outcome and the guard's verdict on it.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub account: String,
    pub guard: GuardVerdict,
    pub outcome: RebalanceOutcome,
}

impl CheckReport {
    /// 2 for an error outcome, 0 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self.outcome.decision() {
            Decision::Error => 2,
            _ => 0,
        }
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ACCOUNT {}", self.account)?;
        let d = match &self.outcome {
            RebalanceOutcome::Rejected(e) => return writeln!(f, "DECISION: ERROR ({e})"),
            RebalanceOutcome::Decided(d) => d,
        };

        writeln!(
            f,
            "DECISION: {} (${:.2} portfolio)",
            d.decision.as_str().to_uppercase(),
            d.portfolio_value
        )?;
        writeln!(f, "  {}", d.summary)?;

        if !d.drift_map.is_empty() {
            writeln!(f, "\nDRIFT:")?;
            for (ticker, drift) in &d.drift_map {
                writeln!(f, "  {:8} {:>+8.2}%", ticker, drift)?;
            }
        }

        if !d.trades.is_empty() {
            writeln!(f, "\nTRADES:")?;
            writeln!(
                f,
                "  {:>3}  {:4} {:8} {:>12} {:>10} {:>10}",
                "#", "Side", "Ticker", "Notional", "Price", "Shares"
            )?;
            for (i, t) in d.trades.iter().enumerate() {
                let price = t.price.map_or("-".to_string(), |p| format!("${p:.2}"));
                let shares = t.shares.map_or("-".to_string(), |s| format!("{s:.3}"));
                writeln!(
                    f,
                    "  {:>3}  {:4} {:8} ${:>11.2} {:>10} {:>10}",
                    i + 1,
                    t.side,
                    t.ticker,
                    t.notional,
                    price,
                    shares
                )?;
            }
        }

        writeln!(f, "\nGUARD: [{}]", self.guard)?;
        writeln!(f, "  hash {}", d.decision_hash)
    }
}

/// Connect to the configured broker, if any.
pub fn connect_broker(config: &Config) -> Result<Option<Box<dyn Broker>>> {
    match config.broker.kind {
        BrokerKind::None => Ok(None),
        BrokerKind::Alpaca => {
            let b = &config.broker;
            let key = env_var(&b.key_env)?;
            let secret = env_var(&b.secret_env)?;
            let default_trading = if b.paper {
                alpaca::PAPER_TRADING_URL
            } else {
                alpaca::LIVE_TRADING_URL
            };
            let trading_url = b.trading_url.as_deref().unwrap_or(default_trading);
            let data_url = b.data_url.as_deref().unwrap_or(alpaca::DATA_URL);

            info!("Connecting to Alpaca at {trading_url}");
            let mut broker = AlpacaBroker::new(&key, &secret, b.paper)
                .with_base_urls(trading_url, data_url)
                .with_timeout(Duration::from_secs(b.timeout_secs));
            broker.connect()?;
            Ok(Some(Box::new(broker)))
        }
    }
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Credentials(name.to_string()))
}

fn require_broker(config: &Config) -> Result<Box<dyn Broker>> {
    connect_broker(config)?
        .ok_or_else(|| Error::Config("this command needs a [broker] section with a kind".into()))
}

/// Run a check, connecting to the broker when the options need one.
pub fn run_check(config: &Config, opts: &CheckOptions) -> Result<CheckReport> {
    let broker = if opts.needs_broker() {
        Some(require_broker(config)?)
    } else {
        None
    };
    check(config, opts, broker, Utc::now())
}

/// Run a check with an already-connected broker and an explicit clock.
pub fn check(
    config: &Config,
    opts: &CheckOptions,
    broker: Option<Box<dyn Broker>>,
    now: DateTime<Utc>,
) -> Result<CheckReport> {
    // 1. Load the snapshot body, pulling holdings from the broker if needed
    let (account, body, prices) = match &opts.source {
        CheckSource::Snapshot(path) => {
            let snap = Snapshot::load(path)?;
            let account = snap.account.unwrap_or_else(|| config.account.id.clone());
            (account, snap.portfolio, snap.prices)
        }
        CheckSource::Targets(path) => {
            let targets = TargetsFile::load(path)?;
            let broker = broker
                .as_deref()
                .ok_or_else(|| Error::Config("targets mode needs a broker".into()))?;
            let cash = broker.account()?.cash;
            let positions = broker.positions()?;
            info!("Fetched {} positions, ${cash:.2} cash", positions.len());
            let holdings = holdings_from_positions(&positions, cash);
            let account = targets
                .account
                .clone()
                .unwrap_or_else(|| config.account.id.clone());
            (account, targets.with_holdings(&holdings)?, None)
        }
    };

    // 2. Open audit log
    let audit_path = config.audit_path();
    let mut audit = AuditLog::open(&audit_path)?;
    audit::log_check_started(&mut audit, &account, &opts.source.to_string())?;

    // 3. Evaluate
    let source: Box<dyn PriceSource> = match broker {
        Some(b) if opts.live_prices => Box::new(BrokerPrices::new(b)),
        _ => Box::new(NoPriceSource),
    };
    let engine = RebalanceEngine::new(config.policy.to_params()).with_price_source(source);
    let outcome = engine.evaluate_json(&body, prices.as_ref());
    if let RebalanceOutcome::Rejected(e) = &outcome {
        warn!("Check for {account} rejected: {e}");
    }

    // 4. Guard against duplicates and cooldown
    let history = AuditLog::history(&audit_path)?;
    let verdict = guard::evaluate(&config.guard, &history, &account, &outcome, now);
    if verdict.is_held() {
        warn!("Rebalance for {account} held: {verdict}");
    }

    // 5. Audit
    audit::log_decision(&mut audit, &account, &outcome, &verdict)?;
    audit::log_guard(&mut audit, &account, &verdict)?;

    let report = CheckReport {
        account,
        guard: verdict,
        outcome,
    };
    audit::log_check_completed(&mut audit, &report.account, report.exit_code())?;
    Ok(report)
}

/// Show current broker positions with their weights.
pub fn show_positions(config: &Config) -> Result<()> {
    let broker = require_broker(config)?;
    let account = broker.account()?;
    let positions = broker.positions()?;

    println!(
        "Account {}: ${:.2} equity, ${:.2} cash\n",
        config.account.id, account.equity, account.cash,
    );

    if positions.is_empty() {
        println!("No positions.");
        return Ok(());
    }

    let valuation = extract(&holdings_from_positions(&positions, account.cash));
    println!("CURRENT PORTFOLIO:");
    for pos in &positions {
        let weight = valuation.weights.get(&pos.ticker).copied().unwrap_or(0.0);
        println!(
            "  {:8} {:>10.3} @ ${:>8.2} avg = ${:>10.2}  ({:.1}%)",
            pos.ticker, pos.quantity, pos.avg_cost, pos.market_value, weight,
        );
    }
    Ok(())
}

/// Check broker connection status.
pub fn check_status(config: &Config) -> Result<()> {
    if config.broker.kind == BrokerKind::None {
        println!("No broker configured; snapshot checks only.");
        return Ok(());
    }

    print!("Connecting to {:?} broker... ", config.broker.kind);
    let broker = require_broker(config)?;
    println!("OK");

    let account = broker.account()?;
    println!(
        "Account {}: ${:.2} equity, ${:.2} buying power",
        config.account.id, account.equity, account.buying_power,
    );
    Ok(())
}
