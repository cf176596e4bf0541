//! JSONL audit trail logging.
//!
//! Each check appends events to an audit.jsonl file, one JSON object per
//! line. The `decision` events double as the history the guard reads back.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use driftbook::{Decision, RebalanceOutcome};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::guard::GuardVerdict;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// A past `decision` event, as read back from the trail.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DecisionRecord {
    pub ts: DateTime<Utc>,
    pub account: String,
    pub decision: Decision,
    #[serde(default)]
    pub decision_hash: Option<String>,
    /// Guard verdict recorded with the decision; absent on older lines.
    #[serde(default)]
    pub guard: Option<String>,
}

impl DecisionRecord {
    /// True when the decision was released rather than held by the guard.
    pub fn proceeded(&self) -> bool {
        self.guard.as_deref().is_none_or(|g| g == "proceed")
    }
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Read prior `decision` events. A missing file is an empty history;
    /// lines that don't parse are skipped.
    pub fn history(path: &Path) -> Result<Vec<DecisionRecord>> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let Ok(value) = serde_json::from_str::<serde_json::Value>(&line) else {
                warn!("{}:{}: skipping malformed audit line", path.display(), i + 1);
                continue;
            };
            if value.get("event").and_then(|e| e.as_str()) != Some("decision") {
                continue;
            }
            match serde_json::from_value::<DecisionRecord>(value) {
                Ok(record) => records.push(record),
                Err(e) => warn!("{}:{}: skipping decision event: {e}", path.display(), i + 1),
            }
        }
        Ok(records)
    }
}

/// Convenience: log a check start event.
pub fn log_check_started(audit: &mut AuditLog, account: &str, source: &str) -> Result<()> {
    audit.log(
        "check_started",
        serde_json::json!({
            "account": account,
            "source": source,
        }),
    )
}

/// Convenience: log the engine's outcome together with the guard verdict.
pub fn log_decision(
    audit: &mut AuditLog,
    account: &str,
    outcome: &RebalanceOutcome,
    verdict: &GuardVerdict,
) -> Result<()> {
    let data = match outcome {
        RebalanceOutcome::Decided(d) => serde_json::json!({
            "account": account,
            "decision": d.decision,
            "decision_hash": d.decision_hash,
            "max_drift_pct": d.max_drift_pct,
            "max_drift_symbol": d.max_drift_symbol,
            "portfolio_value": d.portfolio_value,
            "turnover": d.turnover,
            "trades": d.trades.len(),
            "summary": d.summary,
            "guard": verdict.as_str(),
        }),
        RebalanceOutcome::Rejected(e) => serde_json::json!({
            "account": account,
            "decision": Decision::Error,
            "error": e.to_string(),
            "guard": verdict.as_str(),
        }),
    };
    audit.log("decision", data)
}

/// Convenience: log a guard verdict.
pub fn log_guard(audit: &mut AuditLog, account: &str, verdict: &GuardVerdict) -> Result<()> {
    audit.log(
        "guard",
        serde_json::json!({
            "account": account,
            "verdict": verdict.as_str(),
            "detail": verdict.to_string(),
        }),
    )
}

/// Convenience: log check completion.
pub fn log_check_completed(audit: &mut AuditLog, account: &str, exit_code: i32) -> Result<()> {
    audit.log(
        "check_completed",
        serde_json::json!({
            "account": account,
            "exit_code": exit_code,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn audit_log_writes_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_audit.jsonl");

        {
            let mut log = AuditLog::open(&path).unwrap();
            log_check_started(&mut log, "acct", "snapshot.json").unwrap();
            log.log("test_data", serde_json::json!({"key": "value"}))
                .unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        // Each line should be valid JSON
        for line in &lines {
            let _: serde_json::Value = serde_json::from_str(line).unwrap();
        }

        assert!(lines[0].contains("\"event\":\"check_started\""));
        assert!(lines[1].contains("\"key\":\"value\""));
    }

    #[test]
    fn audit_log_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subdir").join("deep").join("audit.jsonl");

        let mut log = AuditLog::open(&path).unwrap();
        log.log("test", serde_json::json!({})).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn history_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = AuditLog::history(&dir.path().join("nope.jsonl")).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn history_reads_decisions_and_skips_noise() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"{{"event":"check_started","ts":"2026-01-05T10:00:00Z","account":"a"}}"#
        )
        .unwrap();
        writeln!(
            f,
            r#"{{"event":"decision","ts":"2026-01-05T10:00:01Z","account":"a","decision":"rebalance","decision_hash":"abc","guard":"proceed"}}"#
        )
        .unwrap();
        writeln!(f, "not json at all").unwrap();
        writeln!(
            f,
            r#"{{"event":"decision","ts":"garbage","account":"a","decision":"rebalance"}}"#
        )
        .unwrap();
        writeln!(
            f,
            r#"{{"event":"decision","ts":"2026-01-06T10:00:00Z","account":"a","decision":"error","error":"x","guard":"proceed"}}"#
        )
        .unwrap();
        writeln!(
            f,
            r#"{{"event":"decision","ts":"2026-01-07T10:00:00Z","account":"b","decision":"rebalance","decision_hash":"def","guard":"cooldown"}}"#
        )
        .unwrap();
        drop(f);

        let history = AuditLog::history(&path).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].decision, Decision::Rebalance);
        assert_eq!(history[0].decision_hash.as_deref(), Some("abc"));
        assert!(history[0].proceeded());
        assert_eq!(history[1].decision, Decision::Error);
        assert!(!history[2].proceeded());
    }

    #[test]
    fn decision_event_round_trips_through_history() {
        use driftbook::{Holding, Portfolio, RebalanceParams, Ticker, compute_rebalance};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let portfolio = Portfolio::new(
            vec![Holding::new("VTI", 8_000.0), Holding::new("BND", 2_000.0)],
            [("VTI", 60.0), ("BND", 40.0)]
                .into_iter()
                .map(|(t, w)| (Ticker::new(t).unwrap(), w))
                .collect(),
        );
        let outcome = compute_rebalance(&portfolio, &RebalanceParams::default(), None);
        let hash = outcome.as_decided().unwrap().decision_hash.clone();

        {
            let mut log = AuditLog::open(&path).unwrap();
            log_decision(&mut log, "acct", &outcome, &GuardVerdict::Proceed).unwrap();
        }

        let history = AuditLog::history(&path).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].account, "acct");
        assert_eq!(history[0].decision_hash, Some(hash));
        assert!(history[0].proceeded());
    }
}
