//! driftbook-rebalancer: drift checks with a guard and an audit trail.
//!
//! Reads a portfolio snapshot (or target weights plus live broker holdings),
//! asks the driftbook engine for a decision, holds repeated or too-frequent
//! rebalances, and appends every step to a JSONL audit log.

pub mod audit;
pub mod check;
pub mod config;
pub mod error;
pub mod guard;
pub mod snapshot;
