//! Checklist evaluation engine for deep-research agents.
//!
//! Sends generated articles and checklist criteria to a judge model, one call
//! per checklist item, and aggregates pass/fail statistics. The engine is
//! built around three pieces:
//!
//! - a run-wide [`engine::limiter::ConcurrencyLimiter`] bounding in-flight judge calls
//! - a [`engine::retry::RetryPolicy`] with bounded exponential backoff
//! - a [`storage::ledger::ResumeLedger`] that appends each finished record so an
//!   interrupted run resumes without re-evaluating completed work
//!
//! # Quick Start
//!
//! ```no_run
//! use checkjudge_core::config::RunConfig;
//! use checkjudge_core::engine::orchestrator::Orchestrator;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let cfg = RunConfig::default();
//! let orchestrator = Orchestrator::from_config(&cfg)?;
//! let stats = orchestrator.run(&cfg).await?;
//! println!("checks passed: {}/{}", stats.checks_succeeded, stats.checks_total);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dataset;
pub mod engine;
pub mod errors;
pub mod judge;
pub mod model;
pub mod providers;
pub mod report;
pub mod storage;

pub use config::{JudgeConfig, RunConfig};
pub use errors::{ConfigError, DatasetError, JudgeError};
pub use model::{
    ChecklistEntry, ChecklistItem, ChecklistSet, EvaluationOutcome, InputRecord, RecordReport,
    RunStatistics,
};
