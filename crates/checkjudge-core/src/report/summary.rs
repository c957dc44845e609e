//! Machine-readable `summary.json` and offline re-aggregation of result files.

use crate::model::{FileStats, RunStatistics};
use crate::storage::ledger::load_reports;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 1;
pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub schema_version: u32,
    pub finished_at: DateTime<Utc>,
    pub model: String,
    pub files_processed: usize,
    pub files_failed: usize,
    pub records_evaluated: usize,
    pub records_skipped: usize,
    pub records_resumed: usize,
    pub checks_succeeded: usize,
    pub checks_failed: usize,
    pub checks_unresolved: usize,
    pub checks_total: usize,
    /// Percent, null when no checks ran.
    pub pass_rate: Option<f64>,
    pub elapsed_secs: f64,
    pub avg_secs_per_check: Option<f64>,
}

impl RunSummary {
    pub fn from_stats(stats: &RunStatistics, model: &str, finished_at: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            finished_at,
            model: model.to_string(),
            files_processed: stats.files_processed,
            files_failed: stats.files_failed,
            records_evaluated: stats.records_evaluated,
            records_skipped: stats.records_skipped,
            records_resumed: stats.records_resumed,
            checks_succeeded: stats.checks_succeeded,
            checks_failed: stats.checks_failed,
            checks_unresolved: stats.checks_unresolved,
            checks_total: stats.checks_total,
            pass_rate: stats.pass_rate().map(round2),
            elapsed_secs: round2(stats.elapsed.as_secs_f64()),
            avg_secs_per_check: stats.avg_secs_per_check().map(round2),
        }
    }

    pub fn finished_now(stats: &RunStatistics, model: &str) -> Self {
        Self::from_stats(stats, model, Utc::now())
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Write summary.json to file
pub fn write_summary(summary: &RunSummary, out: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(out, json).with_context(|| format!("failed to write {}", out.display()))?;
    Ok(())
}

/// Result files (`{prefix}*.jsonl`) in `folder`, sorted by name.
pub fn result_files(folder: &Path, prefix: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)
        .with_context(|| format!("failed to read output folder {}", folder.display()))?
    {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with(prefix) && name.ends_with(".jsonl") && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Re-aggregate statistics from result files already on disk. Corrupt lines
/// are skipped; no judge calls are made.
pub async fn collect_statistics(folder: &Path, prefix: &str) -> anyhow::Result<RunStatistics> {
    let mut stats = RunStatistics::default();
    for path in result_files(folder, prefix)? {
        let mut file = FileStats::default();
        for report in load_reports(&path).await? {
            file.add_report(&report);
        }
        tracing::debug!(file = %path.display(), records = file.records_evaluated, "aggregated result file");
        stats.merge_file(&file);
    }
    Ok(stats)
}
