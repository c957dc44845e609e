use crate::config::RunConfig;
use crate::model::{FileStats, RunStatistics};
use crate::report::progress::{ProgressEvent, ProgressSink};
use std::sync::Arc;
use std::time::Duration;

const RULE: &str = "------------------------------------------------------------";

/// Mark shown next to each resolved checklist item.
#[must_use]
pub fn verdict_mark(is_met: Option<bool>) -> &'static str {
    match is_met {
        Some(true) => "Yes ✓",
        Some(false) => "No ✗",
        None => "Unresolved ?",
    }
}

#[must_use]
pub fn format_item_line(record_id: &str, title: &str, is_met: Option<bool>) -> String {
    format!("  [{}] {}: {}", record_id, title, verdict_mark(is_met))
}

#[must_use]
pub fn format_file_completed(file: &str, stats: &FileStats) -> String {
    format!(
        "Finished {}: {} records, {}/{} checks passed ({} unresolved) in {:.2}s",
        file,
        stats.records_evaluated,
        stats.checks_succeeded,
        stats.checks_total,
        stats.checks_unresolved,
        stats.elapsed.as_secs_f64()
    )
}

/// Percent with two decimals, or `n/a` when nothing was checked.
#[must_use]
pub fn format_pass_rate(rate: Option<f64>) -> String {
    rate.map(|r| format!("{:.2}%", r))
        .unwrap_or_else(|| "n/a".into())
}

/// Summary block printed at the end of `run` and by `stats`.
#[must_use]
pub fn format_summary(stats: &RunStatistics) -> Vec<String> {
    let mut lines = vec![
        RULE.to_string(),
        "Evaluation summary".to_string(),
        format!(
            "Files:   {} processed, {} failed",
            stats.files_processed, stats.files_failed
        ),
        format!(
            "Records: {} evaluated, {} skipped, {} resumed",
            stats.records_evaluated, stats.records_skipped, stats.records_resumed
        ),
        format!(
            "Checks:  {} passed, {} failed, {} unresolved, {} total",
            stats.checks_succeeded, stats.checks_failed, stats.checks_unresolved, stats.checks_total
        ),
        format!("Pass rate: {}", format_pass_rate(stats.pass_rate())),
    ];
    if stats.elapsed > Duration::ZERO {
        lines.push(format!("Total time: {:.2}s", stats.elapsed.as_secs_f64()));
        if let Some(avg) = stats.avg_secs_per_check() {
            lines.push(format!("Average per check: {:.2}s", avg));
        }
    }
    lines.push(RULE.to_string());
    lines
}

pub fn print_summary(stats: &RunStatistics) {
    for line in format_summary(stats) {
        eprintln!("{}", line);
    }
}

/// Sink that renders progress events as the per-file console block on stderr.
pub fn console_progress_sink(cfg: &RunConfig) -> ProgressSink {
    let settings = format!(
        "concurrency={} timeout={}s max_retries={}",
        cfg.max_concurrent_requests, cfg.request_timeout_secs, cfg.max_retries
    );
    Arc::new(move |ev: ProgressEvent| match ev {
        ProgressEvent::FileStarted {
            file,
            loaded,
            pending,
            resumed,
            skipped,
        } => {
            eprintln!("{}", RULE);
            eprintln!("Processing {}", file);
            eprintln!(
                "  loaded {} records: {} to evaluate, {} already done, {} skipped",
                loaded, pending, resumed, skipped
            );
            eprintln!("  {}", settings);
        }
        ProgressEvent::RecordSkipped { id, reason, .. } => {
            let id = id.unwrap_or_else(|| "?".into());
            eprintln!("  [{}] skipped: {}", id, reason);
        }
        ProgressEvent::ItemResolved {
            record_id,
            title,
            is_met,
        } => eprintln!("{}", format_item_line(&record_id, &title, is_met)),
        ProgressEvent::RecordCompleted {
            record_id,
            met,
            total,
        } => eprintln!("  [{}] done: {}/{} checks passed", record_id, met, total),
        ProgressEvent::FileCompleted { file, stats } => {
            eprintln!("{}", format_file_completed(&file, &stats))
        }
        ProgressEvent::FileFailed { file, error } => {
            eprintln!("Failed {}: {}", file, error)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_marks() {
        assert_eq!(format_item_line("a1", "X", Some(true)), "  [a1] X: Yes ✓");
        assert_eq!(format_item_line("a1", "Y", Some(false)), "  [a1] Y: No ✗");
        assert_eq!(format_item_line("a1", "Z", None), "  [a1] Z: Unresolved ?");
    }

    #[test]
    fn pass_rate_has_two_decimals() {
        assert_eq!(format_pass_rate(Some(200.0 / 3.0)), "66.67%");
        assert_eq!(format_pass_rate(None), "n/a");
    }

    #[test]
    fn summary_block_reports_counts_and_average() {
        let stats = RunStatistics {
            files_processed: 2,
            records_evaluated: 3,
            checks_succeeded: 4,
            checks_failed: 1,
            checks_unresolved: 1,
            checks_total: 6,
            elapsed: Duration::from_secs(3),
            ..Default::default()
        };
        let lines = format_summary(&stats);
        assert!(lines.contains(&"Checks:  4 passed, 1 failed, 1 unresolved, 6 total".to_string()));
        assert!(lines.contains(&"Pass rate: 66.67%".to_string()));
        assert!(lines.contains(&"Average per check: 0.50s".to_string()));
    }

    #[test]
    fn offline_summary_omits_timing() {
        let lines = format_summary(&RunStatistics::default());
        assert!(lines.contains(&"Pass rate: n/a".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("Total time")));
    }
}
