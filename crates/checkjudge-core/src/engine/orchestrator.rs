//! Per-file fan-out: one task per record, one task per checklist item, all
//! admitted through the shared limiter.

use super::evaluate::{display_title, evaluate_item, EvalContext};
use super::limiter::ConcurrencyLimiter;
use super::retry::RetryPolicy;
use crate::config::RunConfig;
use crate::dataset;
use crate::errors::ConfigError;
use crate::judge::JudgeClient;
use crate::model::{ChecklistEntry, ChecklistSet, FileStats, InputRecord, RecordReport, RunStatistics};
use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::storage::ledger::ResumeLedger;
use anyhow::Context;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Result of processing one input file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub stats: FileStats,
    /// Reports written during this call, in completion order.
    pub reports: Vec<RecordReport>,
}

#[derive(Clone)]
pub struct Orchestrator {
    ctx: Arc<EvalContext>,
}

impl Orchestrator {
    pub fn new(judge: JudgeClient, limiter: ConcurrencyLimiter, retry: RetryPolicy, model_name: String) -> Self {
        Self {
            ctx: Arc::new(EvalContext {
                judge,
                limiter,
                retry,
                model_name,
                progress: None,
            }),
        }
    }

    pub fn from_config(cfg: &RunConfig) -> Result<Self, ConfigError> {
        let judge = JudgeClient::from_config(&cfg.judge)?;
        Ok(Self::new(
            judge,
            ConcurrencyLimiter::new(cfg.max_concurrent_requests),
            RetryPolicy::from_config(cfg),
            cfg.judge.model_name(),
        ))
    }

    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        let mut ctx = (*self.ctx).clone();
        ctx.progress = Some(sink);
        self.ctx = Arc::new(ctx);
        self
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.ctx.limiter
    }

    pub fn model_name(&self) -> &str {
        &self.ctx.model_name
    }

    /// Evaluate every checklist item of one record concurrently and assemble
    /// the outcomes in checklist order.
    pub async fn evaluate_record(
        &self,
        record: Arc<InputRecord>,
        entry: Arc<ChecklistEntry>,
    ) -> RecordReport {
        let handles: Vec<_> = (0..entry.checklist.len())
            .map(|index| {
                let ctx = self.ctx.clone();
                let record = record.clone();
                let entry = entry.clone();
                tokio::spawn(async move {
                    evaluate_item(&record, index, &entry.checklist[index], &ctx).await
                })
            })
            .collect();

        let joined = futures::future::join_all(handles).await;
        let checklist_evaluations = joined
            .into_iter()
            .zip(entry.checklist.iter())
            .enumerate()
            .map(|(index, (res, item))| match res {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(
                        record_id = %record.id,
                        item = %display_title(item, index),
                        error = %e,
                        "evaluation task failed"
                    );
                    self.ctx.outcome(item, None)
                }
            })
            .collect();

        RecordReport {
            id: record.id.clone(),
            topic: entry.topic.clone(),
            checklist_evaluations,
            model_used: self.ctx.model_name.clone(),
        }
    }

    /// Evaluate the records of `input` that are not yet in `output`,
    /// appending each report as soon as it completes.
    ///
    /// Only file-level I/O failures (unreadable input, unwritable output)
    /// are returned as errors.
    pub async fn process_file(
        &self,
        input: &Path,
        output: &Path,
        checklists: &ChecklistSet,
    ) -> anyhow::Result<FileReport> {
        let started = Instant::now();
        let file = file_label(input);
        let loaded = dataset::load_records(input)
            .await
            .with_context(|| format!("failed to load {}", input.display()))?;
        let ledger = ResumeLedger::open(output)
            .await
            .with_context(|| format!("failed to open resume state {}", output.display()))?;

        let mut stats = FileStats::default();
        for skipped in &loaded.skipped {
            stats.records_skipped += 1;
            warn!(file = %file, line = skipped.line, id = ?skipped.id, reason = %skipped.reason, "skipping input record");
            self.ctx.emit(ProgressEvent::RecordSkipped {
                file: file.clone(),
                id: skipped.id.clone(),
                reason: skipped.reason.to_string(),
            });
        }

        let mut scheduled = HashSet::new();
        let mut pending = Vec::new();
        for record in &loaded.records {
            if ledger.contains(&record.id) {
                stats.records_resumed += 1;
                continue;
            }
            if !scheduled.insert(record.id.clone()) {
                stats.records_skipped += 1;
                self.skip(&file, &record.id, "duplicate id in input file");
                continue;
            }
            match checklists.get(&record.id) {
                Some(entry) => pending.push((Arc::new(record.clone()), entry)),
                None => {
                    stats.records_skipped += 1;
                    self.skip(&file, &record.id, "no checklist entry");
                }
            }
        }

        info!(
            file = %file,
            loaded = loaded.records.len(),
            pending = pending.len(),
            resumed = stats.records_resumed,
            skipped = stats.records_skipped,
            "processing file"
        );
        self.ctx.emit(ProgressEvent::FileStarted {
            file: file.clone(),
            loaded: loaded.records.len() + loaded.skipped.len(),
            pending: pending.len(),
            resumed: stats.records_resumed,
            skipped: stats.records_skipped,
        });

        let ledger = Arc::new(Mutex::new(ledger));
        let mut join_set = JoinSet::new();
        for (record, entry) in pending {
            let this = self.clone();
            let ledger = ledger.clone();
            join_set.spawn(async move {
                let report = this.evaluate_record(record, entry).await;
                ledger.lock().await.append(&report).await?;
                anyhow::Ok(report)
            });
        }

        let mut reports = Vec::new();
        while let Some(res) = join_set.join_next().await {
            match res {
                Ok(Ok(report)) => {
                    stats.add_report(&report);
                    self.ctx.emit(ProgressEvent::RecordCompleted {
                        record_id: report.id.clone(),
                        met: report.met(),
                        total: report.checklist_evaluations.len(),
                    });
                    reports.push(report);
                }
                Ok(Err(e)) => {
                    join_set.abort_all();
                    return Err(e.context(format!("failed to persist results for {}", file)));
                }
                Err(e) => {
                    // Nothing was written for this record; the next run picks it up.
                    error!(file = %file, error = %e, "record task failed");
                }
            }
        }

        stats.elapsed = started.elapsed();
        self.ctx.emit(ProgressEvent::FileCompleted {
            file,
            stats: stats.clone(),
        });
        Ok(FileReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            stats,
            reports,
        })
    }

    /// Process every `*.jsonl` file of the input folder in name order.
    ///
    /// Fails only when the run cannot start at all (checklist file or input
    /// folder unreadable, output folder not creatable). A failing input file
    /// is logged, counted and skipped.
    pub async fn run(&self, cfg: &RunConfig) -> anyhow::Result<RunStatistics> {
        let started = Instant::now();
        tokio::fs::create_dir_all(&cfg.output_folder)
            .await
            .with_context(|| format!("failed to create {}", cfg.output_folder.display()))?;
        let checklists = dataset::load_checklists(&cfg.checklist_file).await?;
        info!(entries = checklists.len(), "checklists loaded");

        let inputs = list_input_files(cfg).await?;
        if inputs.is_empty() {
            warn!(folder = %cfg.input_folder.display(), "no .jsonl input files found");
        }

        let mut stats = RunStatistics::default();
        for input in inputs {
            let output = cfg.output_path_for(&input);
            match self.process_file(&input, &output, &checklists).await {
                Ok(report) => stats.merge_file(&report.stats),
                Err(e) => {
                    error!(file = %input.display(), error = %format!("{e:#}"), "file processing failed");
                    self.ctx.emit(ProgressEvent::FileFailed {
                        file: file_label(&input),
                        error: format!("{e:#}"),
                    });
                    stats.record_file_failure();
                }
            }
        }
        stats.elapsed = started.elapsed();
        Ok(stats)
    }

    fn skip(&self, file: &str, id: &str, reason: &str) {
        warn!(file = %file, id = %id, reason, "skipping input record");
        self.ctx.emit(ProgressEvent::RecordSkipped {
            file: file.to_string(),
            id: Some(id.to_string()),
            reason: reason.to_string(),
        });
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `*.jsonl` files of the input folder, sorted. When input and output share a
/// folder, our own result files are left out.
pub async fn list_input_files(cfg: &RunConfig) -> anyhow::Result<Vec<PathBuf>> {
    let mut dir = tokio::fs::read_dir(&cfg.input_folder)
        .await
        .with_context(|| format!("failed to read input folder {}", cfg.input_folder.display()))?;
    let same_folder = same_dir(&cfg.input_folder, &cfg.output_folder);
    let checklist = std::fs::canonicalize(&cfg.checklist_file).ok();

    let mut files = Vec::new();
    while let Some(entry) = dir.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
            continue;
        }
        if !entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        if checklist.is_some() && std::fs::canonicalize(&path).ok() == checklist {
            continue;
        }
        let name = file_label(&path);
        if same_folder && name.starts_with(&cfg.output_prefix) {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
