//! Append-only JSONL result files and the resume skip-set derived from them.
//!
//! Every completed record is appended and synced immediately. On open, ids
//! already present are collected; a trailing line cut short by a crash is
//! dropped from the file so later appends start on a clean line.

use crate::model::RecordReport;
use anyhow::Context;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct Scan {
    ids: HashSet<String>,
    /// Byte offset where an unparsable unterminated tail starts.
    torn_tail_at: Option<u64>,
    /// Last line parsed but has no trailing newline.
    missing_newline: bool,
}

fn line_id(line: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    match value.get("id")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn scan(path: &Path, bytes: &[u8]) -> Scan {
    let mut out = Scan::default();
    let mut offset = 0usize;
    let mut line_no = 0usize;
    while offset < bytes.len() {
        line_no += 1;
        let (line_bytes, terminated) = match bytes[offset..].iter().position(|b| *b == b'\n') {
            Some(pos) => (&bytes[offset..offset + pos], true),
            None => (&bytes[offset..], false),
        };
        let line = String::from_utf8_lossy(line_bytes);
        if !line.trim().is_empty() {
            match line_id(&line) {
                Some(id) => {
                    out.ids.insert(id);
                    if !terminated {
                        out.missing_newline = true;
                    }
                }
                None if !terminated => {
                    warn!(
                        path = %path.display(),
                        line = line_no,
                        "truncated trailing result line, treating record as not done"
                    );
                    out.torn_tail_at = Some(offset as u64);
                }
                None => {
                    warn!(
                        path = %path.display(),
                        line = line_no,
                        "unparsable result line ignored"
                    );
                }
            }
        }
        offset += line_bytes.len() + usize::from(terminated);
    }
    out
}

async fn read_if_exists(path: &Path) -> anyhow::Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

/// Ids of records already written to `path`. A missing file is an empty set.
pub async fn already_done(path: &Path) -> anyhow::Result<HashSet<String>> {
    Ok(match read_if_exists(path).await? {
        Some(bytes) => scan(path, &bytes).ids,
        None => HashSet::new(),
    })
}

/// Every parsable report in `path`, in file order.
pub async fn load_reports(path: &Path) -> anyhow::Result<Vec<RecordReport>> {
    let Some(bytes) = read_if_exists(path).await? else {
        return Ok(Vec::new());
    };
    let text = String::from_utf8_lossy(&bytes);
    let mut reports = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RecordReport>(line) {
            Ok(r) => reports.push(r),
            Err(e) => warn!(path = %path.display(), line = idx + 1, error = %e, "skipping unparsable result line"),
        }
    }
    Ok(reports)
}

/// Output file of one input file plus the ids it already holds.
#[derive(Debug)]
pub struct ResumeLedger {
    path: PathBuf,
    done: HashSet<String>,
    needs_newline: bool,
    file: Option<tokio::fs::File>,
}

impl ResumeLedger {
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        let mut ledger = Self {
            path: path.to_path_buf(),
            done: HashSet::new(),
            needs_newline: false,
            file: None,
        };
        let Some(bytes) = read_if_exists(path).await? else {
            return Ok(ledger);
        };

        let scanned = scan(path, &bytes);
        if let Some(at) = scanned.torn_tail_at {
            let f = tokio::fs::OpenOptions::new()
                .write(true)
                .open(path)
                .await
                .with_context(|| format!("failed to open {} for repair", path.display()))?;
            f.set_len(at)
                .await
                .with_context(|| format!("failed to truncate {}", path.display()))?;
            f.sync_all().await?;
        }
        ledger.done = scanned.ids;
        ledger.needs_newline = scanned.missing_newline && scanned.torn_tail_at.is_none();
        debug!(path = %path.display(), done = ledger.done.len(), "resume ledger loaded");
        Ok(ledger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn already_done(&self) -> &HashSet<String> {
        &self.done
    }

    pub fn contains(&self, id: &str) -> bool {
        self.done.contains(id)
    }

    pub fn len(&self) -> usize {
        self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }

    /// Write one report line and sync it before returning.
    pub async fn append(&mut self, report: &RecordReport) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(report).context("failed to serialize report")?;
        line.push('\n');
        if self.needs_newline {
            line.insert(0, '\n');
        }

        let path = self.path.clone();
        if self.file.is_none() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("failed to create output folder {}", parent.display())
                })?;
            }
            let f = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            self.file = Some(f);
        }
        let file = self
            .file
            .as_mut()
            .context("result file handle missing after open")?;

        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("failed to append to {}", path.display()))?;
        file.flush().await?;
        file.sync_data()
            .await
            .with_context(|| format!("failed to sync {}", path.display()))?;

        self.needs_newline = false;
        self.done.insert(report.id.clone());
        Ok(())
    }
}
