use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// One criterion of a checklist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// One line of the checklist file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistEntry {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
}

/// Checklists keyed by record id. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct ChecklistSet {
    entries: HashMap<String, Arc<ChecklistEntry>>,
}

impl ChecklistSet {
    /// Builds the set; on duplicate ids the first entry wins.
    pub fn from_entries(entries: impl IntoIterator<Item = ChecklistEntry>) -> Self {
        let mut map = HashMap::new();
        for entry in entries {
            if map.contains_key(&entry.id) {
                tracing::warn!(id = %entry.id, "duplicate checklist id, keeping first entry");
                continue;
            }
            map.insert(entry.id.clone(), Arc::new(entry));
        }
        Self { entries: map }
    }

    pub fn get(&self, id: &str) -> Option<Arc<ChecklistEntry>> {
        self.entries.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A normalized input record: the content field has already been resolved
/// from whichever candidate field was present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    pub id: String,
    pub content: String,
}

/// Verdict for one checklist item of one record.
///
/// `is_met: None` means no verdict could be obtained, which is distinct from
/// `Some(false)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub checklist_title: String,
    pub is_met: Option<bool>,
    pub model_used: String,
}

/// One output line. Written once, never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordReport {
    pub id: String,
    pub topic: String,
    pub checklist_evaluations: Vec<EvaluationOutcome>,
    pub model_used: String,
}

impl RecordReport {
    pub fn met(&self) -> usize {
        self.checklist_evaluations
            .iter()
            .filter(|o| o.is_met == Some(true))
            .count()
    }

    pub fn not_met(&self) -> usize {
        self.checklist_evaluations
            .iter()
            .filter(|o| o.is_met == Some(false))
            .count()
    }

    pub fn unresolved(&self) -> usize {
        self.checklist_evaluations
            .iter()
            .filter(|o| o.is_met.is_none())
            .count()
    }
}

/// Counters for a single input file, returned by the orchestrator and merged
/// into [`RunStatistics`] by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileStats {
    pub records_evaluated: usize,
    pub records_skipped: usize,
    pub records_resumed: usize,
    pub checks_succeeded: usize,
    pub checks_failed: usize,
    pub checks_unresolved: usize,
    pub checks_total: usize,
    pub elapsed: Duration,
}

impl FileStats {
    pub fn add_report(&mut self, report: &RecordReport) {
        self.records_evaluated += 1;
        self.checks_succeeded += report.met();
        self.checks_failed += report.not_met();
        self.checks_unresolved += report.unresolved();
        self.checks_total += report.checklist_evaluations.len();
    }
}

/// Run-wide aggregate, printed at the end of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    pub files_processed: usize,
    pub files_failed: usize,
    pub records_evaluated: usize,
    pub records_skipped: usize,
    pub records_resumed: usize,
    pub checks_succeeded: usize,
    pub checks_failed: usize,
    pub checks_unresolved: usize,
    pub checks_total: usize,
    pub elapsed: Duration,
}

impl RunStatistics {
    pub fn merge_file(&mut self, file: &FileStats) {
        self.files_processed += 1;
        self.records_evaluated += file.records_evaluated;
        self.records_skipped += file.records_skipped;
        self.records_resumed += file.records_resumed;
        self.checks_succeeded += file.checks_succeeded;
        self.checks_failed += file.checks_failed;
        self.checks_unresolved += file.checks_unresolved;
        self.checks_total += file.checks_total;
    }

    pub fn record_file_failure(&mut self) {
        self.files_failed += 1;
    }

    /// Percentage of checks with a positive verdict; `None` when nothing was checked.
    pub fn pass_rate(&self) -> Option<f64> {
        if self.checks_total == 0 {
            return None;
        }
        Some(self.checks_succeeded as f64 / self.checks_total as f64 * 100.0)
    }

    pub fn avg_secs_per_check(&self) -> Option<f64> {
        if self.checks_total == 0 {
            return None;
        }
        Some(self.elapsed.as_secs_f64() / self.checks_total as f64)
    }
}

/// Record ids appear both as strings and as bare numbers in the wild.
pub(crate) fn id_from_string_or_number<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "id must be a string or number, got: {other}"
        ))),
    }
}
