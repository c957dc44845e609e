//! JSONL loading for checklist and input files.

use crate::errors::DatasetError;
use crate::model::{ChecklistEntry, ChecklistSet, InputRecord};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Candidate content fields, in priority order.
pub const CONTENT_FIELDS: &[&str] = &["article", "prediction"];

/// Placeholder content written by generators when an article failed.
pub const GENERATION_FAILED_MARKERS: &[&str] = &["[生成失败]", "[GENERATION FAILED]"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    InvalidJson(String),
    MissingId,
    MissingContent,
    EmptyContent,
    GenerationFailed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson(e) => write!(f, "invalid JSON: {e}"),
            Self::MissingId => f.write_str("missing id"),
            Self::MissingContent => write!(f, "none of {CONTENT_FIELDS:?} present"),
            Self::EmptyContent => f.write_str("empty content"),
            Self::GenerationFailed => f.write_str("generation failed placeholder"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub line: usize,
    pub id: Option<String>,
    pub reason: SkipReason,
}

#[derive(Debug, Default)]
pub struct LoadedRecords {
    pub records: Vec<InputRecord>,
    pub skipped: Vec<SkippedRecord>,
}

pub async fn load_checklists(path: &Path) -> Result<ChecklistSet, DatasetError> {
    let text = read(path).await?;
    let mut entries = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: ChecklistEntry =
            serde_json::from_str(line).map_err(|source| DatasetError::InvalidChecklist {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })?;
        entries.push(entry);
    }
    Ok(ChecklistSet::from_entries(entries))
}

pub async fn load_records(path: &Path) -> Result<LoadedRecords, DatasetError> {
    let text = read(path).await?;
    Ok(parse_records(&text))
}

/// Lines that cannot be normalized are reported as skipped rather than failing the file.
pub fn parse_records(text: &str) -> LoadedRecords {
    let mut loaded = LoadedRecords::default();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match normalize_line(line) {
            Ok(record) => loaded.records.push(record),
            Err((id, reason)) => loaded.skipped.push(SkippedRecord {
                line: idx + 1,
                id,
                reason,
            }),
        }
    }
    loaded
}

fn normalize_line(line: &str) -> Result<InputRecord, (Option<String>, SkipReason)> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| (None, SkipReason::InvalidJson(e.to_string())))?;
    let id = match value.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err((None, SkipReason::MissingId)),
    };
    let content = CONTENT_FIELDS
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .ok_or_else(|| (Some(id.clone()), SkipReason::MissingContent))?;

    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err((Some(id), SkipReason::EmptyContent));
    }
    if GENERATION_FAILED_MARKERS.contains(&trimmed) {
        return Err((Some(id), SkipReason::GenerationFailed));
    }
    Ok(InputRecord {
        id,
        content: content.to_string(),
    })
}

async fn read(path: &Path) -> Result<String, DatasetError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_wins_over_prediction() {
        let loaded = parse_records(r#"{"id":"a","article":"from article","prediction":"p"}"#);
        assert_eq!(loaded.records[0].content, "from article");
    }

    #[test]
    fn null_article_falls_back_to_prediction() {
        let loaded = parse_records(r#"{"id":"a","article":null,"prediction":"p"}"#);
        assert_eq!(loaded.records[0].content, "p");
    }

    #[test]
    fn records_without_content_are_skipped_not_fatal() {
        let text = [
            r#"{"id":"ok","article":"text"}"#,
            r#"{"id":"none"}"#,
            r#"{"id":"blank","article":"   "}"#,
            r#"{"id":"failed","prediction":"[生成失败]"}"#,
            r#"{"article":"no id"}"#,
            r#"{"id":"trunc","art"#,
            "",
        ]
        .join("\n");
        let loaded = parse_records(&text);
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].id, "ok");

        let reasons: Vec<_> = loaded.skipped.iter().map(|s| &s.reason).collect();
        assert_eq!(reasons[0], &SkipReason::MissingContent);
        assert_eq!(reasons[1], &SkipReason::EmptyContent);
        assert_eq!(reasons[2], &SkipReason::GenerationFailed);
        assert_eq!(reasons[3], &SkipReason::MissingId);
        assert!(matches!(reasons[4], SkipReason::InvalidJson(_)));
        assert_eq!(loaded.skipped[0].line, 2);
        assert_eq!(loaded.skipped[0].id.as_deref(), Some("none"));
    }

    #[test]
    fn numeric_ids_are_normalized() {
        let loaded = parse_records(r#"{"id":7,"article":"x"}"#);
        assert_eq!(loaded.records[0].id, "7");
    }

    #[tokio::test]
    async fn checklist_file_with_bad_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checklist.jsonl");
        std::fs::write(
            &path,
            "{\"id\":\"a\",\"topic\":\"T\",\"checklist\":[{\"title\":\"X\",\"description\":\"d\"}]}\nnot json\n",
        )
        .unwrap();
        let err = load_checklists(&path).await.unwrap_err();
        assert!(matches!(err, DatasetError::InvalidChecklist { line: 2, .. }));
    }

    #[tokio::test]
    async fn checklist_file_loads_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checklist.jsonl");
        std::fs::write(
            &path,
            "{\"id\":\"a\",\"topic\":\"T\",\"checklist\":[{\"title\":\"X\",\"description\":\"d\"}]}\n\n",
        )
        .unwrap();
        let set = load_checklists(&path).await.unwrap();
        let entry = set.get("a").unwrap();
        assert_eq!(entry.topic, "T");
        assert_eq!(entry.checklist.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let err = load_records(Path::new("/definitely/not/here.jsonl"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::Read { .. }));
    }
}
