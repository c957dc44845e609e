//! Progress events emitted while a run is in flight. The console layer
//! consumes them through a sink; the engine itself never prints.

use crate::model::FileStats;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    FileStarted {
        file: String,
        loaded: usize,
        pending: usize,
        resumed: usize,
        skipped: usize,
    },
    RecordSkipped {
        file: String,
        id: Option<String>,
        reason: String,
    },
    ItemResolved {
        record_id: String,
        title: String,
        is_met: Option<bool>,
    },
    RecordCompleted {
        record_id: String,
        met: usize,
        total: usize,
    },
    FileCompleted {
        file: String,
        stats: FileStats,
    },
    FileFailed {
        file: String,
        error: String,
    },
}

/// Called from worker tasks; implementations must be cheap and thread-safe.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;
