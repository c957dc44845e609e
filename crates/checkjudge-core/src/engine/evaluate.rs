//! Evaluation of one (record, checklist item) pair.

use super::limiter::ConcurrencyLimiter;
use super::retry::{RetryOutcome, RetryPolicy};
use crate::judge::JudgeClient;
use crate::model::{ChecklistItem, EvaluationOutcome, InputRecord};
use crate::report::progress::{ProgressEvent, ProgressSink};
use tracing::{error, warn};

/// Everything an evaluation needs, shared by all tasks of a run.
#[derive(Clone)]
pub struct EvalContext {
    pub judge: JudgeClient,
    pub limiter: ConcurrencyLimiter,
    pub retry: RetryPolicy,
    pub model_name: String,
    pub progress: Option<ProgressSink>,
}

impl EvalContext {
    pub(crate) fn emit(&self, ev: ProgressEvent) {
        if let Some(sink) = &self.progress {
            sink(ev);
        }
    }

    pub(crate) fn outcome(&self, item: &ChecklistItem, is_met: Option<bool>) -> EvaluationOutcome {
        EvaluationOutcome {
            checklist_title: item.title.clone(),
            is_met,
            model_used: self.model_name.clone(),
        }
    }
}

/// Title used in logs; untitled items are named by position.
pub(crate) fn display_title(item: &ChecklistItem, index: usize) -> String {
    if item.title.trim().is_empty() {
        format!("item_{}", index + 1)
    } else {
        item.title.clone()
    }
}

/// Judge one checklist item. Never fails: anything that prevents a verdict
/// yields `is_met: None` so the rest of the record still completes.
pub async fn evaluate_item(
    record: &InputRecord,
    index: usize,
    item: &ChecklistItem,
    ctx: &EvalContext,
) -> EvaluationOutcome {
    let title = display_title(item, index);
    let is_met = resolve(record, item, &title, ctx).await;
    ctx.emit(ProgressEvent::ItemResolved {
        record_id: record.id.clone(),
        title,
        is_met,
    });
    ctx.outcome(item, is_met)
}

async fn resolve(
    record: &InputRecord,
    item: &ChecklistItem,
    title: &str,
    ctx: &EvalContext,
) -> Option<bool> {
    if item.description.trim().is_empty() {
        warn!(
            record_id = %record.id,
            item = %title,
            "checklist item has no description, skipping judge call"
        );
        return None;
    }

    let permit = match ctx.limiter.acquire().await {
        Ok(p) => p,
        Err(e) => {
            error!(record_id = %record.id, item = %title, error = %e, "concurrency limiter closed");
            return None;
        }
    };

    let label = format!("{}/{}", record.id, title);
    let judge = &ctx.judge;
    let content = record.content.as_str();
    let outcome = ctx
        .retry
        .run(&label, move |timeout| judge.evaluate(content, item, timeout))
        .await;
    permit.release();

    match outcome {
        RetryOutcome::Completed { value, .. } => {
            if value.is_met.is_none() {
                warn!(
                    record_id = %record.id,
                    item = %title,
                    answer = %truncate(&value.answer, 120),
                    "judge answer is neither yes nor no"
                );
            }
            value.is_met
        }
        RetryOutcome::Exhausted { error, attempts } => {
            warn!(
                record_id = %record.id,
                item = %title,
                attempts,
                error = %error,
                "no verdict after exhausting retries"
            );
            None
        }
        RetryOutcome::Rejected { error, .. } => {
            error!(
                record_id = %record.id,
                item = %title,
                kind = error.kind(),
                error = %error,
                "judge rejected the request"
            );
            None
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::JudgeError;
    use crate::providers::llm::{LlmClient, LlmResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct Scripted {
        replies: Mutex<Vec<Result<&'static str, JudgeError>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(replies: Vec<Result<&'static str, JudgeError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmClient for Scripted {
        async fn complete(&self, _s: &str, _p: &str) -> Result<LlmResponse, JudgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.replies.lock().unwrap().remove(0);
            next.map(|text| LlmResponse {
                text: text.to_string(),
                provider: "scripted".into(),
                model: "m".into(),
            })
        }
        fn provider_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn ctx(llm: Arc<dyn LlmClient>, max_retries: u32) -> EvalContext {
        EvalContext {
            judge: JudgeClient::new(llm),
            limiter: ConcurrencyLimiter::new(2),
            retry: RetryPolicy {
                max_retries,
                timeout: Duration::from_secs(1),
                backoff_base: Duration::from_millis(10),
                max_backoff: Duration::from_secs(1),
                jitter: false,
            },
            model_name: "judge-m".into(),
            progress: None,
        }
    }

    fn record() -> InputRecord {
        InputRecord {
            id: "r1".into(),
            content: "some article".into(),
        }
    }

    fn item(title: &str, description: &str) -> ChecklistItem {
        ChecklistItem {
            title: title.into(),
            description: description.into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn maps_verdict_to_outcome() {
        let llm = Scripted::new(vec![Ok("Yes")]);
        let c = ctx(llm, 2);
        let out = evaluate_item(&record(), 0, &item("X", "d"), &c).await;
        assert_eq!(
            out,
            EvaluationOutcome {
                checklist_title: "X".into(),
                is_met: Some(true),
                model_used: "judge-m".into(),
            }
        );
        assert_eq!(c.limiter.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_yields_null_after_one_call() {
        let llm = Scripted::new(vec![Err(JudgeError::BadRequest {
            status: 400,
            message: "unknown model".into(),
        })]);
        let c = ctx(llm.clone(), 5);
        let out = evaluate_item(&record(), 0, &item("X", "d"), &c).await;
        assert_eq!(out.is_met, None);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        assert_eq!(c.limiter.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_yield_null() {
        let transient = || {
            Err(JudgeError::Transport {
                message: "reset".into(),
            })
        };
        let llm = Scripted::new(vec![transient(), transient(), transient()]);
        let c = ctx(llm.clone(), 2);
        let out = evaluate_item(&record(), 0, &item("X", "d"), &c).await;
        assert_eq!(out.is_met, None);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_item_skips_the_judge() {
        let llm = Scripted::new(vec![]);
        let c = ctx(llm.clone(), 2);
        let out = evaluate_item(&record(), 3, &item("", "  "), &c).await;
        assert_eq!(out.is_met, None);
        assert_eq!(out.checklist_title, "");
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn emits_item_event_with_positional_fallback_title() {
        let llm = Scripted::new(vec![Ok("no")]);
        let mut c = ctx(llm, 0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        c.progress = Some(Arc::new(move |ev| sink_seen.lock().unwrap().push(ev)));

        evaluate_item(&record(), 1, &item("", "d"), &c).await;
        let events = seen.lock().unwrap();
        assert_eq!(
            events[0],
            ProgressEvent::ItemResolved {
                record_id: "r1".into(),
                title: "item_2".into(),
                is_met: Some(false),
            }
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé…");
        assert_eq!(truncate("hi", 5), "hi");
    }
}
