//! Dispatch of judge calls: admission, retries, per-item evaluation and
//! per-file orchestration.

pub mod evaluate;
pub mod limiter;
pub mod orchestrator;
pub mod retry;

pub use evaluate::{evaluate_item, EvalContext};
pub use limiter::{ConcurrencyLimiter, LimiterPermit};
pub use orchestrator::{FileReport, Orchestrator};
pub use retry::{RetryOutcome, RetryPolicy};
