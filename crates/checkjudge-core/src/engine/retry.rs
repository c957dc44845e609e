//! Bounded retries with exponential backoff around a single judge call.

use crate::config::RunConfig;
use crate::errors::JudgeError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    /// Deadline handed to every attempt.
    pub timeout: Duration,
    pub backoff_base: Duration,
    pub max_backoff: Duration,
    /// Scale each delay by a random factor in [0.9, 1.1].
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: crate::config::DEFAULT_MAX_RETRIES,
            timeout: Duration::from_secs(crate::config::DEFAULT_REQUEST_TIMEOUT_SECS),
            backoff_base: Duration::from_millis(crate::config::DEFAULT_BACKOFF_BASE_MS),
            max_backoff: Duration::from_secs(crate::config::DEFAULT_MAX_BACKOFF_SECS),
            jitter: false,
        }
    }
}

/// How a retried call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome<T> {
    Completed { value: T, attempts: u32 },
    /// Every attempt failed with a transient error.
    Exhausted { error: JudgeError, attempts: u32 },
    /// A permanent error; no further attempts were made.
    Rejected { error: JudgeError, attempts: u32 },
}

impl<T> RetryOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Completed { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Rejected { attempts, .. } => *attempts,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Completed { value, .. } => Some(value),
            _ => None,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &RunConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            timeout: cfg.request_timeout(),
            backoff_base: cfg.backoff_base(),
            max_backoff: cfg.max_backoff(),
            jitter: cfg.jitter,
        }
    }

    /// `backoff_base * 2^(attempt-1)`, capped at `max_backoff`. `attempt` starts at 1.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1);
        let factor = 1u32.checked_shl(exp).unwrap_or(u32::MAX);
        self.backoff_base.saturating_mul(factor).min(self.max_backoff)
    }

    fn delay_after(&self, attempt: u32, err: &JudgeError) -> Duration {
        let base = match err.retry_after() {
            Some(hint) => hint.min(self.max_backoff),
            None => self.backoff_for(attempt),
        };
        if !self.jitter || base.is_zero() {
            return base;
        }
        use rand::Rng;
        let factor: f64 = rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
        base.mul_f64(factor).min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails permanently, or the retry budget is spent.
    ///
    /// `op` receives the per-attempt deadline. Never returns an error directly;
    /// failures are reported through [`RetryOutcome`].
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> RetryOutcome<T>
    where
        F: FnMut(Duration) -> Fut,
        Fut: Future<Output = Result<T, JudgeError>>,
    {
        let mut attempt: u32 = 1;
        loop {
            match op(self.timeout).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(call = label, attempt, "judge call succeeded after retry");
                    }
                    return RetryOutcome::Completed {
                        value,
                        attempts: attempt,
                    };
                }
                Err(e) if !e.is_retryable() => {
                    error!(
                        call = label,
                        attempt,
                        kind = e.kind(),
                        error = %e,
                        "judge call failed permanently, not retrying"
                    );
                    return RetryOutcome::Rejected {
                        error: e,
                        attempts: attempt,
                    };
                }
                Err(e) if attempt > self.max_retries => {
                    warn!(
                        call = label,
                        attempts = attempt,
                        kind = e.kind(),
                        error = %e,
                        "judge call retries exhausted"
                    );
                    return RetryOutcome::Exhausted {
                        error: e,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    let backoff = self.delay_after(attempt, &e);
                    if e.is_timeout() {
                        warn!(
                            call = label,
                            attempt,
                            max_attempts = self.max_retries + 1,
                            timeout_ms = self.timeout.as_millis() as u64,
                            backoff_ms = backoff.as_millis() as u64,
                            "judge call timed out, retrying"
                        );
                    } else {
                        warn!(
                            call = label,
                            attempt,
                            max_attempts = self.max_retries + 1,
                            kind = e.kind(),
                            error = %e,
                            backoff_ms = backoff.as_millis() as u64,
                            "judge call failed, retrying"
                        );
                    }
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}
