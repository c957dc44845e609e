//! Text-generation backends used by the judge.

use crate::errors::JudgeError;
use async_trait::async_trait;

pub mod fake;
pub mod openai;

/// Raw text returned by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
}

/// One request/response round trip. Implementations keep no state between calls
/// and leave deadlines to the caller.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<LlmResponse, JudgeError>;

    fn provider_name(&self) -> &'static str;
}
