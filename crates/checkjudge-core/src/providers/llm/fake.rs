use super::{LlmClient, LlmResponse};
use crate::errors::JudgeError;
use async_trait::async_trait;

/// Offline backend that always answers the same verdict.
#[derive(Debug, Clone)]
pub struct FakeClient {
    pub model: String,
    pub verdict: bool,
}

impl FakeClient {
    pub fn new(model: impl Into<String>, verdict: bool) -> Self {
        Self {
            model: model.into(),
            verdict,
        }
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<LlmResponse, JudgeError> {
        Ok(LlmResponse {
            text: if self.verdict { "Yes" } else { "No" }.to_string(),
            provider: "fake".to_string(),
            model: self.model.clone(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
