//! Remote judge: one checklist criterion against one text, one round trip.

use crate::config::{JudgeConfig, JudgeProvider};
use crate::errors::{ConfigError, JudgeError};
use crate::model::ChecklistItem;
use crate::providers::llm::fake::FakeClient;
use crate::providers::llm::openai::OpenAIClient;
use crate::providers::llm::LlmClient;
use std::sync::Arc;
use std::time::Duration;

mod prompt;
pub mod verdict;

pub use verdict::parse_verdict;

/// Parsed judge answer. `is_met` is `None` when the text did not map to yes/no.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawVerdict {
    pub is_met: Option<bool>,
    pub answer: String,
}

#[derive(Clone)]
pub struct JudgeClient {
    llm: Arc<dyn LlmClient>,
}

impl JudgeClient {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub fn from_config(cfg: &JudgeConfig) -> Result<Self, ConfigError> {
        let llm: Arc<dyn LlmClient> = match cfg.provider {
            JudgeProvider::OpenAi => Arc::new(OpenAIClient::from_config(cfg)?),
            JudgeProvider::Fake => Arc::new(FakeClient::new(cfg.model_name(), cfg.fake_verdict)),
        };
        Ok(Self::new(llm))
    }

    pub fn provider_name(&self) -> &'static str {
        self.llm.provider_name()
    }

    /// Ask whether `content` meets `item`, giving up after `timeout`.
    pub async fn evaluate(
        &self,
        content: &str,
        item: &ChecklistItem,
        timeout: Duration,
    ) -> Result<RawVerdict, JudgeError> {
        let user_prompt = prompt::build_prompt(&item.description, content);
        let call = self.llm.complete(prompt::SYSTEM_PROMPT, &user_prompt);

        let resp = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(JudgeError::Timeout { .. })) | Err(_) => {
                return Err(JudgeError::Timeout { after: timeout })
            }
            Ok(Err(e)) => return Err(e),
        };

        Ok(RawVerdict {
            is_met: parse_verdict(&resp.text),
            answer: resp.text,
        })
    }
}
