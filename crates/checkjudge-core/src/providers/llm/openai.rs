//! OpenAI-compatible chat completions backend.
//!
//! This is the only place that interprets HTTP status codes; everything above
//! it sees a classified [`JudgeError`].

use super::{LlmClient, LlmResponse};
use crate::config::JudgeConfig;
use crate::errors::{ConfigError, JudgeError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const USER_AGENT_VALUE: &str = concat!("checkjudge/", env!("CARGO_PKG_VERSION"));

/// Lines of `reasoning_content` consulted when `content` is empty.
const REASONING_TAIL_LINES: usize = 5;

pub struct OpenAIClient {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(
        base_url: &str,
        model: String,
        api_key: String,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Self, ConfigError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            model,
            temperature,
            max_tokens,
            api_key,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            client,
        })
    }

    pub fn from_config(cfg: &JudgeConfig) -> Result<Self, ConfigError> {
        Self::new(
            &cfg.base_url,
            cfg.model.clone(),
            cfg.api_key.clone().unwrap_or_default(),
            cfg.temperature,
            cfg.max_tokens,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<LlmResponse, JudgeError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(classify_status(status, resp).await);
        }

        let json: Value = resp.json().await.map_err(|e| JudgeError::InvalidResponse {
            message: format!("failed to decode chat completion: {}", e),
        })?;
        let text = extract_answer(&json)?;
        debug!(model = %self.model, chars = text.len(), "judge responded");

        Ok(LlmResponse {
            text,
            provider: "openai".to_string(),
            model: self.model.clone(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

async fn classify_status(status: StatusCode, resp: reqwest::Response) -> JudgeError {
    let retry_after = resp
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let message = resp
        .text()
        .await
        .unwrap_or_else(|_| status.to_string());
    let code = status.as_u16();

    match code {
        401 | 403 => JudgeError::Unauthorized {
            status: code,
            message,
        },
        408 => JudgeError::Timeout {
            after: Duration::ZERO,
        },
        429 => JudgeError::RateLimited { retry_after },
        400..=499 => JudgeError::BadRequest {
            status: code,
            message,
        },
        _ => JudgeError::Server {
            status: code,
            message,
        },
    }
}

/// `choices[0].message.content`, falling back to the tail of
/// `reasoning_content` when the content is empty. An empty string is a valid
/// (if unhelpful) answer; a body without choices is not.
pub(crate) fn extract_answer(json: &Value) -> Result<String, JudgeError> {
    let message = json
        .pointer("/choices/0/message")
        .ok_or_else(|| JudgeError::InvalidResponse {
            message: "chat completion has no choices".to_string(),
        })?;

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or("");
    if !content.trim().is_empty() {
        return Ok(content.to_string());
    }

    let reasoning = message
        .get("reasoning_content")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim();
    let lines: Vec<&str> = reasoning.lines().collect();
    let tail = &lines[lines.len().saturating_sub(REASONING_TAIL_LINES)..];
    Ok(tail.join("\n"))
}
