//! Run configuration.
//!
//! Values resolve in this order: built-in defaults, an optional YAML file,
//! the judge environment variables, then whatever the CLI overrides.
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `API_KEY` | Bearer token for the judge endpoint |
//! | `MODEL_NAME` | Judge model identifier |
//! | `BASE_URL` | Base URL of the OpenAI-compatible endpoint |

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;
pub const DEFAULT_MAX_BACKOFF_SECS: u64 = 60;
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const FAKE_MODEL_NAME: &str = "fake-judge";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgeProvider {
    #[default]
    OpenAi,
    Fake,
}

impl JudgeProvider {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "fake" => Ok(Self::Fake),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub provider: JudgeProvider,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Answer returned by the fake provider.
    pub fake_verdict: bool,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            provider: JudgeProvider::default(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: String::new(),
            temperature: 0.1,
            max_tokens: 2000,
            fake_verdict: true,
        }
    }
}

impl JudgeConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.merge_env();
        cfg
    }

    /// Overlay `API_KEY`, `MODEL_NAME` and `BASE_URL` when they are set and non-empty.
    pub fn merge_env(&mut self) {
        if let Some(key) = non_empty_env("API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(model) = non_empty_env("MODEL_NAME") {
            self.model = model;
        }
        if let Some(url) = non_empty_env("BASE_URL") {
            self.base_url = url;
        }
    }

    /// Model name recorded in every outcome.
    pub fn model_name(&self) -> String {
        match (self.provider, self.model.is_empty()) {
            (JudgeProvider::Fake, true) => FAKE_MODEL_NAME.to_string(),
            _ => self.model.clone(),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub input_folder: PathBuf,
    pub output_folder: PathBuf,
    pub checklist_file: PathBuf,
    pub max_concurrent_requests: usize,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub max_backoff_secs: u64,
    pub jitter: bool,
    pub output_prefix: String,
    pub judge: JudgeConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_folder: PathBuf::from("./data"),
            output_folder: PathBuf::from("./evaluation_checklist_results"),
            checklist_file: PathBuf::from("./data/checklist.jsonl"),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            max_backoff_secs: DEFAULT_MAX_BACKOFF_SECS,
            jitter: false,
            output_prefix: "eval_".to_string(),
            judge: JudgeConfig::default(),
        }
    }
}

impl RunConfig {
    /// Defaults (or the YAML file when given) with the judge environment applied.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        cfg.judge.merge_env();
        Ok(cfg)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid {
                field: "max_concurrent_requests",
                reason: "must be at least 1".into(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                reason: "must be greater than 0".into(),
            });
        }
        if self.max_backoff_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "max_backoff_secs",
                reason: "must be greater than 0".into(),
            });
        }
        if self.judge.provider == JudgeProvider::OpenAi {
            if self.judge.api_key.as_deref().unwrap_or("").is_empty() {
                return Err(ConfigError::Invalid {
                    field: "judge.api_key",
                    reason: "is required for the openai provider (set API_KEY)".into(),
                });
            }
            if self.judge.model.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "judge.model",
                    reason: "is required for the openai provider (set MODEL_NAME)".into(),
                });
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }

    /// `{output_folder}/{output_prefix}{input file name}`
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.output_folder
            .join(format!("{}{}", self.output_prefix, name))
    }
}
