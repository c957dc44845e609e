//! Error types for the judge client, configuration and dataset loading.

use std::path::PathBuf;
use std::time::Duration;

/// Failures of a single remote judge call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JudgeError {
    /// The call did not complete within its deadline.
    #[error("judge call timed out after {after:?}")]
    Timeout { after: Duration },

    /// Connection refused/reset, DNS failure and similar.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// 5xx from the judge endpoint.
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// 429 from the judge endpoint.
    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Credentials rejected (401/403).
    #[error("unauthorized (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Request rejected as malformed (4xx other than 401/403/408/429).
    #[error("bad request (HTTP {status}): {message}")]
    BadRequest { status: u16, message: String },

    /// A 2xx response whose body could not be decoded.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
}

impl JudgeError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::Transport { .. }
                | Self::Server { .. }
                | Self::RateLimited { .. }
                | Self::InvalidResponse { .. }
        )
    }

    /// Delay suggested by the server, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Short stable label for logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Transport { .. } => "transport",
            Self::Server { .. } => "server",
            Self::RateLimited { .. } => "rate_limited",
            Self::Unauthorized { .. } => "unauthorized",
            Self::BadRequest { .. } => "bad_request",
            Self::InvalidResponse { .. } => "invalid_response",
        }
    }
}

impl From<reqwest::Error> for JudgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout {
                after: Duration::ZERO,
            };
        }
        if err.is_decode() {
            return Self::InvalidResponse {
                message: err.to_string(),
            };
        }
        Self::Transport {
            message: err.to_string(),
        }
    }
}

/// Invalid or unreadable run configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {field} {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("unknown judge provider '{0}' (expected openai or fake)")]
    UnknownProvider(String),

    #[error("failed to create HTTP client: {0}")]
    HttpClient(String),
}

/// Checklist or input files that cannot be loaded at all.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: invalid checklist entry: {source}")]
    InvalidChecklist {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_and_permanent_classification() {
        let transient = [
            JudgeError::Timeout {
                after: Duration::from_secs(1),
            },
            JudgeError::Transport {
                message: "reset".into(),
            },
            JudgeError::Server {
                status: 503,
                message: "unavailable".into(),
            },
            JudgeError::RateLimited { retry_after: None },
            JudgeError::InvalidResponse {
                message: "eof".into(),
            },
        ];
        for e in &transient {
            assert!(e.is_retryable(), "{e} should be retryable");
        }

        let permanent = [
            JudgeError::Unauthorized {
                status: 401,
                message: "bad key".into(),
            },
            JudgeError::BadRequest {
                status: 400,
                message: "bad model".into(),
            },
        ];
        for e in &permanent {
            assert!(!e.is_retryable(), "{e} should not be retryable");
        }
    }

    #[test]
    fn retry_after_only_for_rate_limit() {
        let rl = JudgeError::RateLimited {
            retry_after: Some(Duration::from_secs(7)),
        };
        assert_eq!(rl.retry_after(), Some(Duration::from_secs(7)));
        let server = JudgeError::Server {
            status: 500,
            message: String::new(),
        };
        assert_eq!(server.retry_after(), None);
    }
}
