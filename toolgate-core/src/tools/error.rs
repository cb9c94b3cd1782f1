use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;

use super::error_category::{ErrorCategory, Retryability};
use crate::rate_limit::RateLimitError;

/// Failure of a single tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("rate limit exceeded for '{tool}', {}", retry_hint(.retry_after))]
    RateLimited {
        tool: String,
        identity: String,
        retry_after: Option<Duration>,
    },

    #[error("invalid parameters for '{tool}': {message}")]
    InvalidParameters { tool: String, message: String },

    #[error("rate limit configuration rejects calls to '{tool}': {source}")]
    Configuration {
        tool: String,
        #[source]
        source: RateLimitError,
    },

    #[error("tool '{tool}' failed: {source:#}")]
    Execution {
        tool: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Rounded up to the next tenth so a caller honouring the hint is not denied again.
fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(wait) => {
            let tenths = wait.as_nanos().div_ceil(100_000_000);
            format!("retry after {}.{}s", tenths / 10, tenths % 10)
        }
        None => "no automatic recovery until the limiter is reset".to_string(),
    }
}

impl ToolError {
    pub fn invalid_parameters(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::InvalidParameters { .. } => ErrorCategory::InvalidParameters,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Execution { .. } => ErrorCategory::ExecutionError,
        }
    }

    pub fn tool_name(&self) -> &str {
        match self {
            Self::RateLimited { tool, .. }
            | Self::InvalidParameters { tool, .. }
            | Self::Configuration { tool, .. }
            | Self::Execution { tool, .. } => tool,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Advisory wait carried by a rate-limit denial.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn retryability(&self) -> Retryability {
        self.category().retryability(self.retry_after())
    }

    pub fn to_payload(&self) -> ToolErrorPayload {
        let category = self.category();
        ToolErrorPayload {
            tool_name: self.tool_name().to_string(),
            category,
            message: self.to_string(),
            is_retryable: matches!(self.retryability(), Retryability::Retryable { .. }),
            retry_after_secs: self.retry_after().map(|wait| wait.as_secs_f64()),
            recovery_suggestions: category.recovery_suggestions(),
        }
    }
}

/// Serializable error block placed in a [`super::ToolEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolErrorPayload {
    pub tool_name: String,
    pub category: ErrorCategory,
    pub message: String,
    pub is_retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<f64>,
    #[serde(default)]
    pub recovery_suggestions: Vec<Cow<'static, str>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_message_includes_retry_hint() {
        let err = ToolError::RateLimited {
            tool: "bash_tool".to_string(),
            identity: "anonymous".to_string(),
            retry_after: Some(Duration::from_millis(2500)),
        };
        assert_eq!(
            err.to_string(),
            "rate limit exceeded for 'bash_tool', retry after 2.5s"
        );
        assert_eq!(err.category(), ErrorCategory::RateLimit);
    }

    #[test]
    fn retry_hint_never_rounds_below_the_real_wait() {
        let hint = |millis| {
            ToolError::RateLimited {
                tool: "read_tool".to_string(),
                identity: "anonymous".to_string(),
                retry_after: Some(Duration::from_millis(millis)),
            }
            .to_string()
        };
        assert_eq!(hint(40), "rate limit exceeded for 'read_tool', retry after 0.1s");
        assert_eq!(hint(2_010), "rate limit exceeded for 'read_tool', retry after 2.1s");
        assert_eq!(hint(3_000), "rate limit exceeded for 'read_tool', retry after 3.0s");
    }

    #[test]
    fn rate_limited_without_refill_says_so() {
        let err = ToolError::RateLimited {
            tool: "think".to_string(),
            identity: "anonymous".to_string(),
            retry_after: None,
        };
        assert!(err.to_string().contains("no automatic recovery"));
        assert_eq!(err.retry_after(), None);
        assert_eq!(err.retryability(), Retryability::RequiresIntervention);
        assert!(!err.to_payload().is_retryable);
    }

    #[test]
    fn payload_marks_only_rate_limits_retryable() {
        let limited = ToolError::RateLimited {
            tool: "read_tool".to_string(),
            identity: "anonymous".to_string(),
            retry_after: Some(Duration::from_secs(1)),
        }
        .to_payload();
        assert!(limited.is_retryable);
        assert_eq!(limited.retry_after_secs, Some(1.0));

        let invalid = ToolError::invalid_parameters("read_tool", "missing path").to_payload();
        assert!(!invalid.is_retryable);
        assert_eq!(invalid.category, ErrorCategory::InvalidParameters);
        assert_eq!(invalid.retry_after_secs, None);
    }

    #[test]
    fn execution_error_keeps_context_chain() {
        let source = anyhow::anyhow!("connection refused").context("calling sheets api");
        let err = ToolError::Execution {
            tool: "sheets_tool".to_string(),
            source,
        };
        assert_eq!(
            err.to_string(),
            "tool 'sheets_tool' failed: calling sheets api: connection refused"
        );
    }
}
