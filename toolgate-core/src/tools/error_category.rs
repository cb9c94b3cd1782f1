//! Error categorization used to route tool failures.
//!
//! Errors are divided into **retryable** (transient) and **non-retryable**
//! (permanent) categories. Rate limiting is its own category so callers can
//! back off instead of treating it like an upstream failure.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

/// Canonical category for a failed tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    // === Retryable (Transient) ===
    /// Admission denied by the shared rate limiter
    RateLimit,

    // === Non-Retryable (Permanent) ===
    /// Invalid parameters or schema validation failure
    InvalidParameters,
    /// Limiter configuration can never admit the request
    Configuration,
    /// General execution error (catch-all for unclassified failures)
    ExecutionError,
}

/// Describes whether and how an error can be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retryability {
    /// Error is transient; retry after the given delay.
    Retryable { after: Duration },
    /// Error is permanent and should NOT be retried.
    NonRetryable,
    /// Error requires human intervention (for example a manual limiter reset).
    RequiresIntervention,
}

impl ErrorCategory {
    /// Whether this error category is safe to retry.
    #[inline]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::RateLimit)
    }

    /// Retry guidance, using the limiter's hint when one is available.
    pub fn retryability(&self, retry_after: Option<Duration>) -> Retryability {
        match (self, retry_after) {
            (ErrorCategory::RateLimit, Some(wait)) => Retryability::Retryable { after: wait },
            // No refill configured: waiting alone will never help.
            (ErrorCategory::RateLimit, None) => Retryability::RequiresIntervention,
            (
                ErrorCategory::InvalidParameters
                | ErrorCategory::Configuration
                | ErrorCategory::ExecutionError,
                _,
            ) => Retryability::NonRetryable,
        }
    }

    /// Short, user-facing label.
    pub const fn user_label(&self) -> &'static str {
        match self {
            ErrorCategory::RateLimit => "Rate limit exceeded",
            ErrorCategory::InvalidParameters => "Invalid parameters",
            ErrorCategory::Configuration => "Rate limit misconfigured",
            ErrorCategory::ExecutionError => "Execution error",
        }
    }

    /// Suggested next steps shown alongside the error.
    pub fn recovery_suggestions(&self) -> Vec<Cow<'static, str>> {
        match self {
            ErrorCategory::RateLimit => vec![
                Cow::Borrowed("Wait for the retry-after interval before calling the tool again"),
                Cow::Borrowed("Batch work into fewer tool calls"),
            ],
            ErrorCategory::InvalidParameters => vec![Cow::Borrowed(
                "Check the tool's required parameters and their types",
            )],
            ErrorCategory::Configuration => vec![Cow::Borrowed(
                "Lower the request cost or raise the bucket capacity for this tool",
            )],
            ErrorCategory::ExecutionError => {
                vec![Cow::Borrowed("Inspect the underlying error before retrying")]
            }
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_label())
    }
}
