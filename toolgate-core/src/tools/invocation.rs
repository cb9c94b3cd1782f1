use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::error::{ToolError, ToolErrorPayload};
use super::traits::Tool;
use crate::rate_limit::{RateDecision, RateLimiter};

pub const ANONYMOUS_IDENTITY: &str = "anonymous";

/// Who is calling a tool. Combined with the tool name to form the limiter key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    /// Blank identities collapse to [`ANONYMOUS_IDENTITY`].
    pub fn new(identity: impl Into<String>) -> Self {
        let identity = identity.into();
        let trimmed = identity.trim();
        if trimmed.is_empty() {
            Self::anonymous()
        } else if trimmed.len() == identity.len() {
            Self(identity)
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn anonymous() -> Self {
        Self(ANONYMOUS_IDENTITY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CallerIdentity {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Limiter key for one tool/caller pair: `"{tool}:{identity}"`.
pub fn limiter_key(tool: &str, identity: &CallerIdentity) -> String {
    format!("{tool}:{identity}")
}

/// Uniform result envelope returned by every tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolEnvelope {
    pub success: bool,
    pub tool: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolErrorPayload>,
    #[serde(default)]
    pub mocked: bool,
}

impl ToolEnvelope {
    pub fn ok(tool: impl Into<String>, data: Value, mocked: bool) -> Self {
        Self {
            success: true,
            tool: tool.into(),
            data: Some(data),
            error: None,
            mocked,
        }
    }

    pub fn failure(error: &ToolError) -> Self {
        Self {
            success: false,
            tool: error.tool_name().to_string(),
            data: None,
            error: Some(error.to_payload()),
            mocked: false,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.error
            .as_ref()
            .is_some_and(|error| error.category == super::ErrorCategory::RateLimit)
    }
}

/// Shared execution wrapper: rate check, then validate, then mock or process.
#[derive(Debug, Clone)]
pub struct ToolInvoker {
    limiter: Arc<RateLimiter>,
    mock_mode: bool,
}

impl ToolInvoker {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self {
            limiter,
            mock_mode: false,
        }
    }

    pub fn with_mock_mode(mut self, mock_mode: bool) -> Self {
        self.mock_mode = mock_mode;
        self
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn mock_mode(&self) -> bool {
        self.mock_mode
    }

    /// Run `tool` and wrap the outcome in a [`ToolEnvelope`].
    pub async fn execute(
        &self,
        tool: &dyn Tool,
        identity: &CallerIdentity,
        args: Value,
    ) -> ToolEnvelope {
        match self.run(tool, identity, args).await {
            Ok((data, mocked)) => ToolEnvelope::ok(tool.name(), data, mocked),
            Err(err) => ToolEnvelope::failure(&err),
        }
    }

    /// Run `tool` and return its raw output.
    pub async fn try_execute(
        &self,
        tool: &dyn Tool,
        identity: &CallerIdentity,
        args: Value,
    ) -> Result<Value, ToolError> {
        self.run(tool, identity, args).await.map(|(data, _)| data)
    }

    async fn run(
        &self,
        tool: &dyn Tool,
        identity: &CallerIdentity,
        args: Value,
    ) -> Result<(Value, bool), ToolError> {
        let name = tool.name();
        self.admit(name, identity, tool.cost(&args))?;

        tool.validate(&args)
            .map_err(|message| ToolError::invalid_parameters(name, message))?;

        if self.mock_mode {
            tracing::debug!(tool = %name, identity = %identity, "Returning mock response");
            return Ok((tool.mock_response(&args), true));
        }

        let data = tool
            .process(args)
            .await
            .map_err(|source| ToolError::Execution {
                tool: name.to_string(),
                source,
            })?;
        Ok((data, false))
    }

    fn admit(&self, tool: &str, identity: &CallerIdentity, cost: f64) -> Result<(), ToolError> {
        let key = limiter_key(tool, identity);
        let decision = self
            .limiter
            .check_rate_limit_with_cost(&key, cost)
            .map_err(|source| ToolError::Configuration {
                tool: tool.to_string(),
                source,
            })?;

        match decision {
            RateDecision::Admitted { .. } => Ok(()),
            RateDecision::Denied { retry_after } => {
                tracing::warn!(
                    tool = %tool,
                    identity = %identity,
                    retry_after = ?retry_after,
                    "Tool call rate limited"
                );
                Err(ToolError::RateLimited {
                    tool: tool.to_string(),
                    identity: identity.to_string(),
                    retry_after,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_identity_is_anonymous() {
        assert_eq!(CallerIdentity::new("  "), CallerIdentity::anonymous());
        assert_eq!(CallerIdentity::new(" alice ").as_str(), "alice");
        assert_eq!(CallerIdentity::default().as_str(), ANONYMOUS_IDENTITY);
    }

    #[test]
    fn limiter_key_joins_tool_and_identity() {
        assert_eq!(
            limiter_key("bash_tool", &CallerIdentity::anonymous()),
            "bash_tool:anonymous"
        );
        assert_eq!(
            limiter_key("read_tool", &CallerIdentity::new("user-42")),
            "read_tool:user-42"
        );
    }

    #[test]
    fn envelope_omits_empty_fields() {
        let envelope = ToolEnvelope::ok("think", serde_json::json!({"thought": "ok"}), false);
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "success": true,
                "tool": "think",
                "data": {"thought": "ok"},
                "mocked": false,
            })
        );
    }
}
