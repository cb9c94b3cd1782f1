use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A single tool adapter guarded by the shared rate limiter.
///
/// The invoker drives the lifecycle; implementations only supply the pieces.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable name used as the first half of the limiter key.
    fn name(&self) -> &str;

    /// Tokens charged against the caller's bucket for this call.
    fn cost(&self, args: &Value) -> f64 {
        let _ = args;
        1.0
    }

    /// Reject malformed arguments before any work happens.
    fn validate(&self, args: &Value) -> Result<(), String> {
        let _ = args;
        Ok(())
    }

    /// Canned output returned when the invoker runs in mock mode.
    fn mock_response(&self, args: &Value) -> Value {
        let _ = args;
        serde_json::json!({ "mock": true, "tool": self.name() })
    }

    async fn process(&self, args: Value) -> Result<Value>;
}
