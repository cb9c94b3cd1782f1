//! Call-site integration: every tool passes the shared limiter before running.

pub mod error;
pub mod error_category;
pub mod invocation;
pub mod traits;

pub use error::{ToolError, ToolErrorPayload};
pub use error_category::{ErrorCategory, Retryability};
pub use invocation::{ANONYMOUS_IDENTITY, CallerIdentity, ToolEnvelope, ToolInvoker, limiter_key};
pub use traits::Tool;
