//! Core of toolgate: the shared token-bucket admission gate and the
//! execution wrapper every tool invocation passes through.
//!
//! Build one [`RateLimiter`] per process, wrap it in an `Arc`, and hand it to
//! a [`ToolInvoker`]. Optionally attach an idle sweeper with
//! [`spawn_idle_sweeper`] so transient caller identities do not accumulate.

pub mod rate_limit;
pub mod tools;

pub use rate_limit::{
    BucketPolicy, BucketSnapshot, Clock, IdleSweeperHandle, LimiterStats, ManualClock,
    PolicySet, RateDecision, RateLimitError, RateLimiter, SystemClock, spawn_idle_sweeper,
};
pub use tools::{
    CallerIdentity, ErrorCategory, Tool, ToolEnvelope, ToolError, ToolInvoker, limiter_key,
};
