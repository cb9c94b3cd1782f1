//! Token-bucket admission control shared by every tool invocation.
//!
//! Each limiter key (by convention `"{tool_name}:{identity}"`) owns one
//! bucket holding at most `capacity` tokens and refilling at
//! `refill_rate` tokens per second. Buckets are created full on first use,
//! refilled lazily whenever they are checked, and dropped by [`RateLimiter::reset`]
//! or by the idle sweep.
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use toolgate_core::rate_limit::{BucketPolicy, ManualClock, PolicySet, RateLimiter};
//!
//! let clock = ManualClock::new();
//! let policies = PolicySet::new(BucketPolicy::new(2.0, 1.0)?);
//! let limiter = RateLimiter::with_clock(policies, Arc::new(clock.clone()));
//!
//! assert!(limiter.check_rate_limit("read_tool:anonymous")?.is_allowed());
//! assert!(limiter.check_rate_limit("read_tool:anonymous")?.is_allowed());
//! assert!(!limiter.check_rate_limit("read_tool:anonymous")?.is_allowed());
//!
//! clock.advance(Duration::from_secs(1));
//! assert!(limiter.check_rate_limit("read_tool:anonymous")?.is_allowed());
//! # Ok::<(), toolgate_core::rate_limit::RateLimitError>(())
//! ```

pub mod bucket;
pub mod clock;
pub mod error;
pub mod limiter;
pub mod policy;
pub mod store;
pub mod sweeper;

pub use bucket::{BucketSnapshot, TokenBucket};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::RateLimitError;
pub use limiter::{LimiterStats, RateDecision, RateLimiter};
pub use policy::{BucketPolicy, PolicySet};
pub use store::BucketStore;
pub use sweeper::{IdleSweeperHandle, spawn_idle_sweeper};
