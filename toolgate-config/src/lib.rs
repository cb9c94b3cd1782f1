//! Configuration components for toolgate.
//!
//! Settings are read from a TOML file (`toolgate.toml` by default), merged
//! with a small set of environment overrides, and validated before any
//! limiter is built from them. Library crates only see the typed structs;
//! file discovery and environment handling live in [`ConfigManager`].

pub mod debug;
pub mod loader;
pub mod rate_limit;

pub use debug::{DebugConfig, TraceLevel};
pub use loader::{ConfigManager, ToolgateConfig};
pub use rate_limit::{PolicyOverride, RateLimitConfig};

/// Default configuration file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "toolgate.toml";

/// Environment variables recognised by [`ConfigManager`].
pub mod env {
    /// Explicit path to a configuration file.
    pub const CONFIG_PATH: &str = "TOOLGATE_CONFIG_PATH";
    /// Overrides `rate_limit.capacity`.
    pub const RATE_CAPACITY: &str = "TOOLGATE_RATE_CAPACITY";
    /// Overrides `rate_limit.refill_per_second`.
    pub const RATE_REFILL_PER_SECOND: &str = "TOOLGATE_RATE_REFILL_PER_SECOND";
}
