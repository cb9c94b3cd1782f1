use thiserror::Error;

/// Configuration errors raised by the admission gate.
///
/// Ordinary denials are not errors; see [`super::RateDecision`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateLimitError {
    #[error("bucket capacity must be a positive number (got {capacity})")]
    InvalidCapacity { capacity: f64 },

    #[error(
        "refill rate must be a positive number of tokens per second (got {refill_rate}); use a fixed allowance for zero"
    )]
    InvalidRefillRate { refill_rate: f64 },

    #[error("request cost must be a positive number (got {cost})")]
    InvalidCost { cost: f64 },

    #[error(
        "request cost {cost} for '{key}' exceeds bucket capacity {capacity} and can never be admitted"
    )]
    CostExceedsCapacity { key: String, cost: f64, capacity: f64 },

    #[error("seeded state for '{key}' is invalid: {reason}")]
    InvalidSeed { key: String, reason: &'static str },

    #[error("idle sweep interval must be greater than zero")]
    InvalidSweepInterval,
}
