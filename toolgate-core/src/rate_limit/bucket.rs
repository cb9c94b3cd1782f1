use serde::Serialize;
use std::time::Duration;

use super::error::RateLimitError;
use super::policy::BucketPolicy;

/// Point-in-time copy of a bucket's fields, used for inspection and seeding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketSnapshot {
    pub capacity: f64,
    /// Tokens restored per second.
    pub refill_rate: f64,
    pub tokens: f64,
    /// Clock reading of the last refill computation.
    pub last_update: Duration,
}

impl BucketSnapshot {
    /// A full bucket for `policy` stamped at `now`.
    pub fn full(policy: BucketPolicy, now: Duration) -> Self {
        Self {
            capacity: policy.capacity(),
            refill_rate: policy.refill_rate(),
            tokens: policy.capacity(),
            last_update: now,
        }
    }

    /// Same policy, but holding exactly `tokens`.
    pub fn with_tokens(mut self, tokens: f64) -> Self {
        self.tokens = tokens;
        self
    }

    pub(crate) fn validate(&self, key: &str) -> Result<(), RateLimitError> {
        let reason = if !self.capacity.is_finite() || self.capacity <= 0.0 {
            "capacity must be a positive number"
        } else if !self.refill_rate.is_finite() || self.refill_rate < 0.0 {
            "refill_rate must be zero or positive"
        } else if !self.tokens.is_finite() || self.tokens < 0.0 || self.tokens > self.capacity {
            "tokens must lie between 0 and capacity"
        } else {
            return Ok(());
        };
        Err(RateLimitError::InvalidSeed {
            key: key.to_string(),
            reason,
        })
    }
}

/// Token-bucket state for a single key.
///
/// The bucket has no locking of its own; callers serialize access (see
/// [`super::store::BucketStore`]). `tokens` only changes through
/// [`TokenBucket::try_consume`], which refills before it consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenBucket {
    capacity: f64,
    refill_rate: f64,
    tokens: f64,
    last_update: Duration,
}

impl TokenBucket {
    /// A full bucket created at `now`.
    pub fn new(policy: BucketPolicy, now: Duration) -> Self {
        Self::from_snapshot(BucketSnapshot::full(policy, now))
    }

    pub fn from_snapshot(snapshot: BucketSnapshot) -> Self {
        Self {
            capacity: snapshot.capacity,
            refill_rate: snapshot.refill_rate,
            tokens: snapshot.tokens,
            last_update: snapshot.last_update,
        }
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn last_update(&self) -> Duration {
        self.last_update
    }

    pub fn snapshot(&self) -> BucketSnapshot {
        BucketSnapshot {
            capacity: self.capacity,
            refill_rate: self.refill_rate,
            tokens: self.tokens,
            last_update: self.last_update,
        }
    }

    /// Credit tokens for the time elapsed since the last update.
    ///
    /// `last_update` only moves forward: it becomes `now` when `now` is later
    /// and is otherwise left unchanged, rather than being overwritten with
    /// every reading. A reading earlier than the stamp therefore counts as zero
    /// elapsed time, and the interval it skipped is never credited twice.
    pub fn refill(&mut self, now: Duration) {
        let elapsed = now.saturating_sub(self.last_update).as_secs_f64();
        if elapsed > 0.0 && self.refill_rate > 0.0 {
            self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        }
        self.last_update = self.last_update.max(now);
    }

    /// Refill, then take `cost` tokens if they are available.
    ///
    /// On denial the token count is left as refilled. A `cost` above
    /// `capacity` can never be admitted, however long the caller waits;
    /// [`RateLimiter`](super::RateLimiter) rejects such requests up front with
    /// [`RateLimitError::CostExceedsCapacity`] instead of reporting a denial.
    pub fn try_consume(&mut self, now: Duration, cost: f64) -> bool {
        self.refill(now);
        if self.tokens >= cost {
            self.tokens = (self.tokens - cost).max(0.0);
            true
        } else {
            false
        }
    }

    /// Time until `cost` tokens will be available, or `None` when the bucket
    /// never refills.
    pub fn retry_after(&self, cost: f64) -> Option<Duration> {
        if self.refill_rate <= 0.0 {
            return None;
        }
        let wait = ((cost - self.tokens) / self.refill_rate).max(0.0);
        Some(Duration::try_from_secs_f64(wait).unwrap_or(Duration::MAX))
    }

    /// Whether the bucket has been untouched for longer than `ttl`.
    pub fn is_idle(&self, now: Duration, ttl: Duration) -> bool {
        now.saturating_sub(self.last_update) > ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    fn bucket(capacity: f64, refill_rate: f64, tokens: f64) -> TokenBucket {
        TokenBucket::from_snapshot(BucketSnapshot {
            capacity,
            refill_rate,
            tokens,
            last_update: Duration::ZERO,
        })
    }

    #[test]
    fn admitted_calls_never_exceed_initial_tokens() {
        let mut bucket = bucket(60.0, 1.0 / 60.0, 60.0);
        let admitted = (0..100)
            .filter(|_| bucket.try_consume(Duration::ZERO, 1.0))
            .count();
        assert_eq!(admitted, 60);
        assert_eq!(bucket.tokens(), 0.0);
    }

    #[test]
    fn refill_is_capped_and_monotonic() {
        let mut bucket = bucket(10.0, 2.0, 0.0);
        let mut previous = bucket.tokens();
        for step in 1..=10u32 {
            bucket.refill(SECOND * step);
            assert!(bucket.tokens() >= previous);
            assert!(bucket.tokens() <= bucket.capacity());
            previous = bucket.tokens();
        }
        assert_eq!(bucket.tokens(), 10.0);
    }

    #[test]
    fn denial_leaves_tokens_unchanged() {
        let mut bucket = bucket(10.0, 5.0, 0.5);
        assert!(!bucket.try_consume(Duration::ZERO, 1.0));
        assert_eq!(bucket.tokens(), 0.5);
    }

    #[test]
    fn stale_timestamp_counts_as_zero_elapsed() {
        let mut bucket = TokenBucket::from_snapshot(BucketSnapshot {
            capacity: 10.0,
            refill_rate: 1.0,
            tokens: 2.0,
            last_update: SECOND * 10,
        });

        assert!(bucket.try_consume(SECOND * 5, 1.0));
        assert_eq!(bucket.tokens(), 1.0);
        assert_eq!(bucket.last_update(), SECOND * 10);

        // Only the time after the original stamp is credited.
        bucket.refill(SECOND * 11);
        assert_eq!(bucket.tokens(), 2.0);
        assert_eq!(bucket.last_update(), SECOND * 11);
    }

    #[test]
    fn zero_refill_is_a_one_shot_allowance() {
        let mut bucket = bucket(2.0, 0.0, 2.0);
        assert!(bucket.try_consume(Duration::ZERO, 1.0));
        assert!(bucket.try_consume(SECOND, 1.0));
        assert!(!bucket.try_consume(SECOND * 3600, 1.0));
        assert_eq!(bucket.retry_after(1.0), None);
    }

    #[test]
    fn cost_above_capacity_is_never_admitted() {
        let mut bucket = bucket(5.0, 10.0, 5.0);
        assert!(!bucket.try_consume(Duration::ZERO, 6.0));
        assert!(!bucket.try_consume(SECOND * 3600, 6.0));
        assert_eq!(bucket.tokens(), 5.0);
    }

    #[test]
    fn retry_after_reflects_deficit() {
        let bucket = bucket(10.0, 4.0, 1.0);
        assert_eq!(bucket.retry_after(3.0), Some(Duration::from_millis(500)));
        assert_eq!(bucket.retry_after(0.5), Some(Duration::ZERO));
    }

    #[test]
    fn idle_detection_uses_last_update() {
        let bucket = bucket(1.0, 1.0, 1.0);
        assert!(!bucket.is_idle(SECOND * 30, SECOND * 30));
        assert!(bucket.is_idle(SECOND * 31, SECOND * 30));
    }

    #[test]
    fn seed_validation_rejects_overfull_buckets() {
        let snapshot = BucketSnapshot {
            capacity: 5.0,
            refill_rate: 1.0,
            tokens: 6.0,
            last_update: Duration::ZERO,
        };
        assert!(matches!(
            snapshot.validate("k"),
            Err(RateLimitError::InvalidSeed { .. })
        ));
        assert!(snapshot.with_tokens(5.0).validate("k").is_ok());
    }
}
