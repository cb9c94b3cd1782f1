use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use toolgate_config::RateLimitConfig;

use super::bucket::{BucketSnapshot, TokenBucket};
use super::clock::{Clock, SystemClock};
use super::error::RateLimitError;
use super::policy::{BucketPolicy, PolicySet};
use super::store::BucketStore;

/// Outcome of an admission check. A denial is a normal result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RateDecision {
    Admitted {
        /// Tokens left in the bucket after this call.
        remaining: f64,
    },
    Denied {
        /// Advisory wait before `cost` tokens are available. `None` when the
        /// bucket never refills and only a reset can help.
        retry_after: Option<Duration>,
    },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Admitted { .. } => None,
            Self::Denied { retry_after } => *retry_after,
        }
    }
}

/// Counters describing limiter activity since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LimiterStats {
    pub admitted: u64,
    pub denied: u64,
    pub evicted: u64,
    pub resets: u64,
}

/// Process-wide admission gate shared by every tool invocation.
///
/// Construct one instance at startup and hand it out as `Arc<RateLimiter>`;
/// all methods take `&self` and are safe to call from any thread.
pub struct RateLimiter {
    store: BucketStore,
    policies: PolicySet,
    clock: Arc<dyn Clock>,
    admitted: AtomicU64,
    denied: AtomicU64,
    evicted: AtomicU64,
    resets: AtomicU64,
}

impl RateLimiter {
    /// Limiter driven by the system clock.
    pub fn new(policies: PolicySet) -> Self {
        Self::with_clock(policies, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(policies: PolicySet, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: BucketStore::new(),
            policies,
            clock,
            admitted: AtomicU64::new(0),
            denied: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            resets: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Result<Self, RateLimitError> {
        Ok(Self::new(PolicySet::from_config(config)?))
    }

    /// Admit or deny one unit of work for `key`.
    pub fn check_rate_limit(&self, key: &str) -> Result<RateDecision, RateLimitError> {
        self.check_rate_limit_with_cost(key, 1.0)
    }

    /// Admit or deny a request costing `cost` tokens for `key`.
    ///
    /// Returns an error only for requests that could never succeed: a
    /// non-positive cost, or a cost above the bucket's capacity.
    pub fn check_rate_limit_with_cost(
        &self,
        key: &str,
        cost: f64,
    ) -> Result<RateDecision, RateLimitError> {
        if !cost.is_finite() || cost <= 0.0 {
            return Err(RateLimitError::InvalidCost { cost });
        }

        let policy = self.policies.resolve(key);
        if cost > policy.capacity() {
            return Err(RateLimitError::CostExceedsCapacity {
                key: key.to_string(),
                cost,
                capacity: policy.capacity(),
            });
        }

        let now = self.clock.now();
        let decision = self.store.get_or_create(
            key,
            || TokenBucket::new(policy, now),
            |bucket| {
                // A seeded bucket may carry a smaller capacity than the policy.
                if cost > bucket.capacity() {
                    return Err(RateLimitError::CostExceedsCapacity {
                        key: key.to_string(),
                        cost,
                        capacity: bucket.capacity(),
                    });
                }
                if bucket.try_consume(now, cost) {
                    Ok(RateDecision::Admitted {
                        remaining: bucket.tokens(),
                    })
                } else {
                    Ok(RateDecision::Denied {
                        retry_after: bucket.retry_after(cost),
                    })
                }
            },
        )?;

        match decision {
            RateDecision::Admitted { remaining } => {
                self.admitted.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(key = %key, cost, remaining, "Rate limit admitted");
            }
            RateDecision::Denied { retry_after } => {
                self.denied.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(
                    key = %key,
                    cost,
                    retry_after = ?retry_after,
                    "Rate limit denied"
                );
            }
        }

        Ok(decision)
    }

    /// Forget every bucket. The next check for any key starts full.
    pub fn reset(&self) -> usize {
        let removed = self.store.reset();
        self.resets.fetch_add(1, Ordering::Relaxed);
        tracing::info!(removed, "Rate limiter reset");
        removed
    }

    /// Drop buckets that have not been checked for longer than `ttl`.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let removed = self.store.evict_idle(self.clock.now(), ttl);
        if removed > 0 {
            self.evicted.fetch_add(removed as u64, Ordering::Relaxed);
            tracing::debug!(
                removed,
                ttl_secs = ttl.as_secs_f64(),
                "Evicted idle rate-limit buckets"
            );
        }
        removed
    }

    /// Policy that applies (or would apply) to a new bucket for `key`.
    pub fn policy_for(&self, key: &str) -> BucketPolicy {
        self.policies.resolve(key)
    }

    pub fn policies(&self) -> &PolicySet {
        &self.policies
    }

    /// Current clock reading, in the same timebase as bucket snapshots.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Inspect the state tracked for `key`.
    pub fn snapshot(&self, key: &str) -> Option<BucketSnapshot> {
        self.store.snapshot(key)
    }

    /// Replace the state tracked for `key`. Intended for tests and
    /// operational repair.
    pub fn seed(&self, key: &str, snapshot: BucketSnapshot) -> Result<(), RateLimitError> {
        snapshot.validate(key)?;
        self.store.insert(key, snapshot);
        Ok(())
    }

    /// Forget a single key.
    pub fn forget(&self, key: &str) -> bool {
        self.store.remove(key)
    }

    pub fn tracked_keys(&self) -> Vec<String> {
        self.store.keys()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn stats(&self) -> LimiterStats {
        LimiterStats {
            admitted: self.admitted.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("policies", &self.policies)
            .field("store", &self.store)
            .field("stats", &self.stats())
            .finish()
    }
}
