use serde::Serialize;
use toolgate_config::RateLimitConfig;

use super::error::RateLimitError;

/// Capacity and refill rate applied to one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketPolicy {
    capacity: f64,
    refill_rate: f64,
}

impl BucketPolicy {
    /// Replenishing policy. `refill_rate` is in tokens per second and must be
    /// strictly positive; use [`BucketPolicy::fixed_allowance`] for a bucket
    /// that never refills.
    pub fn new(capacity: f64, refill_rate: f64) -> Result<Self, RateLimitError> {
        Self::checked(capacity, refill_rate, false)
    }

    /// One-shot allowance of `capacity` tokens with no replenishment.
    pub fn fixed_allowance(capacity: f64) -> Result<Self, RateLimitError> {
        Self::checked(capacity, 0.0, true)
    }

    fn checked(capacity: f64, refill_rate: f64, allow_zero: bool) -> Result<Self, RateLimitError> {
        if !capacity.is_finite() || capacity <= 0.0 {
            return Err(RateLimitError::InvalidCapacity { capacity });
        }
        let refill_ok = refill_rate.is_finite()
            && (refill_rate > 0.0 || (allow_zero && refill_rate == 0.0));
        if !refill_ok {
            return Err(RateLimitError::InvalidRefillRate { refill_rate });
        }
        Ok(Self {
            capacity,
            refill_rate,
        })
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }
}

/// Default policy plus per key-prefix overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicySet {
    default: BucketPolicy,
    // Sorted longest prefix first so the first match is the most specific.
    overrides: Vec<(String, BucketPolicy)>,
}

impl PolicySet {
    pub fn new(default: BucketPolicy) -> Self {
        Self {
            default,
            overrides: Vec::new(),
        }
    }

    /// Add or replace the policy for keys starting with `prefix`.
    pub fn with_override(mut self, prefix: impl Into<String>, policy: BucketPolicy) -> Self {
        let prefix = prefix.into();
        self.overrides.retain(|(existing, _)| *existing != prefix);
        self.overrides.push((prefix, policy));
        self.overrides
            .sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        self
    }

    /// Build a policy set from validated configuration.
    pub fn from_config(config: &RateLimitConfig) -> Result<Self, RateLimitError> {
        let default = policy_from_parts(
            config.capacity,
            config.refill_per_second,
            config.allow_fixed_allowance,
        )?;
        config
            .overrides
            .iter()
            .try_fold(Self::new(default), |set, (prefix, entry)| {
                let policy = policy_from_parts(
                    entry.capacity,
                    entry.refill_per_second,
                    entry.allow_fixed_allowance,
                )?;
                Ok(set.with_override(prefix.clone(), policy))
            })
    }

    pub fn default_policy(&self) -> BucketPolicy {
        self.default
    }

    /// Resolve the policy for `key`: longest matching prefix, else the default.
    pub fn resolve(&self, key: &str) -> BucketPolicy {
        self.matching_override(key)
            .map_or(self.default, |(_, policy)| *policy)
    }

    /// The override prefix that governs `key`, if any.
    pub fn matching_prefix(&self, key: &str) -> Option<&str> {
        self.matching_override(key).map(|(prefix, _)| prefix.as_str())
    }

    fn matching_override(&self, key: &str) -> Option<&(String, BucketPolicy)> {
        self.overrides
            .iter()
            .find(|(prefix, _)| key.starts_with(prefix.as_str()))
    }

    /// Configured prefixes, most specific first.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.overrides.iter().map(|(prefix, _)| prefix.as_str())
    }
}

fn policy_from_parts(
    capacity: f64,
    refill_rate: f64,
    allow_fixed_allowance: bool,
) -> Result<BucketPolicy, RateLimitError> {
    if refill_rate == 0.0 && allow_fixed_allowance {
        BucketPolicy::fixed_allowance(capacity)
    } else {
        BucketPolicy::new(capacity, refill_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolgate_config::PolicyOverride;

    fn policy(capacity: f64, refill_rate: f64) -> BucketPolicy {
        BucketPolicy::new(capacity, refill_rate).unwrap()
    }

    #[test]
    fn rejects_invalid_capacity() {
        assert!(matches!(
            BucketPolicy::new(0.0, 1.0),
            Err(RateLimitError::InvalidCapacity { .. })
        ));
        assert!(BucketPolicy::new(f64::NAN, 1.0).is_err());
        assert!(BucketPolicy::new(-5.0, 1.0).is_err());
    }

    #[test]
    fn zero_refill_must_be_explicit() {
        assert!(matches!(
            BucketPolicy::new(10.0, 0.0),
            Err(RateLimitError::InvalidRefillRate { .. })
        ));
        let fixed = BucketPolicy::fixed_allowance(10.0).unwrap();
        assert_eq!(fixed.refill_rate(), 0.0);
    }

    #[test]
    fn longest_prefix_wins() {
        let set = PolicySet::new(policy(60.0, 1.0))
            .with_override("bash", policy(20.0, 1.0))
            .with_override("bash_tool:", policy(5.0, 0.5));

        assert_eq!(set.resolve("bash_tool:anonymous").capacity(), 5.0);
        assert_eq!(set.resolve("bash_other:anonymous").capacity(), 20.0);
        assert_eq!(set.resolve("think:anonymous").capacity(), 60.0);
        assert_eq!(set.prefixes().collect::<Vec<_>>(), vec!["bash_tool:", "bash"]);
        assert_eq!(set.matching_prefix("bash_tool:x"), Some("bash_tool:"));
        assert_eq!(set.matching_prefix("think:x"), None);
    }

    #[test]
    fn replacing_an_override_keeps_one_entry() {
        let set = PolicySet::new(policy(60.0, 1.0))
            .with_override("think:", policy(5.0, 1.0))
            .with_override("think:", policy(500.0, 1.0));
        assert_eq!(set.prefixes().count(), 1);
        assert_eq!(set.resolve("think:x").capacity(), 500.0);
    }

    #[test]
    fn builds_from_config() {
        let mut config = RateLimitConfig::default();
        config.overrides.insert(
            "read_tool:".to_string(),
            PolicyOverride {
                capacity: 3.0,
                refill_per_second: 0.0,
                allow_fixed_allowance: true,
            },
        );
        let set = PolicySet::from_config(&config).unwrap();
        let read = set.resolve("read_tool:anonymous");
        assert_eq!(read.capacity(), 3.0);
        assert_eq!(read.refill_rate(), 0.0);
        assert_eq!(set.default_policy().capacity(), config.capacity);
    }
}
