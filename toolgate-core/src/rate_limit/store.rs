//! Sharded, concurrency-safe map from limiter key to [`TokenBucket`].
//!
//! Locking discipline:
//! - Keys are spread over a fixed number of shards by hash, each guarded by
//!   its own `RwLock`, so traffic on unrelated keys rarely contends.
//! - Existing buckets are mutated under the shard's *read* lock plus the
//!   bucket's own `Mutex`. Concurrent calls for one key serialize on that
//!   mutex and never observe a torn bucket.
//! - Creation, seeding, reset and eviction take the shard's *write* lock.
//!   Holding it excludes every in-flight bucket update in that shard, so an
//!   eviction can never remove a bucket that is mid-update, and a lazily
//!   created bucket is installed exactly once.

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use super::bucket::{BucketSnapshot, TokenBucket};

/// Number of shards (power of 2 for fast modulo)
const SHARD_COUNT: usize = 16;

type Shard = RwLock<HashMap<String, Mutex<TokenBucket>>>;

pub struct BucketStore {
    shards: Vec<Shard>,
}

impl BucketStore {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT)
                .map(|_| RwLock::new(HashMap::new()))
                .collect(),
        }
    }

    #[allow(clippy::indexing_slicing)] // index is reduced modulo the shard count
    fn shard(&self, key: &str) -> &Shard {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        let index = (hasher.finish() as usize) % self.shards.len();
        &self.shards[index]
    }

    /// Run `f` against the bucket for `key`, creating a full bucket from
    /// `create` first if the key is not tracked yet.
    ///
    /// `f` runs while the bucket is exclusively locked, so the whole
    /// refill-then-consume sequence it performs is atomic for that key.
    /// `create` is called at most once per installed bucket, even when
    /// several threads touch a new key at the same time.
    pub fn get_or_create<C, F, R>(&self, key: &str, create: C, f: F) -> R
    where
        C: FnOnce() -> TokenBucket,
        F: FnOnce(&mut TokenBucket) -> R,
    {
        let shard = self.shard(key);

        // Fast path: bucket already exists, only the shard read lock is needed.
        {
            let map = shard.read();
            if let Some(bucket) = map.get(key) {
                let mut guard = bucket.lock();
                return f(&mut *guard);
            }
        }

        // Slow path: re-check under the write lock, another thread may have
        // installed the bucket in the meantime.
        let mut map = shard.write();
        let mut created = false;
        let bucket = map.entry_ref(key).or_insert_with(|| {
            created = true;
            Mutex::new(create())
        });
        if created {
            tracing::debug!(key = %key, "Created rate-limit bucket");
        }
        f(bucket.get_mut())
    }

    /// Install `snapshot` as the state for `key`, replacing any existing bucket.
    pub fn insert(&self, key: &str, snapshot: BucketSnapshot) {
        let mut map = self.shard(key).write();
        map.insert(
            key.to_string(),
            Mutex::new(TokenBucket::from_snapshot(snapshot)),
        );
    }

    /// Copy of the bucket state for `key`, if tracked.
    pub fn snapshot(&self, key: &str) -> Option<BucketSnapshot> {
        let map = self.shard(key).read();
        map.get(key).map(|bucket| bucket.lock().snapshot())
    }

    pub fn remove(&self, key: &str) -> bool {
        self.shard(key).write().remove(key).is_some()
    }

    /// Drop every bucket. Returns how many were removed.
    pub fn reset(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                let mut map = shard.write();
                let removed = map.len();
                map.clear();
                removed
            })
            .sum()
    }

    /// Remove buckets whose last update is more than `ttl` before `now`.
    /// Returns how many were removed.
    pub fn evict_idle(&self, now: Duration, ttl: Duration) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                // Skip the write lock for shards with nothing to evict.
                let has_idle = shard
                    .read()
                    .values()
                    .any(|bucket| bucket.lock().is_idle(now, ttl));
                if !has_idle {
                    return 0;
                }

                let mut map = shard.write();
                let before = map.len();
                map.retain(|_, bucket| !bucket.get_mut().is_idle(now, ttl));
                before - map.len()
            })
            .sum()
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }

    /// Tracked keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .shards
            .iter()
            .flat_map(|shard| shard.read().keys().cloned().collect::<Vec<_>>())
            .collect();
        keys.sort_unstable();
        keys
    }
}

impl Default for BucketStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BucketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketStore")
            .field("shards", &self.shards.len())
            .field("keys", &self.len())
            .finish()
    }
}
