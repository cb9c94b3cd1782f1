use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::error::RateLimitError;
use super::limiter::RateLimiter;

/// Handle to a background task that periodically evicts idle buckets.
///
/// The task stops when the handle is shut down or dropped.
#[derive(Debug)]
pub struct IdleSweeperHandle {
    task: JoinHandle<()>,
}

impl IdleSweeperHandle {
    pub fn shutdown(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for IdleSweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run [`RateLimiter::evict_idle`] every `interval` on the current tokio runtime.
///
/// A zero `interval` is rejected up front; the task itself never fails.
pub fn spawn_idle_sweeper(
    limiter: Arc<RateLimiter>,
    interval: Duration,
    ttl: Duration,
) -> Result<IdleSweeperHandle, RateLimitError> {
    if interval.is_zero() {
        return Err(RateLimitError::InvalidSweepInterval);
    }

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it so a fresh limiter is
        // not swept before any traffic arrives.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = limiter.evict_idle(ttl);
            tracing::trace!(
                removed,
                tracked = limiter.len(),
                "Idle sweep completed"
            );
        }
    });

    tracing::debug!(
        interval_secs = interval.as_secs_f64(),
        ttl_secs = ttl.as_secs_f64(),
        "Started idle bucket sweeper"
    );

    Ok(IdleSweeperHandle { task })
}
