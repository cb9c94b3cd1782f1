use std::sync::Arc;
use std::time::Duration;
use toolgate_core::rate_limit::{
    BucketPolicy, ManualClock, PolicySet, RateLimitError, RateLimiter, spawn_idle_sweeper,
};

fn shared_limiter() -> (Arc<RateLimiter>, ManualClock) {
    let clock = ManualClock::new();
    let limiter = RateLimiter::with_clock(
        PolicySet::new(BucketPolicy::new(5.0, 1.0).unwrap()),
        Arc::new(clock.clone()),
    );
    (Arc::new(limiter), clock)
}

#[tokio::test(start_paused = true)]
async fn sweeper_evicts_idle_buckets_on_each_tick() {
    let (limiter, clock) = shared_limiter();
    limiter.check_rate_limit("read_tool:anonymous").unwrap();

    let handle = spawn_idle_sweeper(
        Arc::clone(&limiter),
        Duration::from_secs(60),
        Duration::from_secs(300),
    )
    .unwrap();

    // Not idle yet when the first sweep runs.
    clock.advance(Duration::from_secs(120));
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(limiter.len(), 1);

    clock.advance(Duration::from_secs(600));
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(limiter.is_empty());
    assert_eq!(limiter.stats().evicted, 1);

    handle.shutdown();
}

#[tokio::test(start_paused = true)]
async fn sweeper_does_not_run_before_the_first_interval() {
    let (limiter, clock) = shared_limiter();
    limiter.check_rate_limit("bash_tool:anonymous").unwrap();
    clock.advance(Duration::from_secs(3600));

    let handle = spawn_idle_sweeper(
        Arc::clone(&limiter),
        Duration::from_secs(60),
        Duration::from_secs(1),
    )
    .unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(limiter.len(), 1);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(limiter.is_empty());
    drop(handle);
}

#[tokio::test(start_paused = true)]
async fn dropped_handle_stops_sweeping() {
    let (limiter, clock) = shared_limiter();
    let handle = spawn_idle_sweeper(
        Arc::clone(&limiter),
        Duration::from_secs(10),
        Duration::from_secs(1),
    )
    .unwrap();
    drop(handle);

    limiter.check_rate_limit("think:anonymous").unwrap();
    clock.advance(Duration::from_secs(100));
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(limiter.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn zero_interval_is_rejected_before_spawning() {
    let (limiter, _clock) = shared_limiter();
    let err = spawn_idle_sweeper(
        Arc::clone(&limiter),
        Duration::ZERO,
        Duration::from_secs(1),
    )
    .unwrap_err();
    assert_eq!(err, RateLimitError::InvalidSweepInterval);
    // No task was started, so the limiter is only held here.
    assert_eq!(Arc::strong_count(&limiter), 1);
}
