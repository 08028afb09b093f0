//! Integration tests for the fixed-period tick scheduler.
//!
//! Uses `start_paused = true` so Tokio's clock only moves when every
//! task is idle; `sleep_until` then resolves instantly and the elapsed
//! virtual time is exact.

use std::time::Duration;

use educ2_tick::{TickConfig, TickScheduler};
use tokio::time::Instant;

const PERIOD: Duration = Duration::from_millis(500);

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_every_is_unbounded() {
    let cfg = TickConfig::every(PERIOD);
    assert_eq!(cfg.period, PERIOD);
    assert_eq!(cfg.max_ticks, None);
}

#[test]
fn test_limited_sets_max_ticks() {
    let cfg = TickConfig::every(PERIOD).limited(10);
    assert_eq!(cfg.max_ticks, Some(10));
}

#[test]
fn test_validated_clamps_zero_period() {
    let cfg = TickConfig::every(Duration::ZERO).validated();
    assert_eq!(cfg.period, TickConfig::MIN_PERIOD);
}

// =========================================================================
// Tick firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_first_tick_fires_after_one_period() {
    let start = Instant::now();
    let mut s = TickScheduler::new(TickConfig::every(PERIOD));
    assert_eq!(s.tick_count(), 0);

    let tick = s.wait_for_tick().await.expect("unbounded never ends");

    assert_eq!(tick, 1);
    assert_eq!(s.tick_count(), 1);
    assert_eq!(start.elapsed(), PERIOD);
}

#[tokio::test(start_paused = true)]
async fn test_limited_scheduler_fires_exactly_n_ticks() {
    let start = Instant::now();
    let mut s = TickScheduler::new(TickConfig::every(PERIOD).limited(10));

    let mut seen = Vec::new();
    while let Some(tick) = s.wait_for_tick().await {
        seen.push(tick);
    }

    assert_eq!(seen, (1..=10).collect::<Vec<_>>());
    assert_eq!(s.tick_count(), 10);
    assert_eq!(start.elapsed(), PERIOD * 10);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_scheduler_returns_none_immediately() {
    let mut s = TickScheduler::new(TickConfig::every(PERIOD).limited(1));
    s.wait_for_tick().await.expect("one tick");

    let before = Instant::now();
    assert!(s.wait_for_tick().await.is_none());
    assert_eq!(before.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_zero_period_still_ticks() {
    let start = Instant::now();
    let mut s = TickScheduler::new(TickConfig::every(Duration::ZERO).limited(3));

    while s.wait_for_tick().await.is_some() {}

    assert_eq!(start.elapsed(), TickConfig::MIN_PERIOD * 3);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_wait_leaves_schedule_untouched() {
    let mut s = TickScheduler::new(TickConfig::every(PERIOD));

    // Give up halfway through the first period.
    let timed_out =
        tokio::time::timeout(PERIOD / 2, s.wait_for_tick()).await;
    assert!(timed_out.is_err());
    assert_eq!(s.tick_count(), 0);

    // The original deadline still applies.
    let before = Instant::now();
    s.wait_for_tick().await.unwrap();
    assert_eq!(before.elapsed(), PERIOD / 2);
}

// =========================================================================
// Late ticks
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_late_tick_reschedules_from_now_without_burst() {
    let mut s = TickScheduler::new(TickConfig::every(PERIOD).limited(3));

    // Stall the caller for 3.5 periods before waiting.
    tokio::time::advance(PERIOD * 7 / 2).await;
    let before = Instant::now();
    assert_eq!(s.wait_for_tick().await, Some(1));
    assert_eq!(before.elapsed(), Duration::ZERO);

    // One late tick, then the normal cadence: no catch-up ticks.
    let before = Instant::now();
    assert_eq!(s.wait_for_tick().await, Some(2));
    assert_eq!(before.elapsed(), PERIOD);
}
