//! Fixed-period tick scheduler for EDU-C2.
//!
//! This is the clock behind the attack simulation: it fires every
//! `period`, optionally stops after a fixed number of ticks, and can be
//! cancelled at any point simply by dropping the future returned from
//! [`TickScheduler::wait_for_tick`] (or the task awaiting it).
//!
//! # Integration
//!
//! ```ignore
//! let mut ticks = TickScheduler::new(TickConfig::every(period).limited(10));
//! while let Some(tick) = ticks.wait_for_tick().await {
//!     emit_progress(tick);
//! }
//! ```
//!
//! The first tick fires one full period after the scheduler is created,
//! never immediately. A tick that fires late pushes the next one a full
//! period out, so a stalled runtime never produces a burst of ticks.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// Configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks.
    pub period: Duration,
    /// Stop after this many ticks. `None` = tick forever.
    pub max_ticks: Option<u64>,
}

impl TickConfig {
    /// Smallest accepted period. Anything shorter is clamped up to this.
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    /// Unbounded ticking at `period`.
    pub fn every(period: Duration) -> Self {
        Self {
            period,
            max_ticks: None,
        }
    }

    /// Limit the scheduler to `ticks` ticks.
    pub fn limited(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TickScheduler::new`]. A zero period
    /// would turn the scheduler into a busy loop.
    pub fn validated(mut self) -> Self {
        if self.period < Self::MIN_PERIOD {
            warn!(
                period_us = self.period.as_micros() as u64,
                "tick period below minimum, clamping"
            );
            self.period = Self::MIN_PERIOD;
        }
        self
    }
}

/// Fixed-period tick scheduler.
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    next_tick: Instant,
}

impl TickScheduler {
    /// Create a new scheduler. The first tick is due one period from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        debug!(
            period_ms = config.period.as_secs_f64() * 1000.0,
            max_ticks = ?config.max_ticks,
            "tick scheduler created"
        );
        Self {
            next_tick: Instant::now() + config.period,
            tick_count: 0,
            config,
        }
    }

    /// Wait until the next tick is due and return its number, starting
    /// at 1.
    ///
    /// Returns `None` without waiting once a limited scheduler has fired
    /// all its ticks. Cancel safe: dropping the future before it resolves
    /// leaves the schedule untouched.
    pub async fn wait_for_tick(&mut self) -> Option<u64> {
        if self.is_exhausted() {
            return None;
        }

        let deadline = self.next_tick;
        time::sleep_until(deadline).await;

        let now = Instant::now();
        let period = self.config.period;
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(deadline);
        if late_by > period {
            warn!(
                tick = self.tick_count,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick overrun"
            );
        }
        self.next_tick = now + period;

        trace!(tick = self.tick_count, "tick fired");
        Some(self.tick_count)
    }

    /// Ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    fn is_exhausted(&self) -> bool {
        self.config
            .max_ticks
            .is_some_and(|max| self.tick_count >= max)
    }
}
