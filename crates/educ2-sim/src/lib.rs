//! Attack simulation for EDU-C2.
//!
//! An "attack" here is a scripted progress report and nothing else: no
//! socket is opened, no packet is sent, the target is never resolved.
//! The simulation is a background task that prints
//!
//! 1. a "starting" block, queued before [`spawn_attack`] resolves,
//! 2. ten progress lines, one per tick, 10% .. 100%,
//! 3. a "completed" block, after which the task ends.
//!
//! The requested duration is echoed in the starting block only; the
//! schedule is always ten ticks of [`SimConfig::tick_interval`].
//!
//! # Ownership
//!
//! The task is owned through its [`AttackHandle`]. Cancelling the handle,
//! or dropping it, fires a cancellation token the task checks before
//! every send, so a session that owns the handle can never leave a
//! simulation writing behind it.

mod attack;
pub mod text;

pub use attack::{AttackHandle, AttackOutcome, spawn_attack};

use std::time::Duration;

/// Percentage added per tick.
pub const PROGRESS_STEP: u8 = 10;

/// Number of ticks in every simulation.
pub const TOTAL_TICKS: u64 = 10;

/// Default time between progress lines.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Simulation settings shared by every session.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Time between progress lines.
    pub tick_interval: Duration,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}
