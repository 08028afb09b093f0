//! The attack task and the handle that owns it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use educ2_protocol::AttackRequest;
use educ2_tick::{TickConfig, TickScheduler};
use educ2_transport::{Outbound, TransportError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{PROGRESS_STEP, SimConfig, TOTAL_TICKS, text};

/// How a simulation task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    /// All ten ticks ran and the completion lines were queued.
    Completed,
    /// The handle cancelled it before it finished.
    Cancelled,
    /// The connection's writer went away first.
    ConnectionLost,
}

/// Owner of a running (or finished) simulation.
///
/// Dropping the handle cancels the task.
#[derive(Debug)]
pub struct AttackHandle {
    request: AttackRequest,
    progress: Arc<AtomicU8>,
    cancel: CancellationToken,
    task: JoinHandle<AttackOutcome>,
}

impl AttackHandle {
    /// What was requested.
    pub fn request(&self) -> &AttackRequest {
        &self.request
    }

    /// Last reported progress, 0..=100 in steps of 10.
    pub fn progress(&self) -> u8 {
        self.progress.load(Ordering::Relaxed)
    }

    /// Whether the task has ended (completed, lost its connection, or
    /// been cancelled).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the task. Once this returns, the task queues nothing more:
    /// it checks the token before every send. Idempotent.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() && !self.task.is_finished() {
            tracing::debug!(request = %self.request, progress = self.progress(), "cancelling attack simulation");
        }
        self.cancel.cancel();
    }

    /// Waits for the task to end and reports how it ended.
    ///
    /// Returns `None` only if the task panicked or the runtime dropped
    /// it. Must not be called again after it has returned.
    pub async fn wait(&mut self) -> Option<AttackOutcome> {
        match (&mut self.task).await {
            Ok(outcome) => Some(outcome),
            Err(e) if e.is_cancelled() => None,
            Err(e) => {
                tracing::warn!(error = %e, "attack simulation task panicked");
                None
            }
        }
    }
}

impl Drop for AttackHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Starts a simulation that writes to `outbound`.
///
/// The starting block is queued before this returns, so anything the
/// caller queues afterwards (a prompt, say) lands after it. Progress
/// lines follow asynchronously.
///
/// # Errors
/// [`TransportError::ConnectionClosed`] if the connection is already gone;
/// no task is spawned in that case.
pub async fn spawn_attack(
    request: AttackRequest,
    outbound: Outbound,
    config: &SimConfig,
) -> Result<AttackHandle, TransportError> {
    outbound.send(text::starting(&request)).await?;

    let progress = Arc::new(AtomicU8::new(0));
    let cancel = CancellationToken::new();
    let ticks = TickScheduler::new(
        TickConfig::every(config.tick_interval).limited(TOTAL_TICKS),
    );

    tracing::info!(
        conn = %outbound.connection_id(),
        %request,
        "attack simulation started"
    );

    let task = tokio::spawn(run_attack(
        request.method.clone(),
        outbound,
        ticks,
        Arc::clone(&progress),
        cancel.clone(),
    ));

    Ok(AttackHandle {
        request,
        progress,
        cancel,
        task,
    })
}

async fn run_attack(
    method: String,
    outbound: Outbound,
    mut ticks: TickScheduler,
    progress: Arc<AtomicU8>,
    cancel: CancellationToken,
) -> AttackOutcome {
    let conn = outbound.connection_id();
    let outcome = match simulate(&method, &outbound, &mut ticks, &progress, &cancel).await {
        Ok(()) => AttackOutcome::Completed,
        Err(stopped) => stopped,
    };

    match outcome {
        AttackOutcome::Completed => {
            tracing::info!(%conn, ticks = ticks.tick_count(), "attack simulation completed");
        }
        AttackOutcome::Cancelled => {
            tracing::debug!(%conn, ticks = ticks.tick_count(), "attack simulation cancelled");
        }
        AttackOutcome::ConnectionLost => {
            tracing::debug!(%conn, ticks = ticks.tick_count(), "connection gone, stopping attack simulation");
        }
    }
    outcome
}

async fn simulate(
    method: &str,
    outbound: &Outbound,
    ticks: &mut TickScheduler,
    progress: &AtomicU8,
    cancel: &CancellationToken,
) -> Result<(), AttackOutcome> {
    loop {
        let tick = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AttackOutcome::Cancelled),
            tick = ticks.wait_for_tick() => tick,
        };
        let Some(tick) = tick else { break };

        // TOTAL_TICKS * PROGRESS_STEP is exactly 100.
        let percent = tick.min(TOTAL_TICKS) as u8 * PROGRESS_STEP;
        progress.store(percent, Ordering::Relaxed);
        emit(outbound, cancel, text::progress(percent, method)).await?;
    }

    emit(outbound, cancel, text::COMPLETED.to_owned()).await
}

/// Queues one block unless the simulation was cancelled first. A send
/// stuck behind a slow reader is abandoned on cancellation.
async fn emit(
    outbound: &Outbound,
    cancel: &CancellationToken,
    block: String,
) -> Result<(), AttackOutcome> {
    if cancel.is_cancelled() {
        return Err(AttackOutcome::Cancelled);
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AttackOutcome::Cancelled),
        sent = outbound.send(block) => sent.map_err(|_| AttackOutcome::ConnectionLost),
    }
}
