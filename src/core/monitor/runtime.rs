//! Tokio runtime and orchestrator for telemetry collection.
//!
//! The orchestrator is the single writer of the published snapshot: it
//! merges source updates through the [`Aggregator`] and republishes over a
//! watch channel after every applied update. Stopping cancels the sampling
//! tasks; in-flight subprocess results arriving afterwards go nowhere
//! because the update channel's receiver is gone.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};

use crate::error::Result;
use crate::platform;

use super::aggregate::{Aggregator, IssueClock, SourcePayload, SourceUpdate};
use super::snapshot::{ActionOutcome, TelemetrySnapshot};
use super::tasks::{fast_task, thermal_task, top_consumers_task};

/// One-shot requests from the consumer side.
#[derive(Debug, Clone, Copy)]
pub enum MonitorCommand {
    /// Flip turbo/low-power mode. The published flag changes optimistically;
    /// the privileged action proceeds independently.
    SetTurbo(bool),
    /// Drop cached memory.
    PurgeMemory,
}

/// Wrapper around the Tokio runtime driving telemetry collection.
pub struct MonitorRuntime {
    /// Receiver for published snapshots.
    pub snapshot_rx: watch::Receiver<Arc<TelemetrySnapshot>>,

    command_tx: mpsc::Sender<MonitorCommand>,
    shutdown_tx: broadcast::Sender<()>,
    _runtime: tokio::runtime::Runtime,
}

impl MonitorRuntime {
    /// Start the runtime with all sampling tasks spawned.
    pub fn start() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("telemetry-worker")
            .build()?;

        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(TelemetrySnapshot::default()));
        let (command_tx, command_rx) = mpsc::channel::<MonitorCommand>(8);
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        let shutdown_for_spawn = shutdown_tx.clone();
        runtime.spawn(async move {
            spawn_all_tasks(snapshot_tx, command_rx, shutdown_for_spawn).await;
        });

        Ok(Self {
            snapshot_rx,
            command_tx,
            shutdown_tx,
            _runtime: runtime,
        })
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<TelemetrySnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    pub fn set_turbo(&self, enabled: bool) {
        let _ = self.command_tx.try_send(MonitorCommand::SetTurbo(enabled));
    }

    pub fn purge_memory(&self) {
        let _ = self.command_tx.try_send(MonitorCommand::PurgeMemory);
    }

    /// Stop sampling. In-flight subprocess samples complete and are
    /// dropped.
    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        // The runtime itself shuts down when dropped.
    }
}

async fn spawn_all_tasks(
    snapshot_tx: watch::Sender<Arc<TelemetrySnapshot>>,
    command_rx: mpsc::Receiver<MonitorCommand>,
    shutdown_tx: broadcast::Sender<()>,
) {
    let (update_tx, update_rx) = mpsc::channel::<SourceUpdate>(32);
    let clock = IssueClock::new();

    tokio::spawn(orchestrator_task(
        update_rx,
        command_rx,
        update_tx.clone(),
        snapshot_tx,
        shutdown_tx.subscribe(),
    ));

    tokio::spawn(fast_task(
        update_tx.clone(),
        clock.clone(),
        shutdown_tx.subscribe(),
    ));
    tokio::spawn(thermal_task(
        update_tx.clone(),
        clock.clone(),
        shutdown_tx.subscribe(),
    ));
    tokio::spawn(top_consumers_task(update_tx, clock, shutdown_tx.subscribe()));
}

async fn orchestrator_task(
    mut update_rx: mpsc::Receiver<SourceUpdate>,
    mut command_rx: mpsc::Receiver<MonitorCommand>,
    update_tx: mpsc::Sender<SourceUpdate>,
    snapshot_tx: watch::Sender<Arc<TelemetrySnapshot>>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut aggregator = Aggregator::new();

    loop {
        tokio::select! {
            Some(update) = update_rx.recv() => {
                if aggregator.apply(update) {
                    // send() only fails with no receivers, which is fine.
                    let _ = snapshot_tx.send(Arc::new(aggregator.snapshot().clone()));
                }
            }
            Some(command) = command_rx.recv() => {
                handle_command(command, &mut aggregator, &snapshot_tx, &update_tx);
            }
            _ = shutdown.recv() => {
                break;
            }
        }
    }
}

/// Apply the optimistic state change and dispatch the privileged action
/// fire-and-forget; its outcome comes back as a regular source update.
fn handle_command(
    command: MonitorCommand,
    aggregator: &mut Aggregator,
    snapshot_tx: &watch::Sender<Arc<TelemetrySnapshot>>,
    update_tx: &mpsc::Sender<SourceUpdate>,
) {
    match command {
        MonitorCommand::SetTurbo(enabled) => {
            aggregator.apply(SourceUpdate {
                seq: 0,
                payload: SourcePayload::TurboFlag(enabled),
            });
            let _ = snapshot_tx.send(Arc::new(aggregator.snapshot().clone()));

            let tx = update_tx.clone();
            tokio::spawn(async move {
                let outcome = into_outcome(platform::set_gpu_switch(enabled).await);
                let _ = tx
                    .send(SourceUpdate {
                        seq: 0,
                        payload: SourcePayload::ActionResult(outcome),
                    })
                    .await;
            });
        }
        MonitorCommand::PurgeMemory => {
            let tx = update_tx.clone();
            tokio::spawn(async move {
                let outcome = into_outcome(platform::purge_memory().await);
                let _ = tx
                    .send(SourceUpdate {
                        seq: 0,
                        payload: SourcePayload::ActionResult(outcome),
                    })
                    .await;
            });
        }
    }
}

fn into_outcome(result: Result<String>) -> ActionOutcome {
    match result {
        Ok(message) => ActionOutcome {
            success: true,
            message,
        },
        Err(e) => ActionOutcome {
            success: false,
            message: e.to_string(),
        },
    }
}
