//! Fast-path sampling task.
//!
//! Runs every second and reads only synchronous, sub-millisecond sources:
//! CPU tick counters, VM statistics, block-device byte counters,
//! accelerator utilization and the SMC sensors. The SMC connection is owned
//! here and never touched from any other task, so it needs no lock.

use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::core::kernel::{CpuUsageTracker, DiskRateWindow, KernelSource};
use crate::core::monitor::aggregate::{FastSample, IssueClock, SourcePayload, SourceUpdate};
use crate::core::smc::SmcClient;
use crate::error::Result;
use crate::platform::{open_smc_port, HostKernelSource};

fn best_effort<T>(label: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            log::debug!("{} sampling failed: {}", label, e);
            None
        }
    }
}

/// Polling frequency: 1 second; the first tick fires immediately and
/// establishes the CPU/disk baselines.
pub async fn fast_task(
    update_tx: mpsc::Sender<SourceUpdate>,
    clock: IssueClock,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut kernel = HostKernelSource::new();
    let mut smc = match open_smc_port() {
        Ok(port) => Some(SmcClient::new(port)),
        Err(e) => {
            // No handle means no SMC telemetry until restart; everything
            // else keeps flowing.
            log::warn!("SMC unavailable: {}", e);
            None
        }
    };

    let mut cpu_tracker = CpuUsageTracker::new();
    let mut disk_window = DiskRateWindow::new();

    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let seq = clock.next();

                let sample = FastSample {
                    cpu_usage: best_effort("cpu ticks", kernel.cpu_ticks())
                        .and_then(|ticks| cpu_tracker.observe(ticks)),
                    memory: best_effort("memory", kernel.memory()),
                    disk: best_effort("disk counters", kernel.disk_counters())
                        .and_then(|counters| disk_window.observe(counters)),
                    gpu_usage: best_effort("gpu", kernel.gpu_usage()),
                    smc_cpu_temperature: smc.as_mut().and_then(|c| c.cpu_temperature()),
                    smc_fan_speeds: smc
                        .as_mut()
                        .map(|c| c.fan_speeds())
                        .filter(|fans| !fans.is_empty()),
                };

                let update = SourceUpdate {
                    seq,
                    payload: SourcePayload::Fast(sample),
                };
                if update_tx.send(update).await.is_err() {
                    break;
                }
            }
            _ = shutdown.recv() => {
                break;
            }
        }
    }
}
