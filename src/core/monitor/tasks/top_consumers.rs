//! Top CPU/memory consumer sampling task (ps).

use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::core::monitor::aggregate::{IssueClock, SourcePayload, SourceUpdate};
use crate::core::samplers::{top, Cooldown};

/// Minimum spacing between process-listing invocations.
const TOP_COOLDOWN: Duration = Duration::from_secs(3);

/// Self-gated like the thermal task; see there for the sequencing rules.
pub async fn top_consumers_task(
    update_tx: mpsc::Sender<SourceUpdate>,
    clock: IssueClock,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut cooldown = Cooldown::new(TOP_COOLDOWN);

    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !cooldown.ready() {
                    continue;
                }
                let seq = clock.next();

                let sample = top::sample().await;
                if sample.by_cpu.is_empty() && sample.by_memory.is_empty() {
                    continue;
                }
                let update = SourceUpdate {
                    seq,
                    payload: SourcePayload::TopConsumers(sample),
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
