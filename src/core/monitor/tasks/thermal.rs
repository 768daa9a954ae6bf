//! Thermal/fan sampling task (powermetrics).

use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::core::monitor::aggregate::{IssueClock, SourcePayload, SourceUpdate};
use crate::core::samplers::{powermetrics, Cooldown};

/// Minimum spacing between powermetrics invocations.
const THERMAL_COOLDOWN: Duration = Duration::from_secs(5);

/// Ticks with the scheduler but self-gates: subprocess spawn+wait can take
/// seconds, so invocations are spaced at least [`THERMAL_COOLDOWN`] apart.
/// The stamp is taken when sampling starts, not when the subprocess
/// finishes, so a stalled run cannot overwrite fresher SMC readings.
pub async fn thermal_task(
    update_tx: mpsc::Sender<SourceUpdate>,
    clock: IssueClock,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut cooldown = Cooldown::new(THERMAL_COOLDOWN);

    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !cooldown.ready() {
                    continue;
                }
                let seq = clock.next();

                // "No data" is a skipped tick, not an error; the sampler
                // is naturally retried at the next cooldown boundary.
                if let Some(sample) = powermetrics::sample().await {
                    let update = SourceUpdate {
                        seq,
                        payload: SourcePayload::Thermal(sample),
                    };
                    if update_tx.send(update).await.is_err() {
                        break;
                    }
                }
            }
            _ = shutdown.recv() => {
                break;
            }
        }
    }
}
