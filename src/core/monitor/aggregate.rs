//! Single-writer telemetry aggregate.
//!
//! Background samplers send tagged updates; the aggregator is the only code
//! that mutates the published snapshot, so a reader can never observe a
//! current value without its matching history append. Every sampling pass
//! takes a stamp from the shared [`IssueClock`] when it starts, and the
//! aggregator discards completions issued before the last applied one
//! (last-issued-wins, not last-completed-wins). CPU temperature and fan
//! speeds have two producers, the fast-tick SMC read and the thermal
//! subprocess, so those fields carry their own gates across both.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::core::kernel::{DiskRates, MemoryStats};
use crate::core::samplers::top::TopSample;
use crate::core::samplers::ThermalSample;
use crate::ui::format::{format_bytes, format_rate};

use super::snapshot::{ActionOutcome, TelemetrySnapshot};

/// Monotone stamp source shared by every sampling task.
///
/// A stamp is taken when a sampling pass starts, not when it finishes, so a
/// slow completion carries the order it was issued in. One clock serves all
/// tasks; stamps from different sources are comparable.
#[derive(Debug, Clone, Default)]
pub struct IssueClock(Arc<AtomicU64>);

impl IssueClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next stamp, strictly greater than every stamp issued so far.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Results of one fast-tick sampling pass. Every field is best-effort: a
/// `None` leaves the prior published value untouched and skips the history
/// append for that metric.
#[derive(Debug, Clone, Default)]
pub struct FastSample {
    pub cpu_usage: Option<f64>,
    pub memory: Option<MemoryStats>,
    pub disk: Option<DiskRates>,
    pub gpu_usage: Option<f64>,
    pub smc_cpu_temperature: Option<f64>,
    pub smc_fan_speeds: Option<Vec<u32>>,
}

/// Payload of one source update.
#[derive(Debug, Clone)]
pub enum SourcePayload {
    Fast(FastSample),
    Thermal(ThermalSample),
    TopConsumers(TopSample),
    /// Optimistic flip of the published turbo/low-power flag.
    TurboFlag(bool),
    /// Outcome of a one-shot privileged action.
    ActionResult(ActionOutcome),
}

/// A tagged update: which sampling pass issued it, and what it carries.
#[derive(Debug, Clone)]
pub struct SourceUpdate {
    /// Issue-time sequence number, monotone per source.
    pub seq: u64,
    pub payload: SourcePayload,
}

/// Owns the published snapshot and applies source updates in order.
#[derive(Debug, Default)]
pub struct Aggregator {
    snapshot: TelemetrySnapshot,
    last_fast_seq: Option<u64>,
    last_thermal_seq: Option<u64>,
    last_top_seq: Option<u64>,
    // Temperature and fans are fed by both the fast and thermal sources, so
    // their ordering is tracked per metric, not per source.
    last_temperature_seq: Option<u64>,
    last_fans_seq: Option<u64>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &TelemetrySnapshot {
        &self.snapshot
    }

    /// Apply one update. Returns false when the update was a stale
    /// completion and was discarded.
    pub fn apply(&mut self, update: SourceUpdate) -> bool {
        let applied = match update.payload {
            SourcePayload::Fast(sample) => {
                Self::gate(&mut self.last_fast_seq, update.seq) && {
                    self.apply_fast(sample, update.seq);
                    true
                }
            }
            SourcePayload::Thermal(sample) => {
                Self::gate(&mut self.last_thermal_seq, update.seq) && {
                    self.apply_thermal(sample, update.seq);
                    true
                }
            }
            SourcePayload::TopConsumers(sample) => {
                Self::gate(&mut self.last_top_seq, update.seq) && {
                    self.snapshot.top_cpu = sample.by_cpu;
                    self.snapshot.top_memory = sample.by_memory;
                    true
                }
            }
            SourcePayload::TurboFlag(enabled) => {
                self.snapshot.turbo_mode = enabled;
                true
            }
            SourcePayload::ActionResult(outcome) => {
                self.snapshot.last_action = Some(outcome);
                true
            }
        };

        if applied {
            self.snapshot.timestamp = chrono::Utc::now().timestamp();
        }
        applied
    }

    /// Monotone gate: stale (lower-or-equal) stamps after the first are
    /// discarded. Used once per source and once per dual-producer metric.
    fn gate(last: &mut Option<u64>, seq: u64) -> bool {
        match *last {
            Some(applied) if seq <= applied => {
                log::debug!("discarding stale source update (seq {} <= {})", seq, applied);
                false
            }
            _ => {
                *last = Some(seq);
                true
            }
        }
    }

    fn apply_fast(&mut self, sample: FastSample, seq: u64) {
        if let Some(usage) = sample.cpu_usage {
            self.snapshot.cpu_usage = usage;
            self.snapshot.history.push_cpu(usage);
        }
        if let Some(memory) = sample.memory {
            let percent = memory.usage_percent();
            self.snapshot.memory_usage = percent;
            self.snapshot.memory_used = format_bytes(memory.used_bytes());
            self.snapshot.memory_total = format_bytes(memory.total_bytes);
            self.snapshot.history.push_memory(percent);
        }
        if let Some(disk) = sample.disk {
            self.snapshot.disk_read_bps = disk.read_bytes_per_sec;
            self.snapshot.disk_write_bps = disk.write_bytes_per_sec;
            self.snapshot.disk_read_rate = format_rate(disk.read_bytes_per_sec);
            self.snapshot.disk_write_rate = format_rate(disk.write_bytes_per_sec);
            self.snapshot.history.push_disk_read(disk.read_bytes_per_sec);
            self.snapshot.history.push_disk_write(disk.write_bytes_per_sec);
        }
        if let Some(gpu) = sample.gpu_usage {
            self.snapshot.gpu_usage = gpu;
            self.snapshot.history.push_gpu(gpu);
        }
        if let Some(temp) = sample.smc_cpu_temperature {
            if Self::gate(&mut self.last_temperature_seq, seq) {
                self.snapshot.cpu_temperature = temp;
                self.snapshot.history.push_cpu_temperature(temp);
            }
        }
        if let Some(fans) = sample.smc_fan_speeds {
            if Self::gate(&mut self.last_fans_seq, seq) {
                self.snapshot.fan_speeds = fans;
            }
        }
    }

    fn apply_thermal(&mut self, sample: ThermalSample, seq: u64) {
        if Self::gate(&mut self.last_temperature_seq, seq) {
            self.snapshot.cpu_temperature = sample.cpu_temp;
            self.snapshot.history.push_cpu_temperature(sample.cpu_temp);
        }
        self.snapshot.gpu_temperature = sample.gpu_temp;
        if !sample.fan_speeds.is_empty() && Self::gate(&mut self.last_fans_seq, seq) {
            self.snapshot.fan_speeds = sample.fan_speeds;
        }
    }
}
