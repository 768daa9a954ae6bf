//! Kernel statistics reader: host-wide CPU tick counters, VM statistics and
//! cumulative block-device byte counters, plus the delta/rate computations
//! layered on top of them.
//!
//! The raw reads are synchronous and fast (sub-millisecond), safe to call on
//! the sampling task every tick. The actual syscalls live behind
//! [`KernelSource`] so the monitor logic stays portable and testable.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Monotonically increasing host CPU tick counters, one opaque snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuTicks {
    pub user: u64,
    pub system: u64,
    pub idle: u64,
    pub nice: u64,
}

impl CpuTicks {
    /// Busy share over the interval since `prev`, in percent.
    ///
    /// Returns `None` when no ticks elapsed; callers publish nothing for
    /// that interval rather than a stale zero.
    pub fn usage_since(&self, prev: &CpuTicks) -> Option<f64> {
        let user = self.user.saturating_sub(prev.user);
        let system = self.system.saturating_sub(prev.system);
        let idle = self.idle.saturating_sub(prev.idle);
        let nice = self.nice.saturating_sub(prev.nice);

        let total = user + system + idle + nice;
        if total == 0 {
            return None;
        }
        Some((user + system + nice) as f64 / total as f64 * 100.0)
    }
}

/// Tracks the previous tick snapshot so usage can be computed as a delta.
///
/// The first observation after start has no valid baseline (a delta against
/// a zeroed snapshot would count the host's entire uptime), so it only
/// establishes one; the first published value comes from the second tick.
#[derive(Debug, Default)]
pub struct CpuUsageTracker {
    prev: Option<CpuTicks>,
}

impl CpuUsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one snapshot; returns usage in percent once a baseline exists.
    pub fn observe(&mut self, ticks: CpuTicks) -> Option<f64> {
        let usage = self.prev.as_ref().and_then(|prev| ticks.usage_since(prev));
        self.prev = Some(ticks);
        usage
    }
}

/// Host memory statistics. `used` follows the original accounting:
/// active + wired pages, an approximation of what users read as "used".
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    pub active_bytes: u64,
    pub wired_bytes: u64,
    pub total_bytes: u64,
}

impl MemoryStats {
    pub fn used_bytes(&self) -> u64 {
        self.active_bytes + self.wired_bytes
    }

    pub fn usage_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes() as f64 / self.total_bytes as f64 * 100.0
    }
}

/// Cumulative read/write byte counters summed across all block-storage
/// devices enumerated at call time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskCounters {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// Instantaneous disk throughput derived from two counter snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskRates {
    pub read_bytes_per_sec: f64,
    pub write_bytes_per_sec: f64,
}

/// Turns cumulative disk counters into rates over wall-clock intervals.
///
/// A device disappearing between enumerations makes the summed counters
/// drop; the delta is clamped to 0 for that interval instead of going
/// negative. The first observation is baseline only.
#[derive(Debug, Default)]
pub struct DiskRateWindow {
    prev: Option<(DiskCounters, Instant)>,
}

impl DiskRateWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, counters: DiskCounters) -> Option<DiskRates> {
        self.observe_at(counters, Instant::now())
    }

    pub fn observe_at(&mut self, counters: DiskCounters, now: Instant) -> Option<DiskRates> {
        let rates = self.prev.as_ref().and_then(|(prev, prev_at)| {
            let elapsed = now.duration_since(*prev_at).as_secs_f64();
            if elapsed <= 0.0 {
                return None;
            }
            Some(DiskRates {
                read_bytes_per_sec: counters.read_bytes.saturating_sub(prev.read_bytes) as f64
                    / elapsed,
                write_bytes_per_sec: counters.write_bytes.saturating_sub(prev.write_bytes) as f64
                    / elapsed,
            })
        });
        self.prev = Some((counters, now));
        rates
    }
}

/// The operating system's native counter reads, one call per source.
///
/// All methods are synchronous and cheap; failures are per-call and leave
/// the other sources unaffected.
pub trait KernelSource {
    fn cpu_ticks(&mut self) -> Result<CpuTicks>;
    fn memory(&mut self) -> Result<MemoryStats>;
    fn disk_counters(&mut self) -> Result<DiskCounters>;
    /// Peak utilization percent across enumerated accelerators.
    fn gpu_usage(&mut self) -> Result<f64>;
}
