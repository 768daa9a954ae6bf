// macOS implementations of the telemetry sources and one-shot actions.

pub mod actions;
pub mod host_stats;
pub mod iokit;

pub use actions::{purge_memory, set_gpu_switch};
pub use iokit::SmcIoPort as HostSmcPort;

use crate::core::kernel::{CpuTicks, DiskCounters, KernelSource, MemoryStats};
use crate::error::Result;

/// The operating system's native counters, read synchronously.
#[derive(Debug, Default)]
pub struct HostKernelSource;

impl HostKernelSource {
    pub fn new() -> Self {
        Self
    }
}

impl KernelSource for HostKernelSource {
    fn cpu_ticks(&mut self) -> Result<CpuTicks> {
        host_stats::cpu_ticks()
    }

    fn memory(&mut self) -> Result<MemoryStats> {
        host_stats::memory()
    }

    fn disk_counters(&mut self) -> Result<DiskCounters> {
        iokit::disk_counters()
    }

    fn gpu_usage(&mut self) -> Result<f64> {
        iokit::gpu_usage()
    }
}

/// Open the shared SMC connection, reused for all reads and writes.
pub fn open_smc_port() -> Result<HostSmcPort> {
    HostSmcPort::open()
}
