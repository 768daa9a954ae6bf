// Stubs for platforms without the macOS counter interfaces. The monitor
// treats every source as best-effort, so these simply never produce data.

use crate::core::kernel::{CpuTicks, DiskCounters, KernelSource, MemoryStats};
use crate::core::smc::codec::STRUCT_SIZE;
use crate::core::smc::SmcPort;
use crate::error::{MacPerfError, Result};

#[derive(Debug, Default)]
pub struct HostKernelSource;

impl HostKernelSource {
    pub fn new() -> Self {
        Self
    }
}

impl KernelSource for HostKernelSource {
    fn cpu_ticks(&mut self) -> Result<CpuTicks> {
        Err(MacPerfError::Unsupported("host CPU tick counters"))
    }

    fn memory(&mut self) -> Result<MemoryStats> {
        Err(MacPerfError::Unsupported("host VM statistics"))
    }

    fn disk_counters(&mut self) -> Result<DiskCounters> {
        Err(MacPerfError::Unsupported("block-storage byte counters"))
    }

    fn gpu_usage(&mut self) -> Result<f64> {
        Err(MacPerfError::Unsupported("accelerator utilization"))
    }
}

pub struct HostSmcPort;

impl HostSmcPort {
    pub fn open() -> Result<Self> {
        Err(MacPerfError::Unsupported("SMC user client"))
    }
}

impl SmcPort for HostSmcPort {
    fn call(&mut self, _input: &[u8; STRUCT_SIZE]) -> Result<[u8; STRUCT_SIZE]> {
        Err(MacPerfError::Unsupported("SMC user client"))
    }
}

pub fn open_smc_port() -> Result<HostSmcPort> {
    HostSmcPort::open()
}

pub async fn purge_memory() -> Result<String> {
    Err(MacPerfError::Unsupported("purge"))
}

pub async fn set_gpu_switch(_turbo: bool) -> Result<String> {
    Err(MacPerfError::Unsupported("pmset gpuswitch"))
}
