// Platform-specific code module

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "macos")]
pub use macos::{open_smc_port, purge_memory, set_gpu_switch, HostKernelSource, HostSmcPort};

#[cfg(not(target_os = "macos"))]
pub mod fallback;

#[cfg(not(target_os = "macos"))]
pub use fallback::{open_smc_port, purge_memory, set_gpu_switch, HostKernelSource, HostSmcPort};
