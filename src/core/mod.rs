//! Telemetry acquisition core.
//!
//! Leaves first: the SMC byte-protocol client, the kernel statistics
//! reader and the subprocess samplers produce typed samples; the monitor
//! coordinates them and owns the published state.

pub mod cleaner;
pub mod kernel;
pub mod monitor;
pub mod samplers;
pub mod smc;
