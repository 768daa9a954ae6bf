// macperf library - public API

// Re-export error types
pub mod error;
pub use error::{MacPerfError, Result};

// Module declarations
pub mod core;
pub mod platform;
pub mod ui;

// Re-export commonly used types
pub use crate::core::monitor::{MonitorCommand, MonitorRuntime, TelemetrySnapshot};
pub use crate::core::smc::{SmcClient, SmcKey, SmcPort};

// Initialize logging
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}
