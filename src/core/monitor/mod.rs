//! Telemetry aggregate: scheduler, single-writer state and bounded
//! histories.

pub mod aggregate;
pub mod history;
pub mod runtime;
pub mod snapshot;
pub mod tasks;

pub use aggregate::{Aggregator, FastSample, IssueClock, SourcePayload, SourceUpdate};
pub use history::{MetricPoint, MetricsHistory, DEFAULT_HISTORY_SIZE};
pub use runtime::{MonitorCommand, MonitorRuntime};
pub use snapshot::{ActionOutcome, TelemetrySnapshot};
