use serde::{Deserialize, Serialize};

use crate::core::samplers::TopProcess;

use super::history::MetricsHistory;

/// Outcome of a one-shot privileged action, reported asynchronously.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
}

/// Complete published telemetry state: current values plus bounded
/// histories.
///
/// Read-only from the consumer's perspective; only the aggregator writes
/// it, and current value plus matching history for a metric always change
/// together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Unix timestamp of the last applied update.
    pub timestamp: i64,

    pub cpu_usage: f64,

    pub memory_usage: f64,
    pub memory_used: String,
    pub memory_total: String,

    pub gpu_usage: f64,

    pub cpu_temperature: f64,
    pub gpu_temperature: Option<f64>,
    /// One entry per physical fan, order-stable across reads.
    pub fan_speeds: Vec<u32>,

    pub disk_read_bps: f64,
    pub disk_write_bps: f64,
    pub disk_read_rate: String,
    pub disk_write_rate: String,

    /// Optimistically flipped when the toggle action is dispatched.
    pub turbo_mode: bool,

    pub top_cpu: Vec<TopProcess>,
    pub top_memory: Vec<TopProcess>,

    pub last_action: Option<ActionOutcome>,

    pub history: MetricsHistory,
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            timestamp: 0,
            cpu_usage: 0.0,
            memory_usage: 0.0,
            memory_used: String::new(),
            memory_total: String::new(),
            gpu_usage: 0.0,
            cpu_temperature: 0.0,
            gpu_temperature: None,
            fan_speeds: Vec::new(),
            disk_read_bps: 0.0,
            disk_write_bps: 0.0,
            disk_read_rate: "0 B/s".to_string(),
            disk_write_rate: "0 B/s".to_string(),
            turbo_mode: false,
            top_cpu: Vec::new(),
            top_memory: Vec::new(),
            last_action: None,
            history: MetricsHistory::new(),
        }
    }
}
