use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_SIZE: usize = 60;

/// One charted sample. Immutable once created; owned by its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// Unix timestamp, seconds.
    pub timestamp: i64,
    pub value: f64,
}

impl MetricPoint {
    pub fn now(value: f64) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp(),
            value,
        }
    }
}

/// Bounded, time-ordered history per tracked metric (for charting).
///
/// Insertion order is time order; on append beyond capacity the oldest
/// sample is evicted. Mutated only by the aggregator's update path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsHistory {
    capacity: usize,
    pub cpu_usage: VecDeque<MetricPoint>,
    pub memory_usage: VecDeque<MetricPoint>,
    pub gpu_usage: VecDeque<MetricPoint>,
    pub cpu_temperature: VecDeque<MetricPoint>,
    pub disk_read: VecDeque<MetricPoint>,
    pub disk_write: VecDeque<MetricPoint>,
}

impl MetricsHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            cpu_usage: VecDeque::with_capacity(capacity),
            memory_usage: VecDeque::with_capacity(capacity),
            gpu_usage: VecDeque::with_capacity(capacity),
            cpu_temperature: VecDeque::with_capacity(capacity),
            disk_read: VecDeque::with_capacity(capacity),
            disk_write: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push_cpu(&mut self, value: f64) {
        let capacity = self.capacity;
        Self::push_point(&mut self.cpu_usage, MetricPoint::now(value), capacity);
    }

    pub fn push_memory(&mut self, value: f64) {
        let capacity = self.capacity;
        Self::push_point(&mut self.memory_usage, MetricPoint::now(value), capacity);
    }

    pub fn push_gpu(&mut self, value: f64) {
        let capacity = self.capacity;
        Self::push_point(&mut self.gpu_usage, MetricPoint::now(value), capacity);
    }

    pub fn push_cpu_temperature(&mut self, value: f64) {
        let capacity = self.capacity;
        Self::push_point(&mut self.cpu_temperature, MetricPoint::now(value), capacity);
    }

    pub fn push_disk_read(&mut self, value: f64) {
        let capacity = self.capacity;
        Self::push_point(&mut self.disk_read, MetricPoint::now(value), capacity);
    }

    pub fn push_disk_write(&mut self, value: f64) {
        let capacity = self.capacity;
        Self::push_point(&mut self.disk_write, MetricPoint::now(value), capacity);
    }

    fn push_point(queue: &mut VecDeque<MetricPoint>, point: MetricPoint, capacity: usize) {
        if queue.len() >= capacity {
            queue.pop_front();
        }
        queue.push_back(point);
    }
}

impl Default for MetricsHistory {
    fn default() -> Self {
        Self::new()
    }
}
