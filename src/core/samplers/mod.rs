//! Subprocess-based samplers.
//!
//! These spawn short-lived OS utilities, capture their text output and parse
//! semi-structured lines into typed metrics. Subprocess spawn+wait can take
//! hundreds of milliseconds, so these never run on the fast tick path, and
//! each sampler enforces its own minimum wall-clock spacing to bound
//! subprocess overhead.

pub mod powermetrics;
pub mod top;

pub use powermetrics::ThermalSample;
pub use top::TopProcess;

use std::time::{Duration, Instant};

/// Minimum wall-clock spacing gate for an expensive sampler.
///
/// A sampling tick that falls inside the window is a no-op for that sampler;
/// the first call always passes.
#[derive(Debug)]
pub struct Cooldown {
    min_interval: Duration,
    last: Option<Instant>,
}

impl Cooldown {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    /// Whether enough time has passed to run again; arms the gate when it
    /// fires.
    pub fn ready(&mut self) -> bool {
        self.ready_at(Instant::now())
    }

    pub fn ready_at(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_first_call_passes() {
        let mut cd = Cooldown::new(Duration::from_secs(5));
        assert!(cd.ready_at(Instant::now()));
    }

    #[test]
    fn test_cooldown_gates_inside_window() {
        let mut cd = Cooldown::new(Duration::from_secs(5));
        let start = Instant::now();
        assert!(cd.ready_at(start));
        assert!(!cd.ready_at(start + Duration::from_secs(1)));
        assert!(!cd.ready_at(start + Duration::from_millis(4999)));
        assert!(cd.ready_at(start + Duration::from_secs(5)));
    }

    #[test]
    fn test_cooldown_rearms_after_firing() {
        let mut cd = Cooldown::new(Duration::from_secs(3));
        let start = Instant::now();
        assert!(cd.ready_at(start));
        assert!(cd.ready_at(start + Duration::from_secs(3)));
        // Window restarts from the second firing, not the first.
        assert!(!cd.ready_at(start + Duration::from_secs(5)));
        assert!(cd.ready_at(start + Duration::from_secs(6)));
    }
}
