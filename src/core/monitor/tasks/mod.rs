//! Async sampling tasks.
//!
//! The fast task polls synchronous kernel/SMC sources every second; the
//! subprocess-backed tasks run on their own cadence and never block the
//! fast path.

mod fast;
mod thermal;
mod top_consumers;

pub use fast::fast_task;
pub use thermal::thermal_task;
pub use top_consumers::top_consumers_task;
