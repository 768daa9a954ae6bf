// Presentation helpers for the CLI surface.

pub mod format;

pub use format::{format_bytes, format_rate};
