use humansize::{format_size, BINARY};

/// Format a byte count in human-readable binary units (KiB, MiB, ...).
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, BINARY)
}

/// Format an instantaneous throughput as bytes per second.
pub fn format_rate(bytes_per_sec: f64) -> String {
    let clamped = bytes_per_sec.max(0.0) as u64;
    format!("{}/s", format_size(clamped, BINARY))
}
