//! Thermal/fan sampling through the `powermetrics` diagnostic utility.
//!
//! `powermetrics` needs root, so it is invoked through `sudo`; a missing
//! binary, a refused sudo prompt or a non-zero exit all degrade to "no data"
//! rather than an error, and the sampler is retried at its own cooldown.

use tokio::process::Command;

/// One thermal sample from the controller-class sensors.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalSample {
    pub cpu_temp: f64,
    /// One entry per fan line, in output order.
    pub fan_speeds: Vec<u32>,
    pub gpu_temp: Option<f64>,
}

const POWERMETRICS: &str = "/usr/bin/powermetrics";

/// Run one sample of the SMC sampler class and parse it.
pub async fn sample() -> Option<ThermalSample> {
    let output = Command::new("/usr/bin/sudo")
        .args(["-n", POWERMETRICS, "-n", "1", "--samplers", "smc"])
        .output()
        .await;

    let output = match output {
        Ok(out) => out,
        Err(e) => {
            log::debug!("powermetrics unavailable: {}", e);
            return None;
        }
    };
    if !output.status.success() {
        log::debug!("powermetrics exited with {}", output.status);
        return None;
    }

    parse(&String::from_utf8_lossy(&output.stdout))
}

/// Extract the first numeric token after the colon, stripping a known unit
/// suffix. Returns `None` for lines without a colon or a parseable number.
fn numeric_after_colon(line: &str, suffix: &str) -> Option<f64> {
    let (_, rest) = line.split_once(':')?;
    let token = rest.trim().trim_end_matches(suffix).trim();
    token.parse().ok()
}

/// Parse `powermetrics --samplers smc` output.
///
/// A sample without a positive CPU die temperature is discarded entirely,
/// even when fan lines parsed; callers must be able to distinguish "no
/// sample" from a zero-value one.
pub fn parse(output: &str) -> Option<ThermalSample> {
    let mut cpu_temp = 0.0;
    let mut fan_speeds = Vec::new();
    let mut gpu_temp = None;

    for line in output.lines() {
        if line.contains("CPU die temperature:") {
            cpu_temp = numeric_after_colon(line, " C").unwrap_or(0.0);
        } else if line.contains("GPU die temperature:") {
            gpu_temp = numeric_after_colon(line, " C");
        } else if line.contains("Fan:") || line.trim_start().starts_with("Fan") {
            // "Fan: 1234 rpm" or "Fan 0: 1234 rpm"
            if let Some(rpm) = numeric_after_colon(line, " rpm") {
                fan_speeds.push(rpm.floor().max(0.0) as u32);
            }
        }
    }

    if cpu_temp > 0.0 {
        Some(ThermalSample {
            cpu_temp,
            fan_speeds,
            gpu_temp,
        })
    } else {
        None
    }
}
