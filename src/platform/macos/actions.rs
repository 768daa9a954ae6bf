//! One-shot privileged actions: thin wrappers over OS facilities.
//!
//! Fire-and-forget from the monitor's perspective; the outcome text flows
//! back through the published state.

use tokio::process::Command;

use crate::error::{MacPerfError, Result};

async fn run_privileged_shell(command: &str) -> Result<()> {
    let script = format!(
        "do shell script \"{}\" with administrator privileges",
        command
    );
    let output = Command::new("/usr/bin/osascript")
        .args(["-e", &script])
        .output()
        .await?;
    if output.status.success() {
        Ok(())
    } else {
        Err(MacPerfError::subprocess_unavailable(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ))
    }
}

/// Drop cached/inactive memory via `purge`.
pub async fn purge_memory() -> Result<String> {
    run_privileged_shell("purge").await?;
    Ok("Memory purged successfully.".to_string())
}

/// Flip the power-management GPU switch: `2` restores automatic switching
/// (boost allowed), `0` pins the integrated GPU (low power).
pub async fn set_gpu_switch(turbo: bool) -> Result<String> {
    let arg = if turbo { "2" } else { "0" };
    run_privileged_shell(&format!("pmset -a gpuswitch {}", arg)).await?;
    Ok(format!(
        "GPU switching set to {}.",
        if turbo { "automatic" } else { "integrated only" }
    ))
}
