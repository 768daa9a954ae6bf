use std::time::Duration;

use macperf::MonitorRuntime;

#[test]
fn test_runtime_starts_and_publishes_default_snapshot() {
    let runtime = MonitorRuntime::start().unwrap();
    let snapshot = runtime.snapshot();
    // Before any source lands, the published state is the neutral default.
    assert!(snapshot.cpu_usage >= 0.0);
    assert_eq!(snapshot.disk_read_rate, "0 B/s");
    runtime.shutdown();
}

#[test]
fn test_turbo_command_flips_published_flag() {
    let runtime = MonitorRuntime::start().unwrap();
    assert!(!runtime.snapshot().turbo_mode);

    runtime.set_turbo(true);
    // The optimistic flip is applied by the orchestrator task; poll briefly.
    let mut flipped = false;
    for _ in 0..50 {
        if runtime.snapshot().turbo_mode {
            flipped = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    assert!(flipped);
    runtime.shutdown();
}

#[test]
fn test_shutdown_is_idempotent_per_runtime() {
    // Two independent runtimes can coexist and stop cleanly.
    let a = MonitorRuntime::start().unwrap();
    let b = MonitorRuntime::start().unwrap();
    a.shutdown();
    b.shutdown();
}
