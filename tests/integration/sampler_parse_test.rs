use macperf::core::samplers::{powermetrics, top};

const POWERMETRICS_OUTPUT: &str = "\
Machine model: MacBookPro15,1
SMC sampler output:

**** SMC sensors ****

CPU Thermal level: 42
GPU Thermal level: 0
IO Thermal level: 0
Fan: 2167.43 rpm
CPU die temperature: 62.55 C
GPU die temperature: 54.12 C
CPU Plimit: 0.00
GPU Plimit (Int): 0.00
Number of prochots: 0
";

#[test]
fn test_powermetrics_full_sample() {
    let sample = powermetrics::parse(POWERMETRICS_OUTPUT).unwrap();
    assert_eq!(sample.cpu_temp, 62.55);
    assert_eq!(sample.gpu_temp, Some(54.12));
    assert_eq!(sample.fan_speeds, vec![2167]);
}

#[test]
fn test_powermetrics_without_cpu_temp_is_discarded() {
    // A fan reading alone does not make a usable sample.
    let output = "Fan: 2167.43 rpm\nGPU die temperature: 54.12 C\n";
    assert!(powermetrics::parse(output).is_none());
}

#[test]
fn test_powermetrics_fanless_sample() {
    let output = "CPU die temperature: 48.02 C\n";
    let sample = powermetrics::parse(output).unwrap();
    assert_eq!(sample.cpu_temp, 48.02);
    assert!(sample.fan_speeds.is_empty());
    assert_eq!(sample.gpu_temp, None);
}

const PS_CPU_OUTPUT: &str = "\
 %CPU COMM
 42.7 WindowServer
 12.3 Safari
  8.0 Google Chrome Helper
  1.1 mds
";

#[test]
fn test_ps_output_truncated_to_limit() {
    let procs = top::parse(PS_CPU_OUTPUT, 3);
    assert_eq!(procs.len(), 3);
    assert_eq!(procs[0].name, "WindowServer");
    assert_eq!(procs[0].percent, 42.7);
    // Process names may contain spaces.
    assert_eq!(procs[2].name, "Google Chrome Helper");
    assert_eq!(procs[2].percent, 8.0);
}

#[test]
fn test_ps_header_and_blank_lines_skipped() {
    let procs = top::parse(" %MEM COMM\n\n  5.5 kernel_task\n", 3);
    assert_eq!(procs.len(), 1);
    assert_eq!(procs[0].name, "kernel_task");
}

#[test]
fn test_ps_empty_output() {
    assert!(top::parse("", 3).is_empty());
    assert!(top::parse(" %CPU COMM\n", 3).is_empty());
}
