use std::time::{Duration, Instant};

use macperf::core::kernel::{CpuTicks, CpuUsageTracker, DiskRates, MemoryStats};
use macperf::core::monitor::{Aggregator, FastSample, IssueClock, SourcePayload, SourceUpdate};
use macperf::core::samplers::{Cooldown, ThermalSample};

fn fast(seq: u64, cpu: f64) -> SourceUpdate {
    SourceUpdate {
        seq,
        payload: SourcePayload::Fast(FastSample {
            cpu_usage: Some(cpu),
            ..Default::default()
        }),
    }
}

fn thermal(seq: u64, temp: f64) -> SourceUpdate {
    SourceUpdate {
        seq,
        payload: SourcePayload::Thermal(ThermalSample {
            cpu_temp: temp,
            fan_speeds: vec![2100],
            gpu_temp: None,
        }),
    }
}

/// Ten one-second ticks: the fast source lands every tick, the thermal
/// sampler only when its five-second cooldown allows. Both draw stamps
/// from the same clock.
#[test]
fn test_fast_updates_every_tick_thermal_on_cooldown() {
    let mut agg = Aggregator::new();
    let clock = IssueClock::new();
    let mut thermal_gate = Cooldown::new(Duration::from_secs(5));
    let start = Instant::now();
    let mut thermal_runs = 0u64;

    for tick in 0..10u64 {
        let now = start + Duration::from_secs(tick);
        agg.apply(fast(clock.next(), tick as f64));
        if thermal_gate.ready_at(now) {
            thermal_runs += 1;
            agg.apply(thermal(clock.next(), 60.0 + thermal_runs as f64));
        }
    }

    let snap = agg.snapshot();
    assert_eq!(snap.history.cpu_usage.len(), 10);
    // Thermal ran at t=0 and t=5 only.
    assert_eq!(thermal_runs, 2);
    assert_eq!(snap.cpu_temperature, 62.0);
    assert_eq!(snap.history.cpu_temperature.len(), 2);
}

/// The SMC fast read and the thermal subprocess both report CPU
/// temperature and fans; ordering for those fields holds across the two
/// producers, not just within each one.
#[test]
fn test_thermal_issued_before_smc_reading_does_not_overwrite() {
    let mut agg = Aggregator::new();
    let clock = IssueClock::new();

    let thermal_seq = clock.next(); // thermal pass starts, then stalls
    let fast_seq = clock.next();

    agg.apply(SourceUpdate {
        seq: fast_seq,
        payload: SourcePayload::Fast(FastSample {
            smc_cpu_temperature: Some(50.0),
            smc_fan_speeds: Some(vec![2000]),
            ..Default::default()
        }),
    });
    // The stalled thermal run finally completes with older readings.
    agg.apply(thermal(thermal_seq, 48.0));

    let snap = agg.snapshot();
    assert_eq!(snap.cpu_temperature, 50.0);
    assert_eq!(snap.fan_speeds, vec![2000]);
    assert_eq!(snap.history.cpu_temperature.len(), 1);
}

/// A slow subprocess completion issued before the latest applied one must
/// not roll published state backwards.
#[test]
fn test_late_completion_never_overwrites_newer_state() {
    let mut agg = Aggregator::new();
    assert!(agg.apply(thermal(1, 60.0)));
    assert!(agg.apply(thermal(3, 70.0)));
    // The seq-2 run stalled in the subprocess and finishes last.
    assert!(!agg.apply(thermal(2, 65.0)));

    assert_eq!(agg.snapshot().cpu_temperature, 70.0);
    assert_eq!(agg.snapshot().history.cpu_temperature.len(), 2);
}

/// First observation of the cumulative counters yields no rate; the second
/// yields the delta over the elapsed window.
#[test]
fn test_counter_baselines_defer_first_sample() {
    let mut cpu = CpuUsageTracker::new();
    assert!(cpu
        .observe(CpuTicks {
            user: 100,
            system: 50,
            idle: 850,
            nice: 0,
        })
        .is_none());
    let usage = cpu
        .observe(CpuTicks {
            user: 130,
            system: 60,
            idle: 900,
            nice: 0,
        })
        .unwrap();
    assert!((usage - 44.44).abs() < 0.01);
}

#[test]
fn test_full_fast_sample_updates_everything_atomically() {
    let mut agg = Aggregator::new();
    agg.apply(SourceUpdate {
        seq: 1,
        payload: SourcePayload::Fast(FastSample {
            cpu_usage: Some(25.0),
            memory: Some(MemoryStats {
                active_bytes: 4 << 30,
                wired_bytes: 4 << 30,
                total_bytes: 32 << 30,
            }),
            disk: Some(DiskRates {
                read_bytes_per_sec: 1_048_576.0,
                write_bytes_per_sec: 0.0,
            }),
            gpu_usage: Some(15.0),
            smc_cpu_temperature: Some(55.0),
            smc_fan_speeds: Some(vec![1800, 1900]),
        }),
    });

    let snap = agg.snapshot();
    assert_eq!(snap.cpu_usage, 25.0);
    assert_eq!(snap.memory_usage, 25.0);
    assert_eq!(snap.gpu_usage, 15.0);
    assert_eq!(snap.cpu_temperature, 55.0);
    assert_eq!(snap.fan_speeds, vec![1800, 1900]);
    assert_eq!(snap.disk_read_bps, 1_048_576.0);
    assert!(snap.disk_read_rate.ends_with("/s"));
    for history in [
        &snap.history.cpu_usage,
        &snap.history.memory_usage,
        &snap.history.gpu_usage,
        &snap.history.cpu_temperature,
        &snap.history.disk_read,
        &snap.history.disk_write,
    ] {
        assert_eq!(history.len(), 1);
    }
}
