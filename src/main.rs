use anyhow::Result;
use clap::{Arg, Command};
use colored::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use macperf::core::cleaner::CacheCleaner;
use macperf::core::smc::SmcKey;
use macperf::platform;
use macperf::ui::format_bytes;
use macperf::{MonitorRuntime, SmcClient};

fn main() -> Result<()> {
    macperf::init_logging();

    let matches = Command::new("macperf")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Hardware telemetry for macOS: SMC sensors, kernel counters, live monitor")
        .subcommand(
            Command::new("monitor")
                .about("Run the live telemetry monitor until Ctrl+C")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Emit one JSON snapshot per second instead of text")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("smc")
                .about("Talk to the system management controller directly")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("read").about("Read a 4-character key").arg(
                        Arg::new("key")
                            .help("SMC key, e.g. TC0D or F0Ac")
                            .required(true)
                            .index(1),
                    ),
                )
                .subcommand(Command::new("temp").about("Probe the CPU temperature sensors"))
                .subcommand(Command::new("fans").about("Read actual RPM for every fan"))
                .subcommand(
                    Command::new("fan-turbo")
                        .about("Switch fan 0 between automatic and a fixed high target")
                        .arg(
                            Arg::new("state")
                                .help("on or off")
                                .required(true)
                                .value_parser(["on", "off"])
                                .index(1),
                        ),
                ),
        )
        .subcommand(
            Command::new("turbo")
                .about("Toggle GPU boost via the power-management switch (needs admin)")
                .arg(
                    Arg::new("state")
                        .help("on or off")
                        .required(true)
                        .value_parser(["on", "off"])
                        .index(1),
                ),
        )
        .subcommand(Command::new("purge").about("Drop cached memory (needs admin)"))
        .subcommand(
            Command::new("clean-cache")
                .about("Clean user cache directories")
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .help("Show what would be deleted without deleting")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("monitor", sub_matches)) => handle_monitor(sub_matches.get_flag("json")),
        Some(("smc", sub_matches)) => handle_smc(sub_matches),
        Some(("turbo", sub_matches)) => {
            let enabled = sub_matches.get_one::<String>("state").unwrap() == "on";
            run_action(platform::set_gpu_switch(enabled))
        }
        Some(("purge", _)) => run_action(platform::purge_memory()),
        Some(("clean-cache", sub_matches)) => handle_clean_cache(sub_matches.get_flag("dry-run")),
        _ => {
            println!("Use 'macperf --help' for more information.");
            Ok(())
        }
    }
}

fn handle_monitor(json: bool) -> Result<()> {
    let runtime = MonitorRuntime::start()?;

    let running = Arc::new(AtomicBool::new(true));
    let running_for_handler = running.clone();
    ctrlc::set_handler(move || {
        running_for_handler.store(false, Ordering::SeqCst);
    })?;

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_secs(1));
        let snapshot = runtime.snapshot();

        if json {
            println!("{}", serde_json::to_string(snapshot.as_ref())?);
            continue;
        }

        let fans = if snapshot.fan_speeds.is_empty() {
            "-".to_string()
        } else {
            snapshot
                .fan_speeds
                .iter()
                .map(|rpm| format!("{} rpm", rpm))
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!(
            "{} {:5.1}%  {} {:5.1}% ({} / {})  {} {:3.0}%  {} {:4.1}°C  {} {}  {} R {} W {}",
            "CPU".cyan().bold(),
            snapshot.cpu_usage,
            "RAM".cyan().bold(),
            snapshot.memory_usage,
            snapshot.memory_used,
            snapshot.memory_total,
            "GPU".cyan().bold(),
            snapshot.gpu_usage,
            "Temp".cyan().bold(),
            snapshot.cpu_temperature,
            "Fan".cyan().bold(),
            fans,
            "Disk".cyan().bold(),
            snapshot.disk_read_rate,
            snapshot.disk_write_rate,
        );

        if !snapshot.top_cpu.is_empty() {
            let top = snapshot
                .top_cpu
                .iter()
                .map(|p| format!("{} {:.1}%", p.name, p.percent))
                .collect::<Vec<_>>()
                .join("  ");
            println!("  {} {}", "top:".dimmed(), top.dimmed());
        }
    }

    runtime.shutdown();
    Ok(())
}

fn handle_smc(matches: &clap::ArgMatches) -> Result<()> {
    let port = platform::open_smc_port()?;
    let mut client = SmcClient::new(port);

    match matches.subcommand() {
        Some(("read", sub_matches)) => {
            let name = sub_matches.get_one::<String>("key").unwrap();
            let key: SmcKey = name.parse()?;
            let value = client.read_key(key)?;
            println!("{} = {}", name.cyan().bold(), value);
        }
        Some(("temp", _)) => match client.cpu_temperature() {
            Some(temp) => println!("CPU temperature: {}", format!("{:.1} °C", temp).yellow()),
            None => println!("{}", "No plausible CPU temperature sensor found.".yellow()),
        },
        Some(("fans", _)) => {
            let speeds = client.fan_speeds();
            if speeds.is_empty() {
                println!("{}", "No fans reported by the controller.".yellow());
            } else {
                for (i, rpm) in speeds.iter().enumerate() {
                    println!("Fan {}: {}", i, format!("{} rpm", rpm).yellow());
                }
            }
        }
        Some(("fan-turbo", sub_matches)) => {
            let enabled = sub_matches.get_one::<String>("state").unwrap() == "on";
            client.set_fan_turbo(enabled)?;
            println!(
                "Fan 0 set to {}.",
                if enabled { "manual high target" } else { "automatic" }
            );
        }
        _ => unreachable!(),
    }
    Ok(())
}

fn run_action(action: impl std::future::Future<Output = macperf::Result<String>>) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    match runtime.block_on(action) {
        Ok(message) => {
            println!("{}", message.green());
            Ok(())
        }
        Err(e) => {
            println!("{}", e.to_string().red());
            Ok(())
        }
    }
}

fn handle_clean_cache(dry_run: bool) -> Result<()> {
    let cleaner = CacheCleaner::new();
    if cleaner.directories.is_empty() {
        println!("{}", "No cache directories found.".yellow());
        return Ok(());
    }

    if dry_run {
        println!("{}", "DRY RUN MODE - No files will be deleted".yellow().bold());
    }
    println!("{}", "Directories to clean:".white().bold());
    for dir in &cleaner.directories {
        println!("  {}", dir.display().to_string().cyan());
    }

    let stats = cleaner.clean(dry_run, |_, _| {})?;
    println!();
    if dry_run {
        println!(
            "{} {} files, {}",
            "Would delete:".white(),
            stats.deleted_files.to_string().yellow().bold(),
            format_bytes(stats.deleted_size).yellow().bold()
        );
    } else {
        println!(
            "{} {} files, {}",
            "Deleted:".green().bold(),
            stats.deleted_files.to_string().yellow().bold(),
            format_bytes(stats.deleted_size).yellow().bold()
        );
        if stats.failed_files > 0 {
            println!(
                "{} {} files (in use or protected)",
                "Failed:".red().bold(),
                stats.failed_files
            );
        }
    }
    Ok(())
}
