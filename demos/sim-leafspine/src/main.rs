// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Simulate a client streaming packets to a server across a leaf-spine
//! fabric.
//!
//! The three link parameters are mandatory. For example, run using:
//!   cargo run --bin sim-leafspine -- --bandwidth 10Mbps --delay 2ms
//! --queue 100 --stdout --stdout-level debug

use anyhow::{Result, anyhow};
use byte_unit::{Byte, UnitType};
use clap::Parser;
use sim_leafspine::{ScenarioConfig, ScenarioSummary, run_scenario};
use spur_track::Tracker;
use spur_track::builder::{TrackerConfig, TrackersConfig, setup_trackers};

/// Command-line arguments.
#[derive(Parser)]
#[command(about = "Simulate a client/server exchange across a leaf-spine fabric")]
struct Cli {
    /// Link bandwidth, e.g. "10Mbps". Required.
    #[arg(long, default_value = "")]
    bandwidth: String,

    /// Link propagation delay, e.g. "2ms". Required.
    #[arg(long, default_value = "")]
    delay: String,

    /// Link queue capacity in packets, e.g. "100". Required.
    #[arg(long, default_value = "")]
    queue: String,

    /// Number of leaf switches.
    #[arg(long, default_value = "4")]
    num_leaves: usize,

    /// Number of spine switches.
    #[arg(long, default_value = "2")]
    num_spines: usize,

    /// Simulated duration in seconds.
    #[arg(long, default_value = "3600")]
    duration_s: f64,

    /// Payload bytes per packet.
    #[arg(long, default_value = "1200")]
    payload_bytes: usize,

    /// Enable logging to the console.
    #[arg(long, default_value = "false")]
    stdout: bool,

    /// Level of log message to display.
    #[arg(long, default_value = "Info")]
    stdout_level: log::Level,

    /// Set a regular expression for which entites should have logging level set
    /// to `--stdout-level`. Others will have level set to `Error`.
    #[arg(long, default_value = "")]
    stdout_filter_regex: String,
}

fn setup_all_trackers(args: &Cli) -> Result<Tracker> {
    let config = TrackersConfig {
        stdout: TrackerConfig {
            enable: args.stdout,
            level: args.stdout_level,
            filter_regex: &args.stdout_filter_regex,
        },
    };
    setup_trackers(&config).map_err(|e| anyhow!(e.0))
}

fn print_summary(summary: &ScenarioSummary) {
    let duration_s = summary.simulated_ns / 1e9;
    let received =
        Byte::from_u64(summary.bytes_received as u64).get_appropriate_unit(UnitType::Decimal);
    println!("Simulated {duration_s:.3}s");
    println!("Client sent {} packets", summary.packets_sent);
    println!(
        "Server received {} packets ({received:.2})",
        summary.packets_received
    );
    if duration_s > 0.0 {
        let per_second = Byte::from_u64((summary.bytes_received as f64 / duration_s) as u64)
            .get_appropriate_unit(UnitType::Decimal);
        println!("Goodput {per_second:.2}/s");
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let tracker = setup_all_trackers(&args)?;

    let config = ScenarioConfig {
        num_leaves: args.num_leaves,
        num_spines: args.num_spines,
        bandwidth: args.bandwidth,
        delay: args.delay,
        queue: args.queue,
        payload_bytes: args.payload_bytes,
        duration_s: args.duration_s,
    };

    let summary = run_scenario(&config, &tracker)?;
    print_summary(&summary);
    Ok(())
}
