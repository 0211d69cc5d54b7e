//! CLI entrypoint for the slabtier batch demo.

use std::process::ExitCode;

use clap::Parser;
use slabtier_harness::{BatchConfig, BatchReport, ReleaseOrder, run_batch};

/// Batch allocation smoke demo for the slabtier allocator.
#[derive(Debug, Parser)]
#[command(name = "slabtier-demo")]
#[command(about = "Allocate, fill, verify, and release a batch of tiered buffers")]
struct Cli {
    /// Number of buffers to allocate (the default fills all three tiers).
    #[arg(long, default_value_t = 30)]
    count: usize,
    /// Payload size in bytes for every buffer.
    #[arg(long, default_value_t = 20)]
    payload_len: usize,
    /// Order in which buffers are released.
    #[arg(long, value_enum, default_value_t = ReleaseOrder::Forward)]
    release_order: ReleaseOrder,
    /// Emit the report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn print_text(report: &BatchReport) {
    println!(
        "batch ok: {} buffers of {} bytes, released {} ({} overflowed to a larger tier)",
        report.count, report.payload_len, report.release_order, report.overflow_allocations
    );
    for tier in &report.tiers {
        println!(
            "  {:<6} served {:>2} blocks, {}/{} free after release",
            tier.tier, tier.blocks_served, tier.free_after_release, tier.block_capacity
        );
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = BatchConfig {
        count: cli.count,
        payload_len: cli.payload_len,
        order: cli.release_order,
    };

    match run_batch(&config) {
        Ok(report) => {
            if cli.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(err) => {
                        eprintln!("report serialization failed: {err}");
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                print_text(&report);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("batch failed: {err}");
            ExitCode::FAILURE
        }
    }
}
