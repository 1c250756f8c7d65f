mod report;

use std::path::PathBuf;
use std::time::Instant;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracecache::config::{parse_memory_size, CacheConfig, ReplacementPolicyConfig};
use tracecache::io::open_trace;
use tracecache::simulator::Simulator;
use crate::report::Report;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Replays memory access traces against a set-associative cache"))]
struct Args {
    /// Trace file to simulate, repeat for several. Each file gets a fresh cache
    #[arg(short = 'f', long = "file", required = true)]
    files: Vec<PathBuf>,

    /// Cache size in KB
    #[arg(short = 's', long = "cache-size")]
    cache_size: u64,

    /// Block size in bytes
    #[arg(short = 'b', long = "block-size")]
    block_size: u64,

    #[arg(short = 'a', long)]
    associativity: u64,

    #[arg(short = 'r', long = "replacement", value_enum, ignore_case = true)]
    replacement_policy: ReplacementPolicyConfig,

    /// Physical memory size, e.g. 512MB or 4GB
    #[arg(short = 'p', long = "physical-memory", value_parser = parse_memory_size)]
    physical_memory: u64,

    /// Seed for random replacement, runs with the same seed are reproducible
    #[arg(long)]
    seed: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    #[arg(long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();
    let default_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();
    let config = CacheConfig::from_kilobytes(
        args.cache_size,
        args.block_size,
        args.associativity,
        args.replacement_policy,
        args.physical_memory,
    ).map_err(|e| format!("Invalid cache configuration: {e}"))?;
    // Rejects a bad geometry before any trace is opened
    config.geometry().map_err(|e| format!("Invalid cache configuration: {e}"))?;
    for (i, trace) in args.files.iter().enumerate() {
        let mut simulator = Simulator::new(&config, args.seed).map_err(|e| format!("Invalid cache configuration: {e}"))?;
        let trace_reader = open_trace(trace)?;
        simulator.simulate(trace_reader).map_err(|e| format!("Couldn't simulate {}: {e}", trace.display()))?;
        let report = Report::new(trace, &config, &simulator);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report).map_err(|e| format!("Couldn't serialise the output {e}"))?);
        } else {
            if i > 0 {
                println!();
            }
            print!("{report}");
        }
        if args.performance {
            println!("Simulation time: {}s", simulator.get_execution_time().as_nanos() as f64 / 1e9);
        }
        if args.debug {
            eprintln!("Malformed trace lines skipped: {}", simulator.skipped_lines());
            eprintln!("Uninitialised cache lines: {}", simulator.get_uninitialised_line_count());
        }
    }
    if args.performance {
        let total_time = Instant::now() - start;
        println!("Total execution time (includes initial parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        eprintln!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
    }
    Ok(())
}
