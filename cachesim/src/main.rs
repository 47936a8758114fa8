use std::path::{Path, PathBuf};
use std::time::Instant;

use cachehier::config::LayeredCacheConfig;
use cachehier::io::read_trace;
use cachehier::report::{render, OutputFormat};
use cachehier::simulator::{LayeredCacheResult, MalformedRecordPolicy, Simulator};
use clap::{Parser, ValueEnum};
use color_eyre::eyre::{self, WrapErr};
use rayon::prelude::*;
use serde::Serialize;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Format {
    Json,
    Text,
}

impl From<Format> for OutputFormat {
    fn from(value: Format) -> Self {
        match value {
            Format::Json => OutputFormat::Json,
            Format::Text => OutputFormat::Text,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulates a hierarchy of CPU caches against memory access traces")]
struct Args {
    /// JSON cache configuration
    config: PathBuf,

    /// Trace files, each simulated in parallel against its own copy of the hierarchy
    #[arg(required = true)]
    traces: Vec<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Stop at the first malformed trace record instead of skipping it
    #[arg(long)]
    strict: bool,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

#[derive(Serialize)]
struct TraceOutput<'a> {
    trace: String,
    #[serde(flatten)]
    result: &'a LayeredCacheResult,
}

fn simulate(
    config: &LayeredCacheConfig,
    trace: &Path,
    policy: MalformedRecordPolicy,
) -> eyre::Result<Simulator> {
    let mut simulator = Simulator::new(config)
        .wrap_err("invalid cache configuration")?
        .with_malformed_records(policy);
    let bytes = read_trace(trace)
        .wrap_err_with(|| format!("couldn't open the trace file at path {}", trace.display()))?;
    simulator
        .simulate(&bytes)
        .wrap_err_with(|| format!("couldn't simulate {}", trace.display()))?;
    if simulator.skipped_records() > 0 {
        log::warn!(
            "{}: skipped {} malformed records",
            trace.display(),
            simulator.skipped_records()
        );
    }
    Ok(simulator)
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();
    let start = Instant::now();
    let args = Args::parse();
    let config = LayeredCacheConfig::from_path(&args.config).wrap_err_with(|| {
        format!("couldn't load the config file at path {}", args.config.display())
    })?;
    let policy = if args.strict {
        MalformedRecordPolicy::Abort
    } else {
        MalformedRecordPolicy::Skip
    };

    // Hierarchies are independent, one per trace
    let simulators = args
        .traces
        .par_iter()
        .map(|trace| simulate(&config, trace, policy))
        .collect::<eyre::Result<Vec<_>>>()?;

    let format = OutputFormat::from(args.format);
    if let [simulator] = simulators.as_slice() {
        println!("{}", render(simulator.result(), format)?);
    } else {
        match format {
            OutputFormat::Json => {
                let outputs: Vec<_> = args
                    .traces
                    .iter()
                    .zip(&simulators)
                    .map(|(trace, simulator)| TraceOutput {
                        trace: trace.display().to_string(),
                        result: simulator.result(),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&outputs)?);
            }
            OutputFormat::Text => {
                for (trace, simulator) in args.traces.iter().zip(&simulators) {
                    println!("== {} ==", trace.display());
                    println!("{}", render(simulator.result(), format)?);
                }
            }
        }
    }

    if args.performance {
        for (trace, simulator) in args.traces.iter().zip(&simulators) {
            let simulation_time = simulator.get_execution_time();
            println!(
                "Simulation time for {}: {}s",
                trace.display(),
                simulation_time.as_nanos() as f64 / 1e9
            );
        }
        let total_time = start.elapsed();
        println!(
            "Total execution time (includes initial parsing, configuration, and output): {}s",
            total_time.as_nanos() as f64 / 1e9
        );
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        println!("Parsed input configuration: {config:?}");
        for (trace, simulator) in args.traces.iter().zip(&simulators) {
            let uninitialised_lines = simulator.get_uninitialised_line_counts();
            let formatted = config
                .caches
                .iter()
                .map(|c| c.name.as_str())
                .zip(uninitialised_lines.iter())
                .map(|(name, count)| format!("{name}: {count}"))
                .collect::<Vec<_>>()
                .join(", ");
            println!("Uninitialised cache lines by layer for {}: ({formatted})", trace.display());
            println!(
                "Total uninitialised cache lines: {}, malformed records skipped: {}",
                uninitialised_lines.iter().sum::<u64>(),
                simulator.skipped_records()
            );
        }
    }
    Ok(())
}
