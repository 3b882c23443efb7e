//! # Pilot Control
//!
//! Runs the control core against a JSON-lines stream of tick inputs and
//! writes one JSON-lines actuator command per tick.
//!
//! ```text
//! pilot_control --config config/pilot.toml --input drive.jsonl --output commands.jsonl
//! ```
//!
//! With `--realtime` the loop is paced at the configured tick period and the
//! RT setup (memory lock, affinity, SCHED_FIFO) runs first; without it the
//! recording is replayed as fast as possible.

use clap::Parser;
use pilot_common::config::LogLevel;
use pilot_common::consts::DEFAULT_CONFIG_PATH;
use pilot_control::config::{ConfigRefresher, ConfigSnapshot, load_config};
use pilot_control::cycle::{ControlsCore, CycleRunner, Pacing, rt_setup};
use pilot_control::ingest::JsonLinesSource;
use pilot_control::publish::JsonLinesSink;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Pilot control core: engagement, longitudinal and lateral control
#[derive(Parser, Debug)]
#[command(name = "pilot_control")]
#[command(version)]
#[command(about = "Supervisory fixed-tick control core driven by a recorded input stream")]
struct Args {
    /// Path to the controls configuration TOML.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// JSON-lines tick inputs ("-" for stdin).
    #[arg(long, default_value = "-")]
    input: String,

    /// JSON-lines actuator output (stdout when omitted).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Pace ticks at the configured period and apply RT setup.
    #[arg(long)]
    realtime: bool,

    /// CPU core to pin the loop to in realtime mode.
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority in realtime mode.
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let config = load_config(&args.config);

    let level = match &config {
        _ if args.verbose => LogLevel::Debug,
        Ok(snapshot) => snapshot.config().shared.log_level,
        Err(_) => LogLevel::Info,
    };
    setup_tracing(level, args.json);

    info!("pilot_control v{} starting", env!("CARGO_PKG_VERSION"));

    let result = config
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|snapshot| run(&args, snapshot));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("pilot_control shutdown complete");
}

fn run(args: &Args, snapshot: ConfigSnapshot) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = snapshot.config();
    info!(
        service = %cfg.shared.service_name,
        controller = %cfg.lateral.controller,
        tick_period_us = cfg.timing.tick_period_us,
        "config OK"
    );
    let refresh_ticks = cfg.timing.refresh_interval_ticks;

    let reader: Box<dyn BufRead> = if args.input == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        Box::new(BufReader::new(File::open(&args.input)?))
    };
    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let core = ControlsCore::new(snapshot)?;
    let mut runner = CycleRunner::new(core, JsonLinesSource::new(reader), JsonLinesSink::new(writer));
    if refresh_ticks > 0 {
        runner = runner.with_refresher(ConfigRefresher::new(&args.config, refresh_ticks));
    }
    if args.realtime {
        rt_setup(args.cpu_core, args.rt_priority)?;
        runner = runner.with_pacing(Pacing::Realtime);
    }

    let running = runner.running_flag();
    ctrlc::set_handler(move || {
        info!("received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    runner.run()?;

    if let Some(report) = runner.last_report() {
        info!(
            ticks = report.tick,
            state = ?report.engagement,
            generation = report.config_generation,
            "replay finished"
        );
    }
    Ok(())
}

fn setup_tracing(level: LogLevel, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    // Logs go to stderr; stdout may carry the actuator stream.
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .compact()
            .init();
    }
}
