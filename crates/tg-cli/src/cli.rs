//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

/// Annotation generator.
///
/// Reads a recorded event stream, routes events to configured handlers,
/// and writes the merged annotation tiers through the configured outputs.
#[derive(Debug, Parser)]
#[command(name = "tiergen", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Input recording file. Overrides `input_file` from config.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file. Overrides `output_file` from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Stop after this many matched events (<= 0 means unbounded).
    /// Overrides `max_events` from config.
    #[arg(long)]
    pub max_events: Option<i64>,

    /// Recording start time in milliseconds, subtracted from all
    /// annotation timestamps. Overrides `start_time_ms` from config.
    #[arg(long)]
    pub start_time_ms: Option<f64>,

    /// Print an example config file and exit.
    #[arg(short = 'p', long)]
    pub print_config: bool,

    /// Log per-event progress.
    #[arg(long)]
    pub progress: bool,
}
