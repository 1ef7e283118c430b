use anyhow::{Context, Result};
use clap::Parser;
use tg_core::{Pipeline, PipelineConfig};
use tracing_subscriber::EnvFilter;

use tg_cli::{Cli, Config, EXAMPLE_CONFIG, plugins};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    if cli.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    let mut config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(input) = cli.input {
        config.input_file = Some(input);
    }
    if let Some(output) = cli.output {
        config.output_file = Some(output);
    }
    if let Some(max_events) = cli.max_events {
        config.max_events = max_events;
    }
    if let Some(start_time_ms) = cli.start_time_ms {
        config.start_time_ms = start_time_ms;
    }
    tracing::debug!(?config, "loaded configuration");

    // Handlers are registered before the source is built so the source
    // can be filtered down to the channels they care about.
    let registry = plugins::build_registry(&config)?;
    let source = plugins::build_source(&config)?;
    let sinks = plugins::build_sinks(&config)?;

    let mut pipeline = Pipeline::new(
        registry,
        source,
        sinks,
        PipelineConfig {
            start_offset: config.start_offset(),
            max_events: config.max_events,
        },
    );
    if cli.progress {
        pipeline = pipeline.with_progress(Box::new(|progress| {
            tracing::info!(
                event = progress.processed,
                dispatched = progress.dispatched,
                channel = progress.channel,
                "processed event"
            );
        }));
    }

    let tiers = pipeline.run()?;
    tracing::info!(tiers = tiers.len(), "run complete");
    Ok(())
}
