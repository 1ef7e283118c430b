//! The processing pipeline: dispatch loop, compaction, output chain.

use chrono::TimeDelta;

use crate::compact::compact_tiers;
use crate::error::{PipelineError, Role, SetupFailure, SetupFailures};
use crate::interval::TierMap;
use crate::registry::HandlerRegistry;
use crate::sink::OutputSink;
use crate::source::EventSource;

/// Pipeline tuning knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Time elapsed before the recording's logical zero point; subtracted
    /// from every interval bound after merging.
    pub start_offset: TimeDelta,

    /// Stop after this many events were dispatched to at least one
    /// handler. Zero or negative means unbounded.
    pub max_events: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            start_offset: TimeDelta::zero(),
            max_events: 0,
        }
    }
}

/// Progress report for one dispatched event.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    /// Events dispatched to at least one handler so far.
    pub dispatched: u64,
    /// Events pulled from the source so far, matched or not.
    pub processed: u64,
    /// Canonical channel of the current event.
    pub channel: &'a str,
}

/// Callback invoked after each dispatched event. No-op unless installed
/// via [`Pipeline::with_progress`].
pub type ProgressFn = Box<dyn FnMut(&Progress<'_>)>;

/// What the dispatch loop learned about the stream.
struct DispatchOutcome {
    /// Timestamp of the most recently processed event, matched or not.
    /// Compaction borrows it to backfill open-ended intervals.
    last_event_time: Option<TimeDelta>,
}

/// Wires registry, source, and sinks into one run.
///
/// The registry must be fully populated before construction: the union of
/// its handler patterns becomes the source's channel filter, so the
/// source does not waste work on channels no handler wants.
pub struct Pipeline {
    registry: HandlerRegistry,
    source: Box<dyn EventSource>,
    sinks: Vec<Box<dyn OutputSink>>,
    config: PipelineConfig,
    progress: Option<ProgressFn>,
}

impl Pipeline {
    pub fn new(
        registry: HandlerRegistry,
        mut source: Box<dyn EventSource>,
        sinks: Vec<Box<dyn OutputSink>>,
        config: PipelineConfig,
    ) -> Self {
        source.apply_channel_filter(&registry.patterns());
        Self {
            registry,
            source,
            sinks,
            config,
            progress: None,
        }
    }

    /// Installs a progress callback.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Asks every collaborator to self-check its configuration.
    ///
    /// All failures are collected and reported together; on any failure
    /// the run must not process a single event.
    pub fn validate_setup(&self) -> Result<(), SetupFailures> {
        let mut failures = Vec::new();

        if let Err(error) = self.source.validate_setup() {
            failures.push(SetupFailure {
                role: Role::Source,
                name: self.source.name().to_string(),
                error,
            });
        }
        for handler in self.registry.handlers() {
            if let Err(error) = handler.validate_setup() {
                failures.push(SetupFailure {
                    role: Role::Handler,
                    name: handler.name().to_string(),
                    error,
                });
            }
        }
        for sink in &self.sinks {
            if let Err(error) = sink.validate_setup() {
                failures.push(SetupFailure {
                    role: Role::Sink,
                    name: sink.name().to_string(),
                    error,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            for failure in &failures {
                tracing::error!(
                    role = %failure.role,
                    name = %failure.name,
                    error = %format!("{:#}", failure.error),
                    "collaborator failed setup validation"
                );
            }
            Err(SetupFailures(failures))
        }
    }

    /// Runs the full pipeline: validation, dispatch loop, compaction,
    /// output chain. Returns the tier map as transformed by the last sink.
    pub fn run(&mut self) -> Result<TierMap, PipelineError> {
        self.validate_setup()?;
        let outcome = self.read_all()?;
        let tiers = compact_tiers(
            &mut self.registry,
            outcome.last_event_time,
            self.config.start_offset,
        );
        Ok(self.process_outputs(tiers))
    }

    /// Pulls events in source order and fans each one out to its matching
    /// handlers. Source errors are fatal; handler errors are logged and
    /// isolated inside the registry.
    fn read_all(&mut self) -> Result<DispatchOutcome, PipelineError> {
        let source_name = self.source.name().to_string();
        let as_source_error = |source: anyhow::Error| PipelineError::Source {
            name: source_name.clone(),
            source,
        };
        let limit = u64::try_from(self.config.max_events).ok().filter(|&n| n > 0);

        let mut dispatched: u64 = 0;
        let mut processed: u64 = 0;
        let mut last_event_time = None;

        let mut stream = self.source.open().map_err(&as_source_error)?;
        while let Some(event) = stream.next_event().map_err(&as_source_error)? {
            processed += 1;
            last_event_time = Some(event.timestamp);
            let channel = event.channel.canonical();
            if self.registry.dispatch(&channel, &event) {
                dispatched += 1;
                if let Some(progress) = self.progress.as_mut() {
                    progress(&Progress {
                        dispatched,
                        processed,
                        channel: &channel,
                    });
                }
                if limit.is_some_and(|n| dispatched >= n) {
                    tracing::debug!(dispatched, "event bound reached, stopping early");
                    break;
                }
            }
        }
        drop(stream);

        tracing::debug!(processed, dispatched, "event stream finished");
        Ok(DispatchOutcome { last_event_time })
    }

    /// Feeds the tier map through every sink in sequence; each sink's
    /// return value becomes the next sink's input.
    fn process_outputs(&mut self, mut tiers: TierMap) -> TierMap {
        for sink in &mut self.sinks {
            if tiers.is_empty() {
                tracing::warn!(sink = sink.name(), "tier data is empty, skipping output");
                continue;
            }
            match sink.process(&tiers) {
                Ok(next) => tiers = next,
                Err(error) => {
                    // The failing sink's input survives to the next sink.
                    tracing::error!(
                        sink = sink.name(),
                        error = %format!("{error:#}"),
                        "output sink failed, passing data through"
                    );
                }
            }
        }
        tiers
    }
}
