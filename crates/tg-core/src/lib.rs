//! Event routing and tier compaction engine.
//!
//! This crate contains the annotation generator's core:
//! - Registry: pattern-based handler routing with memoized resolution
//! - Pipeline: the dispatch loop with an optional event-count bound
//! - Compaction: merging per-handler tiers, backfilling open intervals,
//!   and normalizing timestamps to the recording's logical zero
//!
//! Event acquisition, handler implementations, and output serialization
//! live behind the [`EventSource`], [`Handler`], and [`OutputSink`]
//! traits; the `tiergen` binary provides the built-in ones.

pub mod channel;
mod compact;
pub mod error;
pub mod event;
pub mod handler;
pub mod interval;
mod pipeline;
mod registry;
pub mod sink;
pub mod source;

pub use channel::{CHANNEL_DELIMITER, Channel, ChannelError};
pub use compact::compact_tiers;
pub use error::{PatternError, PipelineError, Role, SetupFailure, SetupFailures};
pub use event::Event;
pub use handler::{EntryPolicy, Handler, TierAccumulator};
pub use interval::{Interval, TierMap};
pub use pipeline::{Pipeline, PipelineConfig, Progress, ProgressFn};
pub use registry::{HandlerRegistry, RegisteredHandler};
pub use sink::{OutputSink, emittable_intervals};
pub use source::{EventSource, EventStream};
