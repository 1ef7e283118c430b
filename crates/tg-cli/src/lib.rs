//! Annotation generator CLI library.
//!
//! Wires the tg-core engine to configuration-driven sources, handlers,
//! and output sinks.

mod cli;
mod config;
pub mod plugins;

pub use cli::Cli;
pub use config::{Config, EXAMPLE_CONFIG, HandlerSpec, SinkSpec, SourceSpec};
