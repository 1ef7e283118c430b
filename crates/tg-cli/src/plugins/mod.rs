//! Built-in source, handler, and sink implementations, resolved by name.
//!
//! Configuration refers to implementations by a `kind` string; the
//! factories here map each kind to its constructor. Unknown kinds fail at
//! startup, before any event is processed.

mod field_tiers;
mod json_file;
mod jsonl;
mod label_tier;

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use tg_core::{EventSource, Handler, HandlerRegistry, OutputSink};

use crate::config::Config;
pub use field_tiers::FieldTiersHandler;
pub use json_file::JsonFileSink;
pub use jsonl::JsonlSource;
pub use label_tier::LabelTierHandler;

/// Deserializes a plugin's options table, treating an absent table as
/// all-defaults. Option values are validated later by `validate_setup`,
/// so a run with several bad plugins reports every problem at once.
fn parse_options<T: DeserializeOwned + Default>(options: &serde_json::Value) -> Result<T> {
    if options.is_null() {
        Ok(T::default())
    } else {
        serde_json::from_value(options.clone()).context("invalid options")
    }
}

/// Constructs the configured event source.
pub fn build_source(config: &Config) -> Result<Box<dyn EventSource>> {
    match config.source.kind.as_str() {
        "jsonl" => Ok(Box::new(JsonlSource::from_config(config)?)),
        other => bail!("unknown source kind `{other}`"),
    }
}

/// Constructs and registers every configured handler, in order.
///
/// Registration order matters: it decides handler invocation order per
/// event and tier merge order during compaction.
pub fn build_registry(config: &Config) -> Result<HandlerRegistry> {
    let mut registry = HandlerRegistry::new();
    for spec in &config.handler {
        let handler: Box<dyn Handler> = match spec.kind.as_str() {
            "label-tier" => Box::new(LabelTierHandler::from_spec(spec)?),
            "field-tiers" => Box::new(FieldTiersHandler::from_spec(spec)?),
            other => bail!("unknown handler kind `{other}` for handler `{}`", spec.name),
        };
        registry
            .register(&spec.channel, handler)
            .with_context(|| format!("failed to register handler `{}`", spec.name))?;
    }
    Ok(registry)
}

/// Constructs the configured output sinks, in chain order.
pub fn build_sinks(config: &Config) -> Result<Vec<Box<dyn OutputSink>>> {
    let mut sinks: Vec<Box<dyn OutputSink>> = Vec::new();
    for spec in &config.output {
        match spec.kind.as_str() {
            "json-file" => sinks.push(Box::new(JsonFileSink::from_spec(
                spec,
                config.output_file.as_deref(),
            )?)),
            other => bail!("unknown output kind `{other}` for output `{}`", spec.name),
        }
    }
    Ok(sinks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HandlerSpec, SinkSpec};

    fn spec(kind: &str) -> HandlerSpec {
        HandlerSpec {
            kind: kind.to_string(),
            name: "h".to_string(),
            channel: "/a".to_string(),
            options: serde_json::Value::Null,
        }
    }

    #[test]
    fn unknown_handler_kind_fails_at_startup() {
        let config = Config {
            handler: vec![spec("no-such-kind")],
            ..Default::default()
        };
        let error = build_registry(&config).unwrap_err();
        assert!(error.to_string().contains("no-such-kind"));
    }

    #[test]
    fn malformed_channel_pattern_fails_at_startup() {
        let mut bad = spec("label-tier");
        bad.channel = "(unclosed".to_string();
        let config = Config {
            handler: vec![bad],
            ..Default::default()
        };
        assert!(build_registry(&config).is_err());
    }

    #[test]
    fn handlers_register_in_config_order() {
        let config = Config {
            handler: vec![spec("label-tier"), spec("field-tiers")],
            ..Default::default()
        };
        let registry = build_registry(&config).unwrap();
        assert_eq!(registry.handlers().len(), 2);
    }

    #[test]
    fn unknown_sink_kind_fails_at_startup() {
        let config = Config {
            output: vec![SinkSpec {
                kind: "csv".to_string(),
                name: "out".to_string(),
                options: serde_json::Value::Null,
            }],
            ..Default::default()
        };
        assert!(build_sinks(&config).is_err());
    }
}
