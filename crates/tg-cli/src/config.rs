//! Configuration loading and management.

use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Example configuration printed by `tiergen --print-config`.
pub const EXAMPLE_CONFIG: &str = r#"# tiergen configuration

# Input recording to process (JSON lines, one event per line).
input_file = "recording.jsonl"

# Default output file for sinks that do not set their own path.
output_file = "annotations.json"

# The recording start time in milliseconds. Subtracted from all
# annotation timestamps after merging.
start_time_ms = 0.0

# Stop after this many matched events. <= 0 means unbounded.
max_events = 0

[source]
kind = "jsonl"

# Handlers consume events whose channel matches their pattern and
# accumulate annotation tiers. Patterns are regular expressions matched
# anywhere in the channel string.
[[handler]]
kind = "label-tier"
name = "speech"
channel = "/lab/speech"

[handler.options]
tier = "speech"
label_pointer = "/text"

[[handler]]
kind = "field-tiers"
name = "evidence"
channel = "/lab/evidence"

[handler.options.fields]
speaking = "speaking"
visible = "visibility"

# Outputs run in sequence on the merged tiers; each output's result is
# piped into the next one.
[[output]]
kind = "json-file"
name = "json"

[output.options]
overwrite = false
"#;

/// One handler registration from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerSpec {
    /// Which built-in handler implementation to construct.
    pub kind: String,
    /// Identity used in logs and error reports.
    pub name: String,
    /// Channel pattern (regular expression, substring search).
    pub channel: String,
    /// Handler-specific options.
    #[serde(default)]
    pub options: serde_json::Value,
}

/// One output sink from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkSpec {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub options: serde_json::Value,
}

/// The event source to construct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    pub kind: String,
    #[serde(default)]
    pub options: serde_json::Value,
}

impl Default for SourceSpec {
    fn default() -> Self {
        Self {
            kind: "jsonl".to_string(),
            options: serde_json::Value::Null,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Input recording to process.
    pub input_file: Option<PathBuf>,

    /// Default output path for sinks without an explicit one.
    pub output_file: Option<PathBuf>,

    /// Recording start time in milliseconds, subtracted from all
    /// annotation timestamps.
    pub start_time_ms: f64,

    /// Stop after this many matched events (<= 0 means unbounded).
    pub max_events: i64,

    /// The event source.
    #[serde(default)]
    pub source: SourceSpec,

    /// Handler registrations, in order.
    #[serde(default)]
    pub handler: Vec<HandlerSpec>,

    /// Output sinks, in chain order.
    #[serde(default)]
    pub output: Vec<SinkSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_file: None,
            output_file: None,
            start_time_ms: 0.0,
            max_events: 0,
            source: SourceSpec::default(),
            handler: Vec::new(),
            output: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TIERGEN_*)
        figment = figment.merge(Env::prefixed("TIERGEN_"));

        figment.extract()
    }

    /// The start offset as a duration.
    #[must_use]
    pub fn start_offset(&self) -> TimeDelta {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "recording offsets are far below microsecond i64 range"
        )]
        let micros = (self.start_time_ms * 1000.0).round() as i64;
        TimeDelta::microseconds(micros)
    }
}

/// Returns the platform-specific config directory for tiergen.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tiergen"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_are_unbounded_and_unshifted() {
        let config = Config::default();
        assert_eq!(config.max_events, 0);
        assert_eq!(config.start_offset(), TimeDelta::zero());
        assert!(config.handler.is_empty());
        assert_eq!(config.source.kind, "jsonl");
    }

    #[test]
    fn start_offset_keeps_sub_millisecond_precision() {
        let config = Config {
            start_time_ms: 1.5,
            ..Default::default()
        };
        assert_eq!(config.start_offset(), TimeDelta::microseconds(1500));
    }

    #[test]
    fn example_config_parses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EXAMPLE_CONFIG.as_bytes()).unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.input_file, Some(PathBuf::from("recording.jsonl")));
        assert_eq!(config.handler.len(), 2);
        assert_eq!(config.handler[0].kind, "label-tier");
        assert_eq!(config.handler[1].kind, "field-tiers");
        assert_eq!(config.output.len(), 1);
        assert_eq!(config.output[0].kind, "json-file");
    }

    #[test]
    fn file_config_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_events = 7\nstart_time_ms = 250.0").unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.max_events, 7);
        assert_eq!(config.start_offset(), TimeDelta::milliseconds(250));
    }
}
