//! JSON lines event source.
//!
//! Reads one event per line: `{"channel": [...], "time_us": ..., "payload": ...}`.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use regex::Regex;
use tg_core::{Event, EventSource, EventStream};

use crate::config::Config;

/// Event source backed by a JSON lines recording file.
pub struct JsonlSource {
    path: Option<PathBuf>,
    filters: Vec<Regex>,
}

impl JsonlSource {
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.filter(|p| !p.as_os_str().is_empty()),
            filters: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.input_file.clone()))
    }
}

impl EventSource for JsonlSource {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn validate_setup(&self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            bail!("input_file is not set");
        };
        if !path.is_file() {
            bail!(
                "input file `{}` does not exist or is not a regular file",
                path.display()
            );
        }
        Ok(())
    }

    fn apply_channel_filter(&mut self, patterns: &[String]) {
        // Patterns come from the registry, which already compiled them.
        self.filters = patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(error) => {
                    tracing::warn!(pattern, %error, "dropping unusable channel filter");
                    None
                }
            })
            .collect();
        tracing::debug!(filters = self.filters.len(), "channel filter applied");
    }

    fn open(&mut self) -> Result<Box<dyn EventStream + '_>> {
        let path = self.path.as_ref().context("input_file is not set")?;
        let file = File::open(path)
            .with_context(|| format!("failed to open input file `{}`", path.display()))?;
        Ok(Box::new(JsonlStream {
            lines: BufReader::new(file).lines(),
            filters: &self.filters,
            line_number: 0,
        }))
    }
}

struct JsonlStream<'a> {
    lines: Lines<BufReader<File>>,
    filters: &'a [Regex],
    line_number: u64,
}

impl JsonlStream<'_> {
    fn wanted(&self, event: &Event) -> bool {
        if self.filters.is_empty() {
            return true;
        }
        let channel = event.channel.canonical();
        self.filters.iter().any(|filter| filter.is_match(&channel))
    }
}

impl EventStream for JsonlStream<'_> {
    fn next_event(&mut self) -> Result<Option<Event>> {
        while let Some(line) = self.lines.next() {
            self.line_number += 1;
            let line = line.context("failed to read input line")?;
            if line.trim().is_empty() {
                continue;
            }
            let event: Event = serde_json::from_str(&line)
                .with_context(|| format!("invalid event on line {}", self.line_number))?;
            if self.wanted(&event) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::TimeDelta;

    use super::*;

    fn write_lines(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    fn drain(source: &mut JsonlSource) -> Vec<Event> {
        let mut stream = source.open().unwrap();
        let mut events = Vec::new();
        while let Some(event) = stream.next_event().unwrap() {
            events.push(event);
        }
        events
    }

    #[test]
    fn validate_rejects_missing_path() {
        let source = JsonlSource::new(None);
        assert!(source.validate_setup().is_err());

        let source = JsonlSource::new(Some(PathBuf::from("/no/such/file.jsonl")));
        assert!(source.validate_setup().is_err());
    }

    #[test]
    fn reads_events_in_file_order() {
        let file = write_lines(&[
            r#"{"channel": ["/a", "t"], "time_us": 0, "payload": {"n": 1}}"#,
            "",
            r#"{"channel": ["/b", "t"], "time_us": 1000000}"#,
        ]);
        let mut source = JsonlSource::new(Some(file.path().to_path_buf()));

        let events = drain(&mut source);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].channel.canonical(), "/a:t");
        assert_eq!(events[1].timestamp, TimeDelta::seconds(1));
    }

    #[test]
    fn channel_filter_drops_unwanted_events() {
        let file = write_lines(&[
            r#"{"channel": ["/a", "t"], "time_us": 0}"#,
            r#"{"channel": ["/b", "t"], "time_us": 1}"#,
            r#"{"channel": ["/a", "u"], "time_us": 2}"#,
        ]);
        let mut source = JsonlSource::new(Some(file.path().to_path_buf()));
        source.apply_channel_filter(&["/a".to_string()]);

        let events = drain(&mut source);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.channel.canonical().contains("/a")));
    }

    #[test]
    fn malformed_line_is_a_source_error() {
        let file = write_lines(&[
            r#"{"channel": ["/a", "t"], "time_us": 0}"#,
            "not json",
        ]);
        let mut source = JsonlSource::new(Some(file.path().to_path_buf()));

        let mut stream = source.open().unwrap();
        assert!(stream.next_event().unwrap().is_some());
        let error = stream.next_event().unwrap_err();
        assert!(error.to_string().contains("line 2"));
    }
}
