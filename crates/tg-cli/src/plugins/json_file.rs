//! Output sink writing the merged tiers as a JSON document.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tg_core::{OutputSink, TierMap, emittable_intervals};

use super::parse_options;
use crate::config::SinkSpec;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Options {
    /// Output path; falls back to the top-level `output_file`.
    path: Option<PathBuf>,

    /// Allow replacing an existing output file.
    overwrite: bool,
}

/// Writes each tier's emittable intervals to a pretty-printed JSON file.
///
/// Intervals a file cannot represent (no end, or end before start) are
/// skipped with a warning; the rest of the tier is still written. The
/// unmodified input is handed to the next sink.
pub struct JsonFileSink {
    name: String,
    path: Option<PathBuf>,
    overwrite: bool,
}

impl JsonFileSink {
    pub fn from_spec(spec: &SinkSpec, fallback_path: Option<&Path>) -> Result<Self> {
        let options: Options =
            parse_options(&spec.options).with_context(|| format!("output `{}`", spec.name))?;
        Ok(Self {
            name: spec.name.clone(),
            path: options
                .path
                .or_else(|| fallback_path.map(Path::to_path_buf)),
            overwrite: options.overwrite,
        })
    }
}

impl OutputSink for JsonFileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate_setup(&self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            bail!("no output path configured (set `path` or the top-level `output_file`)");
        };
        if path.exists() && !self.overwrite {
            bail!(
                "output file `{}` already exists (set `overwrite = true` to replace it)",
                path.display()
            );
        }
        Ok(())
    }

    fn process(&mut self, tiers: &TierMap) -> Result<TierMap> {
        let path = self.path.as_ref().context("no output path configured")?;

        let emittable: TierMap = tiers
            .iter()
            .map(|(tier, intervals)| (tier.clone(), emittable_intervals(tier, intervals)))
            .collect();

        let file = File::create(path)
            .with_context(|| format!("failed to create output file `{}`", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &emittable)
            .with_context(|| format!("failed to write `{}`", path.display()))?;
        tracing::info!(
            sink = %self.name,
            path = %path.display(),
            tiers = emittable.len(),
            "annotations written"
        );

        Ok(tiers.clone())
    }
}
