//! Error types for the routing and compaction engine.

use std::fmt;

use thiserror::Error;

/// A channel pattern failed to compile.
#[derive(Debug, Error)]
#[error("invalid channel pattern `{pattern}`: {source}")]
pub struct PatternError {
    /// The offending pattern as given at registration.
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Which collaborator role a setup failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Source,
    Handler,
    Sink,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Handler => "handler",
            Self::Sink => "sink",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One collaborator that failed its setup self-check.
#[derive(Debug)]
pub struct SetupFailure {
    pub role: Role,
    pub name: String,
    pub error: anyhow::Error,
}

/// Every setup failure from a validation pass, reported together so a bad
/// configuration surfaces all problems at once instead of one per run.
#[derive(Debug)]
pub struct SetupFailures(pub Vec<SetupFailure>);

impl fmt::Display for SetupFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "setup validation failed for {} collaborator(s):",
            self.0.len()
        )?;
        for failure in &self.0 {
            writeln!(
                f,
                "  - {} `{}`: {:#}",
                failure.role, failure.name, failure.error
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for SetupFailures {}

/// Fatal pipeline errors. Per-handler and per-sink failures are logged and
/// isolated instead of surfacing here.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// One or more collaborators failed validation; nothing was processed.
    #[error(transparent)]
    Setup(#[from] SetupFailures),

    /// The event source could not be opened or died mid-stream.
    #[error("event source `{name}` failed: {source}")]
    Source {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}
