//! The handler contract and accumulation support.

use crate::event::Event;
use crate::interval::{Interval, TierMap};

/// A stateful event consumer.
///
/// Handlers ingest every event whose channel matches their registration
/// pattern and finalize into named interval tiers. `finish` is called at
/// most once per run, after the stream is exhausted. Errors from either
/// operation are caught and logged by the engine; they never abort the run
/// or affect other handlers.
pub trait Handler {
    /// Identity used in logs and error reports.
    fn name(&self) -> &str;

    /// Self-check before any event is processed.
    fn validate_setup(&self) -> anyhow::Result<()>;

    /// Ingest one matched event.
    fn add_event(&mut self, event: &Event) -> anyhow::Result<()>;

    /// Finalize and hand back the accumulated tiers.
    fn finish(&mut self) -> anyhow::Result<TierMap>;
}

/// How [`TierAccumulator::add_entry`] treats consecutive entries.
///
/// Whether a repeated label extends the previous interval or starts a new
/// one is a per-handler decision, not an engine rule, so each handler
/// carries its own policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPolicy {
    /// Merge an entry whose label equals the previous entry's label into
    /// the previous interval instead of appending.
    pub combine_repeated: bool,

    /// Close the previous interval at the new entry's start.
    ///
    /// When disabled the handler must close intervals itself; only the
    /// final interval of a tier may still be open when compaction starts.
    pub override_last_end: bool,
}

impl Default for EntryPolicy {
    fn default() -> Self {
        Self {
            combine_repeated: true,
            override_last_end: true,
        }
    }
}

/// Per-tier interval accumulation shared by handler implementations.
#[derive(Debug, Default)]
pub struct TierAccumulator {
    tiers: TierMap,
}

impl TierAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry to a tier, applying the handler's entry policy.
    pub fn add_entry(&mut self, tier: &str, entry: Interval, policy: EntryPolicy) {
        if let Some(intervals) = self.tiers.get_mut(tier) {
            if policy.override_last_end {
                if let Some(last) = intervals.last_mut() {
                    last.end = Some(entry.start);
                }
            }
            let repeated = intervals
                .last()
                .is_some_and(|last| last.label == entry.label);
            if !(policy.combine_repeated && repeated) {
                intervals.push(entry);
            }
        } else {
            self.tiers.insert(tier.to_string(), vec![entry]);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Consumes the accumulator, yielding the finished tiers.
    #[must_use]
    pub fn into_tiers(self) -> TierMap {
        self.tiers
    }
}
