//! The output sink contract and sink-boundary interval validation.

use crate::interval::{Interval, TierMap};

/// Consumes the merged tier map, persisting or transforming it.
///
/// Sinks run in sequence; each sink's returned map becomes the next
/// sink's input. A sink is skipped (with a warning) when its input is
/// empty, and a failing sink is logged while its input passes through
/// unchanged.
pub trait OutputSink {
    /// Identity used in logs and error reports.
    fn name(&self) -> &str;

    /// Self-check before any event is processed, e.g. refusing to
    /// overwrite an existing output path.
    fn validate_setup(&self) -> anyhow::Result<()>;

    /// Processes the tiers, returning the map to feed the next sink.
    fn process(&mut self, tiers: &TierMap) -> anyhow::Result<TierMap>;
}

/// Drops intervals a sink cannot emit, logging each skip with its tier
/// name and position: a missing end, or `end <= start`. The rest of the
/// tier survives.
#[must_use]
pub fn emittable_intervals(tier: &str, intervals: &[Interval]) -> Vec<Interval> {
    intervals
        .iter()
        .enumerate()
        .filter_map(|(position, interval)| match interval.end {
            None => {
                tracing::warn!(tier, position, label = %interval.label, "skipping interval without end");
                None
            }
            Some(end) if end <= interval.start => {
                tracing::warn!(tier, position, label = %interval.label, "skipping interval with end <= start");
                None
            }
            Some(_) => Some(interval.clone()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn secs(n: i64) -> TimeDelta {
        TimeDelta::seconds(n)
    }

    #[test]
    fn keeps_valid_intervals() {
        let intervals = vec![
            Interval::closed("a", secs(0), secs(1)),
            Interval::closed("b", secs(1), secs(2)),
        ];
        assert_eq!(emittable_intervals("t", &intervals), intervals);
    }

    #[test]
    fn skips_open_and_inverted_intervals() {
        let intervals = vec![
            Interval::closed("ok", secs(0), secs(1)),
            Interval::open("open", secs(1)),
            Interval::closed("inverted", secs(5), secs(3)),
            Interval::closed("empty", secs(2), secs(2)),
            Interval::closed("also-ok", secs(2), secs(4)),
        ];

        let kept = emittable_intervals("t", &intervals);
        assert_eq!(
            kept,
            vec![
                Interval::closed("ok", secs(0), secs(1)),
                Interval::closed("also-ok", secs(2), secs(4)),
            ]
        );
    }
}
