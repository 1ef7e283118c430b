//! Tier compaction: finalize handlers, backfill open ends, merge, and
//! normalize timestamps.

use chrono::TimeDelta;

use crate::interval::TierMap;
use crate::registry::HandlerRegistry;

/// Collects every handler's tiers into one run-wide map.
///
/// Handlers are finalized in registration order. Per tier: empty interval
/// lists are skipped with a warning; a final interval without an end is
/// backfilled with `last_event_time` (an open interval is implicitly open
/// until the stream ends); same-named tiers from multiple handlers are
/// concatenated in registration order. The start offset is subtracted once
/// across the merged map, never per handler, so intervals merged from
/// several handlers cannot be double-shifted.
pub fn compact_tiers(
    registry: &mut HandlerRegistry,
    last_event_time: Option<TimeDelta>,
    start_offset: TimeDelta,
) -> TierMap {
    let mut tiers = TierMap::new();

    for handler in registry.handlers_mut() {
        let name = handler.name().to_string();
        tracing::debug!(handler = %name, "finalizing handler");
        for (tier, mut intervals) in handler.finish() {
            if intervals.is_empty() {
                tracing::warn!(tier, handler = %name, "tier is empty");
                continue;
            }
            if let Some(last) = intervals.last_mut() {
                if last.end.is_none() {
                    // With no processed event to borrow a time from, the
                    // interval stays open and is skipped at the sink.
                    last.end = last_event_time;
                }
            }
            tiers.entry(tier).or_default().append(&mut intervals);
        }
    }

    for intervals in tiers.values_mut() {
        for interval in intervals {
            interval.shift_back(start_offset);
        }
    }

    tiers
}
