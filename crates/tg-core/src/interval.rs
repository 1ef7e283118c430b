//! Annotation intervals and tier collections.

use std::collections::BTreeMap;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Named tiers, each an ordered interval sequence.
///
/// Tiers exist only transiently: built during one run, handed to the
/// output sinks, then discarded.
pub type TierMap = BTreeMap<String, Vec<Interval>>;

/// A labeled time span within a tier.
///
/// While a handler is still accumulating, only the most recently appended
/// interval of a tier may have an absent `end`; compaction backfills it
/// from the last processed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    /// The annotation text.
    pub label: String,

    /// Offset from the stream start.
    #[serde(with = "duration_us")]
    pub start: TimeDelta,

    /// Offset from the stream start, absent while the span is still open.
    #[serde(
        default,
        with = "duration_us_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<TimeDelta>,
}

impl Interval {
    /// Creates an open interval (no end yet).
    pub fn open(label: impl Into<String>, start: TimeDelta) -> Self {
        Self {
            label: label.into(),
            start,
            end: None,
        }
    }

    /// Creates an interval with both bounds set.
    pub fn closed(label: impl Into<String>, start: TimeDelta, end: TimeDelta) -> Self {
        Self {
            label: label.into(),
            start,
            end: Some(end),
        }
    }

    /// Shifts both bounds back by `offset`.
    pub fn shift_back(&mut self, offset: TimeDelta) {
        self.start -= offset;
        if let Some(end) = self.end.as_mut() {
            *end -= offset;
        }
    }
}

/// Serde support for `TimeDelta` as whole microseconds.
///
/// Microseconds keep sub-second precision without float drift; an i64 of
/// microseconds covers every realistic recording length.
pub(crate) mod duration_us {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_microseconds().unwrap_or(i64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        i64::deserialize(deserializer).map(TimeDelta::microseconds)
    }
}

/// Serde support for `Option<TimeDelta>` as whole microseconds.
pub(crate) mod duration_us_opt {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    #[expect(
        clippy::ref_option,
        reason = "signature dictated by serde's with-attribute"
    )]
    pub fn serialize<S: Serializer>(
        value: &Option<TimeDelta>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(delta) => super::duration_us::serialize(delta, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<TimeDelta>, D::Error> {
        Ok(Option::<i64>::deserialize(deserializer)?.map(TimeDelta::microseconds))
    }
}
