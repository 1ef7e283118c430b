//! Events pulled from a recording stream.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::interval::duration_us;

/// One event from the recording.
///
/// The engine only looks at the channel (for routing) and the timestamp
/// (for backfilling open intervals). The payload is opaque here; handlers
/// decide how to interpret it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Where the event originated.
    pub channel: Channel,

    /// Offset from the stream start.
    #[serde(rename = "time_us", with = "duration_us")]
    pub timestamp: TimeDelta,

    /// Source-specific payload, uninterpreted by the engine.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Event {
    /// Creates an event with an empty payload.
    pub const fn new(channel: Channel, timestamp: TimeDelta) -> Self {
        Self {
            channel,
            timestamp,
            payload: serde_json::Value::Null,
        }
    }
}
