//! Hierarchical channel names used for event routing.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between channel segments in the canonical form.
pub const CHANNEL_DELIMITER: char = ':';

/// Channel validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// A channel needs at least one segment.
    #[error("channel requires at least one segment")]
    NoSegments,

    /// A segment contained the delimiter, which would break the canonical form.
    #[error("channel segment `{segment}` contains the delimiter `{CHANNEL_DELIMITER}`")]
    DelimiterInSegment { segment: String },
}

/// The origin of an event: an ordered sequence of name segments
/// (e.g. a scope plus a type discriminator).
///
/// Pattern matching always runs against the canonical form, the segments
/// joined by [`CHANNEL_DELIMITER`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Channel {
    segments: Vec<String>,
}

impl Channel {
    /// Creates a channel after validating its segments.
    pub fn new<I, S>(segments: I) -> Result<Self, ChannelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(ChannelError::NoSegments);
        }
        if let Some(segment) = segments.iter().find(|s| s.contains(CHANNEL_DELIMITER)) {
            return Err(ChannelError::DelimiterInSegment {
                segment: segment.clone(),
            });
        }
        Ok(Self { segments })
    }

    /// The channel segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The canonical string form that routing patterns are matched against.
    #[must_use]
    pub fn canonical(&self) -> String {
        self.segments.join(&CHANNEL_DELIMITER.to_string())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl TryFrom<Vec<String>> for Channel {
    type Error = ChannelError;

    fn try_from(segments: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<Channel> for Vec<String> {
    fn from(channel: Channel) -> Self {
        channel.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_joins_segments() {
        let channel = Channel::new(["/scope/sub", ".rst.hri.PersonHypotheses"]).unwrap();
        assert_eq!(channel.canonical(), "/scope/sub:.rst.hri.PersonHypotheses");
    }

    #[test]
    fn rejects_empty_segment_list() {
        assert_eq!(
            Channel::new(Vec::<String>::new()),
            Err(ChannelError::NoSegments)
        );
    }

    #[test]
    fn rejects_delimiter_in_segment() {
        let result = Channel::new(["a:b", "c"]);
        assert!(matches!(
            result,
            Err(ChannelError::DelimiterInSegment { .. })
        ));
    }

    #[test]
    fn serde_roundtrip_as_segment_list() {
        let channel = Channel::new(["/a", "type"]).unwrap();
        let json = serde_json::to_string(&channel).unwrap();
        assert_eq!(json, r#"["/a","type"]"#);
        let parsed: Channel = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, channel);
    }

    #[test]
    fn serde_rejects_empty_list() {
        let result: Result<Channel, _> = serde_json::from_str("[]");
        assert!(result.is_err());
    }
}
