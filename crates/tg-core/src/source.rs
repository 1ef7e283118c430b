//! The event source contract.

use crate::event::Event;

/// Produces the recording's event stream.
///
/// The pipeline hands the union of all registered handler patterns to
/// [`EventSource::apply_channel_filter`] before opening, so a source can
/// avoid producing channels no handler wants.
pub trait EventSource {
    /// Identity used in logs and error reports.
    fn name(&self) -> &str;

    /// Self-check before any event is processed.
    fn validate_setup(&self) -> anyhow::Result<()>;

    /// Restricts the stream to channels matching any of the given
    /// patterns. Sources that cannot filter may ignore this.
    fn apply_channel_filter(&mut self, patterns: &[String]) {
        let _ = patterns;
    }

    /// Acquires the stream. The returned guard releases the underlying
    /// resource on drop, including on the error path.
    fn open(&mut self) -> anyhow::Result<Box<dyn EventStream + '_>>;
}

/// An open, scanned-once event stream in source order.
pub trait EventStream {
    /// The next event, or `None` when the recording is exhausted.
    fn next_event(&mut self) -> anyhow::Result<Option<Event>>;
}
