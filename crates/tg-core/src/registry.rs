//! Pattern-based handler registration and memoized routing.

use std::collections::HashMap;

use regex::Regex;

use crate::error::PatternError;
use crate::event::Event;
use crate::handler::Handler;
use crate::interval::TierMap;

/// A handler bound to its channel pattern.
pub struct RegisteredHandler {
    name: String,
    pattern: String,
    regex: Regex,
    handler: Box<dyn Handler>,
}

impl RegisteredHandler {
    /// The handler's identity for logs and error reports.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pattern string as given at registration.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the pattern matches anywhere in the canonical channel
    /// string. Substring search, not a full-string anchor.
    #[must_use]
    pub fn matches(&self, channel: &str) -> bool {
        self.regex.is_match(channel)
    }

    pub fn validate_setup(&self) -> anyhow::Result<()> {
        self.handler.validate_setup()
    }

    /// Finalizes the handler. A refusing handler is logged and treated as
    /// contributing nothing, so it cannot lose the other handlers' tiers.
    pub fn finish(&mut self) -> TierMap {
        match self.handler.finish() {
            Ok(tiers) => tiers,
            Err(error) => {
                tracing::error!(
                    handler = %self.name,
                    pattern = %self.pattern,
                    error = %format!("{error:#}"),
                    "handler failed to finish, dropping its contribution"
                );
                TierMap::new()
            }
        }
    }
}

/// Owns every registered handler and resolves channels to the handlers
/// interested in them, memoizing the result per channel string.
///
/// Channel cardinality is small (tens to low hundreds of distinct
/// strings) while event cardinality is large, so one scan per channel
/// amortizes the regex cost to almost nothing. The cache is cleared on
/// every registration, which keeps late `register` calls well defined.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<RegisteredHandler>,
    cache: HashMap<String, Vec<usize>>,
    scans: u64,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field(
                "handlers",
                &self
                    .handlers
                    .iter()
                    .map(RegisteredHandler::name)
                    .collect::<Vec<_>>(),
            )
            .field("scans", &self.scans)
            .finish_non_exhaustive()
    }
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under a channel pattern.
    ///
    /// The pattern is compiled eagerly; a malformed expression fails here,
    /// before any event is processed.
    pub fn register(
        &mut self,
        pattern: &str,
        handler: Box<dyn Handler>,
    ) -> Result<(), PatternError> {
        let regex = Regex::new(pattern).map_err(|source| PatternError {
            pattern: pattern.to_string(),
            source,
        })?;
        tracing::debug!(handler = handler.name(), pattern, "registering handler");
        self.handlers.push(RegisteredHandler {
            name: handler.name().to_string(),
            pattern: pattern.to_string(),
            regex,
            handler,
        });
        self.cache.clear();
        Ok(())
    }

    /// Indices of the handlers whose pattern matches `channel`, in
    /// registration order. Memoized per channel string, empty results
    /// included.
    pub fn resolve(&mut self, channel: &str) -> Vec<usize> {
        if let Some(matched) = self.cache.get(channel) {
            return matched.clone();
        }
        let matched: Vec<usize> = self
            .handlers
            .iter()
            .enumerate()
            .filter(|(_, handler)| handler.matches(channel))
            .map(|(index, _)| index)
            .collect();
        self.scans += 1;
        tracing::debug!(channel, handlers = matched.len(), "channel resolved");
        self.cache.insert(channel.to_string(), matched.clone());
        matched
    }

    /// Forwards an event to every matching handler in registration order.
    ///
    /// A handler error is logged with the handler's identity and the
    /// channel, then ignored; one misbehaving consumer must not lose the
    /// annotations of the others. Returns whether any handler matched.
    pub fn dispatch(&mut self, channel: &str, event: &Event) -> bool {
        let matched = self.resolve(channel);
        for &index in &matched {
            let registered = &mut self.handlers[index];
            if let Err(error) = registered.handler.add_event(event) {
                tracing::error!(
                    handler = %registered.name,
                    channel,
                    error = %format!("{error:#}"),
                    "handler failed to ingest event"
                );
            }
        }
        !matched.is_empty()
    }

    /// Every registered handler, in registration order.
    pub fn handlers(&self) -> &[RegisteredHandler] {
        &self.handlers
    }

    /// Mutable walk over the handlers in registration order, used by tier
    /// compaction to finalize each one.
    pub fn handlers_mut(&mut self) -> impl Iterator<Item = &mut RegisteredHandler> {
        self.handlers.iter_mut()
    }

    /// The distinct pattern strings in registration order, for deriving a
    /// source channel filter.
    #[must_use]
    pub fn patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = Vec::new();
        for handler in &self.handlers {
            if !patterns.iter().any(|p| p == &handler.pattern) {
                patterns.push(handler.pattern.clone());
            }
        }
        patterns
    }

    /// Number of full pattern scans performed so far. Stays constant
    /// across repeated resolutions of the same channel.
    #[must_use]
    pub fn scan_count(&self) -> u64 {
        self.scans
    }
}
