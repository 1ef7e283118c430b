//! Handler that annotates one tier with labels taken from event payloads.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tg_core::{EntryPolicy, Event, Handler, Interval, TierAccumulator, TierMap};

use super::parse_options;
use crate::config::HandlerSpec;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Options {
    /// The tier to annotate.
    tier: Option<String>,

    /// JSON pointer into the payload selecting the label value. The
    /// empty pointer uses the whole payload.
    label_pointer: String,

    combine_repeated: Option<bool>,
    override_last_end: Option<bool>,
}

/// Starts an interval per matched event, labeled from the payload.
///
/// Consecutive equal labels extend the running interval unless
/// `combine_repeated` is disabled; each new entry closes the previous one
/// unless `override_last_end` is disabled.
pub struct LabelTierHandler {
    name: String,
    tier: Option<String>,
    label_pointer: String,
    policy: EntryPolicy,
    accumulator: TierAccumulator,
}

impl LabelTierHandler {
    pub fn from_spec(spec: &HandlerSpec) -> Result<Self> {
        let options: Options = parse_options(&spec.options)
            .with_context(|| format!("handler `{}`", spec.name))?;
        let default_policy = EntryPolicy::default();
        Ok(Self {
            name: spec.name.clone(),
            tier: options.tier,
            label_pointer: options.label_pointer,
            policy: EntryPolicy {
                combine_repeated: options
                    .combine_repeated
                    .unwrap_or(default_policy.combine_repeated),
                override_last_end: options
                    .override_last_end
                    .unwrap_or(default_policy.override_last_end),
            },
            accumulator: TierAccumulator::new(),
        })
    }

    fn label_of(&self, event: &Event) -> Result<String> {
        let value = event.payload.pointer(&self.label_pointer).with_context(|| {
            format!("payload has no value at pointer `{}`", self.label_pointer)
        })?;
        Ok(match value {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    }
}

impl Handler for LabelTierHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate_setup(&self) -> Result<()> {
        match self.tier.as_deref() {
            None | Some("") => bail!("needs a non-empty `tier` option"),
            Some(_) => {}
        }
        if !self.label_pointer.is_empty() && !self.label_pointer.starts_with('/') {
            bail!(
                "`label_pointer` must be a JSON pointer starting with `/`, got `{}`",
                self.label_pointer
            );
        }
        Ok(())
    }

    fn add_event(&mut self, event: &Event) -> Result<()> {
        let label = self.label_of(event)?;
        let tier = self.tier.as_deref().context("tier not configured")?;
        self.accumulator
            .add_entry(tier, Interval::open(label, event.timestamp), self.policy);
        Ok(())
    }

    fn finish(&mut self) -> Result<TierMap> {
        Ok(std::mem::take(&mut self.accumulator).into_tiers())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use serde_json::json;
    use tg_core::Channel;

    use super::*;

    fn spec(options: serde_json::Value) -> HandlerSpec {
        HandlerSpec {
            kind: "label-tier".to_string(),
            name: "test".to_string(),
            channel: "/a".to_string(),
            options,
        }
    }

    fn event(seconds: i64, payload: serde_json::Value) -> Event {
        Event {
            channel: Channel::new(["/a", "t"]).unwrap(),
            timestamp: TimeDelta::seconds(seconds),
            payload,
        }
    }

    #[test]
    fn validation_requires_a_tier() {
        let handler = LabelTierHandler::from_spec(&spec(serde_json::Value::Null)).unwrap();
        assert!(handler.validate_setup().is_err());

        let handler = LabelTierHandler::from_spec(&spec(json!({"tier": "t"}))).unwrap();
        assert!(handler.validate_setup().is_ok());
    }

    #[test]
    fn validation_rejects_relative_pointer() {
        let handler =
            LabelTierHandler::from_spec(&spec(json!({"tier": "t", "label_pointer": "text"})))
                .unwrap();
        assert!(handler.validate_setup().is_err());
    }

    #[test]
    fn unknown_option_is_rejected() {
        assert!(LabelTierHandler::from_spec(&spec(json!({"tierr": "t"}))).is_err());
    }

    #[test]
    fn labels_come_from_the_pointer() {
        let mut handler =
            LabelTierHandler::from_spec(&spec(json!({"tier": "speech", "label_pointer": "/text"})))
                .unwrap();
        handler.add_event(&event(0, json!({"text": "hello"}))).unwrap();
        handler.add_event(&event(2, json!({"text": "world"}))).unwrap();

        let tiers = handler.finish().unwrap();
        assert_eq!(
            tiers["speech"],
            vec![
                Interval::closed("hello", TimeDelta::seconds(0), TimeDelta::seconds(2)),
                Interval::open("world", TimeDelta::seconds(2)),
            ]
        );
    }

    #[test]
    fn empty_pointer_serializes_the_whole_payload() {
        let mut handler = LabelTierHandler::from_spec(&spec(json!({"tier": "t"}))).unwrap();
        handler.add_event(&event(0, json!({"id": 7}))).unwrap();

        let tiers = handler.finish().unwrap();
        assert_eq!(tiers["t"][0].label, r#"{"id":7}"#);
    }

    #[test]
    fn missing_pointer_target_is_an_error() {
        let mut handler =
            LabelTierHandler::from_spec(&spec(json!({"tier": "t", "label_pointer": "/nope"})))
                .unwrap();
        assert!(handler.add_event(&event(0, json!({"text": "x"}))).is_err());
    }

    #[test]
    fn repeated_labels_combine_by_default() {
        let mut handler =
            LabelTierHandler::from_spec(&spec(json!({"tier": "t", "label_pointer": "/s"})))
                .unwrap();
        for n in 0..3 {
            handler.add_event(&event(n, json!({"s": "same"}))).unwrap();
        }

        let tiers = handler.finish().unwrap();
        assert_eq!(
            tiers["t"],
            vec![Interval::closed(
                "same",
                TimeDelta::seconds(0),
                TimeDelta::seconds(2)
            )]
        );
    }

    #[test]
    fn combine_repeated_can_be_disabled() {
        let mut handler = LabelTierHandler::from_spec(&spec(
            json!({"tier": "t", "label_pointer": "/s", "combine_repeated": false}),
        ))
        .unwrap();
        for n in 0..3 {
            handler.add_event(&event(n, json!({"s": "same"}))).unwrap();
        }

        let tiers = handler.finish().unwrap();
        assert_eq!(tiers["t"].len(), 3);
    }
}
