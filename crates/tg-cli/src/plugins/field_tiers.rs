//! Handler that fans payload fields out into one tier per field.

use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tg_core::{EntryPolicy, Event, Handler, Interval, TierAccumulator, TierMap};

use super::parse_options;
use crate::config::HandlerSpec;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Options {
    /// Payload field name -> tier name. Fields not listed are ignored.
    fields: BTreeMap<String, String>,

    combine_repeated: Option<bool>,
    override_last_end: Option<bool>,
}

/// Routes each mapped payload field into its own tier, labeled with the
/// field's value. Useful for streams that report several variables per
/// event, e.g. observation states.
pub struct FieldTiersHandler {
    name: String,
    fields: BTreeMap<String, String>,
    policy: EntryPolicy,
    accumulator: TierAccumulator,
    ignored: HashSet<String>,
}

impl FieldTiersHandler {
    pub fn from_spec(spec: &HandlerSpec) -> Result<Self> {
        let options: Options = parse_options(&spec.options)
            .with_context(|| format!("handler `{}`", spec.name))?;
        let default_policy = EntryPolicy::default();
        Ok(Self {
            name: spec.name.clone(),
            fields: options.fields,
            policy: EntryPolicy {
                combine_repeated: options
                    .combine_repeated
                    .unwrap_or(default_policy.combine_repeated),
                override_last_end: options
                    .override_last_end
                    .unwrap_or(default_policy.override_last_end),
            },
            accumulator: TierAccumulator::new(),
            ignored: HashSet::new(),
        })
    }
}

impl Handler for FieldTiersHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate_setup(&self) -> Result<()> {
        if self.fields.is_empty() {
            bail!("needs a non-empty `fields` map (payload field -> tier)");
        }
        Ok(())
    }

    fn add_event(&mut self, event: &Event) -> Result<()> {
        let Some(object) = event.payload.as_object() else {
            bail!("expects an object payload, got {}", event.payload);
        };
        for (field, value) in object {
            let Some(tier) = self.fields.get(field) else {
                if self.ignored.insert(field.clone()) {
                    tracing::info!(handler = %self.name, field, "ignoring unmapped field");
                }
                continue;
            };
            let label = match value {
                serde_json::Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            self.accumulator
                .add_entry(tier, Interval::open(label, event.timestamp), self.policy);
        }
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

    fn handler(options: serde_json::Value) -> FieldTiersHandler {
        FieldTiersHandler::from_spec(&HandlerSpec {
            kind: "field-tiers".to_string(),
            name: "evidence".to_string(),
            channel: "/a".to_string(),
            options,
        })
        .unwrap()
    }

    fn event(seconds: i64, payload: serde_json::Value) -> Event {
        Event {
            channel: Channel::new(["/a", "t"]).unwrap(),
            timestamp: TimeDelta::seconds(seconds),
            payload,
        }
    }

    #[test]
    fn validation_requires_field_map() {
        let h = handler(serde_json::Value::Null);
        assert!(h.validate_setup().is_err());

        let h = handler(json!({"fields": {"speaking": "speech"}}));
        assert!(h.validate_setup().is_ok());
    }

    #[test]
    fn mapped_fields_land_in_their_tiers() {
        let mut h = handler(json!({"fields": {"speaking": "speech", "visible": "visibility"}}));
        h.add_event(&event(0, json!({"speaking": "yes", "visible": false})))
            .unwrap();
        h.add_event(&event(3, json!({"speaking": "no"}))).unwrap();

        let tiers = h.finish().unwrap();
        assert_eq!(
            tiers["speech"],
            vec![
                Interval::closed("yes", TimeDelta::seconds(0), TimeDelta::seconds(3)),
                Interval::open("no", TimeDelta::seconds(3)),
            ]
        );
        assert_eq!(
            tiers["visibility"],
            vec![Interval::open("false", TimeDelta::seconds(0))]
        );
    }

    #[test]
    fn unmapped_fields_are_ignored() {
        let mut h = handler(json!({"fields": {"speaking": "speech"}}));
        h.add_event(&event(0, json!({"speaking": "yes", "unknown": 1})))
            .unwrap();
        h.add_event(&event(1, json!({"unknown": 2}))).unwrap();

        let tiers = h.finish().unwrap();
        assert_eq!(tiers.len(), 1);
        assert!(tiers.contains_key("speech"));
    }

    #[test]
    fn repeated_states_combine_into_one_interval() {
        let mut h = handler(json!({"fields": {"state": "s"}}));
        for n in 0..4 {
            h.add_event(&event(n, json!({"state": "idle"}))).unwrap();
        }

        let tiers = h.finish().unwrap();
        assert_eq!(
            tiers["s"],
            vec![Interval::closed(
                "idle",
                TimeDelta::seconds(0),
                TimeDelta::seconds(3)
            )]
        );
    }

    #[test]
    fn non_object_payload_is_an_error() {
        let mut h = handler(json!({"fields": {"state": "s"}}));
        assert!(h.add_event(&event(0, json!("not an object"))).is_err());
    }
}
