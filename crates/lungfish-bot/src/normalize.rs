//! Decode raw stream payloads into typed [`Event`]s.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use lungfish_types::{Event, EventKind, RawEvent};

use crate::error::{BotError, Result};
use crate::trigger::parse_trigger;

/// Optional fields shared by the payload kinds we handle.
///
/// Each field is read leniently: a missing or non-string value is `None`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PayloadFields {
    #[serde(deserialize_with = "lenient_string")]
    user: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    text: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    channel: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    presence: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Whether a payload is the empty sentinel (`null` or `{}`).
pub fn is_sentinel(raw: &RawEvent) -> bool {
    match raw {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Normalize one raw payload for a bot with id `bot_user_id`.
///
/// Fails with [`BotError::UnsupportedEventKind`] when `type` is missing,
/// not a string, or not a recognised kind. Missing optional fields on a
/// recognised kind degrade to empty values.
pub fn normalize(raw: &RawEvent, bot_user_id: &str) -> Result<Event> {
    let kind = match raw.get("type") {
        Some(Value::String(tag)) => {
            EventKind::from_tag(tag).ok_or_else(|| BotError::unsupported_kind(tag))?
        }
        Some(other) => return Err(BotError::unsupported_kind(other)),
        None => return Err(BotError::unsupported_kind("<missing>")),
    };

    let fields = PayloadFields::deserialize(raw).unwrap_or_else(|e| {
        debug!(kind = %kind, "Payload fields unreadable, using defaults: {e}");
        PayloadFields::default()
    });

    let mut event = Event::empty(kind);
    event.user_id = fields.user.unwrap_or_default();
    event.channel = fields.channel;

    match kind {
        EventKind::Message => {
            if let Some(text) = fields.text {
                let (is_mention, trigger) = parse_trigger(&text, bot_user_id);
                event.is_mention = is_mention;
                event.trigger = trigger.filter(|_| is_mention);
                event.raw_text = text;
            }
        }
        EventKind::PresenceChange => {
            event.presence = fields.presence;
        }
        _ => {}
    }

    Ok(event)
}
