use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

pub const DEFAULT_EVENT_TYPE: &str = "unknown";
pub const DEFAULT_WHO: &str = "public-site";

/// A discrete notification describing something that happened on the monitored site.
///
/// Serializes to `{"at": "...", "type": "...", "who": "...", "meta": {...}}`, which is
/// exactly the payload pushed to every connected admin panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteEvent {
    /// Server-assigned receipt time, rendered as ISO-8601 with millisecond precision.
    #[serde(serialize_with = "serialize_timestamp")]
    pub at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub who: String,
    pub meta: Value,
}

impl SiteEvent {
    /// Builds an event stamped with the current time.
    pub fn received(input: EventInput) -> Self {
        Self::received_at(input, Utc::now())
    }

    pub fn received_at(input: EventInput, at: DateTime<Utc>) -> Self {
        Self {
            at,
            event_type: input
                .event_type
                .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
            who: input.who.unwrap_or_else(|| DEFAULT_WHO.to_string()),
            meta: input.meta.unwrap_or_else(|| Value::Object(Map::new())),
        }
    }
}

fn serialize_timestamp<S>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// The optional fields an external site may supply when posting an event.
///
/// Parsing is deliberately lenient: anything that is not a JSON object yields an
/// empty input, `null` counts as absent, and `type`/`who` values that are not
/// strings are dropped so the defaults apply. `meta` is passed through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventInput {
    pub event_type: Option<String>,
    pub who: Option<String>,
    pub meta: Option<Value>,
}

impl EventInput {
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Self::default();
        };

        Self {
            event_type: take_string(&mut fields, "type"),
            who: take_string(&mut fields, "who"),
            meta: fields.remove("meta").filter(|meta| !meta.is_null()),
        }
    }

    /// Parses a raw request body. Empty or unparseable bodies produce an empty input.
    pub fn from_slice(body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }

        serde_json::from_slice::<Value>(body)
            .map(Self::from_value)
            .unwrap_or_default()
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}
