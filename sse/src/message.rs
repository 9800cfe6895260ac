use crate::connection::ConnectionId;
use events::SiteEvent;
use serde::Serialize;

/// Trait for getting the SSE event type name
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// Everything the relay pushes down an SSE connection.
///
/// Variants serialize without a wrapper so the `data` line carries the payload
/// verbatim; the SSE `event` name identifies which variant it is.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Event {
    /// Greeting sent once to a freshly registered connection.
    Connected { connection_id: String },

    /// An event posted by the public site.
    SiteEvent(SiteEvent),
}

impl EventType for Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::Connected { .. } => "connected",
            Event::SiteEvent(_) => "site:event",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub event: Event,
    pub scope: MessageScope,
}

#[derive(Debug, Clone)]
pub enum MessageScope {
    /// Send to a single connection
    Connection { connection_id: ConnectionId },
    /// Send to every connected admin panel
    Broadcast,
}

#[cfg(test)]
mod tests {
    use super::*;
    use events::EventInput;
    use serde_json::json;

    #[test]
    fn test_site_event_serializes_without_wrapper() {
        let site_event = SiteEvent::received(EventInput::default());
        let expected = serde_json::to_value(&site_event).unwrap();

        let serialized = serde_json::to_value(Event::SiteEvent(site_event)).unwrap();
        assert_eq!(serialized, expected);
    }

    #[test]
    fn test_connected_serialization() {
        let event = Event::Connected {
            connection_id: "abc".to_string(),
        };

        assert_eq!(event.event_type(), "connected");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"connection_id": "abc"})
        );
    }

    #[test]
    fn test_site_event_type_name() {
        let event = Event::SiteEvent(SiteEvent::received(EventInput::default()));
        assert_eq!(event.event_type(), "site:event");
    }
}
