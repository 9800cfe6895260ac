use crate::connection::{ConnectionId, ConnectionRegistry, EventSender};
use crate::message::{EventType, Message as SseMessage, MessageScope};
use axum::response::sse::Event;
use log::*;
use std::sync::Arc;

pub struct Manager {
    registry: Arc<ConnectionRegistry>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Register a new connection and return its unique ID
    pub fn register_connection(&self, sender: EventSender) -> ConnectionId {
        let connection_id = self.registry.register(sender);
        info!(
            "Admin connected: {} ({} open)",
            connection_id,
            self.registry.len()
        );
        connection_id
    }

    /// Unregister a connection by ID
    pub fn unregister_connection(&self, connection_id: &ConnectionId) {
        if self.registry.unregister(connection_id) {
            info!(
                "Admin disconnected: {} ({} open)",
                connection_id,
                self.registry.len()
            );
        }
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Send a message based on its scope. Returns how many connections it was queued for.
    pub fn send_message(&self, message: SseMessage) -> usize {
        let event_type = message.event.event_type();

        let event_data = match serde_json::to_string(&message.event) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize SSE event: {e}");
                return 0;
            }
        };

        let event = Event::default().event(event_type).data(event_data);

        match message.scope {
            MessageScope::Connection { connection_id } => {
                usize::from(self.registry.send_to(&connection_id, event))
            }
            MessageScope::Broadcast => {
                let delivered = self.registry.broadcast(event);
                debug!("Broadcast {event_type} to {delivered} connection(s)");
                delivered
            }
        }
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}
