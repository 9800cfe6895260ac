use crate::message::{Event as SseEvent, Message as SseMessage, MessageScope};
use crate::Manager;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Handles domain events by converting them to SSE messages and broadcasting
/// them to every connected admin panel.
pub struct SseDomainEventHandler {
    sse_manager: Arc<Manager>,
}

impl SseDomainEventHandler {
    pub fn new(sse_manager: Arc<Manager>) -> Self {
        Self { sse_manager }
    }
}

#[async_trait]
impl EventHandler for SseDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        match event {
            DomainEvent::SiteEventReceived(site_event) => {
                debug!(
                    "Handling SiteEventReceived event: type={}, who={}",
                    site_event.event_type, site_event.who
                );

                self.sse_manager.send_message(SseMessage {
                    event: SseEvent::SiteEvent(site_event.clone()),
                    scope: MessageScope::Broadcast,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use events::{EventInput, EventPublisher, SiteEvent};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_published_site_event_is_broadcast() {
        let manager = Arc::new(Manager::new());
        let publisher = EventPublisher::new()
            .with_handler(Arc::new(SseDomainEventHandler::new(manager.clone())));

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        manager.register_connection(tx1);
        manager.register_connection(tx2);

        publisher
            .publish(DomainEvent::SiteEventReceived(SiteEvent::received(
                EventInput::default(),
            )))
            .await;

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }
}
