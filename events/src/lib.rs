//! Event system infrastructure for the site relay.
//!
//! This crate provides the event system that decouples the HTTP ingress from
//! the infrastructure that delivers events (the SSE fan-out).
//!
//! # Architecture
//!
//! - **SiteEvent**: The immutable event payload broadcast to admin panels
//! - **DomainEvent**: Enum representing everything the relay can publish
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates, avoiding circular dependencies.

use async_trait::async_trait;
use std::sync::Arc;

mod site_event;

pub use site_event::{EventInput, SiteEvent, DEFAULT_EVENT_TYPE, DEFAULT_WHO};

/// Events published by the relay once a request has been accepted.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// Emitted when the public site posts an event with a valid secret.
    /// Every connected admin panel is notified.
    SiteEventReceived(SiteEvent),
}

/// Trait for handling domain events.
/// Implementations perform side effects like pushing notifications or logging.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Publish an event to all registered handlers.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
