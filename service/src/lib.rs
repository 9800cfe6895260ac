use config::Config;
use events::EventPublisher;
use origin::OriginPolicy;
use sse::{Manager, SseDomainEventHandler};
use std::sync::Arc;

pub mod config;
pub mod logging;
pub mod origin;

// Service-level state shared by every handler.
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub origin_policy: Arc<OriginPolicy>,
    pub sse_manager: Arc<Manager>,
    pub event_publisher: EventPublisher,
}

impl AppState {
    /// Wires the SSE manager into the event publisher so that every published
    /// site event is broadcast to connected admin panels.
    pub fn new(app_config: Config) -> Self {
        let sse_manager = Arc::new(Manager::new());
        let event_publisher = EventPublisher::new()
            .with_handler(Arc::new(SseDomainEventHandler::new(sse_manager.clone())));

        Self {
            origin_policy: Arc::new(OriginPolicy::from_config(&app_config)),
            sse_manager,
            event_publisher,
            config: app_config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_new_wires_sse_handler_into_publisher() {
        let config = Config::parse_from([
            "site_relay",
            "--allowed-origins",
            "https://example.com",
        ]);
        let app_state = AppState::new(config);

        assert_eq!(app_state.event_publisher.handler_count(), 1);
        assert_eq!(app_state.sse_manager.connection_count(), 0);
        assert!(app_state
            .origin_policy
            .is_allowed(Some("https://example.com")));
        assert!(!app_state.origin_policy.is_allowed(Some("https://evil.com")));
    }
}
