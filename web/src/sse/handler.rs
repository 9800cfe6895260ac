use async_stream::stream;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use log::*;
use service::AppState;
use ::sse::connection::ConnectionId;
use ::sse::message::{Event as SseEvent, Message as SseMessage, MessageScope};
use ::sse::Manager;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Unregisters the connection when the response stream is dropped, which is how
/// the transport signals that the client went away.
struct ConnectionGuard {
    manager: Arc<Manager>,
    connection_id: ConnectionId,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        debug!(
            "SSE connection {} closed, cleaning up",
            self.connection_id
        );
        self.manager.unregister_connection(&self.connection_id);
    }
}

/// SSE handler that establishes a long-lived connection for an admin panel.
/// The origin policy has already been applied by the middleware.
pub(crate) async fn sse_handler(
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let manager = app_state.sse_manager.clone();
    let connection_id = manager.register_connection(tx);

    // Registered before greeting, so every broadcast after the greeting is delivered
    manager.send_message(SseMessage {
        event: SseEvent::Connected {
            connection_id: connection_id.to_string(),
        },
        scope: MessageScope::Connection {
            connection_id: connection_id.clone(),
        },
    });

    let guard = ConnectionGuard {
        manager,
        connection_id,
    };

    let stream = stream! {
        let _guard = guard;
        while let Some(event) = rx.recv().await {
            yield event;
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(app_state.config.keep_alive()))
}
