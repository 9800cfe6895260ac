use axum::response::sse::Event;
use dashmap::DashMap;
use log::*;
use std::convert::Infallible;
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

pub type EventSender = UnboundedSender<Result<Event, Infallible>>;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub sender: EventSender,
}

/// Membership set of every open push-channel connection.
///
/// Backed by a sharded `DashMap`, so registration, removal and broadcast can run
/// concurrently from any task without external locking. A broadcast observes the
/// members present while it iterates; connections registered afterwards never see it.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionInfo>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a new connection - O(1)
    pub fn register(&self, sender: EventSender) -> ConnectionId {
        let connection_id = ConnectionId::new();
        self.connections
            .insert(connection_id.clone(), ConnectionInfo { sender });
        connection_id
    }

    /// Unregister a connection - O(1). Returns false if it was already gone.
    pub fn unregister(&self, connection_id: &ConnectionId) -> bool {
        self.connections.remove(connection_id).is_some()
    }

    /// Send an event to a single connection.
    pub fn send_to(&self, connection_id: &ConnectionId, event: Event) -> bool {
        match self.connections.get(connection_id) {
            Some(info) => info.sender.send(Ok(event)).is_ok(),
            None => false,
        }
    }

    /// Broadcast an event to all connections - O(n).
    ///
    /// Delivery is fire-and-forget. Connections whose receiving side has gone away
    /// are pruned after the pass; they never cause the broadcast to fail for the
    /// remaining members. Returns the number of connections the event was queued for.
    pub fn broadcast(&self, event: Event) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();

        for entry in self.connections.iter() {
            match entry.value().sender.send(Ok(event.clone())) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        "Failed to send broadcast to connection {}: {}",
                        entry.key().as_str(),
                        e
                    );
                    dead.push(entry.key().clone());
                }
            }
        }

        // Iteration holds shard read locks, so removal waits until the pass is done.
        for connection_id in dead {
            debug!("Pruning closed connection {}", connection_id);
            self.connections.remove(&connection_id);
        }

        delivered
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.connections.contains_key(connection_id)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn event() -> Event {
        Event::default().event("site:event").data("{}")
    }

    #[test]
    fn test_register_and_unregister() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = registry.register(tx);
        assert!(registry.contains(&id));
        assert_eq!(registry.len(), 1);

        assert!(registry.unregister(&id));
        assert!(registry.is_empty());
        assert!(!registry.unregister(&id));
    }

    #[test]
    fn test_connection_ids_are_unique() {
        let registry = ConnectionRegistry::new();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        let first = registry.register(tx1);
        let second = registry.register(tx2);

        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_broadcast_reaches_every_member() {
        let registry = ConnectionRegistry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        registry.register(tx1);
        registry.register(tx2);

        assert_eq!(registry.broadcast(event()), 2);

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
        assert!(rx1.try_recv().is_err());
    }

    #[test]
    fn test_late_joiner_does_not_receive_earlier_broadcast() {
        let registry = ConnectionRegistry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        registry.register(tx1);

        registry.broadcast(event());

        let (tx2, mut rx2) = mpsc::unbounded_channel();
        registry.register(tx2);

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());
    }

    #[test]
    fn test_unregistered_connection_is_excluded_from_broadcast() {
        let registry = ConnectionRegistry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let gone = registry.register(tx1);
        registry.register(tx2);

        registry.unregister(&gone);
        assert_eq!(registry.broadcast(event()), 1);

        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_dead_connection_is_pruned_without_failing_others() {
        let registry = ConnectionRegistry::new();
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let dead = registry.register(tx1);
        let alive = registry.register(tx2);
        drop(rx1);

        assert_eq!(registry.broadcast(event()), 1);

        assert!(rx2.try_recv().is_ok());
        assert!(!registry.contains(&dead));
        assert!(registry.contains(&alive));
    }

    #[test]
    fn test_send_to_unknown_connection_returns_false() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.send_to(&ConnectionId::new(), event()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register_unregister_and_broadcast() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut tasks = Vec::new();

        for _ in 0..32 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let (tx, _rx) = mpsc::unbounded_channel();
                let id = registry.register(tx);
                registry.broadcast(event());
                registry.unregister(&id);
            }));
        }

        for task in tasks {
            task.await.unwrap();
        }

        assert!(registry.is_empty());
    }
}
