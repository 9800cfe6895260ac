use anyhow::Result;
use eventsource_client::{self as es, Client};
use futures_util::stream::StreamExt;
use log::*;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: String,
    pub data: Value,
    pub timestamp: Instant,
}

/// An admin panel listening on the relay's `/sse` stream.
pub struct Connection {
    pub label: String,
    pub connection_id: Option<String>,
    event_rx: mpsc::UnboundedReceiver<Event>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Connection {
    pub async fn establish(base_url: &str, origin: Option<&str>, label: String) -> Result<Self> {
        let url = format!("{}/sse", base_url);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut builder = es::ClientBuilder::for_url(&url)?;
        if let Some(origin) = origin {
            builder = builder.header("Origin", origin)?;
        }
        let client = builder.build();

        let stream_label = label.clone();
        let handle = tokio::spawn(async move {
            let mut stream = client.stream();

            loop {
                match stream.next().await {
                    Some(Ok(es::SSE::Event(event))) => {
                        if let Ok(data) = serde_json::from_str(&event.data) {
                            let sse_event = Event {
                                event_type: event.event_type,
                                data,
                                timestamp: Instant::now(),
                            };

                            if tx.send(sse_event).is_err() {
                                debug!("SSE receiver dropped for {}", stream_label);
                                break;
                            }
                        }
                    }
                    Some(Ok(es::SSE::Comment(_))) => {
                        // Ignore comments (keep-alive)
                    }
                    Some(Err(e)) => {
                        warn!("SSE error for {}: {}", stream_label, e);
                    }
                    None => {
                        debug!("SSE stream ended for {}", stream_label);
                        break;
                    }
                }
            }
        });

        let mut connection = Self {
            label,
            connection_id: None,
            event_rx: rx,
            _handle: handle,
        };

        // Registration happens before the greeting is queued, so once it arrives
        // this panel is guaranteed to see every later broadcast.
        let greeting = connection
            .wait_for_event("connected", Duration::from_secs(5))
            .await?;
        connection.connection_id = greeting.data["connection_id"]
            .as_str()
            .map(str::to_string);

        Ok(connection)
    }

    pub async fn wait_for_event(&mut self, event_type: &str, timeout: Duration) -> Result<Event> {
        self.wait_for(event_type, timeout, |_| true).await
    }

    /// Waits for an event of the given type whose data satisfies `predicate`,
    /// discarding anything else that arrives in the meantime.
    pub async fn wait_for<F>(
        &mut self,
        event_type: &str,
        timeout: Duration,
        predicate: F,
    ) -> Result<Event>
    where
        F: Fn(&Value) -> bool,
    {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                anyhow::bail!("Timeout waiting for event: {}", event_type);
            }

            match tokio::time::timeout(remaining, self.event_rx.recv()).await {
                Ok(Some(event)) if event.event_type == event_type && predicate(&event.data) => {
                    return Ok(event);
                }
                Ok(Some(_)) => {
                    // Wrong event, keep waiting
                    continue;
                }
                Ok(None) => {
                    anyhow::bail!("SSE connection closed");
                }
                Err(_) => {
                    anyhow::bail!("Timeout waiting for event: {}", event_type);
                }
            }
        }
    }

    /// Returns the first matching event seen within `window`, or `None` if the
    /// stream stayed quiet.
    pub async fn expect_silence<F>(&mut self, event_type: &str, window: Duration, predicate: F) -> Option<Event>
    where
        F: Fn(&Value) -> bool,
    {
        self.wait_for(event_type, window, predicate).await.ok()
    }
}
