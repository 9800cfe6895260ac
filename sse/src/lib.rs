//! Server-Sent Events (SSE) infrastructure for pushing site events to admin panels.
//!
//! # Architecture
//!
//! - **Anonymous connections**: Admin panels open a long-lived SSE stream; the
//!   only gate is the origin policy enforced by the web layer.
//! - **Concurrent registry**: A single DashMap holds every open connection, so
//!   connect, disconnect and broadcast never coordinate with each other.
//! - **Connection and Broadcast scopes**: Messages go either to one connection
//!   (the greeting) or to everyone currently connected.
//! - **Ephemeral messages**: Nothing is buffered for absent clients. A panel that
//!   connects after a broadcast never sees it.
//!
//! # Message Flow
//!
//! 1. Admin panel opens `/sse`
//! 2. Connection registered in ConnectionRegistry and greeted with `connected`
//! 3. Public site posts to `/api/event`; the controller publishes a DomainEvent
//! 4. SseDomainEventHandler converts it into a `site:event` broadcast
//! 5. Every connection present at that moment gets the payload queued
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry and type-safe ConnectionId
//! - `manager`: High-level message routing (delegates to ConnectionRegistry)
//! - `message`: Type-safe event and scope definitions
//! - `domain_event_handler`: Bridges the events crate to SSE broadcasts

pub mod connection;
pub mod domain_event_handler;
pub mod manager;
pub mod message;

pub use domain_event_handler::SseDomainEventHandler;
pub use manager::Manager;
