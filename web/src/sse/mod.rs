//! SSE HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for the admin event stream.
//! The core SSE infrastructure (Manager, ConnectionRegistry, Message types)
//! lives in the `sse` crate.

pub mod handler;
