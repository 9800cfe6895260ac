//! Ingress for events posted by the public site.

use crate::controller::Ack;
use crate::extractors::button_secret::ButtonSecret;
use crate::AppState;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use events::{DomainEvent, EventInput, SiteEvent};
use log::*;

/// POST /api/event
///
/// Requires a matching `x-button-secret` header (enforced by the `ButtonSecret`
/// extractor before the body is read). The body is parsed leniently: absent or
/// malformed fields fall back to their defaults instead of failing the request.
/// Each accepted request publishes exactly one event.
pub async fn create(
    State(app_state): State<AppState>,
    _secret: ButtonSecret,
    body: Bytes,
) -> impl IntoResponse {
    let site_event = SiteEvent::received(EventInput::from_slice(&body));

    debug!(
        "Accepted site event: type={}, who={}",
        site_event.event_type, site_event.who
    );

    app_state
        .event_publisher
        .publish(DomainEvent::SiteEventReceived(site_event))
        .await;

    (StatusCode::OK, Json(Ack::ok()))
}
