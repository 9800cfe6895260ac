use crate::{AppState, Error};
use axum::{
    extract::{Request, State},
    http::header::ORIGIN,
    middleware::Next,
    response::{IntoResponse, Response},
};
use log::*;

/// Origin gate applied in front of every route.
///
/// Plain requests, CORS preflights and the SSE handshake all pass through this
/// one check, so the REST ingress and the push channel can never disagree.
/// Rejected requests get a 403 before any handler (or registration) runs.
pub async fn enforce_origin(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let origin = match request.headers().get(ORIGIN) {
        None => None,
        Some(value) => match value.to_str() {
            Ok(origin) => Some(origin.to_string()),
            Err(_) => {
                warn!("CORS blocked request with non-ASCII origin header");
                return Error::OriginRejected(String::from_utf8_lossy(value.as_bytes()).into_owned())
                    .into_response();
            }
        },
    };

    if app_state.origin_policy.is_allowed(origin.as_deref()) {
        return next.run(request).await;
    }

    let origin = origin.unwrap_or_default();
    warn!(
        "CORS blocked {} {} for origin: {}",
        request.method(),
        request.uri().path(),
        origin
    );
    Error::OriginRejected(origin).into_response()
}
