use crate::{
    controller::{event_controller, health_check_controller},
    extractors::button_secret::BUTTON_SECRET_HEADER,
    middleware::origin::enforce_origin,
    sse::handler::sse_handler,
    AppState,
};
use axum::{
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(event_routes(app_state.clone()))
        .merge(sse_routes(app_state.clone()))
        .layer(cors_layer(&app_state))
        // Outermost: the origin decision runs before CORS handling and every handler
        .layer(from_fn_with_state(app_state, enforce_origin))
}

fn health_routes() -> Router {
    Router::new()
        .route("/", get(health_check_controller::root))
        .route("/health", get(health_check_controller::health_check))
}

fn event_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/event", post(event_controller::create))
        .with_state(app_state)
}

fn sse_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/sse", get(sse_handler))
        .with_state(app_state)
}

/// CORS response headers for browser callers. Which origins get them is decided by
/// the same `OriginPolicy` the middleware enforces; the request origin is mirrored.
fn cors_layer(app_state: &AppState) -> CorsLayer {
    let origin_policy = app_state.origin_policy.clone();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request_parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| origin_policy.is_allowed(Some(origin)))
            },
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(BUTTON_SECRET_HEADER)])
        .allow_credentials(true)
}
