use axum::http::StatusCode;
use axum::response::IntoResponse;

/// GET / liveness probe used by the public site and uptime checks
pub async fn root() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "healthy")
}
