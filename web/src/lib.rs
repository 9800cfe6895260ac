//! HTTP surface of the site relay: event ingress, admin SSE stream, health checks.

use log::*;
use tokio::net::TcpListener;

pub use error::Error;
pub use service::AppState;

mod controller;
mod error;
mod extractors;
mod middleware;
pub mod router;
mod sse;

/// Binds the configured address and serves the relay until the process exits.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let listen_address = app_state.config.listen_address();
    let listener = TcpListener::bind(&listen_address).await?;

    info!("Realtime server running at http://{listen_address}");
    info!("Allowed origins: {}", app_state.origin_policy.describe());

    if app_state.config.uses_default_secret() {
        if app_state.config.is_production() {
            error!("BUTTON_SECRET is still the default placeholder; set a real secret");
        } else {
            warn!("BUTTON_SECRET is the default placeholder; override it before deploying");
        }
    }

    axum::serve(listener, router::define_routes(app_state)).await
}
