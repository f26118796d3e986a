//! HTTP layer: axum routers for the three services.
//!
//! - `prediction_api`: `/predict` and `/health` over a `PremiumClassifier`
//! - `records_api`: patient record CRUD over a `RecordRepository`
//! - `frontend`: session-based HTML pages calling the prediction API

pub mod frontend;
pub mod prediction_api;
pub mod records_api;

use std::net::SocketAddr;

use axum::Router;

/// Bind `addr` and serve `app` until Ctrl-C.
///
/// # Errors
/// Returns error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to install Ctrl-C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
