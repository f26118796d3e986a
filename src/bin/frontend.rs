//! Web front end for the prediction API.

use std::sync::Arc;

use anyhow::Result;

use healthquote::config::FrontendConfig;
use healthquote::http::{
    self,
    frontend::{self, FrontendState, PredictionClient, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = healthquote::telemetry::init("frontend")?;

    let config = FrontendConfig::from_env()?;
    tracing::info!("Starting web front end (prediction API at {})", config.api_url);

    let state = FrontendState::new(
        Arc::new(SessionStore::new(config.session_ttl)),
        Arc::new(PredictionClient::new(config.api_url.clone())),
    );
    http::serve(config.addr, frontend::router(state)).await?;

    tracing::info!("Web front end shutdown complete.");
    Ok(())
}
