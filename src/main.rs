//! Healthquote: Insurance premium prediction API
//!
//! Main entry point. Loads the model artifact once, then serves `/predict`
//! and `/health`. A missing or corrupt artifact aborts startup.

use std::sync::Arc;

use anyhow::{Context, Result};

use healthquote::adapters::linear::LinearClassifier;
use healthquote::application::PredictionService;
use healthquote::config::PredictConfig;
use healthquote::http::{self, prediction_api};

fn load_classifier(config: &PredictConfig) -> healthquote::Result<LinearClassifier> {
    let mut classifier = LinearClassifier::new();
    classifier.load_model(&config.model_path)?;
    Ok(classifier)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = healthquote::telemetry::init("healthquote")?;

    let config = PredictConfig::from_env()?;
    tracing::info!("Starting Healthquote prediction API...");

    let classifier = match load_classifier(&config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Model artifact {:?} failed to load: {e}", config.model_path);
            return Err(e).context("Cannot start without a model");
        }
    };

    let service = PredictionService::new(Arc::new(classifier));
    let app = prediction_api::router(service, config.cors_permissive);
    http::serve(config.addr, app).await?;

    tracing::info!("Healthquote shutdown complete.");
    Ok(())
}
