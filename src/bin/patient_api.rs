//! Patient record API backed by a flat JSON file.

use std::sync::Arc;

use anyhow::Result;

use healthquote::adapters::json_file::JsonFileRepository;
use healthquote::application::RecordService;
use healthquote::config::RecordsConfig;
use healthquote::http::{self, records_api};

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = healthquote::telemetry::init("patient_api")?;

    let config = RecordsConfig::from_env()?;
    tracing::info!("Starting patient record API on {:?}", config.data_path);

    let repo = Arc::new(JsonFileRepository::new(&config.data_path));
    let app = records_api::router(RecordService::new(repo));
    http::serve(config.addr, app).await?;

    tracing::info!("Patient record API shutdown complete.");
    Ok(())
}
