//! Tracing subscriber setup shared by every binary.
//!
//! `HEALTHQUOTE_LOG_MODE` picks the sink (`stdout` or `file`), and
//! `HEALTHQUOTE_LOG_FILE` names the file. All output passes through the
//! sanitizing writer.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::adapters::sanitize::SanitizingMakeWriter;

pub const LOG_MODE_ENV: &str = "HEALTHQUOTE_LOG_MODE";
pub const LOG_FILE_ENV: &str = "HEALTHQUOTE_LOG_FILE";

/// Install the global subscriber.
///
/// Keep the returned guard alive for the lifetime of the process; dropping it
/// flushes and stops the background writer.
///
/// # Errors
/// Returns error if the log file cannot be opened.
pub fn init(service: &str) -> std::io::Result<WorkerGuard> {
    let use_file = matches!(
        std::env::var(LOG_MODE_ENV).as_deref(),
        Ok("file") | Ok("FILE")
    );

    let (writer, guard) = if use_file {
        let log_file =
            std::env::var(LOG_FILE_ENV).unwrap_or_else(|_| format!("logs/{service}.log"));

        if let Some(parent) = Path::new(&log_file).parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    Ok(guard)
}
