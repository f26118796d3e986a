//! # Healthquote
//!
//! Insurance premium prediction API, patient record API and web front end.
//!
//! This crate provides:
//! - Validated derivation of BMI, lifestyle risk, city tier and age group
//!   feeding a pre-trained premium classifier
//! - A flat-file patient record store with CRUD and sorting
//! - A session-based HTML front end over the prediction API
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (measurements, derived features, patients)
//! - `ports`: Trait definitions for the classifier and the record repository
//! - `adapters`: Concrete implementations (JSON model artifact, JSON file store)
//! - `application`: Use cases orchestrating domain and ports
//! - `http`: axum routers for the three services

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod http;
pub mod ports;
pub mod telemetry;

pub use domain::{DerivedFeatures, FeatureRow, Prediction, UserMeasurement};

/// Result type for Healthquote operations
pub type Result<T> = std::result::Result<T, HealthquoteError>;

/// Main error type for Healthquote
#[derive(Debug, thiserror::Error)]
pub enum HealthquoteError {
    #[error("Invalid input: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("Prediction gateway failed: {0}")]
    Gateway(#[from] ports::GatewayError),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Record operation failed: {0}")]
    Record(#[from] application::RecordError),

    #[error("Prediction failed: {0}")]
    Predict(#[from] application::PredictError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
