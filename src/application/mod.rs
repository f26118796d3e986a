//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

pub(crate) mod prediction;
mod records;

pub use prediction::{HealthStatus, PredictError, PredictStage, PredictionService};
pub use records::{RecordError, RecordService};
