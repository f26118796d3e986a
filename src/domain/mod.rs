//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O. Raw request bodies are
//! turned into validated types here, and every derived value is computed here.

pub mod features;
mod measurement;
mod patient;
mod prediction;
mod validation;

pub use features::{AgeGroup, CityTier, DerivedFeatures, FeatureRow, LifestyleRisk};
pub use measurement::{normalize_city, title_case, Occupation, UserMeasurement};
pub use patient::{
    Gender, Patient, PatientRecord, PatientUpdate, PatientView, SortField, SortOrder, Verdict,
};
pub use prediction::{Prediction, PredictionResponse};
pub use validation::{FieldViolation, ValidationError, FALSE_TOKENS, TRUE_TOKENS};
