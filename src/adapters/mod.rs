//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external resources:
//! - `linear`: JSON logistic model artifact behind `PremiumClassifier`
//! - `json_file`: flat JSON file behind `RecordRepository`
//! - `sanitize`: PII filtering for logs

pub mod json_file;
pub mod linear;
pub mod sanitize;

// Re-export storage error for lib.rs
pub use json_file::StorageError;
