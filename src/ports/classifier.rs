//! Classifier port: Trait for the premium prediction gateway.
//!
//! The model behind this trait is an opaque pre-trained artifact. It is
//! loaded once at startup and only read afterwards, so implementations must
//! be safe to share across request handlers.

use crate::domain::{FeatureRow, Prediction};

/// Errors raised by the prediction gateway.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("Model artifact unavailable: {0}")]
    Artifact(String),

    #[error("Model artifact failed integrity check: {0}")]
    Integrity(String),

    #[error("Model not loaded")]
    NotLoaded,

    #[error("Prediction failed: {0}")]
    Inference(String),
}

/// Trait for premium category classifiers.
///
/// Implementations receive exactly one feature row per call and return one
/// label, optionally with per-class probabilities.
pub trait PremiumClassifier: Send + Sync {
    /// Predict the premium category for a single row.
    ///
    /// # Errors
    /// Returns `GatewayError::Inference` if the model cannot score the row.
    fn predict(&self, row: &FeatureRow) -> Result<Prediction, GatewayError>;

    /// Whether a model artifact is loaded and ready to serve.
    fn is_loaded(&self) -> bool;

    /// Version string of the loaded model.
    fn model_version(&self) -> &str;
}
