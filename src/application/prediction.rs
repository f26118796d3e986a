//! Prediction service: Validates, derives and classifies one request.
//!
//! This service coordinates:
//! - Input validation
//! - Derived feature computation
//! - Classifier invocation
//! - Response shaping

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::domain::{FeatureRow, Prediction, UserMeasurement, ValidationError};
use crate::ports::{GatewayError, PremiumClassifier};

/// Stages a predict request moves through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictStage {
    Received,
    Validating,
    Deriving,
    Predicting,
    Responding,
    Failed(String),
}

impl fmt::Display for PredictStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received => write!(f, "received"),
            Self::Validating => write!(f, "validating"),
            Self::Deriving => write!(f, "deriving"),
            Self::Predicting => write!(f, "predicting"),
            Self::Responding => write!(f, "responding"),
            Self::Failed(reason) => write!(f, "failed({reason})"),
        }
    }
}

/// Errors a predict request can end in.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: String,
    pub model_loaded: bool,
}

/// Service for premium category prediction.
pub struct PredictionService<C>
where
    C: PremiumClassifier,
{
    classifier: Arc<C>,
}

impl<C> Clone for PredictionService<C>
where
    C: PremiumClassifier,
{
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
        }
    }
}

impl<C> PredictionService<C>
where
    C: PremiumClassifier,
{
    /// Create a new prediction service around an already-loaded classifier.
    pub fn new(classifier: Arc<C>) -> Self {
        Self { classifier }
    }

    /// Run the full pipeline on a raw request body.
    ///
    /// Exactly one feature row reaches the classifier, and only after every
    /// field has validated.
    ///
    /// # Errors
    /// Returns `PredictError::Validation` listing every bad field, or
    /// `PredictError::Gateway` if the classifier fails.
    pub fn predict(&self, body: &Value) -> Result<Prediction, PredictError> {
        let mut stage = PredictStage::Received;
        tracing::debug!(%stage, "predict request");

        stage = PredictStage::Validating;
        tracing::debug!(%stage, "predict request");
        let measurement = match UserMeasurement::from_json(body) {
            Ok(m) => m,
            Err(e) => {
                let stage =
                    PredictStage::Failed(format!("{} invalid field(s)", e.violations().len()));
                tracing::debug!(%stage, fields = ?e.fields(), "predict request rejected");
                return Err(e.into());
            }
        };

        stage = PredictStage::Deriving;
        tracing::debug!(%stage, "predict request");
        let derived = measurement.derive();
        let row = FeatureRow::new(&measurement, &derived);

        stage = PredictStage::Predicting;
        tracing::debug!(
            %stage,
            bmi = derived.bmi,
            age_group = derived.age_group.as_str(),
            lifestyle_risk = derived.lifestyle_risk.as_str(),
            city_tier = derived.city_tier.number(),
            "predict request"
        );
        let prediction = match self.classifier.predict(&row) {
            Ok(p) => p,
            Err(e) => {
                let stage = PredictStage::Failed(e.to_string());
                tracing::warn!(%stage, "classifier failed");
                return Err(e.into());
            }
        };

        stage = PredictStage::Responding;
        match prediction.confidence() {
            Some(c) => tracing::debug!(
                %stage,
                "predicted {} ({:.1}%)",
                prediction.predicted_category,
                c * 100.0
            ),
            None => tracing::debug!(%stage, "predicted {}", prediction.predicted_category),
        }
        Ok(prediction)
    }

    /// Liveness and model status, independent of the predict path.
    #[must_use]
    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "OK",
            version: self.classifier.model_version().to_string(),
            model_loaded: self.classifier.is_loaded(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{AgeGroup, CityTier, LifestyleRisk, Occupation};
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every row it is handed and answers with a fixed label.
    #[derive(Default)]
    pub(crate) struct RecordingClassifier {
        pub rows: Mutex<Vec<FeatureRow>>,
    }

    impl PremiumClassifier for RecordingClassifier {
        fn predict(&self, row: &FeatureRow) -> Result<Prediction, GatewayError> {
            self.rows.lock().expect("lock").push(*row);
            Ok(Prediction::label("Medium"))
        }

        fn is_loaded(&self) -> bool {
            true
        }

        fn model_version(&self) -> &str {
            "test-1"
        }
    }

    pub(crate) struct FailingClassifier;

    impl PremiumClassifier for FailingClassifier {
        fn predict(&self, _row: &FeatureRow) -> Result<Prediction, GatewayError> {
            Err(GatewayError::Inference("feature mismatch".into()))
        }

        fn is_loaded(&self) -> bool {
            false
        }

        fn model_version(&self) -> &str {
            "broken"
        }
    }

    pub(crate) fn scenario() -> Value {
        json!({
            "age": 29, "weight": 83, "height": 1.72, "smoker": true,
            "city": "Delhi", "occupation": "private_job", "income_lpa": 12
        })
    }

    #[test]
    fn test_scenario_reaches_classifier_once() {
        let classifier = Arc::new(RecordingClassifier::default());
        let service = PredictionService::new(Arc::clone(&classifier));

        let prediction = service.predict(&scenario()).expect("Should predict");
        assert_eq!(prediction.predicted_category, "Medium");

        let rows = classifier.rows.lock().expect("lock");
        assert_eq!(rows.len(), 1);
        let row = rows[0];
        assert!((row.bmi - 28.0556).abs() < 1e-3);
        assert_eq!(row.age_group, AgeGroup::Adult);
        assert_eq!(row.lifestyle_risk, LifestyleRisk::Medium);
        assert_eq!(row.city_tier, CityTier::Tier1);
        assert!((row.income_lpa - 12.0).abs() < f64::EPSILON);
        assert_eq!(row.occupation, Occupation::PrivateJob);
    }

    #[test]
    fn test_invalid_body_never_reaches_classifier() {
        let classifier = Arc::new(RecordingClassifier::default());
        let service = PredictionService::new(Arc::clone(&classifier));

        let err = service
            .predict(&json!({"age": 0, "height": 3.0}))
            .expect_err("Should reject");
        match err {
            PredictError::Validation(v) => {
                assert!(v.has_field("age"));
                assert!(v.has_field("height"));
                assert!(v.has_field("occupation"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(classifier.rows.lock().expect("lock").is_empty());
    }

    #[test]
    fn test_gateway_failure_is_surfaced() {
        let service = PredictionService::new(Arc::new(FailingClassifier));
        let err = service.predict(&scenario()).expect_err("Should fail");
        assert!(matches!(err, PredictError::Gateway(GatewayError::Inference(_))));
        assert!(err.to_string().contains("feature mismatch"));
    }

    #[test]
    fn test_health_reports_model_state() {
        let healthy = PredictionService::new(Arc::new(RecordingClassifier::default())).health();
        assert_eq!(healthy.status, "OK");
        assert_eq!(healthy.version, "test-1");
        assert!(healthy.model_loaded);

        let broken = PredictionService::new(Arc::new(FailingClassifier)).health();
        assert!(!broken.model_loaded);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(PredictStage::Predicting.to_string(), "predicting");
        assert_eq!(
            PredictStage::Failed("bad".into()).to_string(),
            "failed(bad)"
        );
    }
}
