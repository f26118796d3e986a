//! Classifier output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Result of one classifier invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted premium category label (e.g. `High`, `Medium`, `Low`)
    pub predicted_category: String,

    /// Per-class probabilities, when the classifier provides them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<BTreeMap<String, f64>>,
}

impl Prediction {
    /// A bare label without probabilities.
    #[must_use]
    pub fn label(category: impl Into<String>) -> Self {
        Self {
            predicted_category: category.into(),
            probabilities: None,
        }
    }

    /// Probability assigned to the predicted category, if known.
    #[must_use]
    pub fn confidence(&self) -> Option<f64> {
        self.probabilities
            .as_ref()
            .and_then(|p| p.get(&self.predicted_category).copied())
    }
}

/// Body of a successful `/predict` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_category: String,
}

impl From<Prediction> for PredictionResponse {
    fn from(p: Prediction) -> Self {
        Self {
            predicted_category: p.predicted_category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_from_probabilities() {
        let mut probs = BTreeMap::new();
        probs.insert("High".to_string(), 0.7);
        probs.insert("Low".to_string(), 0.1);
        probs.insert("Medium".to_string(), 0.2);
        let p = Prediction {
            predicted_category: "High".to_string(),
            probabilities: Some(probs),
        };
        assert_eq!(p.confidence(), Some(0.7));
        assert_eq!(Prediction::label("Low").confidence(), None);
    }

    #[test]
    fn test_response_carries_only_the_category() {
        let p = Prediction::label("Medium");
        let body = serde_json::to_value(PredictionResponse::from(p)).expect("serialize");
        assert_eq!(body, serde_json::json!({"predicted_category": "Medium"}));
    }
}
