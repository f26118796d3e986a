//! HTTP client for the prediction API.

use serde_json::Value;

/// What the front end can tell the user about one prediction call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictOutcome {
    /// 200 with a `predicted_category`
    Label(String),
    /// Any other response
    ApiError,
    /// The request never got a response
    Unreachable,
}

/// Calls `POST /predict` on the configured API.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    http: reqwest::Client,
    url: String,
}

impl PredictionClient {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn predict(&self, body: &Value) -> PredictOutcome {
        let response = match self.http.post(&self.url).json(body).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Prediction API unreachable at {}: {e}", self.url);
                return PredictOutcome::Unreachable;
            }
        };

        let status = response.status();
        let payload: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Prediction API returned {status} with unreadable body: {e}");
                return PredictOutcome::ApiError;
            }
        };

        match payload.get("predicted_category").and_then(Value::as_str) {
            Some(label) if status == reqwest::StatusCode::OK => {
                PredictOutcome::Label(label.to_string())
            }
            _ => {
                tracing::warn!("Prediction API returned {status}: {payload}");
                PredictOutcome::ApiError
            }
        }
    }
}
