//! Prediction API: `/`, `/health` and `/predict`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::application::{HealthStatus, PredictError, PredictionService};
use crate::domain::{PredictionResponse, ValidationError};
use crate::ports::PremiumClassifier;

/// Build the prediction API router around a loaded classifier.
pub fn router<C>(service: PredictionService<C>, cors_permissive: bool) -> Router
where
    C: PremiumClassifier + 'static,
{
    let app = Router::new()
        .route("/", get(home))
        .route("/health", get(health::<C>))
        .route("/predict", post(predict::<C>))
        .with_state(Arc::new(service))
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any);
        app.layer(cors)
    } else {
        app
    }
}

async fn home() -> Json<Value> {
    Json(json!({ "message": "insurance prediction API" }))
}

async fn health<C: PremiumClassifier>(
    State(service): State<Arc<PredictionService<C>>>,
) -> Json<HealthStatus> {
    Json(service.health())
}

async fn predict<C: PremiumClassifier>(
    State(service): State<Arc<PredictionService<C>>>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, PredictError> {
    let body: Value = serde_json::from_slice(&body).map_err(|e| {
        PredictError::Validation(ValidationError::single("body", format!("invalid JSON: {e}")))
    })?;
    let prediction = service.predict(&body)?;
    Ok(Json(prediction.into()))
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": "invalid input", "detail": e.violations() })),
            )
                .into_response(),
            Self::Gateway(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response(),
        }
    }
}
