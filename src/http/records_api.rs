//! Patient record API.
//!
//! Handlers run the synchronous [`RecordService`] on the blocking pool since
//! every operation touches the backing file.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tower_http::trace::TraceLayer;

use crate::adapters::StorageError;
use crate::application::{RecordError, RecordService};
use crate::domain::{Patient, PatientRecord, PatientUpdate, ValidationError};
use crate::ports::RecordRepository;

type Shared<R> = Arc<RecordService<R>>;

/// Build the record API router.
pub fn router<R>(service: RecordService<R>) -> Router
where
    R: RecordRepository + 'static,
    R::Error: Into<StorageError>,
{
    Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .route("/view", get(view::<R>))
        .route("/patient/:id", get(patient::<R>))
        .route("/sort", get(sort::<R>))
        .route("/create", post(create::<R>))
        .route("/edit/:id", put(edit::<R>))
        .route("/delete/:id", delete(remove::<R>))
        .with_state(Arc::new(service))
        .layer(TraceLayer::new_for_http())
}

/// Run a service call on the blocking pool.
async fn blocking<R, T, F>(service: Shared<R>, f: F) -> Result<T, RecordError>
where
    R: RecordRepository + 'static,
    T: Send + 'static,
    F: FnOnce(&RecordService<R>) -> Result<T, RecordError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| RecordError::Task(e.to_string()))?
}

/// A record with its id, for list responses.
#[derive(Serialize)]
struct Listed<'a> {
    id: &'a str,
    #[serde(flatten)]
    record: &'a PatientRecord,
}

#[derive(Debug, Deserialize)]
struct SortParams {
    sort_by: Option<String>,
    order: Option<String>,
}

async fn home() -> Json<Value> {
    Json(json!({ "message": "Patient Management System API" }))
}

async fn about() -> Json<Value> {
    Json(json!({
        "message": "A fully functional API to manage your patient records with health insights"
    }))
}

async fn view<R>(State(service): State<Shared<R>>) -> Result<Json<Map<String, Value>>, RecordError>
where
    R: RecordRepository + 'static,
    R::Error: Into<StorageError>,
{
    let records = blocking(service, |s| s.list()).await?;
    let mut out = Map::with_capacity(records.len());
    for (id, record) in records {
        let value = serde_json::to_value(&record)
            .map_err(|e| RecordError::Storage(StorageError::Serialization(e.to_string())))?;
        out.insert(id, value);
    }
    Ok(Json(out))
}

async fn patient<R>(
    State(service): State<Shared<R>>,
    Path(id): Path<String>,
) -> Result<Json<PatientRecord>, RecordError>
where
    R: RecordRepository + 'static,
    R::Error: Into<StorageError>,
{
    let record = blocking(service, move |s| s.get(&id)).await?;
    Ok(Json(record))
}

async fn sort<R>(
    State(service): State<Shared<R>>,
    Query(params): Query<SortParams>,
) -> Result<Response, RecordError>
where
    R: RecordRepository + 'static,
    R::Error: Into<StorageError>,
{
    let sort_by = params
        .sort_by
        .ok_or_else(|| ValidationError::single("sort_by", "field required"))?;
    let order = params.order;
    let records = blocking(service, move |s| s.sort(&sort_by, order.as_deref())).await?;

    let listed: Vec<Listed<'_>> = records
        .iter()
        .map(|(id, record)| Listed { id, record })
        .collect();
    Ok(Json(listed).into_response())
}

/// Parse a JSON request body, reporting syntax errors as a 422.
fn json_body(body: &Bytes) -> Result<Value, RecordError> {
    serde_json::from_slice(body)
        .map_err(|e| ValidationError::single("body", format!("invalid JSON: {e}")).into())
}

async fn create<R>(
    State(service): State<Shared<R>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), RecordError>
where
    R: RecordRepository + 'static,
    R::Error: Into<StorageError>,
{
    let patient = Patient::from_json(&json_body(&body)?)?;
    blocking(service, move |s| s.create(patient)).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Patient created successfully" })),
    ))
}

async fn edit<R>(
    State(service): State<Shared<R>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, RecordError>
where
    R: RecordRepository + 'static,
    R::Error: Into<StorageError>,
{
    let update = PatientUpdate::from_json(&json_body(&body)?)?;
    blocking(service, move |s| s.update(&id, &update)).await?;
    Ok(Json(json!({ "message": "Patient updated" })))
}

async fn remove<R>(
    State(service): State<Shared<R>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, RecordError>
where
    R: RecordRepository + 'static,
    R::Error: Into<StorageError>,
{
    blocking(service, move |s| s.delete(&id)).await?;
    Ok(Json(json!({ "message": "Patient deleted" })))
}

impl IntoResponse for RecordError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) | Self::InvalidSortField(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::InvalidSortOrder(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Storage(_) | Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        match self {
            Self::Validation(e) => {
                tracing::debug!("Rejected record body: {e}");
                (status, Json(json!({ "detail": e.violations() }))).into_response()
            }
            Self::Storage(_) | Self::Task(_) => {
                tracing::error!("Record operation failed: {self}");
                (status, Json(json!({ "detail": self.to_string() }))).into_response()
            }
            other => (status, Json(json!({ "detail": other.to_string() }))).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::json_file::JsonFileRepository;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    fn app() -> (TempDir, Router) {
        let temp = tempdir().expect("tempdir");
        let repo = Arc::new(JsonFileRepository::new(temp.path().join("patients.json")));
        (temp, router(RecordService::new(repo)))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("Should respond");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn patient(id: &str, height: f64, weight: f64) -> Value {
        json!({
            "id": id, "name": format!("Patient {id}"), "city": "Pune", "age": 33,
            "gender": "Male", "height": height, "weight": weight
        })
    }

    #[tokio::test]
    async fn test_banners() {
        let (_temp, app) = app();
        let (status, body) = send(&app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Patient Management System API");
        let (_, body) = send(&app, "GET", "/about", None).await;
        assert!(body["message"].as_str().expect("message").contains("health insights"));
    }

    #[tokio::test]
    async fn test_create_view_and_get() {
        let (_temp, app) = app();
        let (status, body) = send(&app, "POST", "/create", Some(patient("P002", 1.8, 70.0))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Patient created successfully");
        send(&app, "POST", "/create", Some(patient("P001", 1.6, 80.0))).await;

        let (status, body) = send(&app, "GET", "/view", None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&String> = body.as_object().expect("object").keys().collect();
        assert_eq!(ids, vec!["P002", "P001"]);

        let (status, body) = send(&app, "GET", "/patient/P001", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bmi"], 31.25);
        assert_eq!(body["verdict"], "Obese");
        assert_eq!(body["city"], "Pune");
    }

    #[tokio::test]
    async fn test_create_duplicate_is_400() {
        let (_temp, app) = app();
        send(&app, "POST", "/create", Some(patient("P001", 1.6, 80.0))).await;
        let (status, body) = send(&app, "POST", "/create", Some(patient("P001", 1.7, 60.0))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Patient already exists");

        let (_, body) = send(&app, "GET", "/view", None).await;
        assert_eq!(body.as_object().expect("object").len(), 1);
        assert_eq!(body["P001"]["height"], 1.6);
    }

    #[tokio::test]
    async fn test_create_invalid_body_is_422() {
        let (_temp, app) = app();
        let (status, body) = send(
            &app,
            "POST",
            "/create",
            Some(json!({"id": "P001", "age": 0, "gender": "Unknown"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let detail = body["detail"].as_array().expect("detail list");
        assert!(detail.iter().any(|d| d["field"] == "age"));
        assert!(detail.iter().any(|d| d["field"] == "gender"));
    }

    #[tokio::test]
    async fn test_missing_patient_is_404() {
        let (_temp, app) = app();
        let (status, body) = send(&app, "GET", "/patient/P999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Patient not found");

        let (status, _) = send(&app, "PUT", "/edit/P999", Some(json!({"city": "Agra"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "DELETE", "/delete/P999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_edit_and_delete() {
        let (_temp, app) = app();
        send(&app, "POST", "/create", Some(patient("P001", 1.6, 80.0))).await;

        let (status, body) =
            send(&app, "PUT", "/edit/P001", Some(json!({"weight": 55.0, "city": "Agra"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Patient updated");

        let (_, body) = send(&app, "GET", "/patient/P001", None).await;
        assert_eq!(body["city"], "Agra");
        assert_eq!(body["verdict"], "Normal");

        let (status, _) = send(&app, "PUT", "/edit/P001", Some(json!({"height": -2}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = send(&app, "DELETE", "/delete/P001", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Patient deleted");
        let (_, body) = send(&app, "GET", "/view", None).await;
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_sort() {
        let (_temp, app) = app();
        send(&app, "POST", "/create", Some(patient("P001", 1.70, 90.0))).await;
        send(&app, "POST", "/create", Some(patient("P002", 1.60, 50.0))).await;
        send(&app, "POST", "/create", Some(patient("P003", 1.80, 70.0))).await;

        let (status, body) = send(&app, "GET", "/sort?sort_by=bmi&order=desc", None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body
            .as_array()
            .expect("list")
            .iter()
            .filter_map(|r| r["id"].as_str())
            .collect();
        assert_eq!(ids, vec!["P001", "P003", "P002"]);

        let (status, body) = send(&app, "GET", "/sort?sort_by=height", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], "P002");

        let (status, _) = send(&app, "GET", "/sort?sort_by=invalid", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "GET", "/sort?sort_by=bmi&order=up", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, "GET", "/sort", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
