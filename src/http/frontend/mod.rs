//! Web front end: session-based HTML pages over the prediction API.
//!
//! The session store and the API client are constructed by the caller and
//! injected through [`FrontendState`].

mod client;
mod forms;
pub mod pages;
mod session;

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::domain::title_case;

pub use client::{PredictOutcome, PredictionClient};
pub use forms::{FormErrors, LoginForm, PredictForm};
pub use session::{cookie_value, Flash, SessionHandle, SessionStore, SESSION_COOKIE};

/// Shared front end state.
#[derive(Clone)]
pub struct FrontendState {
    pub sessions: Arc<SessionStore>,
    pub client: Arc<PredictionClient>,
}

impl FrontendState {
    pub fn new(sessions: Arc<SessionStore>, client: Arc<PredictionClient>) -> Self {
        Self { sessions, client }
    }
}

/// Build the front end router.
pub fn router(state: FrontendState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/home", get(home))
        .route("/about", get(about))
        .route("/contact", get(contact))
        .route("/signup", get(signup))
        .route("/login", get(login_page).post(login_submit))
        .route("/predict", get(predict_page).post(predict_submit))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Default, Deserialize)]
struct NextParam {
    next: Option<String>,
}

/// Attach the session cookie when this request stored a new session.
fn with_session(
    sessions: &SessionStore,
    handle: &SessionHandle,
    response: impl IntoResponse,
) -> Response {
    let mut response = response.into_response();
    if let Some(cookie) = sessions.set_cookie(handle) {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

/// Only same-site relative paths are followed after login.
///
/// Browsers drop tabs and newlines from a `Location` before resolving it, so
/// `/\t/host` would become `//host`. Any control or whitespace character is
/// refused, as is anything that cannot be sent as a header value.
fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| {
        n.starts_with('/')
            && !n.starts_with("//")
            && !n.contains('\\')
            && !n.chars().any(|c| c.is_control() || c.is_whitespace())
            && HeaderValue::try_from(*n).is_ok()
    })
}

async fn home(State(state): State<FrontendState>, headers: HeaderMap) -> Response {
    let handle = state.sessions.begin(&headers);
    let flashes = state.sessions.take_flashes(&handle);
    let username = state.sessions.username(&handle);
    with_session(
        &state.sessions,
        &handle,
        pages::home(&flashes, username.as_deref()),
    )
}

async fn signup(State(state): State<FrontendState>, headers: HeaderMap) -> Response {
    let handle = state.sessions.begin(&headers);
    let flashes = state.sessions.take_flashes(&handle);
    let username = state.sessions.username(&handle);
    with_session(
        &state.sessions,
        &handle,
        pages::signup(&flashes, username.as_deref()),
    )
}

/// Resolve the logged-in user, or queue "Login Required" and build the redirect.
fn require_login(
    state: &FrontendState,
    handle: &SessionHandle,
    path: &str,
) -> Result<String, Response> {
    match state.sessions.username(handle) {
        Some(name) => {
            state
                .sessions
                .flash(handle, "success", format!("Hi {name}, have a good day!"));
            Ok(name)
        }
        None => {
            state.sessions.flash(handle, "danger", "Login Required");
            Err(with_session(
                &state.sessions,
                handle,
                Redirect::to(&format!("/login?next={path}")),
            ))
        }
    }
}

async fn about(State(state): State<FrontendState>, headers: HeaderMap) -> Response {
    let handle = state.sessions.begin(&headers);
    let name = match require_login(&state, &handle, "/about") {
        Ok(name) => name,
        Err(redirect) => return redirect,
    };
    let flashes = state.sessions.take_flashes(&handle);
    with_session(
        &state.sessions,
        &handle,
        pages::about(&flashes, Some(&name)),
    )
}

async fn contact(State(state): State<FrontendState>, headers: HeaderMap) -> Response {
    let handle = state.sessions.begin(&headers);
    let name = match require_login(&state, &handle, "/contact") {
        Ok(name) => name,
        Err(redirect) => return redirect,
    };
    let flashes = state.sessions.take_flashes(&handle);
    with_session(
        &state.sessions,
        &handle,
        pages::contact(&flashes, Some(&name)),
    )
}

async fn login_page(
    State(state): State<FrontendState>,
    headers: HeaderMap,
    Query(params): Query<NextParam>,
) -> Response {
    let handle = state.sessions.begin(&headers);
    let flashes = state.sessions.take_flashes(&handle);
    let next = safe_next(params.next.as_deref());
    with_session(
        &state.sessions,
        &handle,
        pages::login(&flashes, "", &FormErrors::new(), next),
    )
}

async fn login_submit(
    State(state): State<FrontendState>,
    headers: HeaderMap,
    Query(params): Query<NextParam>,
    Form(form): Form<LoginForm>,
) -> Response {
    let handle = state.sessions.begin(&headers);
    let next = safe_next(params.next.as_deref());

    match form.validate() {
        Ok(username) => {
            state.sessions.set_username(&handle, &username);
            state.sessions.flash(
                &handle,
                "success",
                format!("Successfully logged in as {}!", title_case(&username)),
            );
            tracing::info!("Session {} logged in", handle.id);
            with_session(
                &state.sessions,
                &handle,
                Redirect::to(next.unwrap_or("/home")),
            )
        }
        Err(errors) => {
            let flashes = state.sessions.take_flashes(&handle);
            with_session(
                &state.sessions,
                &handle,
                pages::login(&flashes, &form.username, &errors, next),
            )
        }
    }
}

async fn predict_page(State(state): State<FrontendState>, headers: HeaderMap) -> Response {
    let handle = state.sessions.begin(&headers);
    let flashes = state.sessions.take_flashes(&handle);
    let username = state.sessions.username(&handle);
    let form = PredictForm {
        smoker: "False".to_string(),
        ..PredictForm::default()
    };
    with_session(
        &state.sessions,
        &handle,
        pages::predict(&flashes, username.as_deref(), &form, &FormErrors::new(), None),
    )
}

async fn predict_submit(
    State(state): State<FrontendState>,
    headers: HeaderMap,
    Form(form): Form<PredictForm>,
) -> Response {
    let handle = state.sessions.begin(&headers);
    let username = state.sessions.username(&handle);

    let mut prediction = None;
    let errors = match form.validate() {
        Ok(body) => {
            match state.client.predict(&body).await {
                PredictOutcome::Label(label) => {
                    state
                        .sessions
                        .flash(&handle, "success", format!("Prediction: {label}"));
                    prediction = Some(label);
                }
                PredictOutcome::ApiError => {
                    state
                        .sessions
                        .flash(&handle, "danger", "API Error: Could not get prediction.");
                }
                PredictOutcome::Unreachable => {
                    state.sessions.flash(
                        &handle,
                        "danger",
                        "Could not connect to the prediction server.",
                    );
                }
            }
            FormErrors::new()
        }
        Err(errors) => errors,
    };

    let flashes = state.sessions.take_flashes(&handle);
    with_session(
        &state.sessions,
        &handle,
        pages::predict(
            &flashes,
            username.as_deref(),
            &form,
            &errors,
            prediction.as_deref(),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::prediction::tests::{FailingClassifier, RecordingClassifier};
    use crate::application::PredictionService;
    use crate::http::prediction_api;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Duration;
    use tower::ServiceExt;

    const PREDICT_FORM: &str =
        "age=29&weight=83&height=1.72&income_lpa=12&smoker=True&city=Delhi&occupation=private_job";

    fn app_with_url(url: &str) -> Router {
        router(FrontendState::new(
            Arc::new(SessionStore::new(Duration::minutes(30))),
            Arc::new(PredictionClient::new(url)),
        ))
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        format!("http://{addr}/predict")
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
        let response = app.clone().oneshot(request).await.expect("Should respond");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        (status, headers, String::from_utf8_lossy(&bytes).into_owned())
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        builder.body(Body::empty()).expect("request")
    }

    fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        builder.body(Body::from(body.to_string())).expect("request")
    }

    fn session_cookie(headers: &HeaderMap) -> String {
        let raw = headers
            .get(header::SET_COOKIE)
            .expect("Set-Cookie")
            .to_str()
            .expect("ascii");
        raw.split(';').next().expect("pair").to_string()
    }

    #[tokio::test]
    async fn test_anonymous_pages_store_no_session() {
        let sessions = Arc::new(SessionStore::new(Duration::minutes(30)));
        let app = router(FrontendState::new(
            sessions.clone(),
            Arc::new(PredictionClient::new("http://127.0.0.1:9/predict")),
        ));

        for uri in ["/", "/home", "/signup", "/login", "/predict"] {
            let (status, headers, body) = send(&app, get(uri, None)).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert!(headers.get(header::SET_COOKIE).is_none(), "{uri}");
            if uri == "/" {
                assert!(body.contains("Insurance Premium Predictor"));
            }
        }
        assert!(sessions.is_empty());

        let (_, headers, _) = send(&app, get("/about", None)).await;
        assert!(session_cookie(&headers).starts_with("hq_session="));
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_about_requires_login() {
        let app = app_with_url("http://127.0.0.1:9/predict");
        let (status, headers, _) = send(&app, get("/about", None)).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(
            headers.get(header::LOCATION).expect("location"),
            "/login?next=/about"
        );
        let cookie = session_cookie(&headers);

        let (_, _, body) = send(&app, get("/login?next=/about", Some(&cookie))).await;
        assert!(body.contains("Login Required"));
        assert!(body.contains("action=\"/login?next=/about\""));
    }

    #[tokio::test]
    async fn test_login_then_contact() {
        let app = app_with_url("http://127.0.0.1:9/predict");
        let (status, headers, _) =
            send(&app, post_form("/login?next=/contact", "username=asha+rao", None)).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(headers.get(header::LOCATION).expect("location"), "/contact");
        let cookie = session_cookie(&headers);

        let (status, _, body) = send(&app, get("/contact", Some(&cookie))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Successfully logged in as Asha Rao!"));
        assert!(body.contains("Hi asha rao, have a good day!"));
    }

    #[tokio::test]
    async fn test_login_rejects_offsite_next_and_short_names() {
        let app = app_with_url("http://127.0.0.1:9/predict");
        let (_, headers, _) = send(
            &app,
            post_form("/login?next=//evil.example", "username=asha", None),
        )
        .await;
        assert_eq!(headers.get(header::LOCATION).expect("location"), "/home");

        let (status, _, body) = send(&app, post_form("/login", "username=ab", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Field must be between 3 and 50 characters long."));
    }

    #[tokio::test]
    async fn test_login_ignores_next_with_control_characters() {
        let app = app_with_url("http://127.0.0.1:9/predict");
        for next in ["/%0aX", "/%09/evil.example", "/%0d%0aSet-Cookie:x=1", "/a%20b"] {
            let uri = format!("/login?next={next}");
            let (status, headers, _) = send(&app, post_form(&uri, "username=asha", None)).await;
            assert_eq!(status, StatusCode::SEE_OTHER, "next={next}");
            assert_eq!(
                headers.get(header::LOCATION).expect("location"),
                "/home",
                "next={next}"
            );
        }
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/about")), Some("/about"));
        assert_eq!(safe_next(Some("/predict?x=1")), Some("/predict?x=1"));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("/\\evil.example")), None);
        assert_eq!(safe_next(Some("/\t/evil.example")), None);
        assert_eq!(safe_next(Some("/\nX")), None);
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(None), None);
    }

    #[tokio::test]
    async fn test_predict_against_live_api() {
        let api = prediction_api::router(
            PredictionService::new(Arc::new(RecordingClassifier::default())),
            false,
        );
        let url = serve(api).await;
        let app = app_with_url(&url);

        let (status, _, body) = send(&app, post_form("/predict", PREDICT_FORM, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Prediction: Medium"));
        assert!(body.contains("class=\"result\""));
    }

    #[tokio::test]
    async fn test_predict_api_error() {
        let api =
            prediction_api::router(PredictionService::new(Arc::new(FailingClassifier)), false);
        let url = serve(api).await;
        let app = app_with_url(&url);

        let (_, _, body) = send(&app, post_form("/predict", PREDICT_FORM, None)).await;
        assert!(body.contains("API Error: Could not get prediction."));

        // Age 120 passes the form but the API rejects it with a 422.
        let api = prediction_api::router(
            PredictionService::new(Arc::new(RecordingClassifier::default())),
            false,
        );
        let app = app_with_url(&serve(api).await);
        let form = PREDICT_FORM.replace("age=29", "age=120");
        let (_, _, body) = send(&app, post_form("/predict", &form, None)).await;
        assert!(body.contains("API Error: Could not get prediction."));
    }

    #[tokio::test]
    async fn test_predict_unreachable_api() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let app = app_with_url(&format!("http://{addr}/predict"));
        let (_, _, body) = send(&app, post_form("/predict", PREDICT_FORM, None)).await;
        assert!(body.contains("Could not connect to the prediction server."));
    }

    #[tokio::test]
    async fn test_predict_form_errors_skip_api() {
        let app = app_with_url("http://127.0.0.1:9/predict");
        let (status, _, body) = send(&app, post_form("/predict", "age=0&city=X", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Enter valid age between 1 and 120"));
        assert!(body.contains("Enter a valid city name"));
        assert!(!body.contains("Could not connect"));
    }
}
