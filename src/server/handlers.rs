use super::session::{ensure_session, session_id};
use super::AppState;
use crate::adapters::output::{generate_output_filename, xlsx_bytes, OutputFormat};
use crate::utils::error::TrackerError;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// JSON `{"error": …}` response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<TrackerError> for ApiError {
    fn from(e: TrackerError) -> Self {
        tracing::error!("Internal error: {}", e);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ProcessRequest {
    spreadsheet_url: Option<String>,
}

pub async fn index_handler(headers: HeaderMap) -> impl IntoResponse {
    let (_, set_cookie) = ensure_session(&headers);
    (set_cookie, Html(include_str!("index.html")))
}

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        "active_jobs": state.jobs.len(),
    }))
}

pub async fn process_spreadsheet_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let spreadsheet_url = serde_json::from_slice::<ProcessRequest>(&body)
        .ok()
        .and_then(|req| req.spreadsheet_url)
        .ok_or_else(|| ApiError::bad_request("No spreadsheet URL provided"))?;

    let spreadsheet_url = spreadsheet_url.trim();
    if spreadsheet_url.is_empty() {
        return Err(ApiError::bad_request("Spreadsheet URL is empty"));
    }

    let (session_id, set_cookie) = ensure_session(&headers);
    let already_running = || {
        ApiError::new(
            StatusCode::CONFLICT,
            "You already have a tracking job running. Please wait for it to complete.",
        )
    };
    if state.jobs.is_running(&session_id) {
        return Err(already_running());
    }

    tracing::info!(
        "Processing spreadsheet for session {}: {}",
        session_id,
        spreadsheet_url
    );
    let comment_urls = state.loader.load(spreadsheet_url).await.map_err(|e| {
        tracing::error!("Error: {}", e);
        ApiError::bad_request(format!("Failed to load spreadsheet: {}", e))
    })?;

    let total = comment_urls.len();
    if !state.jobs.try_start(&session_id, total) {
        return Err(already_running());
    }
    state
        .jobs
        .spawn_job(session_id.clone(), comment_urls, state.processor.clone());
    tracing::info!("Started processing {} URLs for session {}", total, session_id);

    let body = Json(json!({
        "success": true,
        "message": format!("Started processing {} URLs", total),
        "job_id": session_id,
    }));
    Ok((set_cookie, body).into_response())
}

pub async fn status_handler(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let status = session_id(&headers)
        .map(|id| state.jobs.status(&id))
        .unwrap_or_default();
    Json(status)
}

pub async fn results_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let results = session_id(&headers)
        .map(|id| state.jobs.results(&id))
        .unwrap_or_default();
    Json(json!({ "results": results }))
}

pub async fn export_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let results = session_id(&headers)
        .map(|id| state.jobs.results(&id))
        .unwrap_or_default();
    if results.is_empty() {
        return Err(ApiError::bad_request("No results to export"));
    }

    let data = xlsx_bytes(&results).map_err(|e| {
        tracing::error!("Export error: {}", e);
        ApiError::from(e)
    })?;
    let filename = generate_output_filename(OutputFormat::Xlsx);

    Ok((
        [
            (CONTENT_TYPE, XLSX_MIME.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        data,
    )
        .into_response())
}

pub async fn not_found_handler() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Endpoint not found")
}
