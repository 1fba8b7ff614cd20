//! Thin HTTP pass-through over the job engine and wordlist manager.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::error::EngineError;
use crate::jobs::manager::JobManager;
use crate::jobs::{Job, JobType};
use crate::wordlist::{Wordlist, WordlistManager};

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<JobManager>,
    pub wordlists: Arc<WordlistManager>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/jobs", get(list_jobs))
        .route("/api/jobs/start", post(start_job))
        .route("/api/jobs/stop", post(stop_job))
        .route("/api/jobs/{id}", delete(delete_job))
        .route("/api/wordlists", get(list_wordlists))
        .route("/api/wordlists/add", post(add_wordlist))
        .route("/api/rate-limit", post(update_rate_limit))
        .with_state(state)
}

struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::JobNotFound(_) | EngineError::WordlistNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            EngineError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.0.to_string()).into_response()
    }
}

async fn list_jobs(State(state): State<AppState>) -> Json<Vec<Job>> {
    Json(state.manager.get_jobs().await)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartJobRequest {
    target: String,
    wordlist_id: String,
    #[serde(rename = "type")]
    kind: JobType,
}

async fn start_job(
    State(state): State<AppState>,
    Json(req): Json<StartJobRequest>,
) -> Result<Json<Job>, ApiError> {
    let id = state
        .manager
        .start_job(&req.target, &req.wordlist_id, req.kind)
        .await?;
    Ok(Json(state.manager.get_job(&id)?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StopJobRequest {
    job_id: String,
}

async fn stop_job(
    State(state): State<AppState>,
    Json(req): Json<StopJobRequest>,
) -> Result<StatusCode, ApiError> {
    state.manager.stop_job(&req.job_id).await?;
    Ok(StatusCode::OK)
}

async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.manager.delete_job(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_wordlists(State(state): State<AppState>) -> Json<Vec<Wordlist>> {
    Json(state.wordlists.list())
}

#[derive(Deserialize)]
struct AddWordlistRequest {
    name: String,
    words: Vec<String>,
}

async fn add_wordlist(
    State(state): State<AppState>,
    Json(req): Json<AddWordlistRequest>,
) -> Json<serde_json::Value> {
    let id = state.wordlists.add(&req.name, req.words);
    Json(json!({ "id": id }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateLimitRequest {
    rate_limit: f64,
}

async fn update_rate_limit(
    State(state): State<AppState>,
    Json(req): Json<RateLimitRequest>,
) -> StatusCode {
    state.manager.update_rate_limit(req.rate_limit);
    StatusCode::OK
}
