use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use busterd::api::{router, AppState};
use busterd::jobs::manager::{JobManager, JobManagerOptions};
use busterd::probe::ProbeClient;
use busterd::storage::FileJobStore;
use busterd::wordlist::{WordlistManager, WordlistProvider};

fn test_app(dir: &TempDir) -> Router {
    let store = Arc::new(FileJobStore::open(dir.path().join("jobs.json")).unwrap());
    let wordlists = Arc::new(WordlistManager::new());
    let manager = JobManager::new(
        store,
        Arc::clone(&wordlists) as Arc<dyn WordlistProvider>,
        ProbeClient::new(2).unwrap(),
        CancellationToken::new(),
        JobManagerOptions::default(),
    );
    router(AppState { manager, wordlists })
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn jobs_list_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let resp = app.oneshot(get("/api/jobs")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!([]));
}

#[tokio::test]
async fn wordlist_upload_and_job_start_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/wordlists/add",
            json!({"name": "common", "words": ["admin", "login"]}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let wl_id = body_json(resp).await["id"].as_str().unwrap().to_string();

    let resp = app.clone().oneshot(get("/api/wordlists")).await.unwrap();
    let lists = body_json(resp).await;
    assert_eq!(lists.as_array().unwrap().len(), 1);
    assert_eq!(lists[0]["name"], "common");

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/jobs/start",
            json!({"target": "http://127.0.0.1:1", "wordlistId": wl_id, "type": "directory"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let job = body_json(resp).await;
    assert_eq!(job["status"], "running");
    assert_eq!(job["wordlistId"], Value::String(wl_id));
    let job_id = job["id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(post_json("/api/jobs/stop", json!({"jobId": job_id})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/jobs/{job_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.oneshot(get("/api/jobs")).await.unwrap();
    assert_eq!(body_json(resp).await, json!([]));
}

#[tokio::test]
async fn start_with_unknown_wordlist_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let resp = app
        .oneshot(post_json(
            "/api/jobs/start",
            json!({"target": "http://127.0.0.1:1", "wordlistId": "missing", "type": "subdomain"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stop_and_delete_unknown_job_are_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let resp = app
        .clone()
        .oneshot(post_json("/api/jobs/stop", json!({"jobId": "zzz"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/jobs/zzz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rate_limit_update_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let resp = app
        .oneshot(post_json("/api/rate-limit", json!({"rateLimit": 3.0})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
