//! # HTTP boundary
//!
//! The only externally observable protocol:
//!
//! - `POST /ask` — `{"question": "..."}` in, `{"question", "context"}` out,
//!   where `context` is a list of `[text, score]` pairs (k fixed at 8).
//! - `POST /rebuild` — re-ingest from the fact source and atomically swap in
//!   a fresh index; answers with the new corpus size.
//! - `GET /health` — liveness plus the current index size.
//!
//! The service stays available when retrieval context cannot be produced: an
//! empty or failed-to-build index answers `/ask` with empty `context` rather
//! than an error. Only malformed requests (blank question) and hard failures
//! (embedding error mid-query) produce error statuses.
//!
//! Embedding is CPU-bound synchronous work, so handlers push it onto the
//! blocking pool instead of stalling the runtime.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::config::{CONTEXT_K, RagConfig};
use crate::engine::RetrievalEngine;
use crate::error::RetrievalError;
use crate::ingest::fetch_documents;

/// Shared application state: the engine, the outbound HTTP client, and the
/// configuration the rebuild path needs.
pub struct AppState {
    pub engine: RetrievalEngine,
    pub http: reqwest::Client,
    pub config: RagConfig,
}

/// Build the router with all routes bound to `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ask", post(ask))
        .route("/rebuild", post(rebuild))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub question: String,
    /// `(text, score)` pairs serialize as `[text, score]` arrays, best first.
    pub context: Vec<(String, f32)>,
}

#[derive(Debug, Serialize)]
pub struct RebuildResponse {
    pub indexed: usize,
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    if request.question.trim().is_empty() {
        return Err(
            RetrievalError::InvalidArgument("question must not be empty".to_string()).into(),
        );
    }

    let question = request.question;
    let context = {
        let state = Arc::clone(&state);
        let question = question.clone();
        tokio::task::spawn_blocking(move || state.engine.query(&question, CONTEXT_K))
            .await
            .map_err(|err| ApiError::Internal(err.to_string()))??
    };

    Ok(Json(AskResponse { question, context }))
}

async fn rebuild(State(state): State<Arc<AppState>>) -> Result<Json<RebuildResponse>, ApiError> {
    let documents = fetch_documents(&state.http, &state.config.query_url()).await?;
    let indexed = {
        let state = Arc::clone(&state);
        tokio::task::spawn_blocking(move || state.engine.install(documents))
            .await
            .map_err(|err| ApiError::Internal(err.to_string()))??
    };
    Ok(Json(RebuildResponse { indexed }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "indexed": state.engine.indexed_documents(),
    }))
}

/// Error envelope for the HTTP boundary.
#[derive(Debug)]
pub enum ApiError {
    Retrieval(RetrievalError),
    Internal(String),
}

impl From<RetrievalError> for ApiError {
    fn from(err: RetrievalError) -> Self {
        ApiError::Retrieval(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Retrieval(err) => {
                let status = match err {
                    RetrievalError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                    RetrievalError::SourceUnavailable(_) => StatusCode::BAD_GATEWAY,
                    RetrievalError::EmbeddingFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        warn!("Request failed: {message}");
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::VocabEmbedder;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use httpmock::prelude::*;
    use tower::util::ServiceExt;

    fn test_state(fuseki_url: &str) -> Arc<AppState> {
        Arc::new(AppState {
            engine: RetrievalEngine::new(Arc::new(VocabEmbedder::new(128))),
            http: reqwest::Client::new(),
            config: RagConfig {
                fuseki_url: fuseki_url.to_string(),
                bind_addr: "127.0.0.1:0".to_string(),
            },
        })
    }

    fn ask_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/ask")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn ask_on_empty_index_returns_empty_context() {
        let state = test_state("http://localhost:3030/vn");
        let app = build_router(state);

        let response = app
            .oneshot(ask_request(r#"{"question": "where is Hanoi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["question"], "where is Hanoi");
        assert_eq!(body["context"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn ask_returns_ranked_text_score_pairs() {
        let state = test_state("http://localhost:3030/vn");
        state
            .engine
            .install(vec![
                "Hanoi formedBy ThangLong".to_string(),
                "Hue canonicalLabel Hue".to_string(),
            ])
            .unwrap();
        let app = build_router(state);

        let response = app
            .oneshot(ask_request(r#"{"question": "Hanoi formedBy ThangLong"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let context = body["context"].as_array().unwrap();
        assert_eq!(context.len(), 2);
        assert_eq!(context[0][0], "Hanoi formedBy ThangLong");
        assert!(context[0][1].as_f64().unwrap() > context[1][1].as_f64().unwrap());
    }

    #[tokio::test]
    async fn blank_question_is_rejected() {
        let app = build_router(test_state("http://localhost:3030/vn"));
        let response = app
            .oneshot(ask_request(r#"{"question": "   "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_question_field_is_rejected() {
        let app = build_router(test_state("http://localhost:3030/vn"));
        let response = app.oneshot(ask_request(r#"{}"#)).await.unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn rebuild_ingests_and_serves_new_corpus() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/vn/query");
                then.status(200).json_body(serde_json::json!({
                    "results": { "bindings": [{
                        "s": { "type": "uri", "value": "Hanoi" },
                        "p": { "type": "uri", "value": "ns#label" },
                        "o": { "type": "literal", "value": "Hà Nội" },
                    }]}
                }));
            })
            .await;

        let state = test_state(&server.url("/vn"));
        let app = build_router(Arc::clone(&state));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/rebuild")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["indexed"], 1);
        assert_eq!(state.engine.indexed_documents(), 1);
    }

    #[tokio::test]
    async fn rebuild_against_dead_source_keeps_previous_index() {
        let state = test_state("http://127.0.0.1:1");
        state.engine.install(vec!["kept fact".to_string()]).unwrap();
        let app = build_router(Arc::clone(&state));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/rebuild")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(state.engine.indexed_documents(), 1);
    }

    #[tokio::test]
    async fn health_reports_index_size() {
        let state = test_state("http://localhost:3030/vn");
        state.engine.install(vec!["a fact".to_string()]).unwrap();
        let app = build_router(Arc::clone(&state));

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["indexed"], 1);
    }
}
