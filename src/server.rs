//! HTTP surface: `/youtube/summarize` and `/youtube/recipe`, GET and POST.

use std::sync::{Arc, LazyLock};

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use eyre::Result;
use log::info;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::outcome::Outcome;
use crate::pipeline::Pipeline;

static REQUEST_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com/(watch\?v=|shorts/)|youtu\.be/)[a-zA-Z0-9_-]{11}.*$").unwrap()
});

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

/// Body of a POST, or the query of a GET
#[derive(Debug, Default, Deserialize)]
pub struct VideoRequest {
    #[serde(default)]
    pub url: String,
    /// Overrides the configured model for this request only
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub fn create_router(state: AppState) -> Router {
    let youtube = Router::new()
        .route("/summarize", get(summarize_query).post(summarize_body))
        .route("/recipe", get(recipe_query).post(recipe_body));

    Router::new()
        .route("/health", get(health))
        .nest("/youtube", youtube)
        .with_state(state)
}

pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Shape check done before anything is fetched
fn validate_url(url: &str) -> std::result::Result<(), String> {
    let url = url.trim();
    if url.is_empty() {
        return Err("YouTube URL is required".to_string());
    }
    if !REQUEST_URL_RE.is_match(url) {
        return Err("Please enter a valid YouTube URL".to_string());
    }
    Ok(())
}

fn respond<T: Serialize>(outcome: Outcome<T>) -> Response {
    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(outcome)).into_response()
}

/// Extractor failures get the same JSON failure body as pipeline failures
fn rejected(what: &str, detail: String) -> Response {
    respond(Outcome::<()>::Failure(format!("Invalid {what}: {detail}")))
}

type BodyRequest = std::result::Result<Json<VideoRequest>, JsonRejection>;
type QueryRequest = std::result::Result<Query<VideoRequest>, QueryRejection>;

async fn summarize(state: AppState, req: VideoRequest) -> Response {
    if let Err(message) = validate_url(&req.url) {
        return respond(Outcome::<()>::Failure(message));
    }
    respond(state.pipeline.summarize(req.url.trim(), req.model.as_deref()).await)
}

async fn recipe(state: AppState, req: VideoRequest) -> Response {
    if let Err(message) = validate_url(&req.url) {
        return respond(Outcome::<()>::Failure(message));
    }
    respond(state.pipeline.recipe(req.url.trim(), req.model.as_deref()).await)
}

async fn summarize_body(State(state): State<AppState>, payload: BodyRequest) -> Response {
    match payload {
        Ok(Json(req)) => summarize(state, req).await,
        Err(rejection) => rejected("request body", rejection.body_text()),
    }
}

async fn summarize_query(State(state): State<AppState>, query: QueryRequest) -> Response {
    match query {
        Ok(Query(req)) => summarize(state, req).await,
        Err(rejection) => rejected("query string", rejection.body_text()),
    }
}

async fn recipe_body(State(state): State<AppState>, payload: BodyRequest) -> Response {
    match payload {
        Ok(Json(req)) => recipe(state, req).await,
        Err(rejection) => rejected("request body", rejection.body_text()),
    }
}

async fn recipe_query(State(state): State<AppState>, query: QueryRequest) -> Response {
    match query {
        Ok(Query(req)) => recipe(state, req).await,
        Err(rejection) => rejected("query string", rejection.body_text()),
    }
}
