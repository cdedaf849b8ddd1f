//! HTTP routes
//!
//! | Path           | Method | Behavior                                   |
//! |----------------|--------|--------------------------------------------|
//! | `/github`      | GET    | upstream profile, cached                   |
//! | `/analyze`     | GET    | top languages across repositories, cached  |
//! | `/clear-cache` | any    | flushes the cache store                    |
//!
//! Other methods on `/github` and `/analyze` get 405, other paths 404.

use std::future::Future;

use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::Uri;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::cache::{cache_key, ResponseCache};
use crate::data::{Analyzer, GitHubClient};
use crate::error::{ApiError, USERNAME_REQUIRED};
use crate::headers::{decorate, ResponseHeaders, X_CACHE};

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    github: GitHubClient,
    analyzer: Analyzer,
    cache: ResponseCache,
    headers: ResponseHeaders,
}

impl AppState {
    pub fn new(github: GitHubClient, cache: ResponseCache, headers: ResponseHeaders) -> Self {
        Self {
            analyzer: Analyzer::new(github.clone()),
            github,
            cache,
            headers,
        }
    }
}

/// Builds the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/github", get(github_profile).fallback(method_not_allowed))
        .route("/analyze", get(analyze).fallback(method_not_allowed))
        .route("/clear-cache", any(clear_cache))
        .fallback(not_found)
        .layer(middleware::map_response_with_state(
            state.headers.clone(),
            decorate,
        ))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct UsernameParams {
    username: Option<String>,
}

/// Pulls a non-empty `username` out of the query string
fn require_username(query: Option<Query<UsernameParams>>) -> Result<String, ApiError> {
    query
        .and_then(|Query(params)| params.username)
        .map(|username| username.trim().to_string())
        .filter(|username| !username.is_empty())
        .ok_or_else(|| ApiError::Validation(USERNAME_REQUIRED.to_string()))
}

#[derive(Debug, Clone, Copy)]
enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

fn json_response(body: String, status: CacheStatus) -> Response {
    (
        [(CONTENT_TYPE, "application/json"), (X_CACHE, status.as_str())],
        body,
    )
        .into_response()
}

/// Serves `key` from the cache, or runs `fetch` and caches its JSON
///
/// The stored string is the exact body sent on the miss, so later hits are
/// byte-identical.
async fn cached_json<T, E, F, Fut>(
    cache: &ResponseCache,
    key: &str,
    fetch: F,
) -> Result<Response, ApiError>
where
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    ApiError: From<E>,
{
    if let Some(body) = cache.lookup(key).await {
        return Ok(json_response(body, CacheStatus::Hit));
    }

    let value = fetch().await?;
    let body = serde_json::to_string(&value)
        .map_err(|e| ApiError::Internal(format!("failed to serialize response: {e}")))?;

    cache.store(key, &body).await;
    Ok(json_response(body, CacheStatus::Miss))
}

async fn github_profile(
    State(state): State<AppState>,
    uri: Uri,
    query: Option<Query<UsernameParams>>,
) -> Result<Response, ApiError> {
    let username = require_username(query)?;
    let key = cache_key(uri.path(), &username);
    cached_json(&state.cache, &key, || state.github.fetch_user_profile(&username)).await
}

async fn analyze(
    State(state): State<AppState>,
    uri: Uri,
    query: Option<Query<UsernameParams>>,
) -> Result<Response, ApiError> {
    let username = require_username(query)?;
    let key = cache_key(uri.path(), &username);
    cached_json(&state.cache, &key, || state.analyzer.analyze(&username)).await
}

#[derive(Debug, Serialize)]
struct ClearCacheResponse {
    status: u16,
    detail: &'static str,
}

async fn clear_cache(State(state): State<AppState>) -> Result<Json<ClearCacheResponse>, ApiError> {
    state.cache.clear().await?;
    Ok(Json(ClearCacheResponse {
        status: 200,
        detail: "Cache cleared",
    }))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
