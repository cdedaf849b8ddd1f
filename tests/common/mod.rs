//! Shared helpers for integration tests: a fake GitHub API and test stores

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower::ServiceExt;

use profile_edge::cache::{CacheStore, MemoryStore, ResponseCache, StoreError};
use profile_edge::data::GitHubClient;
use profile_edge::headers::ResponseHeaders;
use profile_edge::{router, AppState};

pub const TOKEN: &str = "test-token";

/// Handle to a running fake GitHub API
pub struct FakeGitHub {
    pub base_url: String,
    profile_hits: Arc<AtomicUsize>,
}

impl FakeGitHub {
    /// Number of profile lookups the fake has answered
    pub fn profile_hits(&self) -> usize {
        self.profile_hits.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct Upstream {
    base_url: String,
    profile_hits: Arc<AtomicUsize>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Bad credentials"})),
    )
        .into_response()
}

async fn user(
    State(up): State<Upstream>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    up.profile_hits.fetch_add(1, Ordering::SeqCst);

    let display_name = (name == "torvalds").then_some("Linus Torvalds");
    match name.as_str() {
        "torvalds" | "octocat" => Json(json!({
            "login": name,
            "id": 1024025,
            "name": display_name,
            "public_repos": 4,
            "followers": 200000,
            "repos_url": format!("{}/users/{}/repos", up.base_url, name),
        }))
        .into_response(),
        "limited" => (
            StatusCode::TOO_MANY_REQUESTS,
            [("x-ratelimit-remaining", "7")],
            Json(json!({"message": "API rate limit exceeded"})),
        )
            .into_response(),
        "limited-bare" => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"message": "API rate limit exceeded"})),
        )
            .into_response(),
        "teapot" => StatusCode::IM_A_TEAPOT.into_response(),
        "garbled" => "this is not json".into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"}))).into_response(),
    }
}

async fn repos(
    State(up): State<Upstream>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if query.get("per_page").map(String::as_str) != Some("100") {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "per_page must be 100"})))
            .into_response();
    }

    let names: &[&str] = match name.as_str() {
        "torvalds" => &["linux", "subsurface", "flaky", "dotfiles"],
        _ => &[],
    };
    let listing: Vec<_> = names
        .iter()
        .map(|repo| {
            json!({
                "name": repo,
                "languages_url": format!("{}/repos/{}/{}/languages", up.base_url, name, repo),
            })
        })
        .collect();
    Json(listing).into_response()
}

async fn languages(headers: HeaderMap, Path((_owner, repo)): Path<(String, String)>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    match repo.as_str() {
        "linux" => Json(json!({"C": 1000, "Assembly": 200, "Shell": 50})).into_response(),
        "subsurface" => Json(json!({"C++": 800, "C": 300, "Python": 10})).into_response(),
        "dotfiles" => Json(json!({"Shell": 30, "Lua": 5, "Vim Script": 5})).into_response(),
        _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// Starts the fake API on an ephemeral local port
pub async fn spawn_fake_github() -> FakeGitHub {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake upstream");
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let profile_hits = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route("/users/:name", get(user))
        .route("/users/:name/repos", get(repos))
        .route("/repos/:owner/:repo/languages", get(languages))
        .with_state(Upstream {
            base_url: base_url.clone(),
            profile_hits: Arc::clone(&profile_hits),
        });

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake upstream crashed");
    });

    FakeGitHub {
        base_url,
        profile_hits,
    }
}

/// Starts a listener that accepts connections and never answers
///
/// Returns a `redis://` URL pointing at it.
pub async fn spawn_stalled_redis() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("redis://{addr}/")
}

/// Builds the service under test against `base_url` with `store`
pub fn build_app(base_url: &str, store: Arc<dyn CacheStore>) -> Router {
    let github = GitHubClient::with_options(TOKEN, base_url, Duration::from_secs(2))
        .expect("Failed to build client");
    router(AppState::new(
        github,
        ResponseCache::new(store),
        ResponseHeaders::default(),
    ))
}

pub fn memory_store() -> Arc<dyn CacheStore> {
    Arc::new(MemoryStore::new())
}

/// A response reduced to what tests assert on
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("Body should be JSON")
    }

    pub fn x_cache(&self) -> Option<&str> {
        self.headers.get("x-cache").and_then(|v| v.to_str().ok())
    }
}

pub async fn send(app: &Router, method: &str, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("Router failed");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    TestResponse {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).expect("Body should be UTF-8"),
    }
}

/// Store whose backend is permanently unreachable
pub struct DownStore;

#[async_trait]
impl CacheStore for DownStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl_secs: u64) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn backend(&self) -> &'static str {
        "down"
    }
}

/// Memory store that counts flushes
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    clears: AtomicUsize,
}

impl CountingStore {
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        self.inner.set(key, value, ttl_secs).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear().await
    }

    fn backend(&self) -> &'static str {
        "counting"
    }
}
