//! Headers attached to every response

use axum::extract::State;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_EXPOSE_HEADERS, CACHE_CONTROL, EXPIRES, PRAGMA,
};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::Response;

/// Marks whether a payload came from the cache
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Fixed CORS and no-cache headers
#[derive(Debug, Clone)]
pub struct ResponseHeaders {
    allow_origin: HeaderValue,
}

impl Default for ResponseHeaders {
    fn default() -> Self {
        Self::new(HeaderValue::from_static("*"))
    }
}

impl ResponseHeaders {
    pub fn new(allow_origin: HeaderValue) -> Self {
        Self { allow_origin }
    }

    /// Inserts the headers, replacing any existing values
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, POST"));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
        headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static("X-Cache"));
        headers.insert(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate"),
        );
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(EXPIRES, HeaderValue::from_static("0"));
    }
}

/// Response middleware applying [`ResponseHeaders`]
pub async fn decorate(State(headers): State<ResponseHeaders>, mut response: Response) -> Response {
    headers.apply(response.headers_mut());
    response
}
