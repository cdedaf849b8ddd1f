//! Profile Edge Library
//!
//! This module exposes the cache, upstream client, configuration and routing
//! modules for use by the binary and integration tests.

pub mod cache;
pub mod cli;
pub mod data;
pub mod error;
pub mod headers;
pub mod routes;

pub use routes::{router, AppState};
