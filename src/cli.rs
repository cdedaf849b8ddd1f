//! Command-line and environment configuration
//!
//! Every flag can also be supplied through the environment variable named in
//! its help text; a `.env` file in the working directory is loaded first.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;
use clap::Parser;
use thiserror::Error;

use crate::cache::{redis_url, CacheBackend, CacheSettings, DEFAULT_CONNECT_TIMEOUT};
use crate::data::GITHUB_API_URL;

/// Error types for configuration parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The upstream token is empty
    #[error("GITHUB_TOKEN must not be empty")]
    EmptyToken,

    /// The CORS origin cannot be sent as a header
    #[error("Invalid allowed origin: '{0}'")]
    InvalidOrigin(String),

    /// Host and port do not form a socket address
    #[error("Invalid listen address: '{0}'")]
    InvalidListenAddr(String),
}

/// Profile Edge - caching proxy for GitHub user profiles and language statistics
#[derive(Parser, Debug)]
#[command(name = "profile-edge")]
#[command(about = "Caching HTTP proxy for GitHub user profiles and language statistics")]
#[command(version)]
pub struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3005)]
    pub port: u16,

    /// Interface to bind
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Token sent as a bearer credential on every upstream request
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: String,

    /// Base URL of the GitHub API
    #[arg(long, env = "GITHUB_API_URL", default_value = GITHUB_API_URL)]
    pub github_api_url: String,

    /// Upstream connection timeout in seconds
    #[arg(long, env = "UPSTREAM_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Store backing the response cache
    #[arg(long, env = "CACHE_BACKEND", value_enum, default_value_t = CacheBackend::Redis)]
    pub cache_backend: CacheBackend,

    /// Redis host
    #[arg(long, env = "REDIS_HOST", default_value = "127.0.0.1")]
    pub redis_host: String,

    /// Redis port
    #[arg(long, env = "REDIS_PORT", default_value_t = 6379)]
    pub redis_port: u16,

    /// Redis password
    #[arg(long, env = "REDIS_PASSWORD", hide_env_values = true)]
    pub redis_password: Option<String>,

    /// Directory for the disk cache backend (defaults to the XDG cache directory)
    #[arg(long, env = "CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Value of Access-Control-Allow-Origin on every response
    #[arg(long, env = "CORS_ALLOW_ORIGIN", default_value = "*")]
    pub allow_origin: String,
}

/// Validated settings for starting the server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub github_token: String,
    pub github_api_url: String,
    pub connect_timeout: Duration,
    pub allow_origin: HeaderValue,
    pub cache: CacheSettings,
}

impl ServerConfig {
    /// Validates parsed arguments into a ServerConfig
    ///
    /// # Returns
    /// * `Ok(ServerConfig)` with derived addresses and URLs
    /// * `Err(CliError)` if the token, origin or listen address is unusable
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let github_token = cli.github_token.trim().to_string();
        if github_token.is_empty() {
            return Err(CliError::EmptyToken);
        }

        let allow_origin = HeaderValue::from_str(&cli.allow_origin)
            .map_err(|_| CliError::InvalidOrigin(cli.allow_origin.clone()))?;

        let addr = format!("{}:{}", cli.host, cli.port);
        let listen_addr = addr
            .parse()
            .map_err(|_| CliError::InvalidListenAddr(addr.clone()))?;

        Ok(ServerConfig {
            listen_addr,
            github_token,
            github_api_url: cli.github_api_url.clone(),
            connect_timeout: Duration::from_secs(cli.connect_timeout_secs),
            allow_origin,
            cache: CacheSettings {
                backend: cli.cache_backend,
                redis_url: redis_url(&cli.redis_host, cli.redis_port, cli.redis_password.as_deref()),
                cache_dir: cli.cache_dir.clone(),
                connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            },
        })
    }
}
