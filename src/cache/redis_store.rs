//! Redis-backed cache store
//!
//! Expiry is native (`SET key value EX ttl`). The connection is established on
//! first use and re-established after failures, so the service starts and keeps
//! serving while Redis is down.
//!
//! No lock is held while connecting. Only one caller connects at a time and the
//! rest see [`StoreError::Unavailable`] straight away. A failed connect or a
//! stalled command marks the backend down for `retry_after`, and calls fail
//! fast until that window passes.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::FromRedisValue;
use tokio::time::Instant;

use super::store::{CacheStore, StoreError};

/// Default bound on a single connection attempt
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default bound on a single command round trip
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(1);

/// Default time the backend stays marked down after a failure
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

/// Builds a `redis://` URL from host, port and optional password
pub fn redis_url(host: &str, port: u16, password: Option<&str>) -> String {
    match password.filter(|p| !p.is_empty()) {
        Some(password) => format!("redis://:{password}@{host}:{port}/"),
        None => format!("redis://{host}:{port}/"),
    }
}

#[derive(Default)]
struct ConnectionState {
    conn: Option<ConnectionManager>,
    connecting: bool,
    down_until: Option<Instant>,
}

/// Clears the `connecting` flag even if the connecting future is dropped
struct ConnectAttempt<'a> {
    store: &'a RedisStore,
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        self.store.state().connecting = false;
    }
}

/// Cache store talking to a shared Redis instance
pub struct RedisStore {
    client: redis::Client,
    state: Mutex<ConnectionState>,
    connect_timeout: Duration,
    command_timeout: Duration,
    retry_after: Duration,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("addr", &self.client.get_connection_info().addr)
            .field("connect_timeout", &self.connect_timeout)
            .field("command_timeout", &self.command_timeout)
            .field("retry_after", &self.retry_after)
            .finish()
    }
}

impl RedisStore {
    /// Creates a store for `url` without connecting
    ///
    /// Fails only if the URL itself is malformed.
    pub fn new(url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            client: redis::Client::open(url)?,
            state: Mutex::new(ConnectionState::default()),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            retry_after: DEFAULT_RETRY_AFTER,
        })
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = retry_after;
        self
    }

    fn state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forgets the connection and fails fast until `retry_after` has passed
    fn mark_down(&self) {
        let mut state = self.state();
        state.conn = None;
        state.down_until = Some(Instant::now() + self.retry_after);
    }

    /// Returns the live connection, connecting if there is none yet
    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let attempt = {
            let mut state = self.state();
            if let Some(conn) = state.conn.as_ref() {
                return Ok(conn.clone());
            }
            if state.connecting {
                return Err(StoreError::Unavailable(
                    "connection attempt in progress".to_string(),
                ));
            }
            if state.down_until.is_some_and(|until| Instant::now() < until) {
                return Err(StoreError::Unavailable(
                    "backend marked down after a failed attempt".to_string(),
                ));
            }
            state.connecting = true;
            ConnectAttempt { store: self }
        };

        let result = tokio::time::timeout(
            self.connect_timeout,
            ConnectionManager::new(self.client.clone()),
        )
        .await;
        drop(attempt);

        match result {
            Ok(Ok(conn)) => {
                let mut state = self.state();
                state.conn = Some(conn.clone());
                state.down_until = None;
                tracing::debug!("connected to redis");
                Ok(conn)
            }
            Ok(Err(e)) => {
                self.mark_down();
                Err(e.into())
            }
            Err(_) => {
                self.mark_down();
                Err(StoreError::Timeout)
            }
        }
    }

    /// Runs `cmd` on the shared connection within the command timeout
    async fn run<T>(&self, cmd: &redis::Cmd) -> Result<T, StoreError>
    where
        T: FromRedisValue + Send,
    {
        let mut conn = self.connection().await?;
        match tokio::time::timeout(self.command_timeout, cmd.query_async::<_, T>(&mut conn)).await
        {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
                    self.mark_down();
                }
                Err(e.into())
            }
            Err(_) => {
                self.mark_down();
                Err(StoreError::Timeout)
            }
        }
    }

    /// Checks that the backend answers `PING`
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.run::<String>(&redis::cmd("PING")).await.map(|_| ())
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.run(&cmd).await
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        if ttl_secs == 0 {
            // EX 0 is rejected by Redis; a zero TTL means "already expired".
            return Ok(());
        }

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("EX").arg(ttl_secs);
        self.run(&cmd).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.run(&redis::cmd("FLUSHDB")).await
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
