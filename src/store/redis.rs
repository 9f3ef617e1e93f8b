//! Redis-backed revocation store.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio::time::timeout;

use super::{RevocationStore, StoreError, StoreResult};

const DEFAULT_KEY_PREFIX: &str = "auth:revoked:";
const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(2);

/// Revocation entries as prefixed Redis keys with a native TTL
/// (`SET key 1 EX ttl`). Every command is bounded by `op_timeout`; a
/// timeout surfaces as a [`StoreError`] like any other transport
/// failure, so callers stay fail-closed.
pub struct RedisRevocationStore {
    conn: ConnectionManager,
    key_prefix: String,
    op_timeout: Duration,
}

impl RedisRevocationStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    /// Open a client and connection manager for `redis_url`.
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StoreError::new(format!("redis client: {e}")))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::new(format!("redis connection: {e}")))?;
        Ok(Self::new(conn))
    }

    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    fn key(&self, token_id: &str) -> String {
        format!("{}{}", self.key_prefix, token_id)
    }

    fn ttl_secs(ttl: Duration) -> u64 {
        // EX rejects 0; a sub-second remainder still rounds up to one
        // full second of coverage.
        ttl.as_secs().max(1)
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn put(&self, token_id: &str, ttl: Duration) -> StoreResult<()> {
        let key = self.key(token_id);
        let mut conn = self.conn.clone();

        timeout(
            self.op_timeout,
            redis::cmd("SET")
                .arg(&key)
                .arg("1")
                .arg("EX")
                .arg(Self::ttl_secs(ttl))
                .query_async::<_, ()>(&mut conn),
        )
        .await
        .map_err(|_| StoreError::new("revocation write timed out"))?
        .map_err(|e| StoreError::new(e.to_string()))
    }

    async fn put_if_absent(&self, token_id: &str, ttl: Duration) -> StoreResult<bool> {
        let key = self.key(token_id);
        let mut conn = self.conn.clone();

        // SET .. NX returns OK when the key was created, nil otherwise.
        let reply: Option<String> = timeout(
            self.op_timeout,
            redis::cmd("SET")
                .arg(&key)
                .arg("1")
                .arg("EX")
                .arg(Self::ttl_secs(ttl))
                .arg("NX")
                .query_async(&mut conn),
        )
        .await
        .map_err(|_| StoreError::new("revocation write timed out"))?
        .map_err(|e| StoreError::new(e.to_string()))?;

        Ok(reply.is_some())
    }

    async fn exists(&self, token_id: &str) -> StoreResult<bool> {
        let key = self.key(token_id);
        let mut conn = self.conn.clone();

        timeout(
            self.op_timeout,
            redis::cmd("EXISTS").arg(&key).query_async(&mut conn),
        )
        .await
        .map_err(|_| StoreError::new("revocation lookup timed out"))?
        .map_err(|e| StoreError::new(e.to_string()))
    }
}
