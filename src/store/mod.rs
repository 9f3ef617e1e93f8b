//! Revocation store abstraction.
//!
//! Cross-request revocation state lives in an external TTL-capable
//! key-value store, injected as a trait object so unit tests can swap in
//! [`InMemoryRevocationStore`] without touching the token manager.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

mod memory;
mod redis;

pub use self::memory::InMemoryRevocationStore;
pub use self::redis::RedisRevocationStore;

/// A failed store operation. The token manager maps this to
/// `AuthError::StoreUnavailable` (or a rotation error) — store failures
/// always deny, never admit.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StoreError(String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// TTL key-value store holding revoked token ids.
///
/// Entries expire on their own; nothing here needs garbage collection.
/// Writes must be at-least atomic per key — no cross-key transactions
/// are required.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Mark `token_id` revoked for `ttl`. Overwrites any existing entry.
    async fn put(&self, token_id: &str, ttl: Duration) -> StoreResult<()>;

    /// Mark `token_id` revoked only if it is not already. Returns `true`
    /// when this call created the entry — the atomic compare-and-revoke
    /// used by refresh rotation so one refresh token yields one winner.
    async fn put_if_absent(&self, token_id: &str, ttl: Duration) -> StoreResult<bool>;

    /// Whether `token_id` is currently revoked. Never mutates.
    async fn exists(&self, token_id: &str) -> StoreResult<bool>;
}
