//! In-memory revocation store for tests and embedded deployments.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{RevocationStore, StoreResult};

/// A `HashMap` of token id → expiry deadline behind a mutex. Expired
/// entries are dropped lazily on access, mirroring how TTL keys vanish
/// from Redis.
#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    entries: Mutex<HashMap<String, Instant>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("revocation map poisoned");
        entries.retain(|_, deadline| *deadline > now);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn put(&self, token_id: &str, ttl: Duration) -> StoreResult<()> {
        let mut entries = self.entries.lock().expect("revocation map poisoned");
        entries.insert(token_id.to_string(), Instant::now() + ttl);
        Ok(())
    }

    async fn put_if_absent(&self, token_id: &str, ttl: Duration) -> StoreResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("revocation map poisoned");
        match entries.get(token_id) {
            Some(deadline) if *deadline > now => Ok(false),
            _ => {
                entries.insert(token_id.to_string(), now + ttl);
                Ok(true)
            }
        }
    }

    async fn exists(&self, token_id: &str) -> StoreResult<bool> {
        let now = Instant::now();
        let entries = self.entries.lock().expect("revocation map poisoned");
        Ok(entries
            .get(token_id)
            .is_some_and(|deadline| *deadline > now))
    }
}
