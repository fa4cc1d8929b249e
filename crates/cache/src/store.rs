//! Pluggable storage behind the result cache. The in-memory store is the
//! default; tests and deployments can substitute their own.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug)]
pub struct StoredEntry<T> {
    pub value: Arc<T>,
    /// Consumer the entry belongs to, for explicit invalidation when that
    /// consumer's usage data changes.
    pub owner: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl<T> Clone for StoredEntry<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            owner: self.owner.clone(),
            expires_at: self.expires_at,
        }
    }
}

impl<T> StoredEntry<T> {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Storage seam for cached results. Read failures are treated as misses by
/// the caller and write failures must never block returning a freshly
/// computed value.
#[async_trait]
pub trait CacheStore<T>: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<StoredEntry<T>>, StoreError>;
    async fn put(&self, key: String, entry: StoredEntry<T>) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
    /// Removes every entry tagged with the owner; returns how many.
    async fn remove_owned_by(&self, owner: &str) -> Result<usize, StoreError>;
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}

#[derive(Debug)]
pub struct InMemoryStore<T> {
    entries: DashMap<String, StoredEntry<T>>,
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InMemoryStore<T> {
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> CacheStore<T> for InMemoryStore<T> {
    async fn get(&self, key: &str) -> Result<Option<StoredEntry<T>>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, key: String, entry: StoredEntry<T>) -> Result<(), StoreError> {
        self.entries.insert(key, entry);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn remove_owned_by(&self, owner: &str) -> Result<usize, StoreError> {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.owner.as_deref() != Some(owner));
        Ok(before - self.entries.len())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before - self.entries.len())
    }
}
