//! Single-flight memoization: at most one computation per fingerprint, with
//! every coalesced caller observing the same outcome.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use wattwise_core::RecommendationError;

use crate::store::{CacheStore, StoredEntry};

type FlightResult<T> = Result<Arc<T>, RecommendationError>;

/// Removes the in-flight slot when the leader finishes or is dropped.
struct FlightGuard<'a, T> {
    inflight: &'a DashMap<String, broadcast::Sender<FlightResult<T>>>,
    key: &'a str,
}

impl<T> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        self.inflight.remove(self.key);
    }
}

pub struct SingleFlightCache<T> {
    store: Arc<dyn CacheStore<T>>,
    inflight: DashMap<String, broadcast::Sender<FlightResult<T>>>,
    ttl: chrono::Duration,
    timeout: Duration,
}

impl<T: Send + Sync + 'static> SingleFlightCache<T> {
    /// The store handle is injected by the caller; lifecycle stays outside.
    pub fn new(store: Arc<dyn CacheStore<T>>, ttl: Duration, timeout: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl)
            .unwrap_or_else(|_| chrono::Duration::days(365_000));
        Self { store, inflight: DashMap::new(), ttl, timeout }
    }

    /// Returns the cached value for `key`, or runs `compute` exactly once
    /// while concurrent callers for the same key wait on the outcome. A
    /// computation that outlives the configured deadline fails every waiter
    /// with `ComputationTimeout`.
    pub async fn get_or_compute<F>(
        &self,
        key: &str,
        owner: Option<&str>,
        compute: F,
    ) -> FlightResult<T>
    where
        F: Future<Output = Result<T, RecommendationError>> + Send,
    {
        if let Some(hit) = self.lookup(key).await {
            debug!(event_name = "cache.hit", key, "returning cached result");
            return Ok(hit);
        }

        let mut receiver = match self.inflight.entry(key.to_string()) {
            Entry::Occupied(occupied) => {
                // Subscribe while the guard pins the sender so the leader's
                // broadcast cannot slip past us, then release the shard lock
                // before awaiting.
                let receiver = occupied.get().subscribe();
                drop(occupied);
                receiver
            }
            Entry::Vacant(vacant) => {
                let (sender, _) = broadcast::channel(1);
                vacant.insert(sender.clone());
                return self.lead(key, owner, sender, compute).await;
            }
        };

        debug!(event_name = "cache.coalesced", key, "waiting on in-flight computation");
        match receiver.recv().await {
            Ok(result) => result,
            // The leader finished between our lookup and subscription; a
            // successful run has already populated the store.
            Err(_) => match self.lookup(key).await {
                Some(hit) => Ok(hit),
                None => Err(RecommendationError::ComputationTimeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                }),
            },
        }
    }

    async fn lead<F>(
        &self,
        key: &str,
        owner: Option<&str>,
        sender: broadcast::Sender<FlightResult<T>>,
        compute: F,
    ) -> FlightResult<T>
    where
        F: Future<Output = Result<T, RecommendationError>> + Send,
    {
        // Clears the slot even when the caller abandons the request and this
        // future is dropped mid-computation; waiters then observe a closed
        // channel instead of hanging on a dead flight.
        let _guard = FlightGuard { inflight: &self.inflight, key };

        // Double-check: a previous leader may have stored between our miss
        // and winning the inflight slot.
        if let Some(hit) = self.lookup(key).await {
            let _ = sender.send(Ok(Arc::clone(&hit)));
            return Ok(hit);
        }

        let result = match tokio::time::timeout(self.timeout, compute).await {
            Err(_elapsed) => {
                warn!(
                    event_name = "cache.compute_timeout",
                    key,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "computation exceeded its deadline"
                );
                Err(RecommendationError::ComputationTimeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
            Ok(Err(error)) => Err(error),
            Ok(Ok(value)) => {
                let value = Arc::new(value);
                let entry = StoredEntry {
                    value: Arc::clone(&value),
                    owner: owner.map(str::to_string),
                    expires_at: Utc::now() + self.ttl,
                };
                // A write failure must not cost the caller the fresh value.
                if let Err(error) = self.store.put(key.to_string(), entry).await {
                    warn!(event_name = "cache.store_write_failed", key, %error, "continuing without caching");
                }
                Ok(value)
            }
        };

        let _ = sender.send(result.clone());
        result
    }

    /// Read failures degrade to a miss; expired entries are dropped lazily.
    async fn lookup(&self, key: &str) -> Option<Arc<T>> {
        let entry = match self.store.get(key).await {
            Ok(entry) => entry?,
            Err(error) => {
                warn!(event_name = "cache.store_read_failed", key, %error, "treating as miss");
                return None;
            }
        };

        if entry.is_expired(Utc::now()) {
            if let Err(error) = self.store.remove(key).await {
                warn!(event_name = "cache.store_remove_failed", key, %error, "expired entry left behind");
            }
            return None;
        }

        Some(entry.value)
    }

    /// Explicit invalidation by fingerprint. Never happens implicitly on
    /// read.
    pub async fn invalidate(&self, key: &str) {
        if let Err(error) = self.store.remove(key).await {
            warn!(event_name = "cache.invalidate_failed", key, %error, "invalidation skipped");
        }
    }

    /// Drops every entry for the consumer, used when their usage data
    /// changes.
    pub async fn invalidate_owner(&self, owner: &str) -> usize {
        match self.store.remove_owned_by(owner).await {
            Ok(removed) => removed,
            Err(error) => {
                warn!(event_name = "cache.invalidate_owner_failed", owner, %error, "invalidation skipped");
                0
            }
        }
    }

    pub async fn purge_expired(&self) -> usize {
        match self.store.purge_expired(Utc::now()).await {
            Ok(purged) => purged,
            Err(error) => {
                warn!(event_name = "cache.purge_failed", %error, "purge skipped");
                0
            }
        }
    }
}
