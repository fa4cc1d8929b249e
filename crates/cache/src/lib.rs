pub mod orchestrator;
pub mod single_flight;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use wattwise_core::config::CacheConfig;
use wattwise_core::{RecommendationResult, UsageProfile};

pub use orchestrator::{CachedRecommender, RecommendationInputs};
pub use single_flight::SingleFlightCache;
pub use store::{CacheStore, InMemoryStore, StoreError, StoredEntry};

pub type RecommendationCache = SingleFlightCache<RecommendationResult>;
pub type ProfileCache = SingleFlightCache<UsageProfile>;

/// Recommendation results live for 24 hours by default.
pub fn recommendation_cache(
    config: &CacheConfig,
    store: Arc<dyn CacheStore<RecommendationResult>>,
) -> RecommendationCache {
    SingleFlightCache::new(
        store,
        Duration::from_secs(config.recommendation_ttl_hours * 3600),
        Duration::from_millis(config.computation_timeout_ms),
    )
}

/// Standalone usage profiles change rarely; they live for 7 days by default.
pub fn profile_cache(
    config: &CacheConfig,
    store: Arc<dyn CacheStore<UsageProfile>>,
) -> ProfileCache {
    SingleFlightCache::new(
        store,
        Duration::from_secs(config.profile_ttl_days * 24 * 3600),
        Duration::from_millis(config.computation_timeout_ms),
    )
}
