//! Composition of the recommendation engine with the result cache: the
//! `get_cached_or_compute` boundary the orchestration layer calls.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use wattwise_core::{
    fingerprint_request, CurrentPlan, EngineConfig, MonthlyUsageRecord, Plan,
    RecommendationEngine, RecommendationError, RecommendationRequest, RecommendationResult,
    RegionalFallback, UserPreferences,
};

use crate::single_flight::SingleFlightCache;
use crate::store::CacheStore;

/// Everything one recommendation call needs, all treated as read-only
/// snapshots for the duration of the call.
#[derive(Clone, Copy, Debug)]
pub struct RecommendationInputs<'a> {
    /// Owner tag for explicit invalidation when this consumer's usage data
    /// changes.
    pub consumer_id: &'a str,
    pub records: &'a [MonthlyUsageRecord],
    pub preferences: UserPreferences,
    pub catalog: &'a [Plan],
    /// Advances whenever the catalog changes, retiring old fingerprints.
    pub catalog_version: &'a str,
    pub region: &'a str,
    pub current_plan: Option<&'a CurrentPlan>,
    pub top_n: Option<usize>,
    pub regional_fallback: Option<&'a RegionalFallback>,
}

pub struct CachedRecommender {
    engine: RecommendationEngine,
    cache: SingleFlightCache<RecommendationResult>,
    default_top_n: usize,
}

impl CachedRecommender {
    pub fn new(config: &EngineConfig, store: Arc<dyn CacheStore<RecommendationResult>>) -> Self {
        let ttl = Duration::from_secs(config.cache.recommendation_ttl_hours * 3600);
        let timeout = Duration::from_millis(config.cache.computation_timeout_ms);
        Self {
            engine: RecommendationEngine::new(config.clone()),
            cache: SingleFlightCache::new(store, ttl, timeout),
            default_top_n: config.engine.default_top_n,
        }
    }

    /// Fingerprints the inputs and returns the cached result, or computes
    /// one under single-flight coordination.
    pub async fn recommend(
        &self,
        inputs: RecommendationInputs<'_>,
    ) -> Result<Arc<RecommendationResult>, RecommendationError> {
        let top_n = inputs.top_n.unwrap_or(self.default_top_n);
        let fingerprint = fingerprint_request(
            inputs.records,
            &inputs.preferences,
            inputs.current_plan,
            inputs.catalog_version,
            inputs.region,
            top_n,
        );

        let engine = &self.engine;
        let key = fingerprint.clone();
        let result = self
            .cache
            .get_or_compute(&fingerprint, Some(inputs.consumer_id), async move {
                let profile =
                    engine.analyze_usage(inputs.records, inputs.regional_fallback)?;
                let mut request = RecommendationRequest::new(
                    inputs.preferences,
                    &profile,
                    inputs.catalog,
                    inputs.region,
                )
                .with_top_n(top_n)
                .with_fingerprint(key);
                if let Some(current) = inputs.current_plan {
                    request = request.with_current_plan(current);
                }
                engine.generate(request)
            })
            .await?;

        info!(
            event_name = "recommendation.served",
            consumer_id = inputs.consumer_id,
            fingerprint = %result.fingerprint,
            plans_ranked = result.ranked_plans.len(),
            "recommendation ready"
        );
        Ok(result)
    }

    /// Invalidate every cached result for the consumer after their usage
    /// store changed.
    pub async fn usage_data_changed(&self, consumer_id: &str) -> usize {
        self.cache.invalidate_owner(consumer_id).await
    }

    pub async fn invalidate_fingerprint(&self, fingerprint: &str) {
        self.cache.invalidate(fingerprint).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use wattwise_core::{
        BillingMonth, EngineConfig, MonthlyUsageRecord, Plan, PlanId, RateStructure,
        UsageSource, UserPreferences,
    };

    use crate::store::InMemoryStore;

    use super::{CachedRecommender, RecommendationInputs};

    fn records() -> Vec<MonthlyUsageRecord> {
        (0..12)
            .map(|i| {
                MonthlyUsageRecord::new(
                    BillingMonth { year: 2024, month: 1 }.plus_months(i),
                    850.0,
                    UsageSource::MeterRead,
                )
            })
            .collect()
    }

    fn catalog() -> Vec<Plan> {
        vec![Plan {
            id: PlanId("only".to_string()),
            supplier: "Only Power".to_string(),
            rate_structure: RateStructure::Fixed { rate_per_kwh: Decimal::new(12, 2) },
            contract_length_months: 12,
            early_termination_fee: Decimal::ZERO,
            renewable_percentage: 20.0,
            monthly_fee: Decimal::ZERO,
            connection_fee: Decimal::ZERO,
            rating: None,
            eligible_regions: Vec::new(),
            active: true,
        }]
    }

    #[tokio::test]
    async fn identical_requests_share_one_cached_result() {
        let recommender =
            CachedRecommender::new(&EngineConfig::default(), Arc::new(InMemoryStore::new()));
        let records = records();
        let catalog = catalog();
        let inputs = RecommendationInputs {
            consumer_id: "alice",
            records: &records,
            preferences: UserPreferences::default(),
            catalog: &catalog,
            catalog_version: "v1",
            region: "TX",
            current_plan: None,
            top_n: None,
            regional_fallback: None,
        };

        let first = recommender.recommend(inputs).await.expect("first");
        let second = recommender.recommend(inputs).await.expect("second");

        // Same Arc means the second call was a cache hit.
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn usage_change_invalidates_and_recomputes() {
        let recommender =
            CachedRecommender::new(&EngineConfig::default(), Arc::new(InMemoryStore::new()));
        let records = records();
        let catalog = catalog();
        let inputs = RecommendationInputs {
            consumer_id: "alice",
            records: &records,
            preferences: UserPreferences::default(),
            catalog: &catalog,
            catalog_version: "v1",
            region: "TX",
            current_plan: None,
            top_n: None,
            regional_fallback: None,
        };

        let first = recommender.recommend(inputs).await.expect("first");
        let removed = recommender.usage_data_changed("alice").await;
        assert_eq!(removed, 1);

        let second = recommender.recommend(inputs).await.expect("second");
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.ranked_plans[0].plan.id, second.ranked_plans[0].plan.id);
    }
}
