pub mod config;
pub mod costing;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod fingerprint;
pub mod profiler;
pub mod scoring;

pub use config::{ConfigError, ConfigOverrides, EngineConfig, LoadOptions, LogFormat};
pub use costing::CostEngine;
pub use domain::plan::{Plan, PlanId, RateStructure, SupplierRating, TierBracket};
pub use domain::preferences::UserPreferences;
pub use domain::profile::{
    DataQualityMetrics, Hemisphere, ProfileType, ProjectionMethod, Season, SeasonalAnalysis,
    UsageProfile, UsageProjection,
};
pub use domain::recommendation::{
    CostBreakdown, CurrentPlan, PlanScore, RankedPlan, RecommendationResult, SwitchAdvice,
    SwitchingAnalysis, UsageProfileSummary,
};
pub use domain::usage::{BillingMonth, MonthlyUsageRecord, UsageSource};
pub use engine::{RecommendationEngine, RecommendationRequest};
pub use errors::RecommendationError;
pub use fingerprint::fingerprint_request;
pub use profiler::{RegionalFallback, UsageProfiler};
