use thiserror::Error;

/// Terminal failures of the recommendation core. Degraded-but-usable inputs
/// never land here; they surface as warnings on an otherwise valid result.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RecommendationError {
    #[error("insufficient usage data: {observed_months} month(s) recorded and no regional fallback available")]
    DataQuality { observed_months: usize },
    #[error("preference weights must sum to exactly 100, got {sum}")]
    PreferenceValidation { sum: u32 },
    #[error("no active plans available in region `{region}`")]
    NoEligiblePlans { region: String },
    #[error("recommendation computation exceeded its {timeout_ms}ms deadline")]
    ComputationTimeout { timeout_ms: u64 },
}
