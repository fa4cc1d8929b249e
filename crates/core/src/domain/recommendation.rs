use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::plan::Plan;
use crate::domain::profile::{ProfileType, ProjectionMethod};

/// Projected twelve-month cost of one plan against one usage projection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub base_cost: Decimal,
    pub monthly_fees_annualized: Decimal,
    pub connection_fee: Decimal,
    pub total_annual_cost: Decimal,
    /// `None` when the projected annual consumption is zero.
    pub average_rate_per_kwh: Option<Decimal>,
}

impl CostBreakdown {
    pub fn monthly_cost(&self) -> Decimal {
        self.total_annual_cost / Decimal::from(12)
    }
}

/// Four sub-scores plus the preference-weighted composite, all in [0, 100].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanScore {
    pub cost_score: f64,
    pub flexibility_score: f64,
    pub renewable_score: f64,
    pub rating_score: f64,
    pub composite_score: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchAdvice {
    SwitchNow,
    SwitchAtContractEnd,
    Stay,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwitchingAnalysis {
    pub monthly_savings: Decimal,
    pub early_termination_fee: Decimal,
    /// Months of savings needed to recoup the termination fee; `None` when
    /// there are no savings to recoup it with.
    pub break_even_months: Option<u32>,
    pub optimal_switch_date: Option<NaiveDate>,
    pub advice: SwitchAdvice,
}

/// The consumer's plan in force today, used for savings and break-even math.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrentPlan {
    pub plan: Plan,
    pub months_remaining: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedPlan {
    pub plan: Plan,
    /// 1-based position in the ranking.
    pub rank: u32,
    pub score: PlanScore,
    pub cost: CostBreakdown,
    pub annual_savings: Option<Decimal>,
    pub switching: Option<SwitchingAnalysis>,
}

/// Condensed profile facts carried on the result for downstream narration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageProfileSummary {
    pub profile_type: ProfileType,
    pub projected_annual_kwh: f64,
    pub projection_method: ProjectionMethod,
    pub overall_confidence: f64,
}

/// Value object produced once per request and cached by fingerprint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub id: Uuid,
    pub ranked_plans: Vec<RankedPlan>,
    pub profile_summary: UsageProfileSummary,
    pub total_plans_analyzed: usize,
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub fingerprint: String,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::CostBreakdown;

    #[test]
    fn monthly_cost_is_one_twelfth_of_annual() {
        let breakdown = CostBreakdown {
            base_cost: Decimal::new(110_000, 2),
            monthly_fees_annualized: Decimal::new(10_000, 2),
            connection_fee: Decimal::ZERO,
            total_annual_cost: Decimal::new(120_000, 2),
            average_rate_per_kwh: None,
        };
        assert_eq!(breakdown.monthly_cost(), Decimal::new(10_000, 2));
    }
}
