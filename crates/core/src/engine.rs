//! Recommendation orchestration: filter, cost, score, rank, switching.

use chrono::{Months, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::costing::CostEngine;
use crate::domain::plan::Plan;
use crate::domain::preferences::UserPreferences;
use crate::domain::profile::UsageProfile;
use crate::domain::recommendation::{
    CostBreakdown, CurrentPlan, RankedPlan, RecommendationResult, SwitchAdvice,
    SwitchingAnalysis, UsageProfileSummary,
};
use crate::domain::usage::MonthlyUsageRecord;
use crate::errors::RecommendationError;
use crate::profiler::{RegionalFallback, UsageProfiler};
use crate::scoring::{score_candidates, Candidate};

/// Inputs for one recommendation run. The catalog and profile are read-only
/// snapshots for the duration of the call.
#[derive(Clone, Debug)]
pub struct RecommendationRequest<'a> {
    pub preferences: UserPreferences,
    pub profile: &'a UsageProfile,
    pub catalog: &'a [Plan],
    pub region: String,
    pub current_plan: Option<&'a CurrentPlan>,
    pub top_n: Option<usize>,
    pub fingerprint: String,
}

impl<'a> RecommendationRequest<'a> {
    pub fn new(
        preferences: UserPreferences,
        profile: &'a UsageProfile,
        catalog: &'a [Plan],
        region: impl Into<String>,
    ) -> Self {
        Self {
            preferences,
            profile,
            catalog,
            region: region.into(),
            current_plan: None,
            top_n: None,
            fingerprint: String::new(),
        }
    }

    pub fn with_current_plan(mut self, current_plan: &'a CurrentPlan) -> Self {
        self.current_plan = Some(current_plan);
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = fingerprint.into();
        self
    }
}

#[derive(Clone, Debug)]
pub struct RecommendationEngine {
    config: EngineConfig,
    profiler: UsageProfiler,
    cost_engine: CostEngine,
}

impl RecommendationEngine {
    pub fn new(config: EngineConfig) -> Self {
        let profiler = UsageProfiler::new(config.profiler.clone());
        let cost_engine = CostEngine::new(config.costing.clone());
        Self { config, profiler, cost_engine }
    }

    /// Profiles raw usage records; see `UsageProfiler::analyze`.
    pub fn analyze_usage(
        &self,
        records: &[MonthlyUsageRecord],
        fallback: Option<&RegionalFallback>,
    ) -> Result<UsageProfile, RecommendationError> {
        self.profiler.analyze(records, fallback)
    }

    /// The primary entry point: validates preferences, filters the catalog,
    /// costs and scores every eligible plan, and returns the tie-broken
    /// top-N ranking.
    pub fn generate(
        &self,
        request: RecommendationRequest<'_>,
    ) -> Result<RecommendationResult, RecommendationError> {
        request.preferences.validate()?;

        let eligible: Vec<&Plan> = request
            .catalog
            .iter()
            .filter(|plan| plan.active && plan.available_in(&request.region))
            .collect();
        if eligible.is_empty() {
            return Err(RecommendationError::NoEligiblePlans { region: request.region });
        }

        let costs: Vec<CostBreakdown> = eligible
            .iter()
            .map(|plan| self.cost_engine.cost_breakdown(plan, request.profile))
            .collect();

        let candidates: Vec<Candidate<'_>> = eligible
            .iter()
            .zip(costs.iter())
            .map(|(&plan, cost)| Candidate { plan, cost })
            .collect();
        let scores = score_candidates(&candidates, &request.preferences);

        let mut order: Vec<usize> = (0..eligible.len()).collect();
        order.sort_by(|&a, &b| {
            scores[b]
                .composite_score
                .partial_cmp(&scores[a].composite_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    eligible[b]
                        .renewable_percentage
                        .partial_cmp(&eligible[a].renewable_percentage)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| costs[a].total_annual_cost.cmp(&costs[b].total_annual_cost))
                .then_with(|| eligible[a].id.cmp(&eligible[b].id))
        });

        let current_cost = request
            .current_plan
            .map(|current| self.cost_engine.cost_breakdown(&current.plan, request.profile));

        let top_n = request.top_n.unwrap_or(self.config.engine.default_top_n).max(1);
        let ranked_plans: Vec<RankedPlan> = order
            .iter()
            .take(top_n)
            .enumerate()
            .map(|(position, &index)| {
                let cost = costs[index].clone();
                let annual_savings = current_cost
                    .as_ref()
                    .map(|current| current.total_annual_cost - cost.total_annual_cost);
                let switching = request.current_plan.zip(current_cost.as_ref()).map(
                    |(current, current_breakdown)| {
                        self.switching_analysis(current, current_breakdown, &cost)
                    },
                );

                RankedPlan {
                    plan: Plan::clone(eligible[index]),
                    rank: (position + 1) as u32,
                    score: scores[index],
                    cost,
                    annual_savings,
                    switching,
                }
            })
            .collect();

        let mut warnings = request.profile.data_quality.warnings.clone();
        for ranked in &ranked_plans {
            if ranked.plan.rating.is_none() {
                warnings.push(format!(
                    "no supplier rating on file for plan `{}`; a neutral rating was assumed",
                    ranked.plan.id.0
                ));
            }
        }

        Ok(RecommendationResult {
            id: Uuid::new_v4(),
            ranked_plans,
            profile_summary: UsageProfileSummary {
                profile_type: request.profile.profile_type,
                projected_annual_kwh: request.profile.projection.annual_kwh,
                projection_method: request.profile.projection.method,
                overall_confidence: request.profile.overall_confidence,
            },
            total_plans_analyzed: eligible.len(),
            warnings,
            generated_at: Utc::now(),
            fingerprint: request.fingerprint,
        })
    }

    /// Savings and break-even math against the plan currently in force.
    ///
    /// The policy never recommends paying a termination fee: "switch now"
    /// is reserved for consumers with no contract remaining.
    fn switching_analysis(
        &self,
        current: &CurrentPlan,
        current_cost: &CostBreakdown,
        candidate_cost: &CostBreakdown,
    ) -> SwitchingAnalysis {
        let monthly_savings = current_cost.monthly_cost() - candidate_cost.monthly_cost();
        let annual_savings = current_cost.total_annual_cost - candidate_cost.total_annual_cost;

        // The fee only applies while the current contract is running.
        let early_termination_fee = if current.months_remaining > 0 {
            current.plan.early_termination_fee
        } else {
            Decimal::ZERO
        };

        let break_even_months = (monthly_savings > Decimal::ZERO).then(|| {
            (early_termination_fee / monthly_savings)
                .ceil()
                .to_u32()
                .unwrap_or(u32::MAX)
        });

        let advice = self.switch_advice(
            monthly_savings,
            annual_savings,
            current_cost.total_annual_cost,
            break_even_months,
            current.months_remaining,
        );

        let today = Utc::now().date_naive();
        let optimal_switch_date = match advice {
            SwitchAdvice::SwitchNow => Some(today),
            SwitchAdvice::SwitchAtContractEnd => {
                today.checked_add_months(Months::new(current.months_remaining))
            }
            SwitchAdvice::Stay => None,
        };

        SwitchingAnalysis {
            monthly_savings,
            early_termination_fee,
            break_even_months,
            optimal_switch_date,
            advice,
        }
    }

    fn switch_advice(
        &self,
        monthly_savings: Decimal,
        annual_savings: Decimal,
        current_annual_cost: Decimal,
        break_even_months: Option<u32>,
        months_remaining: u32,
    ) -> SwitchAdvice {
        if monthly_savings <= Decimal::ZERO {
            return SwitchAdvice::Stay;
        }

        if break_even_months.is_some_and(|months| months > months_remaining) {
            return SwitchAdvice::Stay;
        }

        let threshold = current_annual_cost
            * Decimal::from_f64(self.config.engine.switch_threshold_pct / 100.0)
                .unwrap_or(Decimal::ZERO);
        if annual_savings < threshold {
            return SwitchAdvice::Stay;
        }

        if months_remaining == 0 {
            SwitchAdvice::SwitchNow
        } else {
            SwitchAdvice::SwitchAtContractEnd
        }
    }
}
