//! Projected annual cost per plan, one formula per rate-structure variant.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::config::CostingConfig;
use crate::domain::plan::{Plan, RateStructure, TierBracket};
use crate::domain::profile::UsageProfile;
use crate::domain::recommendation::CostBreakdown;

const MONTHS_PER_YEAR: u32 = 12;

#[derive(Clone, Debug)]
pub struct CostEngine {
    config: CostingConfig,
}

impl CostEngine {
    pub fn new(config: CostingConfig) -> Self {
        Self { config }
    }

    /// Single dispatch point over the closed rate-structure union.
    pub fn cost_breakdown(&self, plan: &Plan, profile: &UsageProfile) -> CostBreakdown {
        let annual_kwh = kwh(profile.projection.annual_kwh);

        let base_cost = match &plan.rate_structure {
            RateStructure::Fixed { rate_per_kwh } => *rate_per_kwh * annual_kwh,
            RateStructure::Tiered { tiers } => self.tiered_cost(tiers, profile),
            RateStructure::TimeOfUse { peak_rate_per_kwh, off_peak_rate_per_kwh, peak_share } => {
                self.time_of_use_cost(
                    profile,
                    *peak_rate_per_kwh,
                    *off_peak_rate_per_kwh,
                    *peak_share,
                )
            }
            RateStructure::Variable { historical_average_rate } => {
                self.variable_cost(*historical_average_rate, annual_kwh, profile.overall_confidence)
            }
        };

        let monthly_fees_annualized = plan.monthly_fee * Decimal::from(MONTHS_PER_YEAR);
        let total_annual_cost = base_cost + monthly_fees_annualized + plan.connection_fee;

        let average_rate_per_kwh =
            (annual_kwh > Decimal::ZERO).then(|| total_annual_cost / annual_kwh);

        CostBreakdown {
            base_cost,
            monthly_fees_annualized,
            connection_fee: plan.connection_fee,
            total_annual_cost,
            average_rate_per_kwh,
        }
    }

    /// Allocates each projected month across the ordered brackets bottom-up.
    /// Usage past the last closed ceiling is charged at the final bracket's
    /// rate.
    fn tiered_cost(&self, tiers: &[TierBracket], profile: &UsageProfile) -> Decimal {
        let mut total = Decimal::ZERO;

        for month in &profile.projection.months {
            let mut remaining = kwh(month.kwh);
            let mut prior_ceiling = Decimal::ZERO;

            for (index, tier) in tiers.iter().enumerate() {
                if remaining <= Decimal::ZERO {
                    break;
                }

                let taken = match tier.up_to_kwh {
                    Some(ceiling) => (ceiling - prior_ceiling).max(Decimal::ZERO).min(remaining),
                    None => remaining,
                };
                let last = index == tiers.len() - 1;
                let charged = if last { remaining } else { taken };

                total += charged * tier.rate_per_kwh;
                remaining -= charged;
                if let Some(ceiling) = tier.up_to_kwh {
                    prior_ceiling = ceiling;
                }
            }
        }

        total
    }

    fn time_of_use_cost(
        &self,
        profile: &UsageProfile,
        peak_rate: Decimal,
        off_peak_rate: Decimal,
        plan_peak_share: Option<f64>,
    ) -> Decimal {
        let share = plan_peak_share
            .filter(|s| (0.0..=1.0).contains(s))
            .unwrap_or(self.config.default_peak_share);
        let peak_share = fraction(share);
        let off_peak_share = Decimal::ONE - peak_share;

        profile
            .projection
            .months
            .iter()
            .map(|month| {
                let monthly = kwh(month.kwh);
                monthly * peak_share * peak_rate + monthly * off_peak_share * off_peak_rate
            })
            .sum()
    }

    /// Historical-average pricing carries rate-volatility risk; the buffer
    /// grows as projection confidence falls.
    fn variable_cost(&self, average_rate: Decimal, annual_kwh: Decimal, confidence: f64) -> Decimal {
        let buffer = self.config.variable_rate_buffer * (1.0 - confidence.clamp(0.0, 1.0));
        average_rate * annual_kwh * (Decimal::ONE + fraction(buffer))
    }
}

/// Projected kWh values are finite and non-negative by construction.
fn kwh(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO).max(Decimal::ZERO)
}

fn fraction(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}
