use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanId(pub String);

/// One kWh bracket of a tiered rate. `up_to_kwh` is the inclusive monthly
/// ceiling of the bracket; the final bracket leaves it open.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierBracket {
    pub up_to_kwh: Option<Decimal>,
    pub rate_per_kwh: Decimal,
}

/// Closed set of supported pricing models. Cost formulas live in
/// `costing`; this union only carries each variant's payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RateStructure {
    Fixed {
        rate_per_kwh: Decimal,
    },
    /// Ordered brackets; usage is allocated bottom-up each month.
    Tiered {
        tiers: Vec<TierBracket>,
    },
    TimeOfUse {
        peak_rate_per_kwh: Decimal,
        off_peak_rate_per_kwh: Decimal,
        /// Share of a day's usage falling in the peak window. When absent
        /// the configured default load shape applies.
        peak_share: Option<f64>,
    },
    Variable {
        historical_average_rate: Decimal,
    },
}

impl RateStructure {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "fixed",
            Self::Tiered { .. } => "tiered",
            Self::TimeOfUse { .. } => "time_of_use",
            Self::Variable { .. } => "variable",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupplierRating {
    /// Average review score on a 0-5 scale.
    pub average: f64,
    pub review_count: u32,
}

/// Immutable snapshot of a catalog entry for one recommendation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub supplier: String,
    pub rate_structure: RateStructure,
    pub contract_length_months: u32,
    pub early_termination_fee: Decimal,
    /// Percentage of supply from renewable sources, 0-100.
    pub renewable_percentage: f64,
    pub monthly_fee: Decimal,
    pub connection_fee: Decimal,
    pub rating: Option<SupplierRating>,
    /// Region codes the plan is sold in; empty means nationwide.
    pub eligible_regions: Vec<String>,
    pub active: bool,
}

impl Plan {
    pub fn available_in(&self, region: &str) -> bool {
        self.eligible_regions.is_empty()
            || self.eligible_regions.iter().any(|r| r.eq_ignore_ascii_case(region))
    }
}
