use serde::{Deserialize, Serialize};

use crate::domain::usage::BillingMonth;

/// Coarse classification of a consumer's consumption shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    Baseline,
    HighUser,
    Variable,
    Seasonal,
    InsufficientData,
}

/// Meteorological season. Winter is Dec-Feb in the northern hemisphere and
/// Jun-Aug in the southern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Autumn];
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hemisphere {
    #[default]
    Northern,
    Southern,
}

impl Hemisphere {
    pub fn season_of(self, month: u32) -> Season {
        let northern = match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Autumn,
        };
        match self {
            Self::Northern => northern,
            Self::Southern => match northern {
                Season::Winter => Season::Summer,
                Season::Spring => Season::Autumn,
                Season::Summer => Season::Winter,
                Season::Autumn => Season::Spring,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeasonPeak {
    pub season: Season,
    pub month: BillingMonth,
    pub kwh: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeasonalAnalysis {
    pub summer_average_kwh: f64,
    pub winter_average_kwh: f64,
    /// summer / winter; `None` when the winter average is zero.
    pub ratio: Option<f64>,
    pub is_seasonal: bool,
    pub peak_months: Vec<SeasonPeak>,
    /// Fraction of the four seasons backed by at least one real
    /// (non-interpolated) data point.
    pub confidence: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMethod {
    SeasonalAverage,
    LinearTrend,
    MovingAverage,
    RegionalFallback,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthProjection {
    pub month: BillingMonth,
    pub kwh: f64,
    /// 95% confidence interval bounds; the lower bound never goes negative.
    pub low_95: f64,
    pub high_95: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageProjection {
    /// Twelve consecutive months starting after the last observed one.
    pub months: Vec<MonthProjection>,
    pub annual_kwh: f64,
    pub method: ProjectionMethod,
}

impl UsageProjection {
    pub fn monthly_kwh(&self) -> Vec<f64> {
        self.months.iter().map(|m| m.kwh).collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQualityMetrics {
    /// Months present out of twelve, clamped to 1.0.
    pub completeness: f64,
    pub interpolated_months: Vec<BillingMonth>,
    /// Flagged, never removed.
    pub outlier_months: Vec<BillingMonth>,
    pub warnings: Vec<String>,
}

/// Product of one profiler run. Built fresh per analysis call and never
/// mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageProfile {
    pub profile_type: ProfileType,
    pub seasonal: Option<SeasonalAnalysis>,
    pub projection: UsageProjection,
    pub data_quality: DataQualityMetrics,
    pub overall_confidence: f64,
}
