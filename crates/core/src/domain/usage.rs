use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Calendar month of a utility bill, e.g. `2025-03`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BillingMonth {
    pub year: i32,
    /// 1-based calendar month.
    pub month: u32,
}

impl BillingMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Months since year zero; consecutive calendar months differ by one.
    pub fn ordinal(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    pub fn from_ordinal(ordinal: i64) -> Self {
        let year = ordinal.div_euclid(12);
        let month = ordinal.rem_euclid(12) + 1;
        Self { year: year as i32, month: month as u32 }
    }

    pub fn next(self) -> Self {
        Self::from_ordinal(self.ordinal() + 1)
    }

    pub fn plus_months(self, months: i64) -> Self {
        Self::from_ordinal(self.ordinal() + months)
    }
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageSource {
    MeterRead,
    Estimated,
    Imported,
}

/// One month of recorded consumption. Immutable once recorded; the profiler
/// only ever reads a list of these.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlyUsageRecord {
    pub month: BillingMonth,
    /// Kilowatt-hours consumed, never negative.
    pub kwh: f64,
    pub estimated_cost: Option<Decimal>,
    pub source: UsageSource,
}

impl MonthlyUsageRecord {
    pub fn new(month: BillingMonth, kwh: f64, source: UsageSource) -> Self {
        Self { month, kwh: kwh.max(0.0), estimated_cost: None, source }
    }
}
