//! Data quality assessment: gap interpolation, outlier flagging, warnings.

use crate::domain::profile::DataQualityMetrics;
use crate::domain::usage::{BillingMonth, MonthlyUsageRecord};

/// One month of the cleaned, contiguous series handed to classification and
/// projection. Interpolated points are marked so seasonal averages can
/// prefer real readings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UsagePoint {
    pub month: BillingMonth,
    pub kwh: f64,
    pub interpolated: bool,
}

#[derive(Clone, Debug)]
pub struct QualityReport {
    /// Contiguous months from the first to the last observed record.
    pub series: Vec<UsagePoint>,
    pub metrics: DataQualityMetrics,
    pub observed_months: usize,
}

/// Builds the cleaned series. Missing interior months are filled by linear
/// interpolation between the nearest known neighbors; outliers are flagged
/// via the 1.5 IQR fence and kept in place.
pub fn assess(records: &[MonthlyUsageRecord]) -> QualityReport {
    let mut metrics = DataQualityMetrics::default();
    let mut sorted: Vec<&MonthlyUsageRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.month);

    let mut observed: Vec<(BillingMonth, f64)> = Vec::with_capacity(sorted.len());
    for record in sorted {
        match observed.last_mut() {
            Some((month, kwh)) if *month == record.month => {
                metrics
                    .warnings
                    .push(format!("duplicate record for {month}; keeping the latest value"));
                *kwh = record.kwh;
            }
            _ => observed.push((record.month, record.kwh)),
        }
    }

    let observed_months = observed.len();
    metrics.completeness = (observed_months as f64 / 12.0).min(1.0);
    if observed_months > 0 && observed_months < 12 {
        metrics.warnings.push(format!(
            "only {observed_months} of 12 months recorded; projection confidence is reduced"
        ));
    }

    let series = fill_gaps(&observed, &mut metrics);
    flag_outliers(&observed, &mut metrics);

    QualityReport { series, metrics, observed_months }
}

fn fill_gaps(
    observed: &[(BillingMonth, f64)],
    metrics: &mut DataQualityMetrics,
) -> Vec<UsagePoint> {
    let mut series = Vec::new();

    for window in observed.windows(2) {
        let (from, from_kwh) = window[0];
        let (to, to_kwh) = window[1];
        series.push(UsagePoint { month: from, kwh: from_kwh, interpolated: false });

        let gap = to.ordinal() - from.ordinal();
        for step in 1..gap {
            let month = from.plus_months(step);
            let fraction = step as f64 / gap as f64;
            let kwh = from_kwh + (to_kwh - from_kwh) * fraction;
            series.push(UsagePoint { month, kwh, interpolated: true });
            metrics.interpolated_months.push(month);
        }
    }

    if let Some(&(last, last_kwh)) = observed.last() {
        series.push(UsagePoint { month: last, kwh: last_kwh, interpolated: false });
    }

    if !metrics.interpolated_months.is_empty() {
        metrics.warnings.push(format!(
            "{} missing month(s) filled by linear interpolation",
            metrics.interpolated_months.len()
        ));
    }

    series
}

fn flag_outliers(observed: &[(BillingMonth, f64)], metrics: &mut DataQualityMetrics) {
    // Quartiles are meaningless below four points.
    if observed.len() < 4 {
        return;
    }

    let mut values: Vec<f64> = observed.iter().map(|(_, kwh)| *kwh).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q1 = quartile(&values, 0.25);
    let q3 = quartile(&values, 0.75);
    let iqr = q3 - q1;
    let low_fence = q1 - 1.5 * iqr;
    let high_fence = q3 + 1.5 * iqr;

    for &(month, kwh) in observed {
        if kwh < low_fence || kwh > high_fence {
            metrics.outlier_months.push(month);
            metrics.warnings.push(format!(
                "{month} usage of {kwh:.0} kWh falls outside the expected range ({low_fence:.0}..{high_fence:.0})"
            ));
        }
    }
}

/// Linear-interpolation quartile over an already-sorted slice.
fn quartile(sorted: &[f64], p: f64) -> f64 {
    let position = p * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let fraction = position - lower as f64;
        sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; zero below two points.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

pub(crate) fn coefficient_of_variation(values: &[f64]) -> f64 {
    let mean = mean(values);
    if mean == 0.0 {
        return 0.0;
    }
    std_dev(values) / mean
}

#[cfg(test)]
mod tests {
    use crate::domain::usage::{BillingMonth, MonthlyUsageRecord, UsageSource};

    use super::{assess, coefficient_of_variation, std_dev};

    fn record(year: i32, month: u32, kwh: f64) -> MonthlyUsageRecord {
        MonthlyUsageRecord::new(
            BillingMonth { year, month },
            kwh,
            UsageSource::MeterRead,
        )
    }

    #[test]
    fn interior_gap_is_linearly_interpolated() {
        let records =
            vec![record(2025, 1, 900.0), record(2025, 4, 600.0), record(2025, 5, 500.0)];
        let report = assess(&records);

        assert_eq!(report.series.len(), 5);
        let feb = &report.series[1];
        let mar = &report.series[2];
        assert!(feb.interpolated && mar.interpolated);
        assert!((feb.kwh - 800.0).abs() < 1e-9);
        assert!((mar.kwh - 700.0).abs() < 1e-9);
        assert_eq!(report.metrics.interpolated_months.len(), 2);
    }

    #[test]
    fn outliers_are_flagged_but_kept() {
        let mut records: Vec<_> = (1..=11).map(|m| record(2025, m, 800.0)).collect();
        records.push(record(2025, 12, 4000.0));
        let report = assess(&records);

        assert_eq!(report.metrics.outlier_months, vec![BillingMonth { year: 2025, month: 12 }]);
        assert_eq!(report.series.len(), 12, "outlier months stay in the series");
    }

    #[test]
    fn duplicate_months_keep_latest_and_warn() {
        let records = vec![record(2025, 1, 900.0), record(2025, 1, 950.0), record(2025, 2, 800.0)];
        let report = assess(&records);

        assert_eq!(report.observed_months, 2);
        assert!((report.series[0].kwh - 950.0).abs() < 1e-9);
        assert!(report.metrics.warnings.iter().any(|w| w.contains("duplicate")));
    }

    #[test]
    fn completeness_clamps_at_one() {
        let records: Vec<_> = (0..18)
            .map(|i| {
                let month = BillingMonth { year: 2024, month: 1 }.plus_months(i);
                record(month.year, month.month, 700.0)
            })
            .collect();
        let report = assess(&records);
        assert!((report.metrics.completeness - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn flat_series_has_zero_variation() {
        let values = [500.0, 500.0, 500.0];
        assert_eq!(std_dev(&values), 0.0);
        assert_eq!(coefficient_of_variation(&values), 0.0);
    }
}
