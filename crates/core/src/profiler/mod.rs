//! Usage profiling: data quality, seasonality, classification, projection.

pub mod classify;
pub mod projection;
pub mod quality;
pub mod seasonal;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ProfilerConfig;
use crate::domain::profile::{ProfileType, UsageProfile};
use crate::domain::usage::{BillingMonth, MonthlyUsageRecord};
use crate::errors::RecommendationError;

use classify::{classify, ClassificationInput};
use quality::{coefficient_of_variation, mean};

/// Regional monthly averages used when a consumer's own history is too thin
/// to project from. Index 0 is January.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionalFallback {
    pub region: String,
    pub monthly_average_kwh: [f64; 12],
}

#[derive(Clone, Debug)]
pub struct UsageProfiler {
    config: ProfilerConfig,
}

impl UsageProfiler {
    pub fn new(config: ProfilerConfig) -> Self {
        Self { config }
    }

    /// Classifies the usage history and projects the next twelve months.
    ///
    /// Fewer than three observed months degrade to an `InsufficientData`
    /// profile built from the regional fallback; without a fallback that is
    /// a terminal `DataQuality` error.
    pub fn analyze(
        &self,
        records: &[MonthlyUsageRecord],
        fallback: Option<&RegionalFallback>,
    ) -> Result<UsageProfile, RecommendationError> {
        let report = quality::assess(records);

        if report.observed_months < 3 {
            return self.degraded_profile(report, fallback);
        }

        let observed: Vec<f64> =
            report.series.iter().filter(|p| !p.interpolated).map(|p| p.kwh).collect();
        let seasonal = seasonal::analyze(
            &report.series,
            self.config.hemisphere,
            self.config.seasonal_ratio_threshold,
        );

        let input = ClassificationInput {
            observed_months: report.observed_months,
            mean_monthly_kwh: mean(&observed),
            coefficient_of_variation: coefficient_of_variation(&observed),
            seasonal: seasonal.as_ref(),
        };
        let profile_type = classify(&input, &self.config);

        let overall_confidence = aggregate_confidence(
            report.metrics.completeness,
            interpolated_fraction(&report.series),
            (profile_type == ProfileType::Seasonal)
                .then(|| seasonal.as_ref().map(|s| s.confidence))
                .flatten(),
        );

        let projection = projection::project(
            &report.series,
            profile_type,
            report.observed_months,
            self.config.hemisphere,
            overall_confidence,
        );

        Ok(UsageProfile {
            profile_type,
            seasonal,
            projection,
            data_quality: report.metrics,
            overall_confidence,
        })
    }

    fn degraded_profile(
        &self,
        mut report: quality::QualityReport,
        fallback: Option<&RegionalFallback>,
    ) -> Result<UsageProfile, RecommendationError> {
        let Some(fallback) = fallback else {
            return Err(RecommendationError::DataQuality {
                observed_months: report.observed_months,
            });
        };

        report.metrics.warnings.push(format!(
            "fewer than 3 months of usage history; projecting from the {} regional average",
            fallback.region
        ));

        let start = report
            .series
            .last()
            .map(|point| point.month.next())
            .unwrap_or_else(current_month);

        let overall_confidence = report.metrics.completeness.min(0.25);
        let projection = projection::project_from_table(
            &fallback.monthly_average_kwh,
            start,
            overall_confidence,
        );

        Ok(UsageProfile {
            profile_type: ProfileType::InsufficientData,
            seasonal: None,
            projection,
            data_quality: report.metrics,
            overall_confidence,
        })
    }
}

fn current_month() -> BillingMonth {
    let now = Utc::now();
    BillingMonth { year: now.year(), month: now.month() }
}

fn interpolated_fraction(series: &[quality::UsagePoint]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    series.iter().filter(|p| p.interpolated).count() as f64 / series.len() as f64
}

/// Completeness, discounted by how much of the series was invented through
/// interpolation, blended with seasonal coverage when the seasonal path
/// drove the projection.
fn aggregate_confidence(
    completeness: f64,
    interpolated_fraction: f64,
    seasonal_confidence: Option<f64>,
) -> f64 {
    let mut confidence = completeness * (1.0 - 0.5 * interpolated_fraction);
    if let Some(seasonal) = seasonal_confidence {
        confidence *= 0.5 + 0.5 * seasonal;
    }
    confidence.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::domain::profile::{ProfileType, ProjectionMethod};
    use crate::domain::usage::{BillingMonth, MonthlyUsageRecord, UsageSource};
    use crate::errors::RecommendationError;

    use super::{RegionalFallback, UsageProfiler};

    fn profiler() -> UsageProfiler {
        UsageProfiler::new(EngineConfig::default().profiler)
    }

    fn records(kwh: &[f64]) -> Vec<MonthlyUsageRecord> {
        kwh.iter()
            .enumerate()
            .map(|(i, &kwh)| {
                MonthlyUsageRecord::new(
                    BillingMonth { year: 2024, month: 1 }.plus_months(i as i64),
                    kwh,
                    UsageSource::MeterRead,
                )
            })
            .collect()
    }

    fn fallback() -> RegionalFallback {
        RegionalFallback {
            region: "TX".to_string(),
            monthly_average_kwh: [900.0; 12],
        }
    }

    #[test]
    fn two_months_without_fallback_is_a_data_quality_error() {
        let error = profiler()
            .analyze(&records(&[800.0, 820.0]), None)
            .expect_err("must fail");
        assert!(matches!(error, RecommendationError::DataQuality { observed_months: 2 }));
    }

    #[test]
    fn two_months_with_fallback_degrades_with_warnings() {
        let profile = profiler()
            .analyze(&records(&[800.0, 820.0]), Some(&fallback()))
            .expect("degraded profile");

        assert_eq!(profile.profile_type, ProfileType::InsufficientData);
        assert_eq!(profile.projection.method, ProjectionMethod::RegionalFallback);
        assert!(profile.data_quality.warnings.iter().any(|w| w.contains("regional average")));
        assert!(profile.overall_confidence <= 0.25);
    }

    #[test]
    fn zero_months_without_fallback_is_terminal() {
        let error = profiler().analyze(&[], None).expect_err("must fail");
        assert!(matches!(error, RecommendationError::DataQuality { observed_months: 0 }));
    }

    #[test]
    fn constant_winter_and_lifted_summer_classifies_seasonal() {
        // Jan 2024 start: winter months at 500, summer at 800 (1.6 ratio).
        let kwh: Vec<f64> = (1..=12u32)
            .map(|m| match m {
                12 | 1 | 2 => 500.0,
                6..=8 => 800.0,
                _ => 650.0,
            })
            .collect();
        let profile = profiler().analyze(&records(&kwh), None).expect("profile");

        assert_eq!(profile.profile_type, ProfileType::Seasonal);
        let seasonal = profile.seasonal.expect("seasonal analysis");
        let ratio = seasonal.ratio.expect("ratio");
        assert!((ratio - 1.6).abs() < 1e-9);
        assert_eq!(profile.projection.method, ProjectionMethod::SeasonalAverage);
    }

    #[test]
    fn steady_high_usage_classifies_high_user_with_trend_projection() {
        let kwh = vec![1400.0, 1420.0, 1380.0, 1450.0, 1410.0, 1430.0, 1440.0, 1390.0];
        let profile = profiler().analyze(&records(&kwh), None).expect("profile");

        assert_eq!(profile.profile_type, ProfileType::HighUser);
        assert_eq!(profile.projection.method, ProjectionMethod::LinearTrend);
        assert!(profile.projection.annual_kwh > 0.0);
    }

    #[test]
    fn interpolation_lowers_overall_confidence() {
        let full = profiler().analyze(&records(&[700.0; 12]), None).expect("full");

        let mut sparse_records = records(&[700.0; 12]);
        sparse_records.remove(8);
        sparse_records.remove(5);
        sparse_records.remove(2);
        let sparse = profiler().analyze(&sparse_records, None).expect("sparse");

        assert!(sparse.overall_confidence < full.overall_confidence);
        assert_eq!(sparse.data_quality.interpolated_months.len(), 3);
    }
}
