//! Twelve-month usage projection with per-month confidence intervals.

use crate::domain::profile::{
    Hemisphere, MonthProjection, ProfileType, ProjectionMethod, Season, UsageProjection,
};
use crate::domain::usage::BillingMonth;
use crate::profiler::quality::{mean, std_dev, UsagePoint};
use crate::profiler::seasonal::{group_by_season, season_average};

const Z_95: f64 = 1.96;

/// Minimum observed months for a linear trend to be trusted.
const TREND_MIN_MONTHS: usize = 6;

/// Trailing window of the moving-average fallback.
const MOVING_AVERAGE_WINDOW: usize = 3;

/// Projects the next twelve months from the cleaned series. Method choice
/// follows the profile type; interval half-widths are the same-season
/// historical deviation at 95%, widened as overall confidence falls.
pub fn project(
    series: &[UsagePoint],
    profile_type: ProfileType,
    observed_months: usize,
    hemisphere: Hemisphere,
    overall_confidence: f64,
) -> UsageProjection {
    let start = series
        .last()
        .map(|point| point.month.next())
        .unwrap_or(BillingMonth { year: 0, month: 1 });

    let (values, method) = match profile_type {
        ProfileType::Seasonal => (seasonal_values(series, start, hemisphere), ProjectionMethod::SeasonalAverage),
        ProfileType::Baseline | ProfileType::HighUser if observed_months >= TREND_MIN_MONTHS => {
            (trend_values(series), ProjectionMethod::LinearTrend)
        }
        _ => (moving_average_values(series), ProjectionMethod::MovingAverage),
    };

    build(series, start, &values, method, hemisphere, overall_confidence)
}

/// Builds a projection directly from a twelve-entry regional average table,
/// used when the consumer's own history is too thin to project from.
pub fn project_from_table(
    monthly_kwh: &[f64; 12],
    start: BillingMonth,
    overall_confidence: f64,
) -> UsageProjection {
    let values: Vec<f64> = (0..12)
        .map(|offset| {
            let month = start.plus_months(offset as i64);
            monthly_kwh[(month.month - 1) as usize].max(0.0)
        })
        .collect();

    build(&[], start, &values, ProjectionMethod::RegionalFallback, Hemisphere::Northern, overall_confidence)
}

fn build(
    series: &[UsagePoint],
    start: BillingMonth,
    values: &[f64],
    method: ProjectionMethod,
    hemisphere: Hemisphere,
    overall_confidence: f64,
) -> UsageProjection {
    let overall_sigma = {
        let all: Vec<f64> = series.iter().map(|p| p.kwh).collect();
        std_dev(&all)
    };
    let widening = 2.0 - overall_confidence.clamp(0.0, 1.0);

    let months: Vec<MonthProjection> = values
        .iter()
        .enumerate()
        .map(|(offset, &raw)| {
            let month = start.plus_months(offset as i64);
            let kwh = raw.max(0.0);
            let sigma = season_sigma(series, hemisphere.season_of(month.month), hemisphere)
                .unwrap_or(overall_sigma);
            let half_width = Z_95 * sigma * widening;
            MonthProjection {
                month,
                kwh,
                low_95: (kwh - half_width).max(0.0),
                high_95: kwh + half_width,
            }
        })
        .collect();

    let annual_kwh = months.iter().map(|m| m.kwh).sum();

    UsageProjection { months, annual_kwh, method }
}

fn seasonal_values(series: &[UsagePoint], start: BillingMonth, hemisphere: Hemisphere) -> Vec<f64> {
    let by_season = group_by_season(series, hemisphere);
    let overall: Vec<f64> = series.iter().map(|p| p.kwh).collect();
    let overall_mean = mean(&overall);

    (0..12)
        .map(|offset| {
            let month = start.plus_months(offset);
            let season = hemisphere.season_of(month.month);
            match by_season.get(&season) {
                Some(points) if !points.is_empty() => {
                    season_average(by_season.get(&season)).max(0.0)
                }
                _ => overall_mean,
            }
        })
        .collect()
}

/// Least-squares fit over the trailing twelve series points, extrapolated
/// forward and clamped at zero.
fn trend_values(series: &[UsagePoint]) -> Vec<f64> {
    let window: Vec<f64> = series
        .iter()
        .rev()
        .take(12)
        .rev()
        .map(|p| p.kwh)
        .collect();
    let n = window.len() as f64;

    let x_mean = (n - 1.0) / 2.0;
    let y_mean = mean(&window);
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, y) in window.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }
    let slope = if denominator == 0.0 { 0.0 } else { numerator / denominator };
    let intercept = y_mean - slope * x_mean;

    (0..12)
        .map(|step| {
            let x = window.len() as f64 + step as f64;
            (intercept + slope * x).max(0.0)
        })
        .collect()
}

fn moving_average_values(series: &[UsagePoint]) -> Vec<f64> {
    let window: Vec<f64> = series
        .iter()
        .rev()
        .take(MOVING_AVERAGE_WINDOW)
        .map(|p| p.kwh)
        .collect();
    let level = mean(&window).max(0.0);
    vec![level; 12]
}

fn season_sigma(series: &[UsagePoint], season: Season, hemisphere: Hemisphere) -> Option<f64> {
    let values: Vec<f64> = series
        .iter()
        .filter(|p| hemisphere.season_of(p.month.month) == season)
        .map(|p| p.kwh)
        .collect();
    (values.len() >= 2).then(|| std_dev(&values))
}
