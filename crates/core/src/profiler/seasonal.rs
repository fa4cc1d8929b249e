//! Seasonal shape detection over the cleaned monthly series.

use std::collections::BTreeMap;

use crate::domain::profile::{Hemisphere, Season, SeasonPeak, SeasonalAnalysis};
use crate::profiler::quality::{mean, UsagePoint};

/// Groups the series by meteorological season and derives the summer/winter
/// ratio. Season averages prefer real readings; a season covered only by
/// interpolated months falls back to those.
pub fn analyze(
    series: &[UsagePoint],
    hemisphere: Hemisphere,
    ratio_threshold: f64,
) -> Option<SeasonalAnalysis> {
    if series.is_empty() {
        return None;
    }

    let by_season = group_by_season(series, hemisphere);

    let summer_average_kwh = season_average(by_season.get(&Season::Summer));
    let winter_average_kwh = season_average(by_season.get(&Season::Winter));

    let ratio = (winter_average_kwh > 0.0).then(|| summer_average_kwh / winter_average_kwh);
    let is_seasonal = ratio.is_some_and(|r| r >= ratio_threshold);

    let peak_months = by_season
        .iter()
        .filter_map(|(&season, points)| {
            points
                .iter()
                .max_by(|a, b| {
                    a.kwh.partial_cmp(&b.kwh).unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|peak| SeasonPeak { season, month: peak.month, kwh: peak.kwh })
        })
        .collect();

    let represented = Season::ALL
        .iter()
        .filter(|season| {
            by_season
                .get(season)
                .is_some_and(|points| points.iter().any(|p| !p.interpolated))
        })
        .count();
    let confidence = (represented as f64 / 4.0).clamp(0.0, 1.0);

    Some(SeasonalAnalysis {
        summer_average_kwh,
        winter_average_kwh,
        ratio,
        is_seasonal,
        peak_months,
        confidence,
    })
}

pub(crate) fn group_by_season(
    series: &[UsagePoint],
    hemisphere: Hemisphere,
) -> BTreeMap<Season, Vec<&UsagePoint>> {
    let mut by_season: BTreeMap<Season, Vec<&UsagePoint>> = BTreeMap::new();
    for point in series {
        by_season.entry(hemisphere.season_of(point.month.month)).or_default().push(point);
    }
    by_season
}

pub(crate) fn season_average(points: Option<&Vec<&UsagePoint>>) -> f64 {
    let Some(points) = points else { return 0.0 };

    let real: Vec<f64> =
        points.iter().filter(|p| !p.interpolated).map(|p| p.kwh).collect();
    if !real.is_empty() {
        return mean(&real);
    }

    let all: Vec<f64> = points.iter().map(|p| p.kwh).collect();
    mean(&all)
}

#[cfg(test)]
mod tests {
    use crate::domain::profile::{Hemisphere, Season};
    use crate::domain::usage::BillingMonth;
    use crate::profiler::quality::UsagePoint;

    use super::analyze;

    fn point(month: u32, kwh: f64, interpolated: bool) -> UsagePoint {
        UsagePoint { month: BillingMonth { year: 2025, month }, kwh, interpolated }
    }

    fn year_of_usage(winter_kwh: f64, summer_kwh: f64) -> Vec<UsagePoint> {
        (1..=12)
            .map(|m| {
                let kwh = match m {
                    12 | 1 | 2 => winter_kwh,
                    6..=8 => summer_kwh,
                    _ => (winter_kwh + summer_kwh) / 2.0,
                };
                point(m, kwh, false)
            })
            .collect()
    }

    #[test]
    fn sixty_percent_summer_lift_classifies_as_seasonal() {
        let series = year_of_usage(500.0, 800.0);
        let analysis = analyze(&series, Hemisphere::Northern, 1.35).expect("analysis");

        let ratio = analysis.ratio.expect("ratio defined");
        assert!((ratio - 1.6).abs() < 1e-9);
        assert!(analysis.is_seasonal);
        assert!((analysis.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn flat_usage_is_not_seasonal() {
        let series = year_of_usage(700.0, 700.0);
        let analysis = analyze(&series, Hemisphere::Northern, 1.35).expect("analysis");
        assert!(!analysis.is_seasonal);
    }

    #[test]
    fn zero_winter_average_leaves_ratio_undefined() {
        let series = vec![point(1, 0.0, false), point(7, 900.0, false)];
        let analysis = analyze(&series, Hemisphere::Northern, 1.35).expect("analysis");
        assert_eq!(analysis.ratio, None);
        assert!(!analysis.is_seasonal);
    }

    #[test]
    fn season_average_prefers_real_readings() {
        let series = vec![
            point(1, 400.0, false),
            point(2, 1200.0, true),
            point(7, 800.0, false),
        ];
        let analysis = analyze(&series, Hemisphere::Northern, 1.35).expect("analysis");
        // The interpolated February must not drag the winter average up.
        assert!((analysis.winter_average_kwh - 400.0).abs() < 1e-9);
    }

    #[test]
    fn interpolated_only_seasons_do_not_count_toward_confidence() {
        let series = vec![
            point(1, 500.0, false),
            point(4, 600.0, true),
            point(7, 900.0, false),
        ];
        let analysis = analyze(&series, Hemisphere::Northern, 1.35).expect("analysis");
        // Winter and summer are real; spring is interpolated only.
        assert!((analysis.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn peak_months_track_each_season_maximum() {
        let mut series = year_of_usage(500.0, 800.0);
        series[6].kwh = 950.0; // July spike
        let analysis = analyze(&series, Hemisphere::Northern, 1.35).expect("analysis");

        let summer_peak = analysis
            .peak_months
            .iter()
            .find(|p| p.season == Season::Summer)
            .expect("summer peak");
        assert_eq!(summer_peak.month.month, 7);
    }
}
