use std::fmt::Write as _;
use std::path::Path;

use wattwise_core::{
    EngineConfig, MonthlyUsageRecord, RecommendationError, RegionalFallback, UsageProfile,
    UsageProfiler,
};

use super::{load_json, CommandResult};

pub fn run(
    config: &EngineConfig,
    usage_path: &Path,
    fallback_path: Option<&Path>,
    json: bool,
) -> CommandResult {
    let records: Vec<MonthlyUsageRecord> = match load_json(usage_path, "usage") {
        Ok(records) => records,
        Err(error) => return CommandResult::invalid_input(format!("{error:#}")),
    };
    let fallback: Option<RegionalFallback> = match fallback_path {
        Some(path) => match load_json(path, "regional fallback") {
            Ok(fallback) => Some(fallback),
            Err(error) => return CommandResult::invalid_input(format!("{error:#}")),
        },
        None => None,
    };

    let profiler = UsageProfiler::new(config.profiler.clone());
    let profile = match profiler.analyze(&records, fallback.as_ref()) {
        Ok(profile) => profile,
        Err(error @ RecommendationError::DataQuality { .. }) => {
            return CommandResult::invalid_input(error.to_string())
        }
        Err(error) => return CommandResult::internal(error.to_string()),
    };

    if json {
        return match serde_json::to_string_pretty(&profile) {
            Ok(payload) => CommandResult::success(payload),
            Err(error) => CommandResult::internal(error.to_string()),
        };
    }

    CommandResult::success(render(&profile))
}

fn render(profile: &UsageProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "profile type:        {:?}", profile.profile_type);
    let _ = writeln!(out, "projection method:   {:?}", profile.projection.method);
    let _ = writeln!(out, "projected annual:    {:.0} kWh", profile.projection.annual_kwh);
    let _ = writeln!(out, "overall confidence:  {:.2}", profile.overall_confidence);
    let _ = writeln!(out, "data completeness:   {:.0}%", profile.data_quality.completeness * 100.0);

    if let Some(seasonal) = &profile.seasonal {
        let ratio = seasonal
            .ratio
            .map(|r| format!("{r:.2}"))
            .unwrap_or_else(|| "undefined".to_string());
        let _ = writeln!(
            out,
            "seasonal ratio:      {ratio} (summer {:.0} kWh / winter {:.0} kWh)",
            seasonal.summer_average_kwh, seasonal.winter_average_kwh
        );
    }

    let _ = writeln!(out, "\nmonthly projection (kWh, 95% interval):");
    for month in &profile.projection.months {
        let _ = writeln!(
            out,
            "  {}  {:>7.0}  [{:.0}..{:.0}]",
            month.month, month.kwh, month.low_95, month.high_95
        );
    }

    if !profile.data_quality.warnings.is_empty() {
        let _ = writeln!(out, "\nwarnings:");
        for warning in &profile.data_quality.warnings {
            let _ = writeln!(out, "  - {warning}");
        }
    }

    out
}
