use std::fmt::Write as _;

use wattwise_core::EngineConfig;

use super::CommandResult;

pub fn run(config: &EngineConfig) -> CommandResult {
    let mut out = String::new();
    let _ = writeln!(out, "effective config (source precedence: overrides > env > file > default):");
    let _ = writeln!(
        out,
        "profiler.high_usage_threshold_kwh = {}",
        config.profiler.high_usage_threshold_kwh
    );
    let _ = writeln!(
        out,
        "profiler.variability_cv_threshold = {}",
        config.profiler.variability_cv_threshold
    );
    let _ = writeln!(
        out,
        "profiler.seasonal_ratio_threshold = {}",
        config.profiler.seasonal_ratio_threshold
    );
    let _ = writeln!(out, "profiler.hemisphere = {:?}", config.profiler.hemisphere);
    let _ = writeln!(out, "costing.default_peak_share = {}", config.costing.default_peak_share);
    let _ = writeln!(
        out,
        "costing.variable_rate_buffer = {}",
        config.costing.variable_rate_buffer
    );
    let _ = writeln!(out, "engine.default_top_n = {}", config.engine.default_top_n);
    let _ = writeln!(out, "engine.switch_threshold_pct = {}", config.engine.switch_threshold_pct);
    let _ = writeln!(
        out,
        "cache.recommendation_ttl_hours = {}",
        config.cache.recommendation_ttl_hours
    );
    let _ = writeln!(out, "cache.profile_ttl_days = {}", config.cache.profile_ttl_days);
    let _ = writeln!(
        out,
        "cache.computation_timeout_ms = {}",
        config.cache.computation_timeout_ms
    );
    let _ = writeln!(out, "logging.level = {}", config.logging.level);
    let _ = writeln!(out, "logging.format = {:?}", config.logging.format);

    CommandResult::success(out)
}
