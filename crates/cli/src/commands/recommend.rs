use std::fmt::Write as _;
use std::path::Path;

use wattwise_core::{
    fingerprint_request, CurrentPlan, EngineConfig, MonthlyUsageRecord, RecommendationEngine,
    RecommendationError, RecommendationRequest, RecommendationResult, RegionalFallback,
};

use super::{load_json, parse_preferences, CatalogFile, CommandResult};

pub struct RecommendArgs<'a> {
    pub usage: &'a Path,
    pub plans: &'a Path,
    pub prefs: &'a str,
    pub region: &'a str,
    pub current: Option<&'a Path>,
    pub fallback: Option<&'a Path>,
    pub top: Option<usize>,
    pub json: bool,
}

pub fn run(config: &EngineConfig, args: RecommendArgs<'_>) -> CommandResult {
    let records: Vec<MonthlyUsageRecord> = match load_json(args.usage, "usage") {
        Ok(records) => records,
        Err(error) => return CommandResult::invalid_input(format!("{error:#}")),
    };
    let catalog: CatalogFile = match load_json(args.plans, "plan catalog") {
        Ok(catalog) => catalog,
        Err(error) => return CommandResult::invalid_input(format!("{error:#}")),
    };
    let current: Option<CurrentPlan> = match args.current {
        Some(path) => match load_json(path, "current plan") {
            Ok(current) => Some(current),
            Err(error) => return CommandResult::invalid_input(format!("{error:#}")),
        },
        None => None,
    };
    let fallback: Option<RegionalFallback> = match args.fallback {
        Some(path) => match load_json(path, "regional fallback") {
            Ok(fallback) => Some(fallback),
            Err(error) => return CommandResult::invalid_input(format!("{error:#}")),
        },
        None => None,
    };
    let preferences = match parse_preferences(args.prefs) {
        Ok(preferences) => preferences,
        Err(error) => return CommandResult::invalid_input(format!("{error:#}")),
    };

    let engine = RecommendationEngine::new(config.clone());
    let profile = match engine.analyze_usage(&records, fallback.as_ref()) {
        Ok(profile) => profile,
        Err(error) => return CommandResult::invalid_input(error.to_string()),
    };

    let top_n = args.top.unwrap_or(config.engine.default_top_n);
    let fingerprint = fingerprint_request(
        &records,
        &preferences,
        current.as_ref(),
        &catalog.version,
        args.region,
        top_n,
    );

    let mut request =
        RecommendationRequest::new(preferences, &profile, &catalog.plans, args.region)
            .with_top_n(top_n)
            .with_fingerprint(fingerprint);
    if let Some(current) = current.as_ref() {
        request = request.with_current_plan(current);
    }

    let result = match engine.generate(request) {
        Ok(result) => result,
        Err(
            error @ (RecommendationError::PreferenceValidation { .. }
            | RecommendationError::NoEligiblePlans { .. }
            | RecommendationError::DataQuality { .. }),
        ) => return CommandResult::invalid_input(error.to_string()),
        Err(error) => return CommandResult::internal(error.to_string()),
    };

    if args.json {
        return match serde_json::to_string_pretty(&result) {
            Ok(payload) => CommandResult::success(payload),
            Err(error) => CommandResult::internal(error.to_string()),
        };
    }

    CommandResult::success(render(&result))
}

fn render(result: &RecommendationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "analyzed {} plan(s); profile {:?}, projected {:.0} kWh/yr (confidence {:.2})\n",
        result.total_plans_analyzed,
        result.profile_summary.profile_type,
        result.profile_summary.projected_annual_kwh,
        result.profile_summary.overall_confidence,
    );

    for ranked in &result.ranked_plans {
        let _ = writeln!(
            out,
            "#{} {} ({}) — ${:.2}/yr, score {:.1}",
            ranked.rank,
            ranked.plan.id.0,
            ranked.plan.supplier,
            ranked.cost.total_annual_cost,
            ranked.score.composite_score,
        );
        let _ = writeln!(
            out,
            "    cost {:.0} | flexibility {:.0} | renewable {:.0} | rating {:.0}",
            ranked.score.cost_score,
            ranked.score.flexibility_score,
            ranked.score.renewable_score,
            ranked.score.rating_score,
        );
        if let Some(savings) = ranked.annual_savings {
            let _ = writeln!(out, "    annual savings vs current: ${savings:.2}");
        }
        if let Some(switching) = &ranked.switching {
            let break_even = switching
                .break_even_months
                .map(|months| format!("{months} mo"))
                .unwrap_or_else(|| "n/a".to_string());
            let _ = writeln!(
                out,
                "    advice: {:?} (monthly savings ${:.2}, break-even {break_even})",
                switching.advice, switching.monthly_savings,
            );
        }
    }

    if !result.warnings.is_empty() {
        let _ = writeln!(out, "\nwarnings:");
        for warning in &result.warnings {
            let _ = writeln!(out, "  - {warning}");
        }
    }

    let _ = writeln!(out, "\nfingerprint: {}", result.fingerprint);
    out
}
