//! End-to-end scenarios: raw records through profiling, costing, scoring,
//! and ranking.

use rust_decimal::Decimal;

use wattwise_core::{
    fingerprint_request, BillingMonth, EngineConfig, MonthlyUsageRecord, Plan, PlanId,
    ProfileType, RateStructure, RecommendationEngine, RecommendationRequest, SupplierRating,
    SwitchAdvice, TierBracket, UsageSource, UserPreferences,
};

const YEAR_OF_USAGE: [f64; 12] =
    [850.0, 820.0, 780.0, 750.0, 900.0, 1100.0, 1200.0, 1150.0, 950.0, 800.0, 820.0, 880.0];

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

fn plan(id: &str, rate_structure: RateStructure) -> Plan {
    Plan {
        id: PlanId(id.to_string()),
        supplier: format!("{id} energy"),
        rate_structure,
        contract_length_months: 12,
        early_termination_fee: Decimal::new(10_000, 2),
        renewable_percentage: 30.0,
        monthly_fee: Decimal::new(495, 2),
        connection_fee: Decimal::ZERO,
        rating: Some(SupplierRating { average: 4.1, review_count: 240 }),
        eligible_regions: vec!["TX".to_string()],
        active: true,
    }
}

fn three_plan_catalog() -> Vec<Plan> {
    vec![
        plan("budget-fixed", RateStructure::Fixed { rate_per_kwh: Decimal::new(10, 2) }),
        plan("premium-fixed", RateStructure::Fixed { rate_per_kwh: Decimal::new(14, 2) }),
        plan(
            "tiered-saver",
            RateStructure::Tiered {
                tiers: vec![
                    TierBracket {
                        up_to_kwh: Some(Decimal::from(500)),
                        rate_per_kwh: Decimal::new(11, 2),
                    },
                    TierBracket { up_to_kwh: None, rate_per_kwh: Decimal::new(15, 2) },
                ],
            },
        ),
    ]
}

#[test]
fn cheapest_fixed_plan_wins_when_cost_priority_dominates() {
    let engine = RecommendationEngine::new(EngineConfig::default());
    let usage = records(&YEAR_OF_USAGE);
    let profile = engine.analyze_usage(&usage, None).expect("profile");
    let catalog = three_plan_catalog();

    let preferences = UserPreferences::new(50, 20, 20, 10);
    let fingerprint = fingerprint_request(&usage, &preferences, None, "catalog-v1", "TX", 3);
    let request = RecommendationRequest::new(preferences, &profile, &catalog, "TX")
        .with_fingerprint(fingerprint.clone());

    let result = engine.generate(request).expect("result");

    assert_eq!(result.ranked_plans[0].plan.id.0, "budget-fixed");
    assert_eq!(result.total_plans_analyzed, 3);
    assert_eq!(result.fingerprint, fingerprint);
    assert_eq!(result.ranked_plans[0].rank, 1);
}

#[test]
fn year_with_summer_lift_profiles_as_seasonal() {
    let engine = RecommendationEngine::new(EngineConfig::default());
    // Constant winter at 600, summer at 1.6x.
    let kwh: Vec<f64> = (1..=12u32)
        .map(|m| match m {
            12 | 1 | 2 => 600.0,
            6..=8 => 960.0,
            _ => 700.0,
        })
        .collect();
    let profile = engine.analyze_usage(&records(&kwh), None).expect("profile");

    assert_eq!(profile.profile_type, ProfileType::Seasonal);
    let seasonal = profile.seasonal.expect("seasonal analysis");
    let ratio = seasonal.ratio.expect("ratio");
    assert!((ratio - 1.6).abs() < 1e-9);
}

#[test]
fn composite_scores_stay_bounded_across_preference_tuples() {
    let engine = RecommendationEngine::new(EngineConfig::default());
    let profile = engine.analyze_usage(&records(&YEAR_OF_USAGE), None).expect("profile");
    let catalog = three_plan_catalog();

    for preferences in [
        UserPreferences::new(100, 0, 0, 0),
        UserPreferences::new(0, 100, 0, 0),
        UserPreferences::new(0, 0, 100, 0),
        UserPreferences::new(0, 0, 0, 100),
        UserPreferences::new(40, 30, 20, 10),
    ] {
        let request =
            RecommendationRequest::new(preferences, &profile, &catalog, "TX").with_top_n(3);
        let result = engine.generate(request).expect("result");
        for ranked in &result.ranked_plans {
            assert!(
                (0.0..=100.0).contains(&ranked.score.composite_score),
                "composite out of bounds for {preferences:?}"
            );
        }
    }
}

#[test]
fn invalid_preference_sum_computes_nothing() {
    let engine = RecommendationEngine::new(EngineConfig::default());
    let profile = engine.analyze_usage(&records(&YEAR_OF_USAGE), None).expect("profile");
    let catalog = three_plan_catalog();

    let request = RecommendationRequest::new(
        UserPreferences::new(50, 20, 20, 20),
        &profile,
        &catalog,
        "TX",
    );
    assert!(engine.generate(request).is_err());
}

#[test]
fn repeated_runs_produce_identical_rankings_and_scores() {
    let engine = RecommendationEngine::new(EngineConfig::default());
    let profile = engine.analyze_usage(&records(&YEAR_OF_USAGE), None).expect("profile");
    let catalog = three_plan_catalog();
    let preferences = UserPreferences::new(50, 20, 20, 10);

    let run = || {
        engine
            .generate(RecommendationRequest::new(preferences, &profile, &catalog, "TX"))
            .expect("result")
    };
    let first = run();
    let second = run();

    for (a, b) in first.ranked_plans.iter().zip(second.ranked_plans.iter()) {
        assert_eq!(a.plan.id, b.plan.id);
        assert_eq!(a.rank, b.rank);
        assert_eq!(a.score, b.score);
        assert_eq!(a.cost.total_annual_cost, b.cost.total_annual_cost);
    }
}

#[test]
fn break_even_months_never_decrease_as_the_fee_grows() {
    let engine = RecommendationEngine::new(EngineConfig::default());
    let profile = engine.analyze_usage(&records(&[1000.0; 12]), None).expect("profile");
    let catalog =
        vec![plan("cheaper", RateStructure::Fixed { rate_per_kwh: Decimal::new(10, 2) })];

    let mut previous_break_even = 0;
    for fee_dollars in [0, 50, 100, 150, 300, 600] {
        let mut current_plan =
            plan("current", RateStructure::Fixed { rate_per_kwh: Decimal::new(14, 2) });
        current_plan.early_termination_fee = Decimal::from(fee_dollars);
        let current = wattwise_core::CurrentPlan { plan: current_plan, months_remaining: 24 };

        let request = RecommendationRequest::new(
            UserPreferences::default(),
            &profile,
            &catalog,
            "TX",
        )
        .with_current_plan(&current);
        let result = engine.generate(request).expect("result");

        let break_even = result.ranked_plans[0]
            .switching
            .as_ref()
            .expect("switching analysis")
            .break_even_months
            .expect("positive savings");
        assert!(break_even >= previous_break_even, "fee {fee_dollars}");
        previous_break_even = break_even;
    }
}

#[test]
fn all_candidates_dearer_than_current_means_stay_everywhere() {
    let engine = RecommendationEngine::new(EngineConfig::default());
    let profile = engine.analyze_usage(&records(&YEAR_OF_USAGE), None).expect("profile");
    let catalog = three_plan_catalog();
    let current = wattwise_core::CurrentPlan {
        plan: plan("rock-bottom", RateStructure::Fixed { rate_per_kwh: Decimal::new(6, 2) }),
        months_remaining: 6,
    };

    let request = RecommendationRequest::new(
        UserPreferences::default(),
        &profile,
        &catalog,
        "TX",
    )
    .with_current_plan(&current)
    .with_top_n(3);
    let result = engine.generate(request).expect("result");

    assert_eq!(result.ranked_plans.len(), 3);
    for ranked in &result.ranked_plans {
        let switching = ranked.switching.as_ref().expect("switching analysis");
        assert_eq!(switching.advice, SwitchAdvice::Stay);
    }
}

#[test]
fn sparse_history_with_fallback_flows_through_with_warnings() {
    let engine = RecommendationEngine::new(EngineConfig::default());
    let usage = records(&[820.0, 780.0]);
    let fallback = wattwise_core::RegionalFallback {
        region: "TX".to_string(),
        monthly_average_kwh: [900.0; 12],
    };
    let profile = engine.analyze_usage(&usage, Some(&fallback)).expect("degraded profile");
    assert_eq!(profile.profile_type, ProfileType::InsufficientData);

    let catalog = three_plan_catalog();
    let request = RecommendationRequest::new(
        UserPreferences::default(),
        &profile,
        &catalog,
        "TX",
    );
    let result = engine.generate(request).expect("result");

    assert!(!result.warnings.is_empty());
    assert!(result.warnings.iter().any(|w| w.contains("regional average")));
    assert!(!result.ranked_plans.is_empty());
}
