//! Profile classification as an ordered rule table, first match wins.

use crate::config::ProfilerConfig;
use crate::domain::profile::{ProfileType, SeasonalAnalysis};

pub struct ClassificationInput<'a> {
    pub observed_months: usize,
    pub mean_monthly_kwh: f64,
    pub coefficient_of_variation: f64,
    pub seasonal: Option<&'a SeasonalAnalysis>,
}

pub struct ClassificationRule {
    pub profile: ProfileType,
    pub applies: fn(&ClassificationInput<'_>, &ProfilerConfig) -> bool,
}

/// Precedence is the order of this table. The final rule always applies.
pub const RULES: &[ClassificationRule] = &[
    ClassificationRule {
        profile: ProfileType::InsufficientData,
        applies: |input, _| input.observed_months < 3,
    },
    ClassificationRule {
        profile: ProfileType::Seasonal,
        applies: |input, _| input.seasonal.is_some_and(|s| s.is_seasonal),
    },
    ClassificationRule {
        profile: ProfileType::HighUser,
        applies: |input, config| input.mean_monthly_kwh > config.high_usage_threshold_kwh,
    },
    ClassificationRule {
        profile: ProfileType::Variable,
        applies: |input, config| {
            input.coefficient_of_variation > config.variability_cv_threshold
        },
    },
    ClassificationRule { profile: ProfileType::Baseline, applies: |_, _| true },
];

pub fn classify(input: &ClassificationInput<'_>, config: &ProfilerConfig) -> ProfileType {
    RULES
        .iter()
        .find(|rule| (rule.applies)(input, config))
        .map(|rule| rule.profile)
        .unwrap_or(ProfileType::Baseline)
}
