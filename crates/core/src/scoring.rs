//! Candidate-set scoring: four normalized sub-scores and the weighted
//! composite. Normalization spans the full filtered candidate set, so
//! scoring only runs once every cost is known.

use rust_decimal::prelude::ToPrimitive;

use crate::domain::plan::Plan;
use crate::domain::preferences::UserPreferences;
use crate::domain::recommendation::{CostBreakdown, PlanScore};

/// Blend between the supplier's average rating and how well-reviewed it is
/// relative to the most-reviewed candidate.
const RATING_WEIGHT: f64 = 0.7;
const REVIEW_VOLUME_WEIGHT: f64 = 0.3;

/// Neutral score for plans whose supplier has no rating on file.
const UNRATED_SCORE: f64 = 50.0;

#[derive(Clone, Copy, Debug)]
pub struct Candidate<'a> {
    pub plan: &'a Plan,
    pub cost: &'a CostBreakdown,
}

/// Scores every candidate against the set. Order of the output matches the
/// order of the input.
pub fn score_candidates(
    candidates: &[Candidate<'_>],
    preferences: &UserPreferences,
) -> Vec<PlanScore> {
    let costs: Vec<f64> =
        candidates.iter().map(|c| decimal_axis(c.cost.total_annual_cost.to_f64())).collect();
    let contract_lengths: Vec<f64> =
        candidates.iter().map(|c| f64::from(c.plan.contract_length_months)).collect();
    let termination_fees: Vec<f64> = candidates
        .iter()
        .map(|c| decimal_axis(c.plan.early_termination_fee.to_f64()))
        .collect();
    let rated: Vec<f64> = candidates
        .iter()
        .filter_map(|c| c.plan.rating.map(|r| r.average))
        .collect();
    let max_reviews = candidates
        .iter()
        .filter_map(|c| c.plan.rating.map(|r| r.review_count))
        .max()
        .unwrap_or(0);

    candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            let cost_score = inverted_min_max(costs[index], &costs);

            let flexibility_score = 0.5 * inverted_min_max(contract_lengths[index], &contract_lengths)
                + 0.5 * inverted_min_max(termination_fees[index], &termination_fees);

            let renewable_score = candidate.plan.renewable_percentage.clamp(0.0, 100.0);

            let rating_score = match candidate.plan.rating {
                Some(rating) => {
                    let rating_component = direct_min_max(rating.average, &rated);
                    let volume_component = if max_reviews == 0 {
                        100.0
                    } else {
                        f64::from(rating.review_count) / f64::from(max_reviews) * 100.0
                    };
                    RATING_WEIGHT * rating_component + REVIEW_VOLUME_WEIGHT * volume_component
                }
                None => UNRATED_SCORE,
            };

            let composite_score = (cost_score * f64::from(preferences.cost_priority)
                + flexibility_score * f64::from(preferences.flexibility_priority)
                + renewable_score * f64::from(preferences.renewable_priority)
                + rating_score * f64::from(preferences.rating_priority))
                / 100.0;

            PlanScore {
                cost_score,
                flexibility_score,
                renewable_score,
                rating_score,
                composite_score: composite_score.clamp(0.0, 100.0),
            }
        })
        .collect()
}

/// Lowest value scores 100, highest 0; a degenerate set scores 100.
fn inverted_min_max(value: f64, values: &[f64]) -> f64 {
    let Some((min, max)) = bounds(values) else { return 100.0 };
    if (max - min).abs() < f64::EPSILON {
        return 100.0;
    }
    ((max - value) / (max - min) * 100.0).clamp(0.0, 100.0)
}

/// Highest value scores 100, lowest 0; a degenerate set scores 100.
fn direct_min_max(value: f64, values: &[f64]) -> f64 {
    let Some((min, max)) = bounds(values) else { return 100.0 };
    if (max - min).abs() < f64::EPSILON {
        return 100.0;
    }
    ((value - min) / (max - min) * 100.0).clamp(0.0, 100.0)
}

fn bounds(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}

fn decimal_axis(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0)
}
