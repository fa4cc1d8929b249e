use serde::{Deserialize, Serialize};

use crate::errors::RecommendationError;

/// Relative weights a consumer assigns to the four scoring dimensions.
/// The weights must sum to exactly 100; the recommendation engine rejects
/// anything else rather than renormalizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub cost_priority: u8,
    pub flexibility_priority: u8,
    pub renewable_priority: u8,
    pub rating_priority: u8,
}

impl UserPreferences {
    pub fn new(cost: u8, flexibility: u8, renewable: u8, rating: u8) -> Self {
        Self {
            cost_priority: cost,
            flexibility_priority: flexibility,
            renewable_priority: renewable,
            rating_priority: rating,
        }
    }

    pub fn weight_sum(&self) -> u32 {
        u32::from(self.cost_priority)
            + u32::from(self.flexibility_priority)
            + u32::from(self.renewable_priority)
            + u32::from(self.rating_priority)
    }

    pub fn validate(&self) -> Result<(), RecommendationError> {
        let sum = self.weight_sum();
        if sum == 100 {
            Ok(())
        } else {
            Err(RecommendationError::PreferenceValidation { sum })
        }
    }
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self::new(40, 20, 20, 20)
    }
}

#[cfg(test)]
mod tests {
    use super::UserPreferences;
    use crate::errors::RecommendationError;

    #[test]
    fn default_weights_sum_to_one_hundred() {
        assert!(UserPreferences::default().validate().is_ok());
    }

    #[test]
    fn rejects_weights_that_undershoot() {
        let error = UserPreferences::new(50, 20, 20, 5).validate().expect_err("must fail");
        assert!(matches!(error, RecommendationError::PreferenceValidation { sum: 95 }));
    }

    #[test]
    fn rejects_weights_that_overshoot() {
        let error = UserPreferences::new(50, 30, 20, 10).validate().expect_err("must fail");
        assert!(matches!(error, RecommendationError::PreferenceValidation { sum: 110 }));
    }
}
