use serde::{Deserialize, Serialize};

/// Admission dials that are policy, not arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Inclusive floor a final score must reach before a seat can be reserved.
    pub minimum_score: f64,
    /// Merit points credited to applicants on the school honor roll.
    pub honor_roll_bonus: f64,
}

impl ScoringConfig {
    pub const DEFAULT_MINIMUM_SCORE: f64 = 600.0;
    pub const DEFAULT_HONOR_ROLL_BONUS: f64 = 100.0;

    pub fn merit_bonus_for(&self, honor_roll: bool) -> f64 {
        if honor_roll {
            self.honor_roll_bonus
        } else {
            0.0
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            minimum_score: Self::DEFAULT_MINIMUM_SCORE,
            honor_roll_bonus: Self::DEFAULT_HONOR_ROLL_BONUS,
        }
    }
}
