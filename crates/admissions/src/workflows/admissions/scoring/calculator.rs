use serde::{Deserialize, Serialize};

use super::super::domain::AptitudeSubScores;
use super::super::validation::{ensure_range, ValidationError};

pub const MAX_GRADE: f64 = 10.0;
pub const MAX_SUB_SCORE: f64 = 10.0;
pub const MAX_SCORE: f64 = 1000.0;
pub const GRADE_NORMALIZATION_FACTOR: f64 = 100.0;

pub const GRADE_WEIGHT: f64 = 0.30;
pub const EVALUATION_WEIGHT: f64 = 0.50;
pub const MERIT_WEIGHT: f64 = 0.20;

/// Composite ranking score together with the validated inputs it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalScore {
    pub prior_grade: f64,
    pub evaluation_score: f64,
    pub merit_bonus: f64,
    pub value: f64,
}

/// Weighted contributions behind a final score, for audit displays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub normalized_grade: f64,
    pub grade_component: f64,
    pub evaluation_component: f64,
    pub merit_component: f64,
    pub final_score: f64,
}

impl FinalScore {
    pub fn breakdown(&self) -> ScoreBreakdown {
        let normalized_grade = self.prior_grade * GRADE_NORMALIZATION_FACTOR;
        ScoreBreakdown {
            normalized_grade,
            grade_component: round2(normalized_grade * GRADE_WEIGHT),
            evaluation_component: round2(self.evaluation_score * EVALUATION_WEIGHT),
            merit_component: round2(self.merit_bonus * MERIT_WEIGHT),
            final_score: self.value,
        }
    }
}

/// 30% normalized grade + 50% evaluation + 20% merit, clamped to `[0, 1000]` and
/// rounded to two decimals.
pub fn compute_final_score(
    prior_grade: f64,
    evaluation_score: f64,
    merit_bonus: f64,
) -> Result<FinalScore, ValidationError> {
    let prior_grade = ensure_range("prior_grade", prior_grade, 0.0, MAX_GRADE)?;
    let evaluation_score = ensure_range("evaluation_score", evaluation_score, 0.0, MAX_SCORE)?;
    let merit_bonus = ensure_range("merit_bonus", merit_bonus, 0.0, MAX_SCORE)?;

    let weighted = prior_grade * GRADE_NORMALIZATION_FACTOR * GRADE_WEIGHT
        + evaluation_score * EVALUATION_WEIGHT
        + merit_bonus * MERIT_WEIGHT;

    Ok(FinalScore {
        prior_grade,
        evaluation_score,
        merit_bonus,
        value: round2(weighted.clamp(0.0, MAX_SCORE)),
    })
}

/// Aptitude exam total on the 0-1000 scale: mean of the three sub-scores times 100.
pub fn aptitude_total(sub_scores: &AptitudeSubScores) -> Result<f64, ValidationError> {
    let verbal = ensure_range("verbal", sub_scores.verbal, 0.0, MAX_SUB_SCORE)?;
    let numeric = ensure_range("numeric", sub_scores.numeric, 0.0, MAX_SUB_SCORE)?;
    let abstract_reasoning = ensure_range(
        "abstract_reasoning",
        sub_scores.abstract_reasoning,
        0.0,
        MAX_SUB_SCORE,
    )?;

    let mean = (verbal + numeric + abstract_reasoning) / 3.0;
    Ok(round2((mean * GRADE_NORMALIZATION_FACTOR).clamp(0.0, MAX_SCORE)))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
