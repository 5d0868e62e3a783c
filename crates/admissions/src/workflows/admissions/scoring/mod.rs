mod calculator;
mod config;

pub use calculator::{
    aptitude_total, compute_final_score, FinalScore, ScoreBreakdown, EVALUATION_WEIGHT,
    GRADE_NORMALIZATION_FACTOR, GRADE_WEIGHT, MAX_GRADE, MAX_SCORE, MAX_SUB_SCORE, MERIT_WEIGHT,
};
pub use config::ScoringConfig;
