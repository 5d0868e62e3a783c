use serde::{Deserialize, Serialize};

use super::domain::{ApplicantRecord, RecordState};
use super::repository::ApplicantFile;

/// Administrator filters over registered applicants. Absent fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicantSearch {
    pub state: Option<RecordState>,
    pub honor_roll: Option<bool>,
    pub min_grade: Option<f64>,
    pub max_grade: Option<f64>,
    /// Case-insensitive substring of the full name.
    pub name: Option<String>,
}

impl ApplicantSearch {
    pub fn matches(&self, record: &ApplicantRecord) -> bool {
        if self.state.is_some_and(|state| state != record.state) {
            return false;
        }
        if self
            .honor_roll
            .is_some_and(|honor_roll| honor_roll != record.honor_roll)
        {
            return false;
        }
        if self.min_grade.is_some_and(|min| record.prior_grade < min) {
            return false;
        }
        if self.max_grade.is_some_and(|max| record.prior_grade > max) {
            return false;
        }
        match self.name.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => record
                .full_name()
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }
}

/// Registry-wide counters for the administrator dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ApplicantStatistics {
    pub total: usize,
    pub complete: usize,
    pub incomplete: usize,
    pub honor_roll: usize,
    pub enrolled: usize,
    /// Mean of the non-zero prior grades, two decimals. Zero when nobody has a grade.
    pub average_grade: f64,
}

impl ApplicantStatistics {
    pub fn from_files(files: &[ApplicantFile]) -> Self {
        let mut stats = Self {
            total: files.len(),
            ..Self::default()
        };
        let mut grade_sum = 0.0;
        let mut graded = 0usize;

        for file in files {
            match file.record.state {
                RecordState::Complete => stats.complete += 1,
                RecordState::Incomplete => stats.incomplete += 1,
            }
            if file.record.honor_roll {
                stats.honor_roll += 1;
            }
            if file.enrollment.as_ref().is_some_and(|enrollment| enrollment.is_active()) {
                stats.enrolled += 1;
            }
            if file.record.prior_grade > 0.0 {
                grade_sum += file.record.prior_grade;
                graded += 1;
            }
        }

        if graded > 0 {
            stats.average_grade = (grade_sum / graded as f64 * 100.0).round() / 100.0;
        }
        stats
    }
}
