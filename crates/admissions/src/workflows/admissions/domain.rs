use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

/// Ten-digit national identity number. Immutable once a record is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NationalId(String);

impl NationalId {
    const LENGTH: usize = 10;
    const PROVINCES: std::ops::RangeInclusive<u8> = 1..=24;

    /// Accept exactly ten digits whose first two name a province (01-24).
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingField {
                field: "national_id",
            });
        }
        if trimmed.len() != Self::LENGTH {
            return Err(ValidationError::InvalidNationalId {
                reason: "must contain exactly 10 digits",
            });
        }
        if !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(ValidationError::InvalidNationalId {
                reason: "must contain digits only",
            });
        }
        let province = trimmed[..2].parse::<u8>().unwrap_or(0);
        if !Self::PROVINCES.contains(&province) {
            return Err(ValidationError::InvalidNationalId {
                reason: "province code must be between 01 and 24",
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Modulo-10 verifier over the first nine digits. Not enforced on intake because
    /// legacy records predate the check.
    pub fn has_valid_check_digit(&self) -> bool {
        const COEFFICIENTS: [u32; 9] = [2, 1, 2, 1, 2, 1, 2, 1, 2];
        let digits: Vec<u32> = self.0.chars().filter_map(|c| c.to_digit(10)).collect();
        if digits.len() != Self::LENGTH {
            return false;
        }

        let sum: u32 = digits
            .iter()
            .zip(COEFFICIENTS)
            .map(|(digit, coefficient)| {
                let product = digit * coefficient;
                if product >= 10 {
                    product - 9
                } else {
                    product
                }
            })
            .sum();
        let expected = match sum % 10 {
            0 => 0,
            remainder => 10 - remainder,
        };
        expected == digits[9]
    }
}

impl fmt::Display for NationalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Academic program identifier as published in the admissions catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramId(pub u32);

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordState {
    Incomplete,
    Complete,
}

impl RecordState {
    pub const fn label(self) -> &'static str {
        match self {
            RecordState::Incomplete => "INCOMPLETE",
            RecordState::Complete => "COMPLETE",
        }
    }
}

/// National registration record maintained by administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub national_id: NationalId,
    pub first_name: String,
    pub middle_name: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub email: String,
    pub phone: String,
    pub prior_grade: f64,
    pub honor_roll: bool,
    pub state: RecordState,
    pub created_at: DateTime<Utc>,
}

impl ApplicantRecord {
    pub fn full_name(&self) -> String {
        [
            self.first_name.as_str(),
            self.middle_name.as_str(),
            self.paternal_surname.as_str(),
            self.maternal_surname.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }

    pub fn is_complete(&self) -> bool {
        self.state == RecordState::Complete
    }
}

/// Administrator input for creating a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantDraft {
    pub national_id: String,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    pub paternal_surname: String,
    #[serde(default)]
    pub maternal_surname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub prior_grade: f64,
    #[serde(default)]
    pub honor_roll: bool,
}

/// Partial update; absent fields are left untouched. The national id cannot change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicantUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub paternal_surname: Option<String>,
    #[serde(default)]
    pub maternal_surname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub prior_grade: Option<f64>,
    #[serde(default)]
    pub honor_roll: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Shift {
    Morning,
    Afternoon,
    Evening,
}

impl Shift {
    /// Accepts English names and the catalog's Spanish labels.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "MORNING" | "MATUTINA" => Some(Self::Morning),
            "AFTERNOON" | "VESPERTINA" => Some(Self::Afternoon),
            "EVENING" | "NOCTURNA" => Some(Self::Evening),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Shift::Morning => "MORNING",
            Shift::Afternoon => "AFTERNOON",
            Shift::Evening => "EVENING",
        }
    }
}

/// Enrollments are confirmed on creation because the record is checked first. `PENDING` is
/// accepted from stored data but never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Confirmed,
    Pending,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub program: ProgramId,
    pub shift: Shift,
    pub status: EnrollmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn is_active(&self) -> bool {
        self.status != EnrollmentStatus::Cancelled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AptitudeSubScores {
    pub verbal: f64,
    pub numeric: f64,
    pub abstract_reasoning: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationStatus {
    Pending,
    Evaluated,
}

/// Aptitude evaluation tied to the applicant's enrollment. Scores arrive after the exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub program: ProgramId,
    pub sub_scores: Option<AptitudeSubScores>,
    pub total: Option<f64>,
    pub status: EvaluationStatus,
    pub evaluated_at: Option<DateTime<Utc>>,
}

impl Evaluation {
    pub fn pending(program: ProgramId) -> Self {
        Self {
            program,
            sub_scores: None,
            total: None,
            status: EvaluationStatus::Pending,
            evaluated_at: None,
        }
    }
}

/// Lab assignment lifecycle: `PENDING -> {ASSIGNED, REJECTED}`, then `ASSIGNED -> CANCELLED`.
///
/// `PENDING` is reported for an enrolled applicant with no stored assignment. The decision is
/// taken in one step, so stored assignments always carry a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Pending,
    Assigned,
    Rejected,
    Cancelled,
}

impl AssignmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "PENDING",
            AssignmentStatus::Assigned => "ASSIGNED",
            AssignmentStatus::Rejected => "REJECTED",
            AssignmentStatus::Cancelled => "CANCELLED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, AssignmentStatus::Pending)
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Exam lab requested for an applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabSlot {
    pub lab: String,
    pub building: String,
    pub exam_date: NaiveDate,
    pub start_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub program: ProgramId,
    pub slot: LabSlot,
    pub score: f64,
    pub status: AssignmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub decided_at: DateTime<Utc>,
}
