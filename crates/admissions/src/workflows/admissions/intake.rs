use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use super::domain::{ApplicantDraft, ApplicantRecord, ApplicantUpdate, NationalId, RecordState};
use super::scoring::MAX_GRADE;
use super::validation::{ensure_range, ValidationError};

const MAX_EMAIL_LENGTH: usize = 100;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .unwrap_or_else(|err| unreachable!("static email pattern is valid: {err}"))
    })
}

/// Upper-case and collapse internal whitespace, as names are stored in the registry.
pub(crate) fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Ok(email);
    }
    if email.len() > MAX_EMAIL_LENGTH || !email_pattern().is_match(&email) {
        return Err(ValidationError::InvalidEmail { value: email });
    }
    Ok(email)
}

/// A record is complete once identity, surname, and both contact channels are on file.
pub(crate) fn assess_state(record: &ApplicantRecord) -> RecordState {
    let required = [
        record.first_name.as_str(),
        record.paternal_surname.as_str(),
        record.email.as_str(),
        record.phone.as_str(),
    ];
    if required.iter().all(|value| !value.trim().is_empty()) {
        RecordState::Complete
    } else {
        RecordState::Incomplete
    }
}

/// Builds sanitized applicant records from administrator input.
#[derive(Debug, Clone, Default)]
pub struct RecordGuard;

impl RecordGuard {
    pub fn record_from_draft(
        &self,
        draft: ApplicantDraft,
        created_at: DateTime<Utc>,
    ) -> Result<ApplicantRecord, ValidationError> {
        let national_id = NationalId::parse(&draft.national_id)?;

        let first_name = normalize_name(&draft.first_name);
        if first_name.is_empty() {
            return Err(ValidationError::MissingField {
                field: "first_name",
            });
        }
        let paternal_surname = normalize_name(&draft.paternal_surname);
        if paternal_surname.is_empty() {
            return Err(ValidationError::MissingField {
                field: "paternal_surname",
            });
        }

        let email = normalize_email(&draft.email)?;
        let prior_grade = ensure_range("prior_grade", draft.prior_grade, 0.0, MAX_GRADE)?;

        let mut record = ApplicantRecord {
            national_id,
            first_name,
            middle_name: normalize_name(&draft.middle_name),
            paternal_surname,
            maternal_surname: normalize_name(&draft.maternal_surname),
            email,
            phone: draft.phone.trim().to_string(),
            prior_grade,
            honor_roll: draft.honor_roll,
            state: RecordState::Incomplete,
            created_at,
        };
        record.state = assess_state(&record);
        Ok(record)
    }

    /// Apply a partial update. Every field is validated before any is written.
    pub fn apply_update(
        &self,
        record: &ApplicantRecord,
        update: ApplicantUpdate,
    ) -> Result<ApplicantRecord, ValidationError> {
        let mut next = record.clone();

        if let Some(first_name) = update.first_name {
            next.first_name = normalize_name(&first_name);
            if next.first_name.is_empty() {
                return Err(ValidationError::MissingField {
                    field: "first_name",
                });
            }
        }
        if let Some(middle_name) = update.middle_name {
            next.middle_name = normalize_name(&middle_name);
        }
        if let Some(paternal_surname) = update.paternal_surname {
            next.paternal_surname = normalize_name(&paternal_surname);
            if next.paternal_surname.is_empty() {
                return Err(ValidationError::MissingField {
                    field: "paternal_surname",
                });
            }
        }
        if let Some(maternal_surname) = update.maternal_surname {
            next.maternal_surname = normalize_name(&maternal_surname);
        }
        if let Some(email) = update.email {
            next.email = normalize_email(&email)?;
        }
        if let Some(phone) = update.phone {
            next.phone = phone.trim().to_string();
        }
        if let Some(grade) = update.prior_grade {
            next.prior_grade = ensure_range("prior_grade", grade, 0.0, MAX_GRADE)?;
        }
        if let Some(honor_roll) = update.honor_roll {
            next.honor_roll = honor_roll;
        }

        next.state = assess_state(&next);
        Ok(next)
    }
}
