use chrono::Utc;

use super::common::*;
use crate::workflows::admissions::domain::{ApplicantUpdate, NationalId, RecordState};
use crate::workflows::admissions::intake::RecordGuard;
use crate::workflows::admissions::validation::ValidationError;

#[test]
fn guard_normalizes_names_and_email() {
    let record = RecordGuard
        .record_from_draft(draft(APPLICANT_ID), Utc::now())
        .expect("valid draft");

    assert_eq!(record.first_name, "MARIA");
    assert_eq!(record.paternal_surname, "ZAMBRANO CEDEÑO");
    assert_eq!(record.email, "maria.zambrano@example.com");
    assert_eq!(record.full_name(), "MARIA JOSE ZAMBRANO CEDEÑO LOOR");
    assert_eq!(record.state, RecordState::Complete);
}

#[test]
fn missing_contact_leaves_record_incomplete() {
    let record = RecordGuard
        .record_from_draft(incomplete_draft(APPLICANT_ID), Utc::now())
        .expect("valid draft");
    assert_eq!(record.state, RecordState::Incomplete);
}

#[test]
fn malformed_email_is_rejected() {
    let mut submission = draft(APPLICANT_ID);
    submission.email = "maria@".to_string();

    match RecordGuard.record_from_draft(submission, Utc::now()) {
        Err(ValidationError::InvalidEmail { value }) => assert_eq!(value, "maria@"),
        other => panic!("expected invalid email, got {other:?}"),
    }
}

#[test]
fn grade_outside_scale_is_rejected() {
    let mut submission = draft(APPLICANT_ID);
    submission.prior_grade = 10.01;

    match RecordGuard.record_from_draft(submission, Utc::now()) {
        Err(error) => assert_eq!(error.field(), "prior_grade"),
        other => panic!("expected grade error, got {other:?}"),
    }
}

#[test]
fn blank_first_name_is_required() {
    let mut submission = draft(APPLICANT_ID);
    submission.first_name = "   ".to_string();

    match RecordGuard.record_from_draft(submission, Utc::now()) {
        Err(ValidationError::MissingField {
            field: "first_name",
        }) => {}
        other => panic!("expected missing first name, got {other:?}"),
    }
}

#[test]
fn national_id_format_and_province_are_enforced() {
    let cases = [
        ("131620208", "must contain exactly 10 digits"),
        ("13162020a2", "must contain digits only"),
        ("2516202082", "province code must be between 01 and 24"),
        ("0016202082", "province code must be between 01 and 24"),
    ];
    for (raw, expected) in cases {
        match NationalId::parse(raw) {
            Err(ValidationError::InvalidNationalId { reason }) => {
                assert_eq!(reason, expected, "{raw}")
            }
            other => panic!("expected invalid id for {raw}, got {other:?}"),
        }
    }

    match NationalId::parse("  ") {
        Err(ValidationError::MissingField {
            field: "national_id",
        }) => {}
        other => panic!("expected missing id, got {other:?}"),
    }
}

#[test]
fn check_digit_is_reported_but_not_required() {
    assert!(national_id(APPLICANT_ID).has_valid_check_digit());

    let legacy = national_id(SECOND_APPLICANT_ID);
    assert!(!legacy.has_valid_check_digit());
    assert_eq!(legacy.as_str(), SECOND_APPLICANT_ID);
}

#[test]
fn update_recomputes_completeness() {
    let record = RecordGuard
        .record_from_draft(incomplete_draft(APPLICANT_ID), Utc::now())
        .expect("valid draft");

    let updated = RecordGuard
        .apply_update(
            &record,
            ApplicantUpdate {
                email: Some("NEW@mail.ec".to_string()),
                phone: Some(" 0987654321 ".to_string()),
                ..ApplicantUpdate::default()
            },
        )
        .expect("valid update");

    assert_eq!(updated.email, "new@mail.ec");
    assert_eq!(updated.phone, "0987654321");
    assert_eq!(updated.state, RecordState::Complete);
    assert_eq!(updated.national_id, record.national_id);
}

#[test]
fn rejected_update_leaves_record_untouched() {
    let record = RecordGuard
        .record_from_draft(draft(APPLICANT_ID), Utc::now())
        .expect("valid draft");

    let result = RecordGuard.apply_update(
        &record,
        ApplicantUpdate {
            first_name: Some("ana".to_string()),
            prior_grade: Some(-1.0),
            ..ApplicantUpdate::default()
        },
    );

    assert!(result.is_err());
    assert_eq!(record.first_name, "MARIA");
}
