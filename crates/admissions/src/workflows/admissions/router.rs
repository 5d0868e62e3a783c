use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicantDraft, ApplicantUpdate, AptitudeSubScores, LabSlot, NationalId, ProgramId};
use super::quota::SeatStore;
use super::repository::{ApplicantRepository, NotificationPublisher, RepositoryError};
use super::search::ApplicantSearch;
use super::segment::{EligibilityMarkers, SocialConditions};
use super::service::{AdmissionsService, AdmissionsServiceError, EnrollmentRequest};

type SharedService<R, S, N> = Arc<AdmissionsService<R, S, N>>;

/// Router builder exposing the admissions workflow as JSON endpoints.
pub fn admissions_router<R, S, N>(service: SharedService<R, S, N>) -> Router
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/applicants",
            post(register_handler::<R, S, N>).get(list_handler::<R, S, N>),
        )
        .route(
            "/api/v1/applicants/stats",
            get(statistics_handler::<R, S, N>),
        )
        .route(
            "/api/v1/applicants/:national_id",
            get(applicant_handler::<R, S, N>)
                .put(update_handler::<R, S, N>)
                .delete(delete_handler::<R, S, N>),
        )
        .route(
            "/api/v1/applicants/:national_id/enrollment",
            post(enroll_handler::<R, S, N>).delete(cancel_enrollment_handler::<R, S, N>),
        )
        .route(
            "/api/v1/applicants/:national_id/evaluation",
            post(evaluation_handler::<R, S, N>),
        )
        .route(
            "/api/v1/applicants/:national_id/score",
            post(score_handler::<R, S, N>),
        )
        .route(
            "/api/v1/applicants/:national_id/markers",
            put(markers_handler::<R, S, N>),
        )
        .route(
            "/api/v1/applicants/:national_id/conditions",
            put(conditions_handler::<R, S, N>),
        )
        .route(
            "/api/v1/applicants/:national_id/segment",
            get(segment_handler::<R, S, N>),
        )
        .route(
            "/api/v1/applicants/:national_id/assignment",
            post(assign_handler::<R, S, N>).delete(cancel_handler::<R, S, N>),
        )
        .route(
            "/api/v1/programs/:program_id/seats",
            get(seats_handler::<R, S, N>),
        )
        .route(
            "/api/v1/programs/:program_id/eligibility",
            post(eligibility_handler::<R, S, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct EligibilityQuery {
    score: f64,
}

pub(crate) fn status_for(error: &AdmissionsServiceError) -> StatusCode {
    match error {
        AdmissionsServiceError::Validation(_) | AdmissionsServiceError::ShiftNotOffered { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AdmissionsServiceError::Repository(RepositoryError::NotFound)
        | AdmissionsServiceError::UnknownProgram(_) => StatusCode::NOT_FOUND,
        AdmissionsServiceError::Repository(RepositoryError::Conflict)
        | AdmissionsServiceError::RecordIncomplete(_)
        | AdmissionsServiceError::AlreadyEnrolled(_)
        | AdmissionsServiceError::NotEnrolled(_)
        | AdmissionsServiceError::EvaluationPending(_)
        | AdmissionsServiceError::AlreadyEvaluated(_)
        | AdmissionsServiceError::ScoreMissing(_)
        | AdmissionsServiceError::NoAssignment(_)
        | AdmissionsServiceError::InvalidTransition { .. } => StatusCode::CONFLICT,
        AdmissionsServiceError::Repository(
            RepositoryError::Unavailable(_) | RepositoryError::InvariantViolation(_),
        ) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn error_response(error: AdmissionsServiceError) -> Response {
    let status = status_for(&error);
    let payload = match &error {
        AdmissionsServiceError::Validation(validation) => json!({
            "error": error.to_string(),
            "field": validation.field(),
        }),
        AdmissionsServiceError::Repository(RepositoryError::Conflict) => json!({
            "error": "applicant already exists",
        }),
        AdmissionsServiceError::Repository(RepositoryError::NotFound) => json!({
            "error": "applicant not found",
        }),
        _ => json!({
            "error": error.to_string(),
        }),
    };
    (status, axum::Json(payload)).into_response()
}

fn parse_id(raw: &str) -> Result<NationalId, Response> {
    NationalId::parse(raw).map_err(|err| error_response(err.into()))
}

pub(crate) async fn register_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    axum::Json(draft): axum::Json<ApplicantDraft>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.register(draft) {
        Ok(file) => (StatusCode::CREATED, axum::Json(file.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Query(criteria): Query<ApplicantSearch>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.search(&criteria) {
        Ok(files) => {
            let views: Vec<_> = files.iter().map(|file| file.status_view()).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn statistics_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.statistics() {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn applicant_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(national_id): Path<String>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    let id = match parse_id(&national_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.get(&id) {
        Ok(file) => (StatusCode::OK, axum::Json(file)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(national_id): Path<String>,
    axum::Json(update): axum::Json<ApplicantUpdate>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    let id = match parse_id(&national_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.update(&id, update) {
        Ok(file) => (StatusCode::OK, axum::Json(file.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(national_id): Path<String>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    let id = match parse_id(&national_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.delete(&id) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn enroll_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(national_id): Path<String>,
    axum::Json(request): axum::Json<EnrollmentRequest>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    let id = match parse_id(&national_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.enroll(&id, request) {
        Ok(enrollment) => (StatusCode::CREATED, axum::Json(enrollment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_enrollment_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(national_id): Path<String>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    let id = match parse_id(&national_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.cancel_enrollment(&id) {
        Ok(cancellation) => (StatusCode::OK, axum::Json(cancellation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evaluation_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(national_id): Path<String>,
    axum::Json(sub_scores): axum::Json<AptitudeSubScores>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    let id = match parse_id(&national_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.record_evaluation(&id, sub_scores) {
        Ok(evaluation) => (StatusCode::OK, axum::Json(evaluation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn score_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(national_id): Path<String>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    let id = match parse_id(&national_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.compute_score(&id) {
        Ok(score) => {
            let payload = json!({
                "national_id": id,
                "final_score": score.value,
                "breakdown": score.breakdown(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn markers_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(national_id): Path<String>,
    axum::Json(markers): axum::Json<EligibilityMarkers>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    let id = match parse_id(&national_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.set_markers(&id, markers) {
        Ok((segment, priority)) => {
            let payload = json!({ "segment": segment, "priority": priority });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn conditions_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(national_id): Path<String>,
    axum::Json(conditions): axum::Json<SocialConditions>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    let id = match parse_id(&national_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let markers = match service.declare_conditions(&id, &conditions) {
        Ok(markers) => markers,
        Err(error) => return error_response(error),
    };
    let (segment, priority) = super::segment::classify(&markers);
    let payload = json!({
        "markers": markers,
        "segment": segment,
        "priority": priority,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn segment_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(national_id): Path<String>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    let id = match parse_id(&national_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.segment(&id) {
        Ok((segment, priority)) => {
            let payload = json!({
                "national_id": id,
                "segment": segment,
                "priority": priority,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn assign_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(national_id): Path<String>,
    axum::Json(slot): axum::Json<LabSlot>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    let id = match parse_id(&national_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.assign_lab(&id, slot) {
        Ok(assignment) => (StatusCode::OK, axum::Json(assignment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(national_id): Path<String>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    let id = match parse_id(&national_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.cancel_assignment(&id) {
        Ok(cancellation) => (StatusCode::OK, axum::Json(cancellation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn seats_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(program_id): Path<u32>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.seats(&ProgramId(program_id)) {
        Ok(seats) => (StatusCode::OK, axum::Json(seats)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn eligibility_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(program_id): Path<u32>,
    axum::Json(query): axum::Json<EligibilityQuery>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.check_eligibility(&ProgramId(program_id), query.score) {
        Ok(eligibility) => (StatusCode::OK, axum::Json(eligibility)).into_response(),
        Err(error) => error_response(error),
    }
}
