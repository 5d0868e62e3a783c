use crate::infra::AppState;
use admissions::workflows::admissions::{
    admissions_router, compute_final_score, AdmissionsService, ApplicantRepository,
    NotificationPublisher, ScoreBreakdown, SeatStore,
};
use admissions::error::AppError;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_admissions_routes<R, S, N>(
    service: Arc<AdmissionsService<R, S, N>>,
) -> axum::Router
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    admissions_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/scores/preview",
            axum::routing::post(score_preview_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScorePreviewRequest {
    pub(crate) prior_grade: f64,
    pub(crate) evaluation_score: f64,
    #[serde(default)]
    pub(crate) merit_bonus: f64,
}

/// Stateless calculator endpoint for counselors checking "what if" scores.
pub(crate) async fn score_preview_endpoint(
    Json(payload): Json<ScorePreviewRequest>,
) -> Result<Json<ScoreBreakdown>, AppError> {
    let score = compute_final_score(
        payload.prior_grade,
        payload.evaluation_score,
        payload.merit_bonus,
    )
    .map_err(|err| AppError::Admissions(err.into()))?;
    Ok(Json(score.breakdown()))
}
