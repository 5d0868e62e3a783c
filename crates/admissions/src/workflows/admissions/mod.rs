//! Admissions workflow: record intake, aptitude scoring, priority segments, and seat quotas.
//!
//! The score calculator and segment classifier are pure. All shared mutable state sits in the
//! [`SeatRegistry`], which serializes every reservation and release behind one lock.

pub mod catalog;
pub mod domain;
pub(crate) mod intake;
pub mod quota;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod search;
pub mod segment;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogError, ProgramCatalog, ProgramOffering};
pub use domain::{
    ApplicantDraft, ApplicantRecord, ApplicantUpdate, AptitudeSubScores, Assignment,
    AssignmentStatus, Enrollment, EnrollmentStatus, Evaluation, EvaluationStatus, LabSlot,
    NationalId, ProgramId, RecordState, Shift,
};
pub use intake::RecordGuard;
pub use quota::{
    Eligibility, IneligibleReason, InMemorySeatStore, QuotaValidator, ReleaseOutcome,
    SeatRegistry, SeatStore,
};
pub use repository::{
    ApplicantFile, ApplicantRepository, ApplicantStatusView, Notification, NotificationError,
    NotificationPublisher, RepositoryError,
};
pub use router::admissions_router;
pub use scoring::{aptitude_total, compute_final_score, FinalScore, ScoreBreakdown, ScoringConfig};
pub use search::{ApplicantSearch, ApplicantStatistics};
pub use segment::{classify, EligibilityMarkers, Segment, SocialConditions};
pub use service::{
    AdmissionsService, AdmissionsServiceError, Cancellation, EnrollmentCancellation,
    EnrollmentRequest, SeatAvailability,
};
pub use validation::ValidationError;
