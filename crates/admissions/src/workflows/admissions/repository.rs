use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicantRecord, Assignment, AssignmentStatus, Enrollment, Evaluation, NationalId, RecordState,
};
use super::scoring::FinalScore;
use super::segment::{classify, EligibilityMarkers, Segment};

/// Everything stored for one applicant. Dependent entities live and die with the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantFile {
    pub record: ApplicantRecord,
    pub enrollment: Option<Enrollment>,
    pub evaluation: Option<Evaluation>,
    pub final_score: Option<FinalScore>,
    pub markers: EligibilityMarkers,
    pub assignment: Option<Assignment>,
}

impl ApplicantFile {
    pub fn new(record: ApplicantRecord) -> Self {
        Self {
            record,
            enrollment: None,
            evaluation: None,
            final_score: None,
            markers: EligibilityMarkers::default(),
            assignment: None,
        }
    }

    pub fn national_id(&self) -> &NationalId {
        &self.record.national_id
    }

    pub fn segment(&self) -> (Segment, u8) {
        classify(&self.markers)
    }

    /// Stored decision, or `PENDING` while an active enrollment awaits one.
    pub fn assignment_status(&self) -> Option<AssignmentStatus> {
        match &self.assignment {
            Some(assignment) => Some(assignment.status),
            None => self
                .enrollment
                .as_ref()
                .filter(|enrollment| enrollment.is_active())
                .map(|_| AssignmentStatus::Pending),
        }
    }

    pub fn status_view(&self) -> ApplicantStatusView {
        let (segment, priority) = self.segment();
        ApplicantStatusView {
            national_id: self.record.national_id.clone(),
            full_name: self.record.full_name(),
            state: self.record.state,
            program: self.enrollment.as_ref().map(|enrollment| enrollment.program.0),
            evaluation_total: self.evaluation.as_ref().and_then(|evaluation| evaluation.total),
            final_score: self.final_score.map(|score| score.value),
            segment,
            priority,
            assignment: self.assignment_status(),
        }
    }
}

/// Summary returned by the HTTP routes.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicantStatusView {
    pub national_id: NationalId,
    pub full_name: String,
    pub state: RecordState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_score: Option<f64>,
    pub segment: Segment,
    pub priority: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment: Option<AssignmentStatus>,
}

/// Storage abstraction for applicant files, injected into the service.
pub trait ApplicantRepository: Send + Sync {
    fn insert(&self, file: ApplicantFile) -> Result<ApplicantFile, RepositoryError>;
    fn update(&self, file: ApplicantFile) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &NationalId) -> Result<Option<ApplicantFile>, RepositoryError>;
    /// Removes the file with every dependent entity.
    fn remove(&self, id: &NationalId) -> Result<ApplicantFile, RepositoryError>;
    fn list(&self) -> Result<Vec<ApplicantFile>, RepositoryError>;
    fn count(&self) -> Result<usize, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

/// Outbound notification hook (e-mail or similar adapters).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub template: String,
    pub national_id: NationalId,
    pub recipient: String,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
