use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::catalog::ProgramCatalog;
use super::domain::{
    ApplicantDraft, ApplicantUpdate, AptitudeSubScores, Assignment, AssignmentStatus, Enrollment,
    EnrollmentStatus, Evaluation, EvaluationStatus, LabSlot, NationalId, ProgramId, Shift,
};
use super::intake::RecordGuard;
use super::quota::{Eligibility, QuotaValidator, ReleaseOutcome, SeatRegistry, SeatStore};
use super::repository::{
    ApplicantFile, ApplicantRepository, Notification, NotificationPublisher, RepositoryError,
};
use super::scoring::{aptitude_total, compute_final_score, FinalScore, ScoringConfig};
use super::search::{ApplicantSearch, ApplicantStatistics};
use super::segment::{classify, EligibilityMarkers, Segment, SocialConditions};
use super::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRequest {
    pub program: ProgramId,
    pub shift: Shift,
}

/// Seat counters for one program as exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeatAvailability {
    pub program: ProgramId,
    pub remaining: i64,
    pub capacity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cancellation {
    pub assignment: Assignment,
    pub seats: ReleaseOutcome,
}

/// Cancelled enrollment, with the seat outcome when a held lab seat was returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentCancellation {
    pub enrollment: Enrollment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats: Option<ReleaseOutcome>,
}

type ApplicantLocks = Mutex<HashMap<NationalId, Arc<Mutex<()>>>>;

/// Workflow over applicant files: register, enroll, evaluate, score, classify, assign.
///
/// Every read-modify-write of one applicant's file runs under that applicant's lock, so the
/// seat registry sees at most one reserve or release per decision.
pub struct AdmissionsService<R, S, N> {
    guard: RecordGuard,
    locks: ApplicantLocks,
    repository: Arc<R>,
    notifier: Arc<N>,
    catalog: Arc<ProgramCatalog>,
    quota: QuotaValidator<S>,
    scoring: ScoringConfig,
}

impl<R, S, N> AdmissionsService<R, S, N>
where
    R: ApplicantRepository + 'static,
    S: SeatStore + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(
        repository: Arc<R>,
        seats: Arc<SeatRegistry<S>>,
        notifier: Arc<N>,
        catalog: Arc<ProgramCatalog>,
        scoring: ScoringConfig,
    ) -> Self {
        Self {
            guard: RecordGuard,
            locks: Mutex::new(HashMap::new()),
            repository,
            notifier,
            catalog,
            quota: QuotaValidator::new(seats, scoring.minimum_score),
            scoring,
        }
    }

    pub fn catalog(&self) -> &ProgramCatalog {
        &self.catalog
    }

    pub fn scoring(&self) -> ScoringConfig {
        self.scoring
    }

    pub fn register(&self, draft: ApplicantDraft) -> Result<ApplicantFile, AdmissionsServiceError> {
        let record = self.guard.record_from_draft(draft, Utc::now())?;
        let stored = self.repository.insert(ApplicantFile::new(record))?;
        info!(
            national_id = %stored.national_id(),
            state = stored.record.state.label(),
            "applicant registered"
        );
        Ok(stored)
    }

    pub fn get(&self, id: &NationalId) -> Result<ApplicantFile, AdmissionsServiceError> {
        let file = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(file)
    }

    pub fn list(&self) -> Result<Vec<ApplicantFile>, AdmissionsServiceError> {
        Ok(self.repository.list()?)
    }

    pub fn count(&self) -> Result<usize, AdmissionsServiceError> {
        Ok(self.repository.count()?)
    }

    pub fn search(
        &self,
        criteria: &ApplicantSearch,
    ) -> Result<Vec<ApplicantFile>, AdmissionsServiceError> {
        let mut files = self.repository.list()?;
        files.retain(|file| criteria.matches(&file.record));
        Ok(files)
    }

    pub fn statistics(&self) -> Result<ApplicantStatistics, AdmissionsServiceError> {
        Ok(ApplicantStatistics::from_files(&self.repository.list()?))
    }

    pub fn update(
        &self,
        id: &NationalId,
        update: ApplicantUpdate,
    ) -> Result<ApplicantFile, AdmissionsServiceError> {
        let lock = self.applicant_lock(id);
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.get(id)?;
        file.record = self.guard.apply_update(&file.record, update)?;
        self.repository.update(file.clone())?;
        debug!(national_id = %id, state = file.record.state.label(), "applicant updated");
        Ok(file)
    }

    /// Delete the record with all dependent entities. A held seat goes back to its program.
    pub fn delete(&self, id: &NationalId) -> Result<ApplicantFile, AdmissionsServiceError> {
        let lock = self.applicant_lock(id);
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let file = self.get(id)?;
        let seat_program = held_seat(&file);
        if let Some(program) = seat_program {
            self.quota.release_seat(&program)?;
        }

        let removed = match self.repository.remove(id) {
            Ok(removed) => removed,
            Err(err) => {
                if let Some(program) = seat_program {
                    self.undo_release(&program);
                }
                return Err(err.into());
            }
        };
        info!(national_id = %id, "applicant deleted with dependent entities");
        Ok(removed)
    }

    pub fn enroll(
        &self,
        id: &NationalId,
        request: EnrollmentRequest,
    ) -> Result<Enrollment, AdmissionsServiceError> {
        let lock = self.applicant_lock(id);
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.get(id)?;
        if !file.record.is_complete() {
            return Err(AdmissionsServiceError::RecordIncomplete(id.clone()));
        }
        if file.enrollment.as_ref().is_some_and(Enrollment::is_active) {
            return Err(AdmissionsServiceError::AlreadyEnrolled(id.clone()));
        }

        let program = self
            .catalog
            .get(&request.program)
            .filter(|program| program.active)
            .ok_or(AdmissionsServiceError::UnknownProgram(request.program))?;
        if !program.offers(request.shift) {
            return Err(AdmissionsServiceError::ShiftNotOffered {
                program: request.program,
                shift: request.shift,
            });
        }

        let enrollment = Enrollment {
            program: request.program,
            shift: request.shift,
            status: EnrollmentStatus::Confirmed,
            created_at: Utc::now(),
        };
        file.enrollment = Some(enrollment.clone());
        file.evaluation = Some(Evaluation::pending(request.program));
        file.final_score = None;
        file.assignment = None;
        self.repository.update(file.clone())?;

        info!(
            national_id = %id,
            program = %request.program,
            shift = request.shift.label(),
            "applicant enrolled"
        );

        let mut details = BTreeMap::new();
        details.insert("program".to_string(), program.name.clone());
        details.insert("shift".to_string(), request.shift.label().to_string());
        self.notify(&file, "enrollment_confirmed", details);

        Ok(enrollment)
    }

    /// Cancel the active enrollment. Its evaluation and score are dropped and a held lab seat
    /// goes back to the program; the applicant may enroll again afterwards.
    pub fn cancel_enrollment(
        &self,
        id: &NationalId,
    ) -> Result<EnrollmentCancellation, AdmissionsServiceError> {
        let lock = self.applicant_lock(id);
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.get(id)?;
        let enrollment = file
            .enrollment
            .as_mut()
            .filter(|enrollment| enrollment.is_active())
            .ok_or_else(|| AdmissionsServiceError::NotEnrolled(id.clone()))?;
        enrollment.status = EnrollmentStatus::Cancelled;
        let enrollment = enrollment.clone();

        let seat_program = held_seat(&file);
        let seats = match seat_program {
            Some(program) => Some(self.quota.release_seat(&program)?),
            None => None,
        };
        if let Some(assignment) = file
            .assignment
            .as_mut()
            .filter(|assignment| assignment.status == AssignmentStatus::Assigned)
        {
            assignment.status = AssignmentStatus::Cancelled;
            assignment.decided_at = Utc::now();
        }
        file.evaluation = None;
        file.final_score = None;

        if let Err(err) = self.repository.update(file) {
            if let Some(program) = seat_program {
                self.undo_release(&program);
            }
            return Err(err.into());
        }

        info!(
            national_id = %id,
            program = %enrollment.program,
            seat_returned = seats.is_some(),
            "enrollment cancelled"
        );
        Ok(EnrollmentCancellation { enrollment, seats })
    }

    pub fn record_evaluation(
        &self,
        id: &NationalId,
        sub_scores: AptitudeSubScores,
    ) -> Result<Evaluation, AdmissionsServiceError> {
        let lock = self.applicant_lock(id);
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.get(id)?;
        let evaluation = file
            .evaluation
            .as_mut()
            .ok_or_else(|| AdmissionsServiceError::NotEnrolled(id.clone()))?;
        if evaluation.status == EvaluationStatus::Evaluated {
            return Err(AdmissionsServiceError::AlreadyEvaluated(id.clone()));
        }

        let total = aptitude_total(&sub_scores)?;
        evaluation.sub_scores = Some(sub_scores);
        evaluation.total = Some(total);
        evaluation.status = EvaluationStatus::Evaluated;
        evaluation.evaluated_at = Some(Utc::now());
        let evaluation = evaluation.clone();

        self.repository.update(file)?;
        info!(national_id = %id, total, "aptitude evaluation recorded");
        Ok(evaluation)
    }

    /// Recomputes from the stored grade, evaluation total, and honor-roll merit.
    pub fn compute_score(&self, id: &NationalId) -> Result<FinalScore, AdmissionsServiceError> {
        let lock = self.applicant_lock(id);
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.get(id)?;
        let evaluation = file
            .evaluation
            .as_ref()
            .ok_or_else(|| AdmissionsServiceError::NotEnrolled(id.clone()))?;
        let total = evaluation
            .total
            .filter(|_| evaluation.status == EvaluationStatus::Evaluated)
            .ok_or_else(|| AdmissionsServiceError::EvaluationPending(id.clone()))?;

        let merit_bonus = self.scoring.merit_bonus_for(file.record.honor_roll);
        let score = compute_final_score(file.record.prior_grade, total, merit_bonus)?;
        file.final_score = Some(score);
        self.repository.update(file)?;

        info!(national_id = %id, final_score = score.value, "final score computed");
        Ok(score)
    }

    pub fn set_markers(
        &self,
        id: &NationalId,
        markers: EligibilityMarkers,
    ) -> Result<(Segment, u8), AdmissionsServiceError> {
        let lock = self.applicant_lock(id);
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.get(id)?;
        file.markers = markers;
        let segment = classify(&file.markers);
        self.repository.update(file)?;
        debug!(national_id = %id, segment = segment.0.label(), "eligibility markers stored");
        Ok(segment)
    }

    /// Derive markers from declared circumstances and store them.
    pub fn declare_conditions(
        &self,
        id: &NationalId,
        conditions: &SocialConditions,
    ) -> Result<EligibilityMarkers, AdmissionsServiceError> {
        let markers = EligibilityMarkers::from_conditions(conditions);
        self.set_markers(id, markers)?;
        Ok(markers)
    }

    pub fn segment(&self, id: &NationalId) -> Result<(Segment, u8), AdmissionsServiceError> {
        Ok(self.get(id)?.segment())
    }

    /// Decide a lab assignment. A terminal assignment is returned unchanged.
    pub fn assign_lab(
        &self,
        id: &NationalId,
        slot: LabSlot,
    ) -> Result<Assignment, AdmissionsServiceError> {
        let lock = self.applicant_lock(id);
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.get(id)?;
        if let Some(existing) = file
            .assignment
            .as_ref()
            .filter(|assignment| assignment.status.is_terminal())
        {
            debug!(
                national_id = %id,
                status = existing.status.label(),
                "assignment already decided"
            );
            return Ok(existing.clone());
        }

        let program = file
            .enrollment
            .as_ref()
            .filter(|enrollment| enrollment.is_active())
            .map(|enrollment| enrollment.program)
            .ok_or_else(|| AdmissionsServiceError::NotEnrolled(id.clone()))?;
        let score = file
            .final_score
            .map(|score| score.value)
            .ok_or_else(|| AdmissionsServiceError::ScoreMissing(id.clone()))?;

        let eligibility = self.quota.check_eligibility(&program, score)?;
        let (status, reason) = match eligibility.reason {
            Some(reason) => (AssignmentStatus::Rejected, Some(reason.as_str().to_string())),
            None if self.quota.reserve_seat(&program)? => (AssignmentStatus::Assigned, None),
            None => (AssignmentStatus::Rejected, Some("no seats".to_string())),
        };

        let assignment = Assignment {
            program,
            slot,
            score,
            status,
            reason,
            decided_at: Utc::now(),
        };
        file.assignment = Some(assignment.clone());
        if let Err(err) = self.repository.update(file.clone()) {
            if status == AssignmentStatus::Assigned {
                self.undo_reservation(&program);
            }
            return Err(err.into());
        }

        info!(
            national_id = %id,
            program = %program,
            status = assignment.status.label(),
            "assignment decided"
        );

        if assignment.status == AssignmentStatus::Assigned {
            let mut details = BTreeMap::new();
            details.insert("lab".to_string(), assignment.slot.lab.clone());
            details.insert("building".to_string(), assignment.slot.building.clone());
            details.insert(
                "exam_date".to_string(),
                assignment.slot.exam_date.to_string(),
            );
            details.insert(
                "start_time".to_string(),
                assignment.slot.start_time.format("%H:%M").to_string(),
            );
            self.notify(&file, "lab_assigned", details);
        }

        Ok(assignment)
    }

    /// `ASSIGNED -> CANCELLED`, returning the seat. Every other cancel is rejected.
    pub fn cancel_assignment(&self, id: &NationalId) -> Result<Cancellation, AdmissionsServiceError> {
        let lock = self.applicant_lock(id);
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.get(id)?;
        let assignment = file
            .assignment
            .as_mut()
            .ok_or_else(|| AdmissionsServiceError::NoAssignment(id.clone()))?;
        if assignment.status != AssignmentStatus::Assigned {
            return Err(AdmissionsServiceError::InvalidTransition {
                from: assignment.status,
                action: "cancel",
            });
        }

        let seats = self.quota.release_seat(&assignment.program)?;
        assignment.status = AssignmentStatus::Cancelled;
        assignment.decided_at = Utc::now();
        let assignment = assignment.clone();
        if let Err(err) = self.repository.update(file) {
            self.undo_release(&assignment.program);
            return Err(err.into());
        }

        info!(
            national_id = %id,
            program = %assignment.program,
            remaining = seats.remaining(),
            "assignment cancelled"
        );
        Ok(Cancellation { assignment, seats })
    }

    pub fn check_eligibility(
        &self,
        program: &ProgramId,
        score: f64,
    ) -> Result<Eligibility, AdmissionsServiceError> {
        Ok(self.quota.check_eligibility(program, score)?)
    }

    pub fn seats(&self, program: &ProgramId) -> Result<SeatAvailability, AdmissionsServiceError> {
        let registry = self.quota.registry();
        let capacity = registry
            .capacity(program)
            .ok_or(AdmissionsServiceError::UnknownProgram(*program))?;
        let remaining = registry.remaining(program)?.unwrap_or(0);
        Ok(SeatAvailability {
            program: *program,
            remaining,
            capacity,
        })
    }

    fn applicant_lock(&self, id: &NationalId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id.clone()).or_default())
    }

    // Compensations run after a failed write; the write error is what the caller sees.
    fn undo_reservation(&self, program: &ProgramId) {
        if let Err(err) = self.quota.release_seat(program) {
            warn!(program = %program, error = %err, "reserved seat could not be returned");
        }
    }

    fn undo_release(&self, program: &ProgramId) {
        match self.quota.reserve_seat(program) {
            Ok(true) => {}
            Ok(false) => warn!(program = %program, "released seat was taken before rollback"),
            Err(err) => warn!(program = %program, error = %err, "released seat could not be retaken"),
        }
    }

    // Delivery failures never fail the workflow step that triggered them.
    fn notify(&self, file: &ApplicantFile, template: &str, details: BTreeMap<String, String>) {
        let notification = Notification {
            template: template.to_string(),
            national_id: file.national_id().clone(),
            recipient: file.record.email.clone(),
            details,
        };
        if let Err(err) = self.notifier.publish(notification) {
            warn!(
                national_id = %file.national_id(),
                template,
                error = %err,
                "notification not delivered"
            );
        }
    }
}

fn held_seat(file: &ApplicantFile) -> Option<ProgramId> {
    file.assignment
        .as_ref()
        .filter(|assignment| assignment.status == AssignmentStatus::Assigned)
        .map(|assignment| assignment.program)
}

#[derive(Debug, thiserror::Error)]
pub enum AdmissionsServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("applicant {0} has an incomplete record")]
    RecordIncomplete(NationalId),
    #[error("program {0} is not open for admission")]
    UnknownProgram(ProgramId),
    #[error("program {program} does not offer the {} shift", .shift.label())]
    ShiftNotOffered { program: ProgramId, shift: Shift },
    #[error("applicant {0} already holds an active enrollment")]
    AlreadyEnrolled(NationalId),
    #[error("applicant {0} is not enrolled in a program")]
    NotEnrolled(NationalId),
    #[error("applicant {0} has not been evaluated yet")]
    EvaluationPending(NationalId),
    #[error("applicant {0} has already been evaluated")]
    AlreadyEvaluated(NationalId),
    #[error("applicant {0} has no final score")]
    ScoreMissing(NationalId),
    #[error("applicant {0} has no assignment")]
    NoAssignment(NationalId),
    #[error("cannot {action} an assignment in state {from}")]
    InvalidTransition {
        from: AssignmentStatus,
        action: &'static str,
    },
}
