use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use axum::response::Response;
use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;

use crate::workflows::admissions::domain::{
    ApplicantDraft, AptitudeSubScores, LabSlot, NationalId, ProgramId, Shift,
};
use crate::workflows::admissions::quota::{InMemorySeatStore, SeatRegistry};
use crate::workflows::admissions::repository::{
    ApplicantFile, ApplicantRepository, Notification, NotificationError, NotificationPublisher,
    RepositoryError,
};
use crate::workflows::admissions::service::{AdmissionsService, EnrollmentRequest};
use crate::workflows::admissions::{admissions_router, ProgramCatalog, ScoringConfig};

pub(super) const APPLICANT_ID: &str = "1316202082";
pub(super) const SECOND_APPLICANT_ID: &str = "1350123456";
pub(super) const THIRD_APPLICANT_ID: &str = "1317924551";

/// Program 901 has a single seat so tests can exhaust it.
pub(super) const SCARCE_PROGRAM: ProgramId = ProgramId(901);
pub(super) const ROOMY_PROGRAM: ProgramId = ProgramId(902);

pub(super) type TestService = AdmissionsService<MemoryRepository, InMemorySeatStore, MemoryNotifier>;

pub(super) fn national_id(raw: &str) -> NationalId {
    NationalId::parse(raw).expect("valid national id")
}

pub(super) fn draft(raw_id: &str) -> ApplicantDraft {
    ApplicantDraft {
        national_id: raw_id.to_string(),
        first_name: "  maria ".to_string(),
        middle_name: "jose".to_string(),
        paternal_surname: "zambrano   cedeño".to_string(),
        maternal_surname: "loor".to_string(),
        email: "Maria.Zambrano@Example.COM".to_string(),
        phone: "0991234567".to_string(),
        prior_grade: 9.5,
        honor_roll: false,
    }
}

pub(super) fn incomplete_draft(raw_id: &str) -> ApplicantDraft {
    ApplicantDraft {
        email: String::new(),
        phone: String::new(),
        ..draft(raw_id)
    }
}

pub(super) fn catalog() -> ProgramCatalog {
    let csv = "id,name,faculty,semesters,seats,modalities,shifts,status\n\
901,Medicina Rural,Facultad de Ciencias Médicas,12,1,PRESENCIAL,MATUTINA,ACTIVA\n\
902,Agronomía,Facultad de Ciencias Agropecuarias,10,35,PRESENCIAL,\"MATUTINA,VESPERTINA\",ACTIVA\n\
903,Historia,Facultad de Ciencias Sociales,8,20,PRESENCIAL,MATUTINA,INACTIVA\n";
    ProgramCatalog::from_reader(Cursor::new(csv)).expect("test catalog parses")
}

pub(super) fn seat_registry(catalog: &ProgramCatalog) -> Arc<SeatRegistry<InMemorySeatStore>> {
    let registry = Arc::new(SeatRegistry::new(Arc::new(InMemorySeatStore::default())));
    catalog.seed(&registry).expect("seed seats");
    registry
}

pub(super) struct Harness {
    pub(super) service: TestService,
    pub(super) repository: Arc<MemoryRepository>,
    pub(super) notifier: Arc<MemoryNotifier>,
    pub(super) seats: Arc<SeatRegistry<InMemorySeatStore>>,
}

pub(super) fn build_service() -> Harness {
    let catalog = catalog();
    let seats = seat_registry(&catalog);
    let repository = Arc::new(MemoryRepository::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = AdmissionsService::new(
        repository.clone(),
        seats.clone(),
        notifier.clone(),
        Arc::new(catalog),
        ScoringConfig::default(),
    );
    Harness {
        service,
        repository,
        notifier,
        seats,
    }
}

pub(super) fn enrollment(program: ProgramId) -> EnrollmentRequest {
    EnrollmentRequest {
        program,
        shift: Shift::Morning,
    }
}

pub(super) fn strong_sub_scores() -> AptitudeSubScores {
    AptitudeSubScores {
        verbal: 9.0,
        numeric: 8.5,
        abstract_reasoning: 8.0,
    }
}

pub(super) fn weak_sub_scores() -> AptitudeSubScores {
    AptitudeSubScores {
        verbal: 3.0,
        numeric: 2.0,
        abstract_reasoning: 4.0,
    }
}

pub(super) fn lab_slot() -> LabSlot {
    LabSlot {
        lab: "LAB-3".to_string(),
        building: "Bloque B".to_string(),
        exam_date: NaiveDate::from_ymd_opt(2025, 11, 15).expect("valid date"),
        start_time: NaiveTime::from_hms_opt(8, 30, 0).expect("valid time"),
    }
}

/// Register, enroll, evaluate, and score an applicant so only the assignment remains.
pub(super) fn scored_applicant<R: ApplicantRepository + 'static>(
    service: &AdmissionsService<R, InMemorySeatStore, MemoryNotifier>,
    raw_id: &str,
    program: ProgramId,
    sub_scores: AptitudeSubScores,
) -> NationalId {
    let id = national_id(raw_id);
    service.register(draft(raw_id)).expect("register");
    service.enroll(&id, enrollment(program)).expect("enroll");
    service
        .record_evaluation(&id, sub_scores)
        .expect("record evaluation");
    service.compute_score(&id).expect("compute score");
    id
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) files: Arc<Mutex<HashMap<NationalId, ApplicantFile>>>,
}

impl ApplicantRepository for MemoryRepository {
    fn insert(&self, file: ApplicantFile) -> Result<ApplicantFile, RepositoryError> {
        let mut guard = self.files.lock().expect("repository mutex poisoned");
        if guard.contains_key(file.national_id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(file.national_id().clone(), file.clone());
        Ok(file)
    }

    fn update(&self, file: ApplicantFile) -> Result<(), RepositoryError> {
        let mut guard = self.files.lock().expect("repository mutex poisoned");
        guard.insert(file.national_id().clone(), file);
        Ok(())
    }

    fn fetch(&self, id: &NationalId) -> Result<Option<ApplicantFile>, RepositoryError> {
        let guard = self.files.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &NationalId) -> Result<ApplicantFile, RepositoryError> {
        let mut guard = self.files.lock().expect("repository mutex poisoned");
        guard.remove(id).ok_or(RepositoryError::NotFound)
    }

    fn list(&self) -> Result<Vec<ApplicantFile>, RepositoryError> {
        let guard = self.files.lock().expect("repository mutex poisoned");
        let mut files: Vec<_> = guard.values().cloned().collect();
        files.sort_by(|a, b| a.national_id().cmp(b.national_id()));
        Ok(files)
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.files.lock().expect("repository mutex poisoned").len())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn templates(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|notification| notification.template)
            .collect()
    }
}

impl NotificationPublisher for MemoryNotifier {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// In-memory files behind a slow `fetch` and writes that can be switched to fail.
#[derive(Default)]
pub(super) struct ControlledRepository {
    pub(super) inner: MemoryRepository,
    pub(super) fetch_delay: Duration,
    pub(super) fail_writes: AtomicBool,
}

impl ControlledRepository {
    pub(super) fn slow(fetch_delay: Duration) -> Self {
        Self {
            fetch_delay,
            ..Self::default()
        }
    }

    pub(super) fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn check_writes(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("disk full".to_string()));
        }
        Ok(())
    }
}

impl ApplicantRepository for ControlledRepository {
    fn insert(&self, file: ApplicantFile) -> Result<ApplicantFile, RepositoryError> {
        self.inner.insert(file)
    }

    fn update(&self, file: ApplicantFile) -> Result<(), RepositoryError> {
        self.check_writes()?;
        self.inner.update(file)
    }

    fn fetch(&self, id: &NationalId) -> Result<Option<ApplicantFile>, RepositoryError> {
        if !self.fetch_delay.is_zero() {
            thread::sleep(self.fetch_delay);
        }
        self.inner.fetch(id)
    }

    fn remove(&self, id: &NationalId) -> Result<ApplicantFile, RepositoryError> {
        self.check_writes()?;
        self.inner.remove(id)
    }

    fn list(&self) -> Result<Vec<ApplicantFile>, RepositoryError> {
        self.inner.list()
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        self.inner.count()
    }
}

pub(super) type ControlledService =
    AdmissionsService<ControlledRepository, InMemorySeatStore, MemoryNotifier>;

pub(super) fn controlled_service(
    repository: Arc<ControlledRepository>,
) -> (ControlledService, Arc<SeatRegistry<InMemorySeatStore>>) {
    let catalog = catalog();
    let seats = seat_registry(&catalog);
    let service = AdmissionsService::new(
        repository,
        seats.clone(),
        Arc::new(MemoryNotifier::default()),
        Arc::new(catalog),
        ScoringConfig::default(),
    );
    (service, seats)
}

pub(super) struct OfflineNotifier;

impl NotificationPublisher for OfflineNotifier {
    fn publish(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl ApplicantRepository for UnavailableRepository {
    fn insert(&self, _file: ApplicantFile) -> Result<ApplicantFile, RepositoryError> {
        Err(RepositoryError::Unavailable("workbook locked".to_string()))
    }

    fn update(&self, _file: ApplicantFile) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("workbook locked".to_string()))
    }

    fn fetch(&self, _id: &NationalId) -> Result<Option<ApplicantFile>, RepositoryError> {
        Err(RepositoryError::Unavailable("workbook locked".to_string()))
    }

    fn remove(&self, _id: &NationalId) -> Result<ApplicantFile, RepositoryError> {
        Err(RepositoryError::Unavailable("workbook locked".to_string()))
    }

    fn list(&self) -> Result<Vec<ApplicantFile>, RepositoryError> {
        Err(RepositoryError::Unavailable("workbook locked".to_string()))
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("workbook locked".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    admissions_router(Arc::new(service))
}
