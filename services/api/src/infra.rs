use admissions::config::AdmissionsSettings;
use admissions::workflows::admissions::{
    AdmissionsService, ApplicantFile, ApplicantRepository, CatalogError, InMemorySeatStore,
    NationalId, Notification, NotificationError, NotificationPublisher, ProgramCatalog,
    RepositoryError, SeatRegistry,
};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

pub(crate) type ApiService =
    AdmissionsService<InMemoryApplicantRepository, InMemorySeatStore, LoggingNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Applicant files keyed by national id, ordered for stable listings.
#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicantRepository {
    files: Arc<Mutex<BTreeMap<NationalId, ApplicantFile>>>,
}

impl ApplicantRepository for InMemoryApplicantRepository {
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
        if guard.contains_key(file.national_id()) {
            guard.insert(file.national_id().clone(), file);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
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
        Ok(guard.values().cloned().collect())
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.files.lock().expect("repository mutex poisoned").len())
    }
}

/// Records notifications in memory and logs them; no mail transport is wired.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotifier {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationPublisher for LoggingNotifier {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            template = %notification.template,
            national_id = %notification.national_id,
            recipient = %notification.recipient,
            "notification queued"
        );
        let mut guard = self.events.lock().expect("notifier mutex poisoned");
        guard.push(notification);
        Ok(())
    }
}

impl LoggingNotifier {
    pub(crate) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

pub(crate) fn load_catalog(settings: &AdmissionsSettings) -> Result<ProgramCatalog, CatalogError> {
    match &settings.programs_csv {
        Some(path) => ProgramCatalog::from_path(path),
        None => ProgramCatalog::standard(),
    }
}

pub(crate) struct Wiring {
    pub(crate) service: Arc<ApiService>,
    pub(crate) seats: Arc<SeatRegistry<InMemorySeatStore>>,
    pub(crate) notifier: Arc<LoggingNotifier>,
}

/// Build the service over in-memory adapters with seats seeded from the catalog.
pub(crate) fn wire_service(settings: &AdmissionsSettings) -> Result<Wiring, CatalogError> {
    let catalog = load_catalog(settings)?;
    let seats = Arc::new(SeatRegistry::new(Arc::new(InMemorySeatStore::default())));
    catalog.seed(&seats)?;

    let notifier = Arc::new(LoggingNotifier::default());
    let service = Arc::new(AdmissionsService::new(
        Arc::new(InMemoryApplicantRepository::default()),
        seats.clone(),
        notifier.clone(),
        Arc::new(catalog),
        settings.scoring,
    ));

    Ok(Wiring {
        service,
        seats,
        notifier,
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
