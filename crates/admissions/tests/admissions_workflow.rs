//! End-to-end scenarios for the admissions workflow through the public service facade.
//!
//! Uses the bundled program catalog, so seat counts here match the published offering.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use admissions::workflows::admissions::{
        AdmissionsService, ApplicantDraft, ApplicantFile, ApplicantRepository, InMemorySeatStore,
        NationalId, Notification, NotificationError, NotificationPublisher, ProgramCatalog,
        RepositoryError, ScoringConfig, SeatRegistry,
    };

    pub(super) type Service = AdmissionsService<Files, InMemorySeatStore, Outbox>;

    pub(super) fn draft(raw_id: &str, grade: f64, honor_roll: bool) -> ApplicantDraft {
        ApplicantDraft {
            national_id: raw_id.to_string(),
            first_name: "Carlos".to_string(),
            middle_name: String::new(),
            paternal_surname: "Mendoza".to_string(),
            maternal_surname: "Vera".to_string(),
            email: format!("{raw_id}@aspirantes.ec"),
            phone: "0998877665".to_string(),
            prior_grade: grade,
            honor_roll,
        }
    }

    pub(super) fn service() -> (Service, Arc<SeatRegistry<InMemorySeatStore>>, Arc<Outbox>) {
        let catalog = ProgramCatalog::standard().expect("bundled catalog");
        let seats = Arc::new(SeatRegistry::new(Arc::new(InMemorySeatStore::default())));
        catalog.seed(&seats).expect("seed seats");
        let outbox = Arc::new(Outbox::default());
        let service = AdmissionsService::new(
            Arc::new(Files::default()),
            seats.clone(),
            outbox.clone(),
            Arc::new(catalog),
            ScoringConfig::default(),
        );
        (service, seats, outbox)
    }

    #[derive(Default)]
    pub(super) struct Files {
        files: Mutex<HashMap<NationalId, ApplicantFile>>,
    }

    impl ApplicantRepository for Files {
        fn insert(&self, file: ApplicantFile) -> Result<ApplicantFile, RepositoryError> {
            let mut guard = self.files.lock().expect("files mutex poisoned");
            if guard.contains_key(file.national_id()) {
                return Err(RepositoryError::Conflict);
            }
            guard.insert(file.national_id().clone(), file.clone());
            Ok(file)
        }

        fn update(&self, file: ApplicantFile) -> Result<(), RepositoryError> {
            let mut guard = self.files.lock().expect("files mutex poisoned");
            guard.insert(file.national_id().clone(), file);
            Ok(())
        }

        fn fetch(&self, id: &NationalId) -> Result<Option<ApplicantFile>, RepositoryError> {
            Ok(self.files.lock().expect("files mutex poisoned").get(id).cloned())
        }

        fn remove(&self, id: &NationalId) -> Result<ApplicantFile, RepositoryError> {
            self.files
                .lock()
                .expect("files mutex poisoned")
                .remove(id)
                .ok_or(RepositoryError::NotFound)
        }

        fn list(&self) -> Result<Vec<ApplicantFile>, RepositoryError> {
            Ok(self
                .files
                .lock()
                .expect("files mutex poisoned")
                .values()
                .cloned()
                .collect())
        }

        fn count(&self) -> Result<usize, RepositoryError> {
            Ok(self.files.lock().expect("files mutex poisoned").len())
        }
    }

    #[derive(Default)]
    pub(super) struct Outbox {
        sent: Mutex<Vec<Notification>>,
    }

    impl Outbox {
        pub(super) fn sent(&self) -> Vec<Notification> {
            self.sent.lock().expect("outbox mutex poisoned").clone()
        }
    }

    impl NotificationPublisher for Outbox {
        fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
            self.sent
                .lock()
                .expect("outbox mutex poisoned")
                .push(notification);
            Ok(())
        }
    }
}

use std::sync::Arc;
use std::thread;

use admissions::workflows::admissions::{
    AssignmentStatus, AptitudeSubScores, EnrollmentRequest, LabSlot, NationalId, ProgramId,
    Segment, Shift, SocialConditions,
};
use chrono::{NaiveDate, NaiveTime};

use common::*;

const MEDICINE: ProgramId = ProgramId(102);

fn slot() -> LabSlot {
    LabSlot {
        lab: "LAB-1".to_string(),
        building: "Edificio Central".to_string(),
        exam_date: NaiveDate::from_ymd_opt(2025, 12, 1).expect("valid date"),
        start_time: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
    }
}

fn scores(value: f64) -> AptitudeSubScores {
    AptitudeSubScores {
        verbal: value,
        numeric: value,
        abstract_reasoning: value,
    }
}

#[test]
fn applicant_moves_from_registration_to_assigned_lab() {
    let (service, seats, outbox) = service();
    let id = NationalId::parse("1316202082").expect("valid id");

    service
        .register(draft("1316202082", 9.0, true))
        .expect("register");
    service
        .enroll(
            &id,
            EnrollmentRequest {
                program: MEDICINE,
                shift: Shift::Morning,
            },
        )
        .expect("enroll");
    service
        .record_evaluation(&id, scores(8.0))
        .expect("evaluate");
    let score = service.compute_score(&id).expect("score");
    // 900 * 0.3 + 800 * 0.5 + 100 * 0.2
    assert_eq!(score.value, 690.0);

    let (segment, priority) = service
        .declare_conditions(
            &id,
            &SocialConditions {
                bachiller_last_year: true,
                ..SocialConditions::default()
            },
        )
        .map(|markers| admissions::workflows::admissions::classify(&markers))
        .expect("declare conditions");
    assert_eq!((segment, priority), (Segment::Bachilleres, 6));

    let assignment = service.assign_lab(&id, slot()).expect("assign");
    assert_eq!(assignment.status, AssignmentStatus::Assigned);
    assert_eq!(seats.remaining(&MEDICINE).expect("load"), Some(79));

    let templates: Vec<_> = outbox.sent().into_iter().map(|n| n.template).collect();
    assert_eq!(templates, vec!["enrollment_confirmed", "lab_assigned"]);
}

#[test]
fn parallel_assignments_respect_program_capacity() {
    let (service, seats, _) = service();
    seats.configure(MEDICINE, 3).expect("shrink capacity");
    let service = Arc::new(service);

    let ids: Vec<NationalId> = (0..8)
        .map(|n| {
            let raw = format!("13{:08}", 10_000 + n);
            let id = NationalId::parse(&raw).expect("valid id");
            service.register(draft(&raw, 10.0, false)).expect("register");
            service
                .enroll(
                    &id,
                    EnrollmentRequest {
                        program: MEDICINE,
                        shift: Shift::Morning,
                    },
                )
                .expect("enroll");
            service.record_evaluation(&id, scores(9.0)).expect("evaluate");
            service.compute_score(&id).expect("score");
            id
        })
        .collect();

    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let service = Arc::clone(&service);
            thread::spawn(move || service.assign_lab(&id, slot()).expect("assign").status)
        })
        .collect();

    let assigned = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread completes"))
        .filter(|status| *status == AssignmentStatus::Assigned)
        .count();

    assert_eq!(assigned, 3);
    assert_eq!(seats.remaining(&MEDICINE).expect("load"), Some(0));
}
