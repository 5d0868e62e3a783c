use crate::infra::{wire_service, Wiring};
use admissions::config::AdmissionsSettings;
use admissions::error::AppError;
use admissions::workflows::admissions::{
    classify, compute_final_score, ApplicantDraft, AptitudeSubScores, EligibilityMarkers,
    EnrollmentRequest, LabSlot, NationalId, ProgramId, ScoringConfig, Shift, SocialConditions,
};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Program the sample applicants enroll in.
    #[arg(long, default_value_t = 101)]
    pub(crate) program: u32,
    /// Exam date for lab assignments (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) exam_date: Option<NaiveDate>,
    /// Optional program catalog CSV used instead of the bundled offering.
    #[arg(long)]
    pub(crate) programs_csv: Option<PathBuf>,
    /// Print applicant status payloads as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// High-school grade on the 0-10 scale
    #[arg(long)]
    pub(crate) prior_grade: f64,
    /// Aptitude evaluation total on the 0-1000 scale
    #[arg(long)]
    pub(crate) evaluation_score: f64,
    /// Merit bonus on the 0-1000 scale
    #[arg(long, default_value_t = 0.0)]
    pub(crate) merit_bonus: f64,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ClassifyArgs {
    #[arg(long)]
    pub(crate) socioeconomic_condition: bool,
    #[arg(long)]
    pub(crate) rurality: bool,
    #[arg(long)]
    pub(crate) disability: bool,
    #[arg(long)]
    pub(crate) ethnic_affiliation: bool,
    #[arg(long)]
    pub(crate) violence_victim: bool,
    #[arg(long)]
    pub(crate) returning_migrant: bool,
    #[arg(long = "vulnerability")]
    pub(crate) vulnerability: bool,
    #[arg(long)]
    pub(crate) academic_merit: bool,
    #[arg(long)]
    pub(crate) bachiller_ethnic: bool,
    #[arg(long)]
    pub(crate) bachiller_last_year: bool,
}

impl From<&ClassifyArgs> for EligibilityMarkers {
    fn from(args: &ClassifyArgs) -> Self {
        EligibilityMarkers {
            socioeconomic_condition: args.socioeconomic_condition,
            rurality: args.rurality,
            disability: args.disability,
            ethnic_affiliation: args.ethnic_affiliation,
            violence_victim: args.violence_victim,
            returning_migrant: args.returning_migrant,
            socioeconomic_vulnerability: args.vulnerability,
            academic_merit: args.academic_merit,
            bachiller_ethnic: args.bachiller_ethnic,
            bachiller_last_year: args.bachiller_last_year,
        }
    }
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let score = compute_final_score(args.prior_grade, args.evaluation_score, args.merit_bonus)
        .map_err(|err| AppError::Admissions(err.into()))?;
    match serde_json::to_string_pretty(&score.breakdown()) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("Score breakdown unavailable: {err}"),
    }
    Ok(())
}

pub(crate) fn run_classify(args: ClassifyArgs) -> Result<(), AppError> {
    let (segment, priority) = classify(&EligibilityMarkers::from(&args));
    println!("{} (priority {priority})", segment.label());
    Ok(())
}

struct SampleApplicant {
    national_id: &'static str,
    first_name: &'static str,
    paternal_surname: &'static str,
    prior_grade: f64,
    honor_roll: bool,
    aptitude: f64,
    conditions: SocialConditions,
}

fn sample_applicants() -> Vec<SampleApplicant> {
    vec![
        SampleApplicant {
            national_id: "1316202082",
            first_name: "Maria",
            paternal_surname: "Zambrano",
            prior_grade: 9.4,
            honor_roll: true,
            aptitude: 8.8,
            conditions: SocialConditions {
                zone: "RURAL".to_string(),
                institution_type: "FISCAL".to_string(),
                ..SocialConditions::default()
            },
        },
        SampleApplicant {
            national_id: "1350123456",
            first_name: "Luis",
            paternal_surname: "Cedeno",
            prior_grade: 8.1,
            honor_roll: false,
            aptitude: 7.2,
            conditions: SocialConditions {
                bachiller_last_year: true,
                ..SocialConditions::default()
            },
        },
        SampleApplicant {
            national_id: "1317924551",
            first_name: "Ana",
            paternal_surname: "Macias",
            prior_grade: 6.0,
            honor_roll: false,
            aptitude: 4.5,
            conditions: SocialConditions::default(),
        },
    ]
}

/// Walk three applicants through the full workflow against in-memory adapters.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let settings = AdmissionsSettings {
        scoring: ScoringConfig::default(),
        programs_csv: args.programs_csv.clone(),
    };
    let Wiring {
        service,
        seats,
        notifier,
    } = wire_service(&settings)?;

    let program = ProgramId(args.program);
    let Some(offering) = service.catalog().get(&program).cloned() else {
        println!("Program {} is not in the catalog", program.0);
        return Ok(());
    };
    let shift = offering.shifts.first().copied().unwrap_or(Shift::Morning);
    let exam_date = args.exam_date.unwrap_or_else(|| Local::now().date_naive());

    println!("Admissions workflow demo");
    println!(
        "Program: {} {} ({}), shift {}, {} seats",
        program.0,
        offering.name,
        offering.faculty,
        shift.label(),
        offering.seats
    );
    println!(
        "Minimum score for assignment: {}",
        service.scoring().minimum_score
    );

    for (index, sample) in sample_applicants().into_iter().enumerate() {
        println!("\n- Applicant {} {}", sample.first_name, sample.paternal_surname);

        let draft = ApplicantDraft {
            national_id: sample.national_id.to_string(),
            first_name: sample.first_name.to_string(),
            middle_name: String::new(),
            paternal_surname: sample.paternal_surname.to_string(),
            maternal_surname: String::new(),
            email: format!("{}@aspirantes.ec", sample.national_id),
            phone: "0991234567".to_string(),
            prior_grade: sample.prior_grade,
            honor_roll: sample.honor_roll,
        };
        let file = match service.register(draft) {
            Ok(file) => file,
            Err(err) => {
                println!("  Registration rejected: {err}");
                continue;
            }
        };
        let id: NationalId = file.national_id().clone();
        println!("  Registered as {} ({:?})", id, file.record.state);

        if let Err(err) = service.enroll(&id, EnrollmentRequest { program, shift }) {
            println!("  Enrollment rejected: {err}");
            continue;
        }

        let sub_scores = AptitudeSubScores {
            verbal: sample.aptitude,
            numeric: sample.aptitude,
            abstract_reasoning: sample.aptitude,
        };
        let evaluation = service.record_evaluation(&id, sub_scores)?;
        let score = service.compute_score(&id)?;
        let breakdown = score.breakdown();
        println!(
            "  Evaluation {} -> final score {} (grade {} + evaluation {} + merit {})",
            evaluation.total.unwrap_or_default(),
            breakdown.final_score,
            breakdown.grade_component,
            breakdown.evaluation_component,
            breakdown.merit_component
        );

        let markers = service.declare_conditions(&id, &sample.conditions)?;
        let (segment, priority) = classify(&markers);
        println!("  Segment {} (priority {priority})", segment.label());

        let slot = LabSlot {
            lab: format!("LAB-{}", index + 1),
            building: "Edificio Central".to_string(),
            exam_date,
            start_time: NaiveTime::from_hms_opt(8 + index as u32, 0, 0)
                .unwrap_or(NaiveTime::MIN),
        };
        let assignment = service.assign_lab(&id, slot)?;
        match &assignment.reason {
            Some(reason) => println!("  Assignment {} ({reason})", assignment.status),
            None => println!(
                "  Assignment {} at {} on {}",
                assignment.status, assignment.slot.lab, assignment.slot.exam_date
            ),
        }

        if args.json {
            let view = service.get(&id)?.status_view();
            match serde_json::to_string_pretty(&view) {
                Ok(json) => println!("  Status payload:\n{json}"),
                Err(err) => println!("  Status payload unavailable: {err}"),
            }
        }
    }

    let remaining = seats.remaining(&program).map_err(|err| AppError::Admissions(err.into()))?;
    println!(
        "\nSeats remaining for {}: {}",
        program.0,
        remaining.unwrap_or_default()
    );

    let events = notifier.events();
    if events.is_empty() {
        println!("Notifications: none dispatched");
    } else {
        println!("Notifications:");
        for event in events {
            println!("  - template={} -> {}", event.template, event.recipient);
        }
    }

    Ok(())
}
