//! Admissions workflow: applicant records, aptitude scoring, priority segments, and
//! per-program seat quotas.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
