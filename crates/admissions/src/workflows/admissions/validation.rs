use serde::Serialize;

/// Input rejected before any state is touched. Always recoverable by correcting the input.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max} (found {found})")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        found: f64,
    },
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("national id is invalid: {reason}")]
    InvalidNationalId { reason: &'static str },
    #[error("email '{value}' is not a valid address")]
    InvalidEmail { value: String },
    #[error("{field} is required")]
    MissingField { field: &'static str },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::OutOfRange { field, .. }
            | ValidationError::NotFinite { field }
            | ValidationError::MissingField { field } => field,
            ValidationError::InvalidNationalId { .. } => "national_id",
            ValidationError::InvalidEmail { .. } => "email",
        }
    }
}

/// Reject NaN/infinite values and anything outside `[min, max]`.
pub(crate) fn ensure_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            found: value,
        });
    }
    Ok(value)
}
