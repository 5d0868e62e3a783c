use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::ProgramId;
use super::repository::RepositoryError;

/// Durable home of the remaining-seat counters. The registry owns all locking; stores only
/// load and persist.
pub trait SeatStore: Send + Sync {
    fn load(&self, program: &ProgramId) -> Result<Option<i64>, RepositoryError>;
    fn persist(&self, program: &ProgramId, remaining: i64) -> Result<(), RepositoryError>;
}

/// Process-local seat store.
#[derive(Debug, Default)]
pub struct InMemorySeatStore {
    counts: Mutex<HashMap<ProgramId, i64>>,
}

impl SeatStore for InMemorySeatStore {
    fn load(&self, program: &ProgramId) -> Result<Option<i64>, RepositoryError> {
        let counts = self
            .counts
            .lock()
            .map_err(|_| RepositoryError::Unavailable("seat store lock poisoned".to_string()))?;
        Ok(counts.get(program).copied())
    }

    fn persist(&self, program: &ProgramId, remaining: i64) -> Result<(), RepositoryError> {
        let mut counts = self
            .counts
            .lock()
            .map_err(|_| RepositoryError::Unavailable("seat store lock poisoned".to_string()))?;
        counts.insert(*program, remaining);
        Ok(())
    }
}

/// Result of returning a seat to a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReleaseOutcome {
    Released { remaining: i64 },
    /// The counter now exceeds the configured capacity. The increment is kept.
    AboveCapacity { remaining: i64, capacity: i64 },
}

impl ReleaseOutcome {
    pub fn remaining(&self) -> i64 {
        match self {
            ReleaseOutcome::Released { remaining }
            | ReleaseOutcome::AboveCapacity { remaining, .. } => *remaining,
        }
    }
}

/// Remaining seats per program, mutated only through `reserve` and `release`.
///
/// A single mutex spans the load, check, and persist steps so that operations on the same
/// program are linearizable even when the store itself is not transactional.
pub struct SeatRegistry<S> {
    store: Arc<S>,
    capacities: Mutex<HashMap<ProgramId, i64>>,
}

impl<S> SeatRegistry<S>
where
    S: SeatStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            capacities: Mutex::new(HashMap::new()),
        }
    }

    /// Declare a program's capacity and reset its counter to that capacity.
    pub fn configure(&self, program: ProgramId, capacity: u32) -> Result<(), RepositoryError> {
        let mut capacities = self
            .capacities
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.store.persist(&program, i64::from(capacity))?;
        capacities.insert(program, i64::from(capacity));
        debug!(program = %program, capacity, "seat capacity configured");
        Ok(())
    }

    pub fn is_configured(&self, program: &ProgramId) -> bool {
        self.capacities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(program)
    }

    pub fn capacity(&self, program: &ProgramId) -> Option<i64> {
        self.capacities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(program)
            .copied()
    }

    pub fn remaining(&self, program: &ProgramId) -> Result<Option<i64>, RepositoryError> {
        let _capacities = self
            .capacities
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.store.load(program)
    }

    /// Take one seat if any remain. Unknown programs have no seats.
    pub fn reserve(&self, program: &ProgramId) -> Result<bool, RepositoryError> {
        let _capacities = self
            .capacities
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match self.store.load(program)? {
            Some(remaining) if remaining > 0 => {
                self.store.persist(program, remaining - 1)?;
                debug!(program = %program, remaining = remaining - 1, "seat reserved");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Return one seat. Never capped; exceeding capacity is reported, not prevented.
    ///
    /// Programs that were never configured have no seats to return and are left untouched.
    pub fn release(&self, program: &ProgramId) -> Result<ReleaseOutcome, RepositoryError> {
        let capacities = self
            .capacities
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(capacity) = capacities.get(program).copied() else {
            warn!(program = %program, "seat release for a program without configured capacity");
            return Err(RepositoryError::InvariantViolation(format!(
                "program {program} has no configured seats to release"
            )));
        };
        let remaining = self.store.load(program)?.unwrap_or(0) + 1;
        self.store.persist(program, remaining)?;

        if remaining > capacity {
            warn!(
                program = %program,
                remaining,
                capacity,
                "seat release pushed program above configured capacity"
            );
            return Ok(ReleaseOutcome::AboveCapacity {
                remaining,
                capacity,
            });
        }
        debug!(program = %program, remaining, "seat released");
        Ok(ReleaseOutcome::Released { remaining })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IneligibleReason {
    #[serde(rename = "insufficient score")]
    InsufficientScore,
    #[serde(rename = "no seats")]
    NoSeats,
}

impl IneligibleReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            IneligibleReason::InsufficientScore => "insufficient score",
            IneligibleReason::NoSeats => "no seats",
        }
    }
}

/// Admission gate answer. A negative answer is an ordinary result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    pub eligible: bool,
    pub reason: Option<IneligibleReason>,
}

impl Eligibility {
    pub const fn eligible() -> Self {
        Self {
            eligible: true,
            reason: None,
        }
    }

    pub const fn ineligible(reason: IneligibleReason) -> Self {
        Self {
            eligible: false,
            reason: Some(reason),
        }
    }
}

/// Gates admissions on the minimum score and seat availability.
pub struct QuotaValidator<S> {
    registry: Arc<SeatRegistry<S>>,
    minimum_score: f64,
}

impl<S> QuotaValidator<S>
where
    S: SeatStore,
{
    pub fn new(registry: Arc<SeatRegistry<S>>, minimum_score: f64) -> Self {
        Self {
            registry,
            minimum_score,
        }
    }

    pub fn minimum_score(&self) -> f64 {
        self.minimum_score
    }

    pub fn registry(&self) -> &Arc<SeatRegistry<S>> {
        &self.registry
    }

    /// Score is checked before seats. A NaN score fails closed.
    pub fn check_eligibility(
        &self,
        program: &ProgramId,
        score: f64,
    ) -> Result<Eligibility, RepositoryError> {
        if !(score >= self.minimum_score) {
            return Ok(Eligibility::ineligible(IneligibleReason::InsufficientScore));
        }
        match self.registry.remaining(program)? {
            Some(remaining) if remaining > 0 => Ok(Eligibility::eligible()),
            _ => Ok(Eligibility::ineligible(IneligibleReason::NoSeats)),
        }
    }

    pub fn reserve_seat(&self, program: &ProgramId) -> Result<bool, RepositoryError> {
        self.registry.reserve(program)
    }

    pub fn release_seat(&self, program: &ProgramId) -> Result<ReleaseOutcome, RepositoryError> {
        self.registry.release(program)
    }
}
