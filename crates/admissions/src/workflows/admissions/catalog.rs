use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use super::domain::{ProgramId, Shift};
use super::quota::{SeatRegistry, SeatStore};
use super::repository::RepositoryError;

const STANDARD_CATALOG: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/programs.csv"));

/// One academic program open for admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramOffering {
    pub id: ProgramId,
    pub name: String,
    pub faculty: String,
    pub semesters: u8,
    pub seats: u32,
    pub modalities: Vec<String>,
    pub shifts: Vec<Shift>,
    pub active: bool,
}

impl ProgramOffering {
    pub fn offers(&self, shift: Shift) -> bool {
        self.shifts.contains(&shift)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgramCatalog {
    programs: BTreeMap<ProgramId, ProgramOffering>,
}

impl ProgramCatalog {
    /// The ten programs the admissions office opens by default.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::from_reader(STANDARD_CATALOG.as_bytes())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut programs = BTreeMap::new();

        for row in csv_reader.deserialize::<ProgramRow>() {
            let offering = row?.into_offering()?;
            if programs.contains_key(&offering.id) {
                return Err(CatalogError::DuplicateProgram(offering.id));
            }
            programs.insert(offering.id, offering);
        }

        Ok(Self { programs })
    }

    pub fn get(&self, id: &ProgramId) -> Option<&ProgramOffering> {
        self.programs.get(id)
    }

    pub fn programs(&self) -> impl Iterator<Item = &ProgramOffering> {
        self.programs.values()
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Configure seat capacity for every active program. Returns how many were seeded.
    pub fn seed<S: SeatStore>(&self, registry: &SeatRegistry<S>) -> Result<usize, CatalogError> {
        let mut seeded = 0;
        for offering in self.programs().filter(|offering| offering.active) {
            registry.configure(offering.id, offering.seats)?;
            seeded += 1;
        }
        info!(programs = seeded, "seat registry seeded from catalog");
        Ok(seeded)
    }
}

#[derive(Debug, Deserialize)]
struct ProgramRow {
    id: u32,
    name: String,
    #[serde(default)]
    faculty: String,
    semesters: u8,
    seats: u32,
    #[serde(default, deserialize_with = "comma_list")]
    modalities: Vec<String>,
    #[serde(default, deserialize_with = "comma_list")]
    shifts: Vec<String>,
    #[serde(default)]
    status: String,
}

impl ProgramRow {
    fn into_offering(self) -> Result<ProgramOffering, CatalogError> {
        let id = ProgramId(self.id);
        let shifts = self
            .shifts
            .iter()
            .map(|raw| {
                Shift::parse(raw).ok_or_else(|| CatalogError::InvalidShift {
                    program: id,
                    value: raw.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProgramOffering {
            id,
            name: self.name,
            faculty: self.faculty,
            semesters: self.semesters,
            seats: self.seats,
            modalities: self.modalities,
            shifts,
            active: self.status.is_empty()
                || self.status.eq_ignore_ascii_case("ACTIVA")
                || self.status.eq_ignore_ascii_case("ACTIVE"),
        })
    }
}

fn comma_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .split(',')
        .map(|value| value.trim().to_ascii_uppercase())
        .filter(|value| !value.is_empty())
        .collect())
}

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidShift { program: ProgramId, value: String },
    DuplicateProgram(ProgramId),
    Seats(RepositoryError),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "failed to read program catalog: {}", err),
            CatalogError::Csv(err) => write!(f, "invalid program catalog CSV: {}", err),
            CatalogError::InvalidShift { program, value } => {
                write!(f, "program {} lists unknown shift '{}'", program, value)
            }
            CatalogError::DuplicateProgram(program) => {
                write!(f, "program {} appears more than once", program)
            }
            CatalogError::Seats(err) => write!(f, "could not seed seat registry: {}", err),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(err) => Some(err),
            CatalogError::Csv(err) => Some(err),
            CatalogError::Seats(err) => Some(err),
            CatalogError::InvalidShift { .. } | CatalogError::DuplicateProgram(_) => None,
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<RepositoryError> for CatalogError {
    fn from(err: RepositoryError) -> Self {
        Self::Seats(err)
    }
}
