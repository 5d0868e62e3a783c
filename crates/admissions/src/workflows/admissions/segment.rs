use serde::{Deserialize, Serialize};

/// Priority tiers used to order applicants for seat allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Segment {
    Cuotas,
    Vulnerabilidad,
    MeritoAcademico,
    /// Defined tier that no marker currently populates.
    Reconocimientos,
    PueblosNacionalidades,
    Bachilleres,
    General,
}

impl Segment {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Cuotas,
            Self::Vulnerabilidad,
            Self::MeritoAcademico,
            Self::Reconocimientos,
            Self::PueblosNacionalidades,
            Self::Bachilleres,
            Self::General,
        ]
    }

    /// 1 is served first, 7 last.
    pub const fn priority(self) -> u8 {
        match self {
            Self::Cuotas => 1,
            Self::Vulnerabilidad => 2,
            Self::MeritoAcademico => 3,
            Self::Reconocimientos => 4,
            Self::PueblosNacionalidades => 5,
            Self::Bachilleres => 6,
            Self::General => 7,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Cuotas => "CUOTAS",
            Self::Vulnerabilidad => "VULNERABILIDAD",
            Self::MeritoAcademico => "MERITO_ACADEMICO",
            Self::Reconocimientos => "RECONOCIMIENTOS",
            Self::PueblosNacionalidades => "PUEBLOS_NACIONALIDADES",
            Self::Bachilleres => "BACHILLERES",
            Self::General => "GENERAL",
        }
    }
}

/// Boolean eligibility flags attached to an applicant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityMarkers {
    pub socioeconomic_condition: bool,
    pub rurality: bool,
    pub disability: bool,
    pub ethnic_affiliation: bool,
    pub violence_victim: bool,
    pub returning_migrant: bool,
    pub socioeconomic_vulnerability: bool,
    pub academic_merit: bool,
    pub bachiller_ethnic: bool,
    pub bachiller_last_year: bool,
}

impl EligibilityMarkers {
    fn qualifies_for_quota(&self) -> bool {
        self.socioeconomic_condition
            || self.rurality
            || self.disability
            || self.ethnic_affiliation
            || self.violence_victim
            || self.returning_migrant
    }

    /// Derive the markers from declared circumstances.
    pub fn from_conditions(conditions: &SocialConditions) -> Self {
        let (socioeconomic_condition, socioeconomic_vulnerability) =
            match conditions.income_quintile {
                Some(quintile) => (quintile <= 2, quintile == 1),
                None => (false, false),
            };

        let rurality = conditions
            .institution_type
            .trim()
            .eq_ignore_ascii_case("FISCAL")
            && conditions.zone.trim().eq_ignore_ascii_case("RURAL");

        let disability = conditions.has_disability_card
            && conditions.disability_percentage >= MIN_DISABILITY_PERCENTAGE;

        let ethnic_affiliation = ETHNIC_GROUPS.iter().any(|group| {
            conditions
                .self_identification
                .trim()
                .eq_ignore_ascii_case(group)
        });

        let academic_merit = conditions.honor_roll
            && conditions.distinction.as_deref().is_some_and(|distinction| {
                MERIT_DISTINCTIONS
                    .iter()
                    .any(|known| distinction.trim().eq_ignore_ascii_case(known))
            });

        Self {
            socioeconomic_condition,
            rurality,
            disability,
            ethnic_affiliation,
            violence_victim: conditions.violence_victim,
            returning_migrant: conditions.returning_migrant,
            socioeconomic_vulnerability,
            academic_merit,
            bachiller_ethnic: conditions.bachiller_last_year
                && conditions.bachiller_of_peoples_and_nationalities,
            bachiller_last_year: conditions.bachiller_last_year,
        }
    }
}

const MIN_DISABILITY_PERCENTAGE: u8 = 30;
const ETHNIC_GROUPS: [&str; 3] = ["INDIGENA", "AFROECUATORIANO", "MONTUBIO"];
const MERIT_DISTINCTIONS: [&str; 3] = [
    "ABANDERADO PABELLON NACIONAL",
    "PORTA ESTANDARTE PLANTEL",
    "1ER. ESCOLTA PABELLON NACIONAL",
];

/// Raw circumstances declared during intake, before they are reduced to markers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialConditions {
    /// Household income quintile, 1 (poorest) to 5.
    pub income_quintile: Option<u8>,
    pub institution_type: String,
    pub zone: String,
    pub disability_percentage: u8,
    pub has_disability_card: bool,
    pub self_identification: String,
    pub honor_roll: bool,
    pub distinction: Option<String>,
    pub bachiller_last_year: bool,
    /// Declared by the school for last-year students of recognised peoples and nationalities.
    pub bachiller_of_peoples_and_nationalities: bool,
    pub violence_victim: bool,
    pub returning_migrant: bool,
}

/// First matching tier wins; `GENERAL` catches everything else.
pub fn classify(markers: &EligibilityMarkers) -> (Segment, u8) {
    let segment = if markers.qualifies_for_quota() {
        Segment::Cuotas
    } else if markers.socioeconomic_vulnerability {
        Segment::Vulnerabilidad
    } else if markers.academic_merit {
        Segment::MeritoAcademico
    } else if markers.bachiller_ethnic {
        Segment::PueblosNacionalidades
    } else if markers.bachiller_last_year {
        Segment::Bachilleres
    } else {
        Segment::General
    };

    (segment, segment.priority())
}
