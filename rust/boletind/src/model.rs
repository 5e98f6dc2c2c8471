use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const MIN_GRADE: f64 = 0.0;
pub const MAX_GRADE: f64 = 10.0;
pub const PASSING_AVERAGE: f64 = 7.0;

/// Grade written into every term when a previa is approved.
pub const PREVIA_APPROVAL_GRADE: f64 = 7.0;
pub const PREVIA_APPROVAL_NOTE: &str = "Aprobada desde materia previa";

/// A course transfer needs strictly more verbal warnings than this.
pub const VERBAL_WARNING_THRESHOLD: i64 = 3;

pub const MIN_YEAR_LEVEL: i64 = 1;
pub const MAX_YEAR_LEVEL: i64 = 7;

/// One of the three grading periods (cuatrimestres) of a school year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Term {
    First,
    Second,
    Third,
}

impl Term {
    pub const ALL: [Term; 3] = [Term::First, Term::Second, Term::Third];

    pub fn number(self) -> i64 {
        match self {
            Term::First => 1,
            Term::Second => 2,
            Term::Third => 3,
        }
    }

    pub fn from_number(n: i64) -> Option<Self> {
        match n {
            1 => Some(Term::First),
            2 => Some(Term::Second),
            3 => Some(Term::Third),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        (self.number() - 1) as usize
    }
}

impl From<Term> for i64 {
    fn from(t: Term) -> i64 {
        t.number()
    }
}

impl TryFrom<i64> for Term {
    type Error = String;

    fn try_from(n: i64) -> Result<Self, Self::Error> {
        Term::from_number(n).ok_or_else(|| format!("term must be 1, 2 or 3 (got {})", n))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Directivo,
    Profesor,
    Preceptor,
    Secretario,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "directivo" => Some(Role::Directivo),
            "profesor" => Some(Role::Profesor),
            "preceptor" => Some(Role::Preceptor),
            "secretario" => Some(Role::Secretario),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Directivo => "directivo",
            Role::Profesor => "profesor",
            Role::Preceptor => "preceptor",
            Role::Secretario => "secretario",
        }
    }
}

/// The staff member acting on a request. Every mutating engine operation
/// takes one explicitly instead of reading ambient session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// Grades, previas and course transfers are restricted to school management.
    pub fn can_manage_records(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Directivo)
    }

    pub fn can_record_discipline(&self) -> bool {
        matches!(
            self.role,
            Role::Admin | Role::Directivo | Role::Preceptor | Role::Profesor
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub last_name: String,
    pub first_name: String,
    pub dni: Option<String>,
    pub course_id: Option<String>,
    pub active: bool,
}

impl Student {
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSection {
    pub id: String,
    pub year_level: i64,
    pub division: String,
    pub specialty: Option<String>,
    pub active: bool,
}

impl CourseSection {
    pub fn label(&self) -> String {
        format!("{}° {}", self.year_level, self.division)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub specialty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeEntry {
    pub student_id: String,
    pub subject_id: String,
    pub term: Term,
    pub value: Option<f64>,
    pub note: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviaState {
    Pendiente,
    Regularizada,
    Aprobada,
}

impl PreviaState {
    pub fn as_str(self) -> &'static str {
        match self {
            PreviaState::Pendiente => "pendiente",
            PreviaState::Regularizada => "regularizada",
            PreviaState::Aprobada => "aprobada",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pendiente" => Some(PreviaState::Pendiente),
            "regularizada" => Some(PreviaState::Regularizada),
            "aprobada" => Some(PreviaState::Aprobada),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == PreviaState::Aprobada
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviaRecord {
    pub id: String,
    pub student_id: String,
    pub subject_id: String,
    pub subject_name: Option<String>,
    pub prior_year: i64,
    pub state: PreviaState,
    pub notes: Option<String>,
    pub created_at: Option<String>,
}

/// Sanction attached to a disciplinary record. The two variants the engine
/// reasons about are closed; anything else the school records stays free text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum SanctionType {
    VerbalWarning,
    DivisionChange,
    Other(String),
}

impl SanctionType {
    pub const VERBAL_WARNING_LABEL: &'static str = "Amonestación verbal";
    pub const DIVISION_CHANGE_LABEL: &'static str = "Cambio de división";

    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        let folded = label.to_lowercase();
        if folded == Self::VERBAL_WARNING_LABEL.to_lowercase() {
            SanctionType::VerbalWarning
        } else if folded == Self::DIVISION_CHANGE_LABEL.to_lowercase() {
            SanctionType::DivisionChange
        } else {
            SanctionType::Other(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            SanctionType::VerbalWarning => Self::VERBAL_WARNING_LABEL,
            SanctionType::DivisionChange => Self::DIVISION_CHANGE_LABEL,
            SanctionType::Other(s) => s.as_str(),
        }
    }
}

impl From<SanctionType> for String {
    fn from(s: SanctionType) -> String {
        s.label().to_string()
    }
}

impl From<String> for SanctionType {
    fn from(s: String) -> Self {
        SanctionType::from_label(&s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisciplinaryRecord {
    pub id: String,
    pub student_id: String,
    pub date: NaiveDate,
    pub reason: String,
    pub sanction: Option<SanctionType>,
    pub notes: Option<String>,
    pub user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_numbers_roundtrip_and_reject_out_of_range() {
        for t in Term::ALL {
            assert_eq!(Term::from_number(t.number()), Some(t));
        }
        assert_eq!(Term::from_number(0), None);
        assert_eq!(Term::from_number(4), None);
        assert!(Term::try_from(5).is_err());
    }

    #[test]
    fn sanction_labels_are_matched_case_insensitively() {
        assert_eq!(
            SanctionType::from_label("amonestación verbal"),
            SanctionType::VerbalWarning
        );
        assert_eq!(
            SanctionType::from_label(" Cambio de división "),
            SanctionType::DivisionChange
        );
        assert_eq!(
            SanctionType::from_label("AMONESTACIÓN VERBAL"),
            SanctionType::VerbalWarning
        );
        assert_eq!(
            SanctionType::from_label("CAMBIO DE DIVISIÓN"),
            SanctionType::DivisionChange
        );
        assert_eq!(
            SanctionType::from_label("Suspensión"),
            SanctionType::Other("Suspensión".to_string())
        );
    }

    #[test]
    fn only_management_roles_manage_records() {
        assert!(Principal::new("u1", Role::Admin).can_manage_records());
        assert!(Principal::new("u1", Role::Directivo).can_manage_records());
        assert!(!Principal::new("u1", Role::Profesor).can_manage_records());
        assert!(Principal::new("u1", Role::Preceptor).can_record_discipline());
        assert!(!Principal::new("u1", Role::Secretario).can_record_discipline());
    }
}
