use crate::config::CalendarSettings;
use crate::error::{require_manager, EngineError, EngineResult};
use crate::model::{GradeEntry, Principal, Term, MAX_GRADE, MIN_GRADE, PREVIA_APPROVAL_GRADE};
use crate::store::{Enrollment, GradeStore, PreviaStore, SubjectCatalog};
use chrono::{Datelike, NaiveDate};

pub fn parse_term(n: i64) -> EngineResult<Term> {
    Term::try_from(n).map_err(EngineError::Validation)
}

/// `None` clears a cell back to "not yet entered".
pub fn validate_grade(value: Option<f64>) -> EngineResult<Option<f64>> {
    match value {
        None => Ok(None),
        Some(v) if !v.is_finite() => Err(EngineError::Validation(
            "grade must be a finite number".into(),
        )),
        Some(v) if !(MIN_GRADE..=MAX_GRADE).contains(&v) => Err(EngineError::Validation(
            format!("grade must be between {} and {} (got {})", MIN_GRADE, MAX_GRADE, v),
        )),
        Some(v) => Ok(Some(v)),
    }
}

pub fn record_grade<S>(
    store: &S,
    principal: &Principal,
    student_id: &str,
    subject_id: &str,
    term: i64,
    value: Option<f64>,
    note: Option<&str>,
) -> EngineResult<GradeEntry>
where
    S: Enrollment + SubjectCatalog + GradeStore + PreviaStore,
{
    require_manager(principal)?;
    let term = parse_term(term)?;
    let value = validate_grade(value)?;

    if store.student(student_id)?.is_none() {
        return Err(EngineError::not_found("student", student_id));
    }
    if store.subject(subject_id)?.is_none() {
        return Err(EngineError::not_found("subject", subject_id));
    }
    // Grades written by a previa approval stay at 7 while the previa is approved.
    if value != Some(PREVIA_APPROVAL_GRADE) {
        if let Some(previa) = store.approved_previa(student_id, subject_id)? {
            return Err(EngineError::NotEligible(format!(
                "{} was approved through previa {}; its grades are fixed at {}",
                subject_id, previa.id, PREVIA_APPROVAL_GRADE
            )));
        }
    }

    let entry = GradeEntry {
        student_id: student_id.to_string(),
        subject_id: subject_id.to_string(),
        term,
        value,
        note: note.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
        user_id: Some(principal.user_id.clone()),
    };
    store.upsert_grade(&entry)?;
    Ok(entry)
}

pub fn grade_entries<S>(
    store: &S,
    student_id: &str,
    subject_id: Option<&str>,
) -> EngineResult<Vec<GradeEntry>>
where
    S: Enrollment + GradeStore,
{
    if store.student(student_id)?.is_none() {
        return Err(EngineError::not_found("student", student_id));
    }
    let mut grades = store.grades_for_student(student_id)?;
    if let Some(subject_id) = subject_id {
        grades.retain(|g| g.subject_id == subject_id);
    }
    Ok(grades)
}

/// Term in progress on `date`. Months before the first term's start belong
/// to the previous year's third term.
pub fn current_term(date: NaiveDate, calendar: &CalendarSettings) -> Term {
    let m = date.month();
    if m >= calendar.term1_start_month && m < calendar.term2_start_month {
        Term::First
    } else if m >= calendar.term2_start_month && m < calendar.term3_start_month {
        Term::Second
    } else {
        Term::Third
    }
}
