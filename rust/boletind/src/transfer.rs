use crate::error::{require_manager, EngineError, EngineResult};
use crate::model::{
    CourseSection, DisciplinaryRecord, Principal, SanctionType, Student, VERBAL_WARNING_THRESHOLD,
};
use crate::store::{DisciplinaryStore, Enrollment, PreviaStore};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

pub const TRANSFER_REASON: &str = "Cambio de curso por mal comportamiento";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferEligibility {
    pub student_id: String,
    pub verbal_warnings: i64,
    pub eligible: bool,
    pub current_course: Option<CourseSection>,
    /// Active sections of the same year the student could move to.
    pub candidates: Vec<CourseSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutcome {
    pub student_id: String,
    pub from_course: CourseSection,
    pub to_course: CourseSection,
    pub previas_removed: usize,
    pub record_id: String,
}

pub fn is_eligible(verbal_warnings: i64) -> bool {
    verbal_warnings > VERBAL_WARNING_THRESHOLD
}

fn load_student<S: Enrollment>(store: &S, student_id: &str) -> EngineResult<Student> {
    store
        .student(student_id)?
        .ok_or_else(|| EngineError::not_found("student", student_id))
}

pub fn transfer_eligibility<S>(store: &S, student_id: &str) -> EngineResult<TransferEligibility>
where
    S: Enrollment + DisciplinaryStore,
{
    let student = load_student(store, student_id)?;
    let verbal_warnings = store.count_by_type(student_id, &SanctionType::VerbalWarning)?;
    let eligible = is_eligible(verbal_warnings);

    let current_course = match student.course_id.as_deref() {
        Some(id) => store.course(id)?,
        None => None,
    };
    let candidates = match (&current_course, eligible) {
        (Some(c), true) => store.same_year_courses(c.year_level, &c.id)?,
        _ => Vec::new(),
    };

    Ok(TransferEligibility {
        student_id: student_id.to_string(),
        verbal_warnings,
        eligible,
        current_course,
        candidates,
    })
}

fn validate_target(
    current: Option<&CourseSection>,
    target: Option<CourseSection>,
    target_course_id: &str,
) -> EngineResult<(CourseSection, CourseSection)> {
    let Some(current) = current else {
        return Err(EngineError::InvalidTarget(
            "student is not assigned to a course section".into(),
        ));
    };
    let Some(target) = target.filter(|t| t.active) else {
        return Err(EngineError::InvalidTarget(format!(
            "course {} does not exist or is not active",
            target_course_id
        )));
    };
    if target.id == current.id {
        return Err(EngineError::InvalidTarget(
            "target course is the student's current course".into(),
        ));
    }
    if target.year_level != current.year_level {
        return Err(EngineError::InvalidTarget(format!(
            "target course is year {} but the student is in year {}",
            target.year_level, current.year_level
        )));
    }
    Ok((current.clone(), target))
}

/// Moves a student to another division of the same year after repeated
/// verbal warnings. Previas are cleared; grades are kept. The previa purge,
/// the course update and the audit record commit together or not at all.
pub fn transfer_course(
    conn: &Connection,
    principal: &Principal,
    student_id: &str,
    target_course_id: &str,
) -> EngineResult<TransferOutcome> {
    require_manager(principal)?;

    let tx = conn
        .unchecked_transaction()
        .map_err(EngineError::TransferFailed)?;

    let student = load_student(&*tx, student_id)?;
    let current = match student.course_id.as_deref() {
        Some(id) => tx.course(id)?,
        None => None,
    };
    let target = tx.course(target_course_id)?;
    let (from_course, to_course) = validate_target(current.as_ref(), target, target_course_id)?;

    let verbal_warnings = tx.count_by_type(student_id, &SanctionType::VerbalWarning)?;
    if !is_eligible(verbal_warnings) {
        return Err(EngineError::NotEligible(format!(
            "a course transfer needs more than {} verbal warnings (student has {})",
            VERBAL_WARNING_THRESHOLD, verbal_warnings
        )));
    }

    let previas_removed = tx
        .delete_all_previas(student_id)
        .map_err(EngineError::TransferFailed)?;

    let updated = tx
        .set_student_course(student_id, &to_course.id)
        .map_err(EngineError::TransferFailed)?;
    if updated != 1 {
        return Err(EngineError::TransferFailed(rusqlite::Error::QueryReturnedNoRows));
    }

    let record = DisciplinaryRecord {
        id: Uuid::new_v4().to_string(),
        student_id: student_id.to_string(),
        date: chrono::Local::now().date_naive(),
        reason: TRANSFER_REASON.to_string(),
        sanction: Some(SanctionType::DivisionChange),
        notes: Some(format!(
            "Cambiado de {} a {}",
            from_course.label(),
            to_course.label()
        )),
        user_id: Some(principal.user_id.clone()),
    };
    tx.append_disciplinary(&record)
        .map_err(EngineError::TransferFailed)?;

    tx.commit().map_err(EngineError::TransferFailed)?;

    Ok(TransferOutcome {
        student_id: student_id.to_string(),
        from_course,
        to_course,
        previas_removed,
        record_id: record.id,
    })
}
