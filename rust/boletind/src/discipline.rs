use crate::error::{EngineError, EngineResult};
use crate::model::{DisciplinaryRecord, Principal, SanctionType};
use crate::store::{DisciplinaryStore, Enrollment};
use chrono::NaiveDate;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewDisciplinary<'a> {
    pub student_id: &'a str,
    /// Defaults to today.
    pub date: Option<NaiveDate>,
    pub reason: &'a str,
    pub sanction: Option<SanctionType>,
    pub notes: Option<&'a str>,
}

pub fn record_disciplinary<S>(
    store: &S,
    principal: &Principal,
    new: &NewDisciplinary<'_>,
) -> EngineResult<DisciplinaryRecord>
where
    S: Enrollment + DisciplinaryStore,
{
    if !principal.can_record_discipline() {
        return Err(EngineError::Forbidden(format!(
            "role {} may not record disciplinary entries",
            principal.role.as_str()
        )));
    }
    let reason = new.reason.trim();
    if reason.is_empty() {
        return Err(EngineError::Validation("reason must not be empty".into()));
    }
    if store.student(new.student_id)?.is_none() {
        return Err(EngineError::not_found("student", new.student_id));
    }

    let record = DisciplinaryRecord {
        id: Uuid::new_v4().to_string(),
        student_id: new.student_id.to_string(),
        date: new
            .date
            .unwrap_or_else(|| chrono::Local::now().date_naive()),
        reason: reason.to_string(),
        // A blank sanction means the call was recorded without one.
        sanction: new
            .sanction
            .clone()
            .filter(|s| !s.label().trim().is_empty()),
        notes: new
            .notes
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        user_id: Some(principal.user_id.clone()),
    };
    store.append_disciplinary(&record)?;
    Ok(record)
}

pub fn list_disciplinary<S>(store: &S, student_id: &str) -> EngineResult<Vec<DisciplinaryRecord>>
where
    S: Enrollment + DisciplinaryStore,
{
    if store.student(student_id)?.is_none() {
        return Err(EngineError::not_found("student", student_id));
    }
    Ok(store.disciplinary_for_student(student_id)?)
}
