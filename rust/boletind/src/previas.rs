//! Pending prior-year subjects (previas).
//!
//! A previa moves `pendiente -> regularizada -> aprobada`, with the middle
//! step optional. Approval is terminal and writes a grade of 7 into every
//! term of the subject so the regular report card shows it as approved.

use crate::error::{require_manager, EngineError, EngineResult};
use crate::model::{
    GradeEntry, PreviaRecord, PreviaState, Principal, Term, MAX_YEAR_LEVEL, MIN_YEAR_LEVEL,
    PREVIA_APPROVAL_GRADE, PREVIA_APPROVAL_NOTE,
};
use crate::store::{Enrollment, GradeStore, PreviaStore, SubjectCatalog};
use rusqlite::Connection;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewPrevia<'a> {
    pub student_id: &'a str,
    pub subject_id: &'a str,
    pub prior_year: i64,
    /// Defaults to `pendiente`; a previa cannot be registered as approved.
    pub state: Option<PreviaState>,
    pub notes: Option<&'a str>,
}

pub fn create_previa<S>(
    store: &S,
    principal: &Principal,
    new: &NewPrevia<'_>,
) -> EngineResult<PreviaRecord>
where
    S: Enrollment + SubjectCatalog + PreviaStore,
{
    require_manager(principal)?;

    if !(MIN_YEAR_LEVEL..=MAX_YEAR_LEVEL).contains(&new.prior_year) {
        return Err(EngineError::Validation(format!(
            "priorYear must be in {}..={}",
            MIN_YEAR_LEVEL, MAX_YEAR_LEVEL
        )));
    }
    let state = new.state.unwrap_or(PreviaState::Pendiente);
    if state.is_terminal() {
        return Err(EngineError::Validation(
            "a previa is approved through approval, not created approved".into(),
        ));
    }

    if store.student(new.student_id)?.is_none() {
        return Err(EngineError::not_found("student", new.student_id));
    }
    let subject = store
        .subject(new.subject_id)?
        .ok_or_else(|| EngineError::not_found("subject", new.subject_id))?;

    if let Some(existing) =
        store.find_open_previa(new.student_id, new.subject_id, new.prior_year)?
    {
        return Err(EngineError::Duplicate(format!(
            "student already has an open previa for {} (year {}): {}",
            subject.name, new.prior_year, existing.id
        )));
    }

    let record = PreviaRecord {
        id: Uuid::new_v4().to_string(),
        student_id: new.student_id.to_string(),
        subject_id: new.subject_id.to_string(),
        subject_name: Some(subject.name),
        prior_year: new.prior_year,
        state,
        notes: new
            .notes
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        created_at: Some(chrono::Utc::now().to_rfc3339()),
    };
    store.insert_previa(&record)?;
    Ok(record)
}

pub fn list_previas<S: PreviaStore>(
    store: &S,
    student_id: Option<&str>,
) -> EngineResult<Vec<PreviaRecord>> {
    Ok(store.previas(student_id)?)
}

pub fn regularize_previa<S: PreviaStore>(
    store: &S,
    principal: &Principal,
    previa_id: &str,
) -> EngineResult<PreviaRecord> {
    require_manager(principal)?;
    let mut previa = store
        .previa(previa_id)?
        .ok_or_else(|| EngineError::not_found("previa", previa_id))?;
    if previa.state != PreviaState::Pendiente {
        return Err(EngineError::NotEligible(format!(
            "only a pendiente previa can be regularized (state is {})",
            previa.state.as_str()
        )));
    }
    store.set_previa_state(previa_id, PreviaState::Regularizada, None)?;
    previa.state = PreviaState::Regularizada;
    Ok(previa)
}

/// Approves a previa and writes the synthetic grades in one transaction.
/// Either the state change and all three grade entries persist, or nothing does.
pub fn approve_previa(
    conn: &Connection,
    principal: &Principal,
    previa_id: &str,
) -> EngineResult<PreviaRecord> {
    require_manager(principal)?;

    let tx = conn
        .unchecked_transaction()
        .map_err(EngineError::ApprovalFailed)?;

    let mut previa = tx
        .previa(previa_id)?
        .ok_or_else(|| EngineError::not_found("previa", previa_id))?;
    if previa.state.is_terminal() {
        return Err(EngineError::NotEligible(format!(
            "previa {} is already approved",
            previa_id
        )));
    }

    for term in Term::ALL {
        tx.upsert_grade(&GradeEntry {
            student_id: previa.student_id.clone(),
            subject_id: previa.subject_id.clone(),
            term,
            value: Some(PREVIA_APPROVAL_GRADE),
            note: Some(PREVIA_APPROVAL_NOTE.to_string()),
            user_id: Some(principal.user_id.clone()),
        })
        .map_err(EngineError::ApprovalFailed)?;
    }

    let updated = tx
        .set_previa_state(previa_id, PreviaState::Aprobada, Some(PREVIA_APPROVAL_NOTE))
        .map_err(EngineError::ApprovalFailed)?;
    if updated != 1 {
        return Err(EngineError::ApprovalFailed(rusqlite::Error::QueryReturnedNoRows));
    }
    tx.commit().map_err(EngineError::ApprovalFailed)?;

    previa.state = PreviaState::Aprobada;
    previa.notes = Some(PREVIA_APPROVAL_NOTE.to_string());
    Ok(previa)
}

/// Hard-deletes a previa. Grades are left untouched, including synthetic
/// ones written by an earlier approval.
pub fn remove_previa<S: PreviaStore>(
    store: &S,
    principal: &Principal,
    previa_id: &str,
) -> EngineResult<()> {
    require_manager(principal)?;
    if store.delete_previa(previa_id)? == 0 {
        return Err(EngineError::not_found("previa", previa_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{compute_boletin, GradeStatus};
    use crate::testutil::{directivo, grade_value, set_raw_grade, workspace};

    fn new_previa<'a>(student: &'a str, subject: &'a str, year: i64) -> NewPrevia<'a> {
        NewPrevia {
            student_id: student,
            subject_id: subject,
            prior_year: year,
            state: None,
            notes: Some("  adeuda de 2° año "),
        }
    }

    fn grade_rows(conn: &Connection, student: &str, subject: &str) -> Vec<(i64, Option<f64>)> {
        let mut stmt = conn
            .prepare(
                "SELECT term, value FROM grades WHERE student_id = ? AND subject_id = ? ORDER BY term",
            )
            .expect("prepare");
        let rows = stmt
            .query_map((student, subject), |r| Ok((r.get(0)?, r.get(1)?)))
            .expect("query")
            .collect::<Result<Vec<_>, _>>()
            .expect("rows");
        rows
    }

    #[test]
    fn create_starts_pendiente_and_rejects_duplicates() {
        let conn = workspace();
        let p = create_previa(&conn, &directivo(), &new_previa("s-1", "his", 2)).expect("create");
        assert_eq!(p.state, PreviaState::Pendiente);
        assert_eq!(p.notes.as_deref(), Some("adeuda de 2° año"));
        assert_eq!(p.subject_name.as_deref(), Some("Historia"));

        let e = create_previa(&conn, &directivo(), &new_previa("s-1", "his", 2))
            .expect_err("duplicate");
        assert_eq!(e.code(), "duplicate");

        // A different prior year is a different record.
        create_previa(&conn, &directivo(), &new_previa("s-1", "his", 1)).expect("other year");
    }

    #[test]
    fn create_allows_new_record_once_previous_is_approved() {
        let conn = workspace();
        let p = create_previa(&conn, &directivo(), &new_previa("s-1", "fis", 2)).expect("create");
        approve_previa(&conn, &directivo(), &p.id).expect("approve");
        create_previa(&conn, &directivo(), &new_previa("s-1", "fis", 2)).expect("re-create");
    }

    #[test]
    fn create_validates_inputs() {
        let conn = workspace();
        let e = create_previa(&conn, &directivo(), &new_previa("s-1", "his", 0)).expect_err("year");
        assert_eq!(e.code(), "bad_params");
        let e = create_previa(&conn, &directivo(), &new_previa("ghost", "his", 2))
            .expect_err("student");
        assert_eq!(e.code(), "not_found");
        let e = create_previa(&conn, &directivo(), &new_previa("s-1", "ghost", 2))
            .expect_err("subject");
        assert_eq!(e.code(), "not_found");

        let mut approved = new_previa("s-1", "his", 2);
        approved.state = Some(PreviaState::Aprobada);
        let e = create_previa(&conn, &directivo(), &approved).expect_err("approved state");
        assert_eq!(e.code(), "bad_params");
    }

    #[test]
    fn approve_writes_three_sevens_and_is_terminal() {
        let conn = workspace();
        set_raw_grade(&conn, "s-1", "mat", 2, 3.0);
        let p = create_previa(&conn, &directivo(), &new_previa("s-1", "mat", 2)).expect("create");

        let approved = approve_previa(&conn, &directivo(), &p.id).expect("approve");
        assert_eq!(approved.state, PreviaState::Aprobada);
        assert_eq!(
            grade_rows(&conn, "s-1", "mat"),
            vec![(1, Some(7.0)), (2, Some(7.0)), (3, Some(7.0))]
        );
        let stored = conn.previa(&p.id).expect("get").expect("present");
        assert_eq!(stored.state, PreviaState::Aprobada);

        let e = approve_previa(&conn, &directivo(), &p.id).expect_err("second approve");
        assert_eq!(e.code(), "not_eligible");

        let rows = compute_boletin(&conn, "s-1").expect("boletin");
        let mat = rows.iter().find(|r| r.subject_id == "mat").expect("mat");
        assert_eq!(mat.average, Some(7.0));
        assert_eq!(mat.status, GradeStatus::Aprobado);
    }

    #[test]
    fn approve_from_regularizada() {
        let conn = workspace();
        let p = create_previa(&conn, &directivo(), &new_previa("s-2", "len", 1)).expect("create");
        let r = regularize_previa(&conn, &directivo(), &p.id).expect("regularize");
        assert_eq!(r.state, PreviaState::Regularizada);
        let e = regularize_previa(&conn, &directivo(), &p.id).expect_err("twice");
        assert_eq!(e.code(), "not_eligible");
        approve_previa(&conn, &directivo(), &p.id).expect("approve");
        assert_eq!(grade_value(&conn, "s-2", "len", 3), Some(7.0));
    }

    #[test]
    fn failed_grade_write_rolls_back_approval() {
        let conn = workspace();
        set_raw_grade(&conn, "s-1", "his", 1, 4.0);
        let p = create_previa(&conn, &directivo(), &new_previa("s-1", "his", 2)).expect("create");
        conn.execute_batch(
            "CREATE TRIGGER block_third_term BEFORE INSERT ON grades
             WHEN NEW.term = 3
             BEGIN SELECT RAISE(ABORT, 'third term locked'); END;",
        )
        .expect("trigger");

        let e = approve_previa(&conn, &directivo(), &p.id).expect_err("rolled back");
        assert_eq!(e.code(), "approval_failed");

        let stored = conn.previa(&p.id).expect("get").expect("present");
        assert_eq!(stored.state, PreviaState::Pendiente);
        assert_eq!(grade_rows(&conn, "s-1", "his"), vec![(1, Some(4.0))]);
    }

    #[test]
    fn approve_unknown_previa_is_not_found() {
        let conn = workspace();
        let e = approve_previa(&conn, &directivo(), "nope").expect_err("missing");
        assert_eq!(e.code(), "not_found");
    }

    #[test]
    fn remove_keeps_grades() {
        let conn = workspace();
        let p = create_previa(&conn, &directivo(), &new_previa("s-1", "len", 2)).expect("create");
        approve_previa(&conn, &directivo(), &p.id).expect("approve");
        remove_previa(&conn, &directivo(), &p.id).expect("remove");
        assert!(conn.previa(&p.id).expect("get").is_none());
        assert_eq!(grade_rows(&conn, "s-1", "len").len(), 3);

        let e = remove_previa(&conn, &directivo(), &p.id).expect_err("gone");
        assert_eq!(e.code(), "not_found");
    }

    #[test]
    fn list_filters_by_student() {
        let conn = workspace();
        create_previa(&conn, &directivo(), &new_previa("s-1", "len", 2)).expect("a");
        create_previa(&conn, &directivo(), &new_previa("s-2", "len", 2)).expect("b");
        assert_eq!(list_previas(&conn, None).expect("all").len(), 2);
        let mine = list_previas(&conn, Some("s-2")).expect("mine");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].student_id, "s-2");
    }
}
