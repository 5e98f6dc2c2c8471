//! Data-access seams the engine reads and writes through.
//!
//! Every trait is implemented for [`rusqlite::Connection`]; a
//! [`rusqlite::Transaction`] derefs to a connection, so the same calls run
//! inside a unit of work unchanged.

use crate::model::{
    CourseSection, DisciplinaryRecord, GradeEntry, PreviaRecord, PreviaState, SanctionType,
    Student, Subject, Term,
};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

pub trait Enrollment {
    fn student(&self, student_id: &str) -> rusqlite::Result<Option<Student>>;
    fn course(&self, course_id: &str) -> rusqlite::Result<Option<CourseSection>>;
    fn set_student_course(&self, student_id: &str, course_id: &str) -> rusqlite::Result<usize>;
    /// Active sections of `year_level`, excluding `excluding_course_id`, ordered by division.
    fn same_year_courses(
        &self,
        year_level: i64,
        excluding_course_id: &str,
    ) -> rusqlite::Result<Vec<CourseSection>>;
}

pub trait SubjectCatalog {
    fn subject(&self, subject_id: &str) -> rusqlite::Result<Option<Subject>>;
    /// Active subjects assigned to a course section, ordered by name.
    fn subjects_for_course(&self, course_id: &str) -> rusqlite::Result<Vec<Subject>>;
}

pub trait GradeStore {
    fn get_grade(
        &self,
        student_id: &str,
        subject_id: &str,
        term: Term,
    ) -> rusqlite::Result<Option<GradeEntry>>;
    fn grades_for_student(&self, student_id: &str) -> rusqlite::Result<Vec<GradeEntry>>;
    /// Inserts the (student, subject, term) entry or updates it in place.
    fn upsert_grade(&self, entry: &GradeEntry) -> rusqlite::Result<()>;
}

pub trait PreviaStore {
    fn previa(&self, previa_id: &str) -> rusqlite::Result<Option<PreviaRecord>>;
    fn previas(&self, student_id: Option<&str>) -> rusqlite::Result<Vec<PreviaRecord>>;
    /// A not-yet-approved record for the same student, subject and prior year.
    fn find_open_previa(
        &self,
        student_id: &str,
        subject_id: &str,
        prior_year: i64,
    ) -> rusqlite::Result<Option<PreviaRecord>>;
    /// An approved record for the subject, whatever its prior year.
    fn approved_previa(
        &self,
        student_id: &str,
        subject_id: &str,
    ) -> rusqlite::Result<Option<PreviaRecord>>;
    fn insert_previa(&self, record: &PreviaRecord) -> rusqlite::Result<()>;
    fn set_previa_state(
        &self,
        previa_id: &str,
        state: PreviaState,
        notes: Option<&str>,
    ) -> rusqlite::Result<usize>;
    fn delete_previa(&self, previa_id: &str) -> rusqlite::Result<usize>;
    fn delete_all_previas(&self, student_id: &str) -> rusqlite::Result<usize>;
}

pub trait DisciplinaryStore {
    fn count_by_type(&self, student_id: &str, sanction: &SanctionType) -> rusqlite::Result<i64>;
    fn append_disciplinary(&self, record: &DisciplinaryRecord) -> rusqlite::Result<()>;
    fn disciplinary_for_student(&self, student_id: &str)
        -> rusqlite::Result<Vec<DisciplinaryRecord>>;
}

fn conversion_err(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn course_from_row(r: &Row<'_>) -> rusqlite::Result<CourseSection> {
    Ok(CourseSection {
        id: r.get(0)?,
        year_level: r.get(1)?,
        division: r.get(2)?,
        specialty: r.get(3)?,
        active: r.get::<_, i64>(4)? != 0,
    })
}

fn grade_from_row(r: &Row<'_>) -> rusqlite::Result<GradeEntry> {
    let term_no: i64 = r.get(2)?;
    let term = Term::from_number(term_no)
        .ok_or_else(|| conversion_err(2, format!("invalid term {}", term_no)))?;
    Ok(GradeEntry {
        student_id: r.get(0)?,
        subject_id: r.get(1)?,
        term,
        value: r.get(3)?,
        note: r.get(4)?,
        user_id: r.get(5)?,
    })
}

fn previa_from_row(r: &Row<'_>) -> rusqlite::Result<PreviaRecord> {
    let state_raw: String = r.get(5)?;
    let state = PreviaState::parse(&state_raw)
        .ok_or_else(|| conversion_err(5, format!("invalid previa state {}", state_raw)))?;
    Ok(PreviaRecord {
        id: r.get(0)?,
        student_id: r.get(1)?,
        subject_id: r.get(2)?,
        subject_name: r.get(3)?,
        prior_year: r.get(4)?,
        state,
        notes: r.get(6)?,
        created_at: r.get(7)?,
    })
}

fn disciplinary_from_row(r: &Row<'_>) -> rusqlite::Result<DisciplinaryRecord> {
    let sanction: Option<String> = r.get(4)?;
    Ok(DisciplinaryRecord {
        id: r.get(0)?,
        student_id: r.get(1)?,
        date: r.get(2)?,
        reason: r.get(3)?,
        sanction: sanction.map(|s| SanctionType::from_label(&s)),
        notes: r.get(5)?,
        user_id: r.get(6)?,
    })
}

const COURSE_COLUMNS: &str = "id, year_level, division, specialty, active";
const GRADE_COLUMNS: &str = "student_id, subject_id, term, value, note, user_id";
const PREVIA_SELECT: &str = "SELECT p.id, p.student_id, p.subject_id, s.name, p.prior_year,
                                    p.state, p.notes, p.created_at
                             FROM previas p
                             LEFT JOIN subjects s ON s.id = p.subject_id";

impl Enrollment for Connection {
    fn student(&self, student_id: &str) -> rusqlite::Result<Option<Student>> {
        self.query_row(
            "SELECT id, last_name, first_name, dni, course_id, active
             FROM students
             WHERE id = ?",
            [student_id],
            |r| {
                Ok(Student {
                    id: r.get(0)?,
                    last_name: r.get(1)?,
                    first_name: r.get(2)?,
                    dni: r.get(3)?,
                    course_id: r.get(4)?,
                    active: r.get::<_, i64>(5)? != 0,
                })
            },
        )
        .optional()
    }

    fn course(&self, course_id: &str) -> rusqlite::Result<Option<CourseSection>> {
        self.query_row(
            &format!("SELECT {} FROM courses WHERE id = ?", COURSE_COLUMNS),
            [course_id],
            course_from_row,
        )
        .optional()
    }

    fn set_student_course(&self, student_id: &str, course_id: &str) -> rusqlite::Result<usize> {
        self.execute(
            "UPDATE students SET course_id = ? WHERE id = ?",
            (course_id, student_id),
        )
    }

    fn same_year_courses(
        &self,
        year_level: i64,
        excluding_course_id: &str,
    ) -> rusqlite::Result<Vec<CourseSection>> {
        let mut stmt = self.prepare(&format!(
            "SELECT {} FROM courses
             WHERE year_level = ? AND id <> ? AND active = 1
             ORDER BY division",
            COURSE_COLUMNS
        ))?;
        let rows = stmt
            .query_map((year_level, excluding_course_id), course_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl SubjectCatalog for Connection {
    fn subject(&self, subject_id: &str) -> rusqlite::Result<Option<Subject>> {
        self.query_row(
            "SELECT id, name, specialty FROM subjects WHERE id = ?",
            [subject_id],
            |r| {
                Ok(Subject {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    specialty: r.get(2)?,
                })
            },
        )
        .optional()
    }

    fn subjects_for_course(&self, course_id: &str) -> rusqlite::Result<Vec<Subject>> {
        let mut stmt = self.prepare(
            "SELECT s.id, s.name, s.specialty
             FROM subjects s
             JOIN course_subjects cs ON cs.subject_id = s.id
             WHERE cs.course_id = ? AND s.active = 1
             ORDER BY s.name, s.id",
        )?;
        let rows = stmt
            .query_map([course_id], |r| {
                Ok(Subject {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    specialty: r.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl GradeStore for Connection {
    fn get_grade(
        &self,
        student_id: &str,
        subject_id: &str,
        term: Term,
    ) -> rusqlite::Result<Option<GradeEntry>> {
        self.query_row(
            &format!(
                "SELECT {} FROM grades WHERE student_id = ? AND subject_id = ? AND term = ?",
                GRADE_COLUMNS
            ),
            (student_id, subject_id, term.number()),
            grade_from_row,
        )
        .optional()
    }

    fn grades_for_student(&self, student_id: &str) -> rusqlite::Result<Vec<GradeEntry>> {
        let mut stmt = self.prepare(&format!(
            "SELECT {} FROM grades
             WHERE student_id = ?
             ORDER BY subject_id, term",
            GRADE_COLUMNS
        ))?;
        let rows = stmt
            .query_map([student_id], grade_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn upsert_grade(&self, entry: &GradeEntry) -> rusqlite::Result<()> {
        let grade_id = Uuid::new_v4().to_string();
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.execute(
            "INSERT INTO grades(id, student_id, subject_id, term, value, note, user_id, updated_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(student_id, subject_id, term) DO UPDATE SET
               value = excluded.value,
               note = excluded.note,
               user_id = excluded.user_id,
               updated_at = excluded.updated_at",
            (
                &grade_id,
                &entry.student_id,
                &entry.subject_id,
                entry.term.number(),
                entry.value,
                &entry.note,
                &entry.user_id,
                &updated_at,
            ),
        )?;
        Ok(())
    }
}

impl PreviaStore for Connection {
    fn previa(&self, previa_id: &str) -> rusqlite::Result<Option<PreviaRecord>> {
        self.query_row(
            &format!("{} WHERE p.id = ?", PREVIA_SELECT),
            [previa_id],
            previa_from_row,
        )
        .optional()
    }

    fn previas(&self, student_id: Option<&str>) -> rusqlite::Result<Vec<PreviaRecord>> {
        let mut stmt = self.prepare(&format!(
            "{} WHERE (?1 IS NULL OR p.student_id = ?1)
             ORDER BY p.student_id, p.prior_year, s.name",
            PREVIA_SELECT
        ))?;
        let rows = stmt
            .query_map([student_id], previa_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn find_open_previa(
        &self,
        student_id: &str,
        subject_id: &str,
        prior_year: i64,
    ) -> rusqlite::Result<Option<PreviaRecord>> {
        self.query_row(
            &format!(
                "{} WHERE p.student_id = ? AND p.subject_id = ? AND p.prior_year = ?
                   AND p.state <> 'aprobada'
                 LIMIT 1",
                PREVIA_SELECT
            ),
            (student_id, subject_id, prior_year),
            previa_from_row,
        )
        .optional()
    }

    fn approved_previa(
        &self,
        student_id: &str,
        subject_id: &str,
    ) -> rusqlite::Result<Option<PreviaRecord>> {
        self.query_row(
            &format!(
                "{} WHERE p.student_id = ? AND p.subject_id = ? AND p.state = 'aprobada'
                 LIMIT 1",
                PREVIA_SELECT
            ),
            (student_id, subject_id),
            previa_from_row,
        )
        .optional()
    }

    fn insert_previa(&self, record: &PreviaRecord) -> rusqlite::Result<()> {
        let created_at = record
            .created_at
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
        self.execute(
            "INSERT INTO previas(id, student_id, subject_id, prior_year, state, notes, created_at)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                &record.id,
                &record.student_id,
                &record.subject_id,
                record.prior_year,
                record.state.as_str(),
                &record.notes,
                &created_at,
            ),
        )?;
        Ok(())
    }

    fn set_previa_state(
        &self,
        previa_id: &str,
        state: PreviaState,
        notes: Option<&str>,
    ) -> rusqlite::Result<usize> {
        self.execute(
            "UPDATE previas SET state = ?, notes = COALESCE(?, notes) WHERE id = ?",
            (state.as_str(), notes, previa_id),
        )
    }

    fn delete_previa(&self, previa_id: &str) -> rusqlite::Result<usize> {
        self.execute("DELETE FROM previas WHERE id = ?", [previa_id])
    }

    fn delete_all_previas(&self, student_id: &str) -> rusqlite::Result<usize> {
        self.execute("DELETE FROM previas WHERE student_id = ?", [student_id])
    }
}

impl DisciplinaryStore for Connection {
    fn count_by_type(&self, student_id: &str, sanction: &SanctionType) -> rusqlite::Result<i64> {
        self.query_row(
            "SELECT COUNT(*) FROM disciplinary_records WHERE student_id = ? AND sanction = ?",
            (student_id, sanction.label()),
            |r| r.get(0),
        )
    }

    fn append_disciplinary(&self, record: &DisciplinaryRecord) -> rusqlite::Result<()> {
        self.execute(
            "INSERT INTO disciplinary_records(id, student_id, date, reason, sanction, notes, user_id)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                &record.id,
                &record.student_id,
                record.date,
                &record.reason,
                record.sanction.as_ref().map(|s| s.label()),
                &record.notes,
                &record.user_id,
            ),
        )?;
        Ok(())
    }

    fn disciplinary_for_student(
        &self,
        student_id: &str,
    ) -> rusqlite::Result<Vec<DisciplinaryRecord>> {
        let mut stmt = self.prepare(
            "SELECT id, student_id, date, reason, sanction, notes, user_id
             FROM disciplinary_records
             WHERE student_id = ?
             ORDER BY date DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map([student_id], disciplinary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
