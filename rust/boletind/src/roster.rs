//! Seeds a workspace from the enrollment system's roster export: courses,
//! subjects, subject assignments and students, upserted by id.

use anyhow::{anyhow, Context};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterCourse {
    pub id: String,
    pub year_level: i64,
    pub division: String,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSubject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterAssignment {
    pub course_id: String,
    pub subject_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterStudent {
    pub id: String,
    pub last_name: String,
    pub first_name: String,
    #[serde(default)]
    pub dni: Option<String>,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    #[serde(default)]
    pub courses: Vec<RosterCourse>,
    #[serde(default)]
    pub subjects: Vec<RosterSubject>,
    #[serde(default)]
    pub assignments: Vec<RosterAssignment>,
    #[serde(default)]
    pub students: Vec<RosterStudent>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSummary {
    pub courses: usize,
    pub subjects: usize,
    pub assignments: usize,
    pub students: usize,
}

pub fn load_roster_file(path: &Path) -> anyhow::Result<Roster> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read roster {}", path.to_string_lossy()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse roster {}", path.to_string_lossy()))
}

pub fn import_roster(conn: &Connection, roster: &Roster) -> anyhow::Result<RosterSummary> {
    for c in &roster.courses {
        if !(crate::model::MIN_YEAR_LEVEL..=crate::model::MAX_YEAR_LEVEL).contains(&c.year_level) {
            return Err(anyhow!(
                "course {} has year level {} outside 1..=7",
                c.id,
                c.year_level
            ));
        }
    }

    let tx = conn.unchecked_transaction()?;

    for c in &roster.courses {
        tx.execute(
            "INSERT INTO courses(id, year_level, division, specialty, active)
             VALUES(?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
               year_level = excluded.year_level,
               division = excluded.division,
               specialty = excluded.specialty,
               active = excluded.active",
            (&c.id, c.year_level, c.division.trim(), &c.specialty, c.active as i64),
        )
        .with_context(|| format!("failed to import course {}", c.id))?;
    }

    for s in &roster.subjects {
        tx.execute(
            "INSERT INTO subjects(id, name, specialty, active)
             VALUES(?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
               name = excluded.name,
               specialty = excluded.specialty,
               active = excluded.active",
            (&s.id, s.name.trim(), &s.specialty, s.active as i64),
        )
        .with_context(|| format!("failed to import subject {}", s.id))?;
    }

    for a in &roster.assignments {
        tx.execute(
            "INSERT OR IGNORE INTO course_subjects(course_id, subject_id) VALUES(?, ?)",
            (&a.course_id, &a.subject_id),
        )
        .with_context(|| {
            format!(
                "failed to assign subject {} to course {}",
                a.subject_id, a.course_id
            )
        })?;
    }

    for s in &roster.students {
        tx.execute(
            "INSERT INTO students(id, last_name, first_name, dni, course_id, active)
             VALUES(?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
               last_name = excluded.last_name,
               first_name = excluded.first_name,
               dni = excluded.dni,
               course_id = excluded.course_id,
               active = excluded.active",
            (
                &s.id,
                s.last_name.trim(),
                s.first_name.trim(),
                &s.dni,
                &s.course_id,
                s.active as i64,
            ),
        )
        .with_context(|| format!("failed to import student {}", s.id))?;
    }

    tx.commit()?;

    Ok(RosterSummary {
        courses: roster.courses.len(),
        subjects: roster.subjects.len(),
        assignments: roster.assignments.len(),
        students: roster.students.len(),
    })
}
