//! In-memory workspace shared by the unit tests.

use crate::db;
use crate::model::{Principal, Role};
use rusqlite::Connection;

pub fn workspace() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    db::init_schema(&conn).expect("init schema");
    conn.execute_batch(
        "INSERT INTO courses(id, year_level, division, specialty, active) VALUES
           ('c-3a', 3, 'A', 'Informática', 1),
           ('c-3b', 3, 'B', 'Informática', 1),
           ('c-3c', 3, 'C', NULL, 0),
           ('c-4a', 4, 'A', 'Informática', 1);
         INSERT INTO subjects(id, name, specialty, active) VALUES
           ('fis', 'Física', NULL, 1),
           ('his', 'Historia', NULL, 1),
           ('len', 'Lengua', NULL, 1),
           ('mat', 'Matemática', NULL, 1),
           ('tal', 'Taller', 'Informática', 0);
         INSERT INTO course_subjects(course_id, subject_id) VALUES
           ('c-3a', 'fis'), ('c-3a', 'his'), ('c-3a', 'len'), ('c-3a', 'mat'), ('c-3a', 'tal'),
           ('c-3b', 'his'), ('c-3b', 'len'), ('c-3b', 'mat');
         INSERT INTO students(id, last_name, first_name, dni, course_id, active) VALUES
           ('s-1', 'Gómez', 'Lucía', '40111222', 'c-3a', 1),
           ('s-2', 'Pérez', 'Tomás', '40333444', 'c-3a', 1),
           ('s-3', 'Ruiz', 'Ana', NULL, NULL, 1);",
    )
    .expect("seed workspace");
    conn
}

pub fn directivo() -> Principal {
    Principal::new("u-dir", Role::Directivo)
}

pub fn grade_value(conn: &Connection, student: &str, subject: &str, term: i64) -> Option<f64> {
    conn.query_row(
        "SELECT value FROM grades WHERE student_id = ? AND subject_id = ? AND term = ?",
        (student, subject, term),
        |r| r.get(0),
    )
    .unwrap_or(None)
}

pub fn set_raw_grade(conn: &Connection, student: &str, subject: &str, term: i64, value: f64) {
    conn.execute(
        "INSERT INTO grades(id, student_id, subject_id, term, value)
         VALUES(lower(hex(randomblob(8))), ?, ?, ?, ?)
         ON CONFLICT(student_id, subject_id, term) DO UPDATE SET value = excluded.value",
        (student, subject, term, value),
    )
    .expect("insert grade");
}
