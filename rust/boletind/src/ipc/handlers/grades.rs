use crate::config::CalendarSettings;
use crate::grades::{current_term, grade_entries, record_grade};
use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{opt_str, param_i64, param_str, parse_actor, require_db, to_json};
use crate::ipc::types::{AppState, Request};
use chrono::NaiveDate;
use serde_json::json;

fn parse_value(req: &Request) -> Result<Option<f64>, HandlerErr> {
    match req.params.get("value") {
        None => Err(HandlerErr::bad_params("missing value (use null to clear)")),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params("value must be a number or null")),
    }
}

fn handle_grades_set(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = require_db(state)?;
    let actor = parse_actor(req)?;
    let student_id = param_str(req, "studentId")?;
    let subject_id = param_str(req, "subjectId")?;
    let term = param_i64(req, "term")?;
    let value = parse_value(req)?;
    let note = opt_str(req, "note")?;

    let entry = record_grade(conn, &actor, student_id, subject_id, term, value, note)?;
    to_json(&entry)
}

fn handle_grades_list(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = require_db(state)?;
    let student_id = param_str(req, "studentId")?;
    let subject_id = opt_str(req, "subjectId")?;
    let grades = grade_entries(conn, student_id, subject_id)?;
    Ok(json!({ "grades": to_json(&grades)? }))
}

fn handle_current_term(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = require_db(state)?;
    let date = match opt_str(req, "date")? {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|_| HandlerErr::bad_params("date must be YYYY-MM-DD"))?,
        None => chrono::Local::now().date_naive(),
    };
    let calendar = CalendarSettings::load(conn)
        .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?;
    let term = current_term(date, &calendar);
    Ok(json!({ "date": date.to_string(), "term": term.number() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.set" => Some(respond(&req.id, handle_grades_set(state, req))),
        "grades.list" => Some(respond(&req.id, handle_grades_list(state, req))),
        "grades.currentTerm" => Some(respond(&req.id, handle_current_term(state, req))),
        _ => None,
    }
}
