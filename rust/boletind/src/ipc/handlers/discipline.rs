use crate::discipline::{list_disciplinary, record_disciplinary, NewDisciplinary};
use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{opt_str, param_str, parse_actor, require_db, to_json};
use crate::ipc::types::{AppState, Request};
use crate::model::SanctionType;
use chrono::NaiveDate;
use serde_json::json;

fn handle_discipline_record(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = require_db(state)?;
    let actor = parse_actor(req)?;
    let date = match opt_str(req, "date")? {
        Some(raw) => Some(
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| HandlerErr::bad_params("date must be YYYY-MM-DD"))?,
        ),
        None => None,
    };
    let new = NewDisciplinary {
        student_id: param_str(req, "studentId")?,
        date,
        reason: param_str(req, "reason")?,
        sanction: opt_str(req, "sanction")?.map(SanctionType::from_label),
        notes: opt_str(req, "notes")?,
    };

    let record = record_disciplinary(conn, &actor, &new)?;
    to_json(&record)
}

fn handle_discipline_list(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = require_db(state)?;
    let student_id = param_str(req, "studentId")?;
    let records = list_disciplinary(conn, student_id)?;
    Ok(json!({ "records": to_json(&records)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "discipline.record" => Some(respond(&req.id, handle_discipline_record(state, req))),
        "discipline.list" => Some(respond(&req.id, handle_discipline_list(state, req))),
        _ => None,
    }
}
