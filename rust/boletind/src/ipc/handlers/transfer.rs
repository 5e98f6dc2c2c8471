use crate::ipc::error::{respond, HandlerResult};
use crate::ipc::helpers::{param_str, parse_actor, require_db, to_json};
use crate::ipc::types::{AppState, Request};
use crate::transfer::{transfer_course, transfer_eligibility};

fn handle_transfer_eligibility(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = require_db(state)?;
    let student_id = param_str(req, "studentId")?;
    let eligibility = transfer_eligibility(conn, student_id)?;
    to_json(&eligibility)
}

fn handle_transfer_apply(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = require_db(state)?;
    let actor = parse_actor(req)?;
    let student_id = param_str(req, "studentId")?;
    let target = param_str(req, "targetCourseId")?;

    let outcome = transfer_course(conn, &actor, student_id, target)?;
    tracing::info!(
        student = %outcome.student_id,
        from = %outcome.from_course.id,
        to = %outcome.to_course.id,
        previas_removed = outcome.previas_removed,
        actor = %actor.user_id,
        "student transferred"
    );
    to_json(&outcome)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "transfer.eligibility" => Some(respond(&req.id, handle_transfer_eligibility(state, req))),
        "transfer.apply" => Some(respond(&req.id, handle_transfer_apply(state, req))),
        _ => None,
    }
}
