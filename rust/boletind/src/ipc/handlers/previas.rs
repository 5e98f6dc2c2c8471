use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{opt_str, param_i64, param_str, parse_actor, require_db, to_json};
use crate::ipc::types::{AppState, Request};
use crate::model::PreviaState;
use crate::previas::{
    approve_previa, create_previa, list_previas, regularize_previa, remove_previa, NewPrevia,
};
use serde_json::json;

fn handle_previas_list(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = require_db(state)?;
    let student_id = opt_str(req, "studentId")?;
    let previas = list_previas(conn, student_id)?;
    Ok(json!({ "previas": to_json(&previas)? }))
}

fn handle_previas_create(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = require_db(state)?;
    let actor = parse_actor(req)?;
    let state_param = match opt_str(req, "state")? {
        Some(raw) => Some(PreviaState::parse(raw).ok_or_else(|| {
            HandlerErr::bad_params("state must be one of: pendiente, regularizada")
        })?),
        None => None,
    };
    let new = NewPrevia {
        student_id: param_str(req, "studentId")?,
        subject_id: param_str(req, "subjectId")?,
        prior_year: param_i64(req, "priorYear")?,
        state: state_param,
        notes: opt_str(req, "notes")?,
    };

    let previa = create_previa(conn, &actor, &new)?;
    tracing::info!(previa = %previa.id, student = %previa.student_id, "previa created");
    to_json(&previa)
}

fn handle_previas_regularize(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = require_db(state)?;
    let actor = parse_actor(req)?;
    let previa_id = param_str(req, "previaId")?;
    let previa = regularize_previa(conn, &actor, previa_id)?;
    to_json(&previa)
}

fn handle_previas_approve(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = require_db(state)?;
    let actor = parse_actor(req)?;
    let previa_id = param_str(req, "previaId")?;
    let previa = approve_previa(conn, &actor, previa_id)?;
    tracing::info!(
        previa = %previa.id,
        student = %previa.student_id,
        subject = %previa.subject_id,
        actor = %actor.user_id,
        "previa approved"
    );
    to_json(&previa)
}

fn handle_previas_remove(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = require_db(state)?;
    let actor = parse_actor(req)?;
    let previa_id = param_str(req, "previaId")?;
    remove_previa(conn, &actor, previa_id)?;
    tracing::info!(previa = %previa_id, actor = %actor.user_id, "previa removed");
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "previas.list" => Some(respond(&req.id, handle_previas_list(state, req))),
        "previas.create" => Some(respond(&req.id, handle_previas_create(state, req))),
        "previas.regularize" => Some(respond(&req.id, handle_previas_regularize(state, req))),
        "previas.approve" => Some(respond(&req.id, handle_previas_approve(state, req))),
        "previas.remove" => Some(respond(&req.id, handle_previas_remove(state, req))),
        _ => None,
    }
}
