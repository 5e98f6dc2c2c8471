use crate::calc::{compute_boletin, evaluate_promotion, evaluate_rows};
use crate::ipc::error::{respond, HandlerResult};
use crate::ipc::helpers::{param_str, require_db, to_json};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_boletin_compute(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = require_db(state)?;
    let student_id = param_str(req, "studentId")?;
    let rows = compute_boletin(conn, student_id)?;
    let promotion = evaluate_rows(&rows);
    Ok(json!({
        "studentId": student_id,
        "rows": to_json(&rows)?,
        "promotion": to_json(&promotion)?,
    }))
}

fn handle_promotion_evaluate(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = require_db(state)?;
    let student_id = param_str(req, "studentId")?;
    let result = evaluate_promotion(conn, student_id)?;
    to_json(&result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "boletin.compute" => Some(respond(&req.id, handle_boletin_compute(state, req))),
        "promotion.evaluate" => Some(respond(&req.id, handle_promotion_evaluate(state, req))),
        _ => None,
    }
}
