use crate::config::CalendarSettings;
use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{require_db, to_json};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

#[derive(Clone, Copy)]
enum SetupSection {
    Calendar,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "calendar" => Some(Self::Calendar),
            _ => None,
        }
    }
}

fn handle_setup_get(state: &mut AppState, _req: &Request) -> HandlerResult {
    let conn = require_db(state)?;
    let calendar = CalendarSettings::load(conn)
        .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?;
    Ok(json!({ "calendar": to_json(&calendar)? }))
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = require_db(state)?;
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return Err(HandlerErr::bad_params("missing section"));
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return Err(HandlerErr::bad_params("unknown section"));
    };
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return Err(HandlerErr::bad_params("patch must be an object"));
    };

    match section {
        SetupSection::Calendar => {
            let mut current = CalendarSettings::load(conn)
                .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?;
            current.merge_patch(patch).map_err(HandlerErr::bad_params)?;
            current
                .save(conn)
                .map_err(|e| HandlerErr::new("db_update_failed", e.to_string()))?;
            Ok(json!({ "calendar": to_json(&current)? }))
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(respond(&req.id, handle_setup_get(state, req))),
        "setup.update" => Some(respond(&req.id, handle_setup_update(state, req))),
        _ => None,
    }
}
