use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{opt_str, require_db, to_json};
use crate::ipc::types::{AppState, Request};
use crate::roster::{import_roster, load_roster_file, Roster};
use std::path::PathBuf;

fn handle_roster_import(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = require_db(state)?;

    let roster: Roster = if let Some(path) = opt_str(req, "path")? {
        load_roster_file(&PathBuf::from(path))
            .map_err(|e| HandlerErr::new("io_failed", format!("{e:#}")))?
    } else if let Some(inline) = req.params.get("roster") {
        serde_json::from_value(inline.clone())
            .map_err(|e| HandlerErr::bad_params(format!("invalid roster: {}", e)))?
    } else {
        return Err(HandlerErr::bad_params("missing path or roster"));
    };

    let summary = import_roster(conn, &roster)
        .map_err(|e| HandlerErr::new("import_failed", format!("{e:#}")))?;
    tracing::info!(
        courses = summary.courses,
        subjects = summary.subjects,
        students = summary.students,
        "roster imported"
    );
    to_json(&summary)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.import" => Some(respond(&req.id, handle_roster_import(state, req))),
        _ => None,
    }
}
