use crate::ipc::error::HandlerErr;
use crate::ipc::types::{AppState, Request};
use crate::model::{Principal, Role};
use rusqlite::Connection;

pub fn require_db<'a>(state: &'a AppState) -> Result<&'a Connection, HandlerErr> {
    state
        .db
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn param_str<'a>(req: &'a Request, key: &str) -> Result<&'a str, HandlerErr> {
    match req.params.get(key).and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim()),
        _ => Err(HandlerErr::bad_params(format!("missing {}", key))),
    }
}

pub fn opt_str<'a>(req: &'a Request, key: &str) -> Result<Option<&'a str>, HandlerErr> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v
            .as_str()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a string", key))),
    }
}

pub fn param_i64(req: &Request, key: &str) -> Result<i64, HandlerErr> {
    req.params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// `{ "actor": { "userId": "...", "role": "directivo" } }`
pub fn parse_actor(req: &Request) -> Result<Principal, HandlerErr> {
    let Some(actor) = req.params.get("actor").and_then(|v| v.as_object()) else {
        return Err(HandlerErr::bad_params("missing actor"));
    };
    let user_id = match actor.get("userId").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return Err(HandlerErr::bad_params("missing actor.userId")),
    };
    let Some(role) = actor
        .get("role")
        .and_then(|v| v.as_str())
        .and_then(Role::parse)
    else {
        return Err(HandlerErr::bad_params(
            "actor.role must be one of: admin, directivo, profesor, preceptor, secretario",
        ));
    };
    Ok(Principal { user_id, role })
}

pub fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, HandlerErr> {
    serde_json::to_value(value).map_err(|e| HandlerErr::new("internal", e.to_string()))
}
