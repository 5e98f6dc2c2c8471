use serde_json::json;
use thiserror::Error;

/// Failures surfaced by engine operations. Multi-step operations either
/// fully apply or fully roll back before returning one of these.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    InvalidTarget(String),

    #[error("{0}")]
    NotEligible(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("previa approval rolled back: {0}")]
    ApprovalFailed(#[source] rusqlite::Error),

    #[error("course transfer rolled back: {0}")]
    TransferFailed(#[source] rusqlite::Error),

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        EngineError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "bad_params",
            EngineError::NotFound { .. } => "not_found",
            EngineError::Duplicate(_) => "duplicate",
            EngineError::InvalidTarget(_) => "invalid_target",
            EngineError::NotEligible(_) => "not_eligible",
            EngineError::Forbidden(_) => "forbidden",
            EngineError::ApprovalFailed(_) => "approval_failed",
            EngineError::TransferFailed(_) => "transfer_failed",
            EngineError::Storage(_) => "db_query_failed",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            EngineError::NotFound { entity, id } => Some(json!({ "entity": entity, "id": id })),
            _ => None,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

pub(crate) fn require_manager(principal: &crate::model::Principal) -> EngineResult<()> {
    if principal.can_manage_records() {
        Ok(())
    } else {
        Err(EngineError::Forbidden(format!(
            "role {} may not modify academic records",
            principal.role.as_str()
        )))
    }
}
