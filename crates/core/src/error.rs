use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The lot has no free slot left.
    #[error("Lot {lot_id} is full")]
    LotFull { lot_id: DbId },

    /// An exit was requested for a session that has already been completed.
    #[error("Session {session_id} is already completed")]
    AlreadyCompleted { session_id: DbId },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
