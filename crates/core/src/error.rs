use crate::types::DbId;

/// Failures the HTTP layer maps onto status codes.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Input that is well-formed but not acceptable (400).
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not authenticated: {0}")]
    Unauthorized(String),

    #[error("not allowed: {0}")]
    Forbidden(String),
}
