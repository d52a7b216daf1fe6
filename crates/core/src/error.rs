use crate::types::DbId;

/// Domain errors shared by every storyteller crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A parent-owned row is missing or belongs to someone else.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad credentials or an unusable token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
