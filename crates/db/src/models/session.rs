//! Refresh-token session model.

use sqlx::FromRow;
use storyteller_core::types::{DbId, Timestamp};

/// A row from the `sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: DbId,
    pub parent_id: DbId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
    pub is_revoked: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new session.
pub struct CreateSession {
    pub parent_id: DbId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
}
