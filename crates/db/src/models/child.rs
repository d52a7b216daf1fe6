//! Child profile model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storyteller_core::types::{DbId, Timestamp};

/// A row from the `children` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Child {
    pub id: DbId,
    pub parent_id: DbId,
    pub name: String,
    pub age: i32,
    pub interests: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a child profile. The owning parent comes from the
/// authenticated request, not the body.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateChild {
    pub name: String,
    pub age: i32,
    pub interests: String,
}
