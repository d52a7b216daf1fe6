//! Parent account model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use storyteller_core::types::{DbId, Timestamp};

/// Full row from the `parents` table.
///
/// Contains the password hash -- never serialize this to API responses.
/// Use [`ParentResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct Parent {
    pub id: DbId,
    pub email: String,
    pub password_hash: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe parent representation for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ParentResponse {
    pub id: DbId,
    pub email: String,
    pub created_at: Timestamp,
}

impl From<&Parent> for ParentResponse {
    fn from(parent: &Parent) -> Self {
        Self {
            id: parent.id,
            email: parent.email.clone(),
            created_at: parent.created_at,
        }
    }
}

/// DTO for creating a parent. The email must already be normalized.
#[derive(Debug)]
pub struct CreateParent {
    pub email: String,
    pub password_hash: String,
}
