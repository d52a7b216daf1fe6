//! Repository for the `story_shares` table.

use sqlx::PgPool;
use storyteller_core::types::{DbId, Timestamp};

use crate::models::share::StoryShare;

const COLUMNS: &str = "token, story_id, expires_at, created_at, updated_at";

pub struct ShareRepo;

impl ShareRepo {
    /// Insert a share token for a story.
    pub async fn create(
        pool: &PgPool,
        story_id: DbId,
        token: &str,
        expires_at: Option<Timestamp>,
    ) -> Result<StoryShare, sqlx::Error> {
        let query = format!(
            "INSERT INTO story_shares (token, story_id, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StoryShare>(&query)
            .bind(token)
            .bind(story_id)
            .bind(expires_at)
            .fetch_one(pool)
            .await
    }

    /// Look up a share by token, expired or not.
    pub async fn find(pool: &PgPool, token: &str) -> Result<Option<StoryShare>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM story_shares WHERE token = $1");
        sqlx::query_as::<_, StoryShare>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }
}
