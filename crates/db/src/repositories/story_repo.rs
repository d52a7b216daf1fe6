//! Repository for the `stories` table.

use sqlx::PgPool;
use storyteller_core::story::StoryStatus;
use storyteller_core::types::DbId;

use crate::models::section::{CreateSection, StorySection};
use crate::models::story::{CreateStory, Story};

const COLUMNS: &str = "id, parent_id, child_id, title, prompt, age_group, language, style, \
                        status, model, input_tokens, output_tokens, total_tokens, \
                        created_at, updated_at";

const SECTION_COLUMNS: &str = "id, story_id, idx, title, text, image_prompt, image_url, \
                                audio_url, created_at, updated_at";

/// Stories and their lifecycle status.
pub struct StoryRepo;

impl StoryRepo {
    /// Insert a story and all of its sections in one transaction.
    ///
    /// Returns the story with its sections ordered by `idx`.
    pub async fn create_with_sections(
        pool: &PgPool,
        parent_id: DbId,
        input: &CreateStory,
        sections: &[CreateSection],
    ) -> Result<(Story, Vec<StorySection>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO stories
                (parent_id, child_id, title, prompt, age_group, language, style,
                 model, input_tokens, output_tokens, total_tokens)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        let story = sqlx::query_as::<_, Story>(&query)
            .bind(parent_id)
            .bind(input.child_id)
            .bind(&input.title)
            .bind(&input.prompt)
            .bind(&input.age_group)
            .bind(&input.language)
            .bind(&input.style)
            .bind(&input.model)
            .bind(input.input_tokens)
            .bind(input.output_tokens)
            .bind(input.total_tokens)
            .fetch_one(&mut *tx)
            .await?;

        let section_query = format!(
            "INSERT INTO story_sections (story_id, idx, title, text, image_prompt)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {SECTION_COLUMNS}"
        );
        let mut rows = Vec::with_capacity(sections.len());
        for section in sections {
            let row = sqlx::query_as::<_, StorySection>(&section_query)
                .bind(story.id)
                .bind(section.idx)
                .bind(&section.title)
                .bind(&section.text)
                .bind(&section.image_prompt)
                .fetch_one(&mut *tx)
                .await?;
            rows.push(row);
        }

        tx.commit().await?;
        rows.sort_by_key(|s| s.idx);

        tracing::debug!(story_id = story.id, sections = rows.len(), "Story persisted");
        Ok((story, rows))
    }

    /// Find a story owned by `parent_id`.
    pub async fn find_for_parent(
        pool: &PgPool,
        parent_id: DbId,
        id: DbId,
    ) -> Result<Option<Story>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stories WHERE id = $1 AND parent_id = $2");
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .bind(parent_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a story without an ownership check. Only for share-token reads.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Story>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stories WHERE id = $1");
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a parent's stories newest first, optionally for one child.
    pub async fn list_for_parent(
        pool: &PgPool,
        parent_id: DbId,
        child_id: Option<DbId>,
    ) -> Result<Vec<Story>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM stories
             WHERE parent_id = $1
               AND ($2::BIGINT IS NULL OR child_id = $2)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Story>(&query)
            .bind(parent_id)
            .bind(child_id)
            .fetch_all(pool)
            .await
    }

    /// Set the lifecycle status of a story owned by `parent_id`. Returns
    /// `true` if the row was updated.
    pub async fn set_status(
        pool: &PgPool,
        parent_id: DbId,
        id: DbId,
        status: StoryStatus,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE stories SET status = $3 WHERE id = $1 AND parent_id = $2")
                .bind(id)
                .bind(parent_id)
                .bind(status.as_str())
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a story; sections, shares, learning and reports cascade.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, parent_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1 AND parent_id = $2")
            .bind(id)
            .bind(parent_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
