//! Repository for the `children` table.

use sqlx::PgPool;
use storyteller_core::types::DbId;

use crate::models::child::{Child, CreateChild};

const COLUMNS: &str = "id, parent_id, name, age, interests, created_at, updated_at";

/// Child profiles, always scoped to their parent.
pub struct ChildRepo;

impl ChildRepo {
    /// Insert a child profile for `parent_id`.
    ///
    /// The `ck_children_age` constraint rejects ages outside 2..=12.
    pub async fn create(
        pool: &PgPool,
        parent_id: DbId,
        input: &CreateChild,
    ) -> Result<Child, sqlx::Error> {
        let query = format!(
            "INSERT INTO children (parent_id, name, age, interests)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Child>(&query)
            .bind(parent_id)
            .bind(&input.name)
            .bind(input.age)
            .bind(&input.interests)
            .fetch_one(pool)
            .await
    }

    /// List a parent's children, oldest profile first.
    pub async fn list_for_parent(pool: &PgPool, parent_id: DbId) -> Result<Vec<Child>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM children WHERE parent_id = $1 ORDER BY created_at, id");
        sqlx::query_as::<_, Child>(&query)
            .bind(parent_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_for_parent(
        pool: &PgPool,
        parent_id: DbId,
        id: DbId,
    ) -> Result<Option<Child>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM children WHERE id = $1 AND parent_id = $2");
        sqlx::query_as::<_, Child>(&query)
            .bind(id)
            .bind(parent_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a child. Stories keep existing with `child_id` cleared.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, parent_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM children WHERE id = $1 AND parent_id = $2")
            .bind(id)
            .bind(parent_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
