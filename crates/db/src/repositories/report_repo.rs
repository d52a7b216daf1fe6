//! Repository for the `story_reports` table.

use sqlx::types::Json;
use sqlx::PgPool;
use storyteller_core::report::StoryReport;
use storyteller_core::types::DbId;

use crate::models::report::StoryReportRow;

const COLUMNS: &str = "story_id, report, created_at, updated_at";

pub struct ReportRepo;

impl ReportRepo {
    /// The cached report for a story, if one was computed.
    pub async fn find(pool: &PgPool, story_id: DbId) -> Result<Option<StoryReportRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM story_reports WHERE story_id = $1");
        sqlx::query_as::<_, StoryReportRow>(&query)
            .bind(story_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or replace the cached report.
    pub async fn upsert(
        pool: &PgPool,
        story_id: DbId,
        report: &StoryReport,
    ) -> Result<StoryReportRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO story_reports (story_id, report)
             VALUES ($1, $2)
             ON CONFLICT (story_id) DO UPDATE SET report = EXCLUDED.report
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StoryReportRow>(&query)
            .bind(story_id)
            .bind(Json(report))
            .fetch_one(pool)
            .await
    }
}
