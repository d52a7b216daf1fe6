//! Cached safety/readability report row.

use sqlx::types::Json;
use sqlx::FromRow;
use storyteller_core::report::StoryReport;
use storyteller_core::types::{DbId, Timestamp};

/// A row from the `story_reports` table.
#[derive(Debug, Clone, FromRow)]
pub struct StoryReportRow {
    pub story_id: DbId,
    pub report: Json<StoryReport>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
