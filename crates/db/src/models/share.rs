//! Share-token model.

use serde::Serialize;
use sqlx::FromRow;
use storyteller_core::types::{DbId, Timestamp};

/// A row from the `story_shares` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoryShare {
    pub token: String,
    pub story_id: DbId,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl StoryShare {
    /// A share without an expiry never expires.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn share(expires_at: Option<Timestamp>) -> StoryShare {
        StoryShare {
            token: "t".into(),
            story_id: 1,
            expires_at,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn expiry() {
        let now = Utc::now();
        assert!(!share(None).is_expired_at(now));
        assert!(!share(Some(now + Duration::days(1))).is_expired_at(now));
        assert!(share(Some(now - Duration::seconds(1))).is_expired_at(now));
    }
}
