use async_trait::async_trait;
use uuid::Uuid;

use crate::store::postgres::PgStore;
use crate::timezones::repo_types::TimeZone;

#[async_trait]
pub trait TimeZoneRepo: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<TimeZone>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<TimeZone>>;
    async fn find_by_abbreviation(&self, abbreviation: &str) -> anyhow::Result<Option<TimeZone>>;
}

#[async_trait]
impl TimeZoneRepo for PgStore {
    async fn list(&self) -> anyhow::Result<Vec<TimeZone>> {
        let rows = sqlx::query_as::<_, TimeZone>(
            "SELECT id, abbreviation, name, utc_offset FROM time_zones ORDER BY utc_offset, abbreviation",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<TimeZone>> {
        let row = sqlx::query_as::<_, TimeZone>(
            "SELECT id, abbreviation, name, utc_offset FROM time_zones WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_by_abbreviation(&self, abbreviation: &str) -> anyhow::Result<Option<TimeZone>> {
        let row = sqlx::query_as::<_, TimeZone>(
            "SELECT id, abbreviation, name, utc_offset FROM time_zones WHERE abbreviation = $1",
        )
        .bind(abbreviation)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }
}
