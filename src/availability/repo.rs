use anyhow::Context;
use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::availability::repo_types::{AvailabilityWindow, NewWindow};
use crate::store::postgres::PgStore;

#[async_trait]
pub trait AvailabilityRepo: Send + Sync {
    /// Ordered by (week_day, to_time).
    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<AvailabilityWindow>>;
    /// Drops every window of the user and stores `windows` in their place, atomically.
    async fn replace_for_user(
        &self,
        user_id: Uuid,
        windows: &[NewWindow],
    ) -> anyhow::Result<Vec<AvailabilityWindow>>;
}

async fn insert_window_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    w: &NewWindow,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO availability_windows (user_id, week_day, from_time, to_time)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id)
    .bind(w.week_day)
    .bind(w.from_time)
    .bind(w.to_time)
    .execute(&mut **tx)
    .await
    .context("insert availability window")?;
    Ok(())
}

#[async_trait]
impl AvailabilityRepo for PgStore {
    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<AvailabilityWindow>> {
        let rows = sqlx::query_as::<_, AvailabilityWindow>(
            r#"
            SELECT id, user_id, week_day, from_time, to_time
              FROM availability_windows
             WHERE user_id = $1
             ORDER BY week_day ASC, to_time ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list availability windows")?;
        Ok(rows)
    }

    async fn replace_for_user(
        &self,
        user_id: Uuid,
        windows: &[NewWindow],
    ) -> anyhow::Result<Vec<AvailabilityWindow>> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        sqlx::query("DELETE FROM availability_windows WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("delete availability windows")?;
        for w in windows {
            insert_window_tx(&mut tx, user_id, w).await?;
        }
        tx.commit().await.context("commit tx")?;

        self.list_for_user(user_id).await
    }
}
