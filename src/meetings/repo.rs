use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use crate::meetings::repo_types::{Meeting, MeetingQuery, MeetingRow, MeetingStatus, NewMeeting};
use crate::store::postgres::PgStore;

const MEETING_COLUMNS: &str = r#"
    id, organizer_id, attendee_id, status, start_at, end_at, from_time, to_time,
    subject, notes, room_id, room_pin, created_at
"#;

#[async_trait]
pub trait MeetingRepo: Send + Sync {
    async fn insert(&self, meeting: NewMeeting) -> anyhow::Result<Meeting>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Meeting>>;
    async fn find_by_room(&self, room_id: &str) -> anyhow::Result<Option<Meeting>>;
    /// Writes `next`. With `expected` set the write only happens while the stored
    /// status still equals it; `None` is returned when nothing was written.
    async fn set_status(
        &self,
        id: Uuid,
        expected: Option<MeetingStatus>,
        next: MeetingStatus,
    ) -> anyhow::Result<Option<Meeting>>;
    /// Ascending by start.
    async fn list(&self, query: &MeetingQuery) -> anyhow::Result<Vec<Meeting>>;
}

#[async_trait]
impl MeetingRepo for PgStore {
    async fn insert(&self, m: NewMeeting) -> anyhow::Result<Meeting> {
        let row = sqlx::query_as::<_, MeetingRow>(&format!(
            r#"
            INSERT INTO meetings (organizer_id, attendee_id, status, start_at, end_at,
                                  from_time, to_time, subject, notes, room_id, room_pin)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {MEETING_COLUMNS}
            "#
        ))
        .bind(m.organizer_id)
        .bind(m.attendee_id)
        .bind(MeetingStatus::Pending.as_str())
        .bind(m.start_at)
        .bind(m.end_at)
        .bind(m.from_time)
        .bind(m.to_time)
        .bind(&m.subject)
        .bind(&m.notes)
        .bind(&m.room_id)
        .bind(&m.room_pin)
        .fetch_one(&self.db)
        .await
        .context("insert meeting")?;
        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Meeting>> {
        let row = sqlx::query_as::<_, MeetingRow>(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find meeting")?;
        row.map(Meeting::try_from).transpose()
    }

    async fn find_by_room(&self, room_id: &str) -> anyhow::Result<Option<Meeting>> {
        let row = sqlx::query_as::<_, MeetingRow>(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings WHERE room_id = $1"
        ))
        .bind(room_id)
        .fetch_optional(&self.db)
        .await
        .context("find meeting by room")?;
        row.map(Meeting::try_from).transpose()
    }

    async fn set_status(
        &self,
        id: Uuid,
        expected: Option<MeetingStatus>,
        next: MeetingStatus,
    ) -> anyhow::Result<Option<Meeting>> {
        let row = sqlx::query_as::<_, MeetingRow>(&format!(
            r#"
            UPDATE meetings SET status = $2
             WHERE id = $1 AND ($3::text IS NULL OR status = $3)
            RETURNING {MEETING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(next.as_str())
        .bind(expected.map(MeetingStatus::as_str))
        .fetch_optional(&self.db)
        .await
        .context("update meeting status")?;
        row.map(Meeting::try_from).transpose()
    }

    async fn list(&self, q: &MeetingQuery) -> anyhow::Result<Vec<Meeting>> {
        let statuses: Vec<String> = q.statuses.iter().map(|s| s.as_str().to_string()).collect();
        let rows = sqlx::query_as::<_, MeetingRow>(&format!(
            r#"
            SELECT {MEETING_COLUMNS}
              FROM meetings
             WHERE (organizer_id = $1 OR (NOT $2 AND attendee_id = $1))
               AND (cardinality($3::text[]) = 0 OR status = ANY($3))
               AND start_at > $4
             ORDER BY start_at ASC
            "#
        ))
        .bind(q.user_id)
        .bind(q.organizer_only)
        .bind(statuses)
        .bind(q.starts_after)
        .fetch_all(&self.db)
        .await
        .context("list meetings")?;
        rows.into_iter().map(Meeting::try_from).collect()
    }
}
