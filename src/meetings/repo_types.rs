use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Pending,
    Confirmed,
    Declined,
    Canceled,
}

impl MeetingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MeetingStatus::Pending => "pending",
            MeetingStatus::Confirmed => "confirmed",
            MeetingStatus::Declined => "declined",
            MeetingStatus::Canceled => "canceled",
        }
    }

    /// Transition table used by the guarded policy. Re-applying the current
    /// status is accepted as a no-op.
    pub fn can_become(self, next: MeetingStatus) -> bool {
        use MeetingStatus::*;
        self == next
            || matches!(
                (self, next),
                (Pending, Confirmed) | (Pending, Declined) | (Pending, Canceled) | (Confirmed, Canceled)
            )
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MeetingStatus::Pending),
            "confirmed" => Ok(MeetingStatus::Confirmed),
            "declined" => Ok(MeetingStatus::Declined),
            "canceled" => Ok(MeetingStatus::Canceled),
            other => anyhow::bail!("unknown meeting status {other:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Meeting {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub attendee_id: Uuid,
    pub status: MeetingStatus,
    pub start_at: OffsetDateTime,
    pub end_at: OffsetDateTime,
    pub from_time: i32,
    pub to_time: i32,
    pub subject: String,
    pub notes: Option<String>,
    pub room_id: String,
    pub room_pin: String,
    pub created_at: OffsetDateTime,
}

impl Meeting {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.organizer_id == user_id || self.attendee_id == user_id
    }

    /// The other side of the meeting, seen from `user_id`.
    pub fn counterpart_of(&self, user_id: Uuid) -> Uuid {
        if self.organizer_id == user_id {
            self.attendee_id
        } else {
            self.organizer_id
        }
    }
}

#[derive(Debug, FromRow)]
pub struct MeetingRow {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub attendee_id: Uuid,
    pub status: String,
    pub start_at: OffsetDateTime,
    pub end_at: OffsetDateTime,
    pub from_time: i32,
    pub to_time: i32,
    pub subject: String,
    pub notes: Option<String>,
    pub room_id: String,
    pub room_pin: String,
    pub created_at: OffsetDateTime,
}

impl TryFrom<MeetingRow> for Meeting {
    type Error = anyhow::Error;

    fn try_from(r: MeetingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            organizer_id: r.organizer_id,
            attendee_id: r.attendee_id,
            status: r.status.parse()?,
            start_at: r.start_at,
            end_at: r.end_at,
            from_time: r.from_time,
            to_time: r.to_time,
            subject: r.subject,
            notes: r.notes,
            room_id: r.room_id,
            room_pin: r.room_pin,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewMeeting {
    pub organizer_id: Uuid,
    pub attendee_id: Uuid,
    pub start_at: OffsetDateTime,
    pub end_at: OffsetDateTime,
    pub from_time: i32,
    pub to_time: i32,
    pub subject: String,
    pub notes: Option<String>,
    pub room_id: String,
    pub room_pin: String,
}

/// Filter for participant listings.
#[derive(Debug, Clone)]
pub struct MeetingQuery {
    pub user_id: Uuid,
    /// When set, only meetings where the user is the organizer.
    pub organizer_only: bool,
    /// Empty means any status.
    pub statuses: Vec<MeetingStatus>,
    /// Exclusive lower bound on `start_at`.
    pub starts_after: OffsetDateTime,
}

impl MeetingQuery {
    pub fn matches(&self, m: &Meeting) -> bool {
        let party = if self.organizer_only {
            m.organizer_id == self.user_id
        } else {
            m.is_participant(self.user_id)
        };
        party
            && (self.statuses.is_empty() || self.statuses.contains(&m.status))
            && m.start_at > self.starts_after
    }
}
