use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::meetings::repo_types::{Meeting, MeetingStatus};
use crate::meetings::services::UpcomingMeeting;
use crate::users::repo_types::UserSummary;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    pub organizer_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub start_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_at: OffsetDateTime,
    pub from_time: i32,
    pub to_time: i32,
    pub subject: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub status: Option<MeetingStatus>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub from: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePinRequest {
    pub room_id: String,
    pub pin: String,
}

#[derive(Debug, Serialize)]
pub struct ValidatePinResponse {
    pub valid: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDto {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub attendee_id: Uuid,
    pub status: MeetingStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub start_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_at: OffsetDateTime,
    pub from_time: i32,
    pub to_time: i32,
    pub subject: String,
    pub notes: Option<String>,
    pub room_id: String,
    pub room_pin: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&Meeting> for MeetingDto {
    fn from(m: &Meeting) -> Self {
        Self {
            id: m.id,
            organizer_id: m.organizer_id,
            attendee_id: m.attendee_id,
            status: m.status,
            start_at: m.start_at,
            end_at: m.end_at,
            from_time: m.from_time,
            to_time: m.to_time,
            subject: m.subject.clone(),
            notes: m.notes.clone(),
            room_id: m.room_id.clone(),
            room_pin: m.room_pin.clone(),
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingResponse {
    pub meeting: MeetingDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_sent: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UpcomingMeetingDto {
    #[serde(flatten)]
    pub meeting: MeetingDto,
    pub organizer: Option<UserSummary>,
    pub attendee: Option<UserSummary>,
}

impl From<&UpcomingMeeting> for UpcomingMeetingDto {
    fn from(u: &UpcomingMeeting) -> Self {
        Self {
            meeting: MeetingDto::from(&u.meeting),
            organizer: u.organizer.clone(),
            attendee: u.attendee.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpcomingMeetingList {
    pub meetings: Vec<UpcomingMeetingDto>,
}
