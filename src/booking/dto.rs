use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::availability::repo_types::AvailabilityWindow;
use crate::meetings::repo_types::{Meeting, MeetingStatus};
use crate::users::dto::PublicProfile;

#[derive(Debug, Deserialize)]
pub struct BookingQuery {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub from: Option<OffsetDateTime>,
}

/// Time the owner is already booked. Carries no room credentials and nothing
/// about who the meeting is with.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusySlot {
    #[serde(with = "time::serde::rfc3339")]
    pub start_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_at: OffsetDateTime,
    pub from_time: i32,
    pub to_time: i32,
    pub status: MeetingStatus,
}

impl From<&Meeting> for BusySlot {
    fn from(m: &Meeting) -> Self {
        Self {
            start_at: m.start_at,
            end_at: m.end_at,
            from_time: m.from_time,
            to_time: m.to_time,
            status: m.status,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPageResponse {
    pub user: PublicProfile,
    pub windows: Vec<AvailabilityWindow>,
    pub busy: Vec<BusySlot>,
}
