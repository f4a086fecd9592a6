use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One weekly recurring slot. Offsets are minutes since midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week_day: i16, // 0 = Sunday
    pub from_time: i32,
    pub to_time: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewWindow {
    pub week_day: i16,
    pub from_time: i32,
    pub to_time: i32,
}
