use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 hash, not exposed in JSON
    pub image_url: Option<String>,
    pub is_active: bool,
    pub preferred_language_code: String,
    pub is_email_confirmed: bool,
    pub time_zone_id: Uuid,
    pub unique_link_id: String,       // public booking slug
    pub country_code: Option<String>,
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub preferred_language_code: String,
    pub time_zone_id: Uuid,
    pub unique_link_id: String,
    pub country_code: Option<String>,
}

/// Fields a user may change on their own profile; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub preferred_language_code: Option<String>,
    pub time_zone_id: Option<Uuid>,
    pub country_code: Option<String>,
    pub image_url: Option<String>,
}

/// Participant summary attached to meeting listings.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            email: u.email.clone(),
        }
    }
}
