use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::User;

/// Full profile, returned to the user themself and on user lookups.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub preferred_language_code: String,
    pub is_email_confirmed: bool,
    pub time_zone_id: Uuid,
    pub unique_link_id: String,
    pub country_code: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for UserProfile {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            image_url: u.image_url.clone(),
            is_active: u.is_active,
            preferred_language_code: u.preferred_language_code.clone(),
            is_email_confirmed: u.is_email_confirmed,
            time_zone_id: u.time_zone_id,
            unique_link_id: u.unique_link_id.clone(),
            country_code: u.country_code.clone(),
            created_at: u.created_at,
        }
    }
}

/// Reduced profile shown to anonymous visitors of a booking link.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub image_url: Option<String>,
    pub preferred_language_code: String,
    pub time_zone_id: Uuid,
    pub unique_link_id: String,
}

impl From<&User> for PublicProfile {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            image_url: u.image_url.clone(),
            preferred_language_code: u.preferred_language_code.clone(),
            time_zone_id: u.time_zone_id,
            unique_link_id: u.unique_link_id.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub preferred_language_code: Option<String>,
    pub time_zone_id: Option<Uuid>,
    pub country_code: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<UserProfile>,
}
