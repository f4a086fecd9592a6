use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::users::dto::UpdateUserRequest;
use crate::users::repo_types::{User, UserPatch};

pub(crate) fn user_not_found() -> ApiError {
    ApiError::NotFound("Could not find a user with the given id.".into())
}

pub async fn get_user(st: &AppState, id: Uuid) -> ApiResult<User> {
    st.users.find_by_id(id).await?.ok_or_else(user_not_found)
}

pub async fn list_users(st: &AppState) -> ApiResult<Vec<User>> {
    Ok(st.users.list().await?)
}

fn non_blank(field: &str, value: Option<String>) -> ApiResult<Option<String>> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Err(ApiError::Validation(format!("{field} must not be empty."))),
        other => Ok(other),
    }
}

/// Only the owner of the profile may change it.
pub async fn update_user(
    st: &AppState,
    caller: Uuid,
    target: Uuid,
    req: UpdateUserRequest,
) -> ApiResult<User> {
    if caller != target {
        warn!(%caller, %target, "profile update by another user");
        return Err(ApiError::Forbidden("You can only update your own profile.".into()));
    }

    if let Some(tz) = req.time_zone_id {
        if st.time_zones.find_by_id(tz).await?.is_none() {
            return Err(ApiError::Validation("Provided Time Zone is not valid.".into()));
        }
    }

    let patch = UserPatch {
        first_name: non_blank("firstName", req.first_name)?,
        last_name: non_blank("lastName", req.last_name)?,
        preferred_language_code: non_blank("preferredLanguageCode", req.preferred_language_code)?,
        time_zone_id: req.time_zone_id,
        country_code: req.country_code,
        image_url: req.image_url,
    };

    let user = st
        .users
        .update_profile(target, patch)
        .await?
        .ok_or_else(user_not_found)?;
    info!(user_id = %user.id, "profile updated");
    Ok(user)
}
