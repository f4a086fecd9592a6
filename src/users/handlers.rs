use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{UpdateUserRequest, UserList, UserProfile, UserResponse};
use super::services::{get_user, list_users, update_user};
use crate::{
    auth::extractors::AuthUser,
    error::ApiResult,
    extract::{AppJson, AppPath},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/me", get(get_me))
        .route("/user/all", get(get_all_users))
        .route("/user/:uid", get(get_user_by_id).patch(patch_user))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
) -> ApiResult<Json<UserResponse>> {
    let user = get_user(&state, user_id).await?;
    Ok(Json(UserResponse {
        user: UserProfile::from(&user),
    }))
}

#[instrument(skip(state))]
pub async fn get_all_users(State(state): State<AppState>) -> ApiResult<Json<UserList>> {
    let users = list_users(&state).await?;
    Ok(Json(UserList {
        users: users.iter().map(UserProfile::from).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn get_user_by_id(
    State(state): State<AppState>,
    AppPath(uid): AppPath<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let user = get_user(&state, uid).await?;
    Ok(Json(UserResponse {
        user: UserProfile::from(&user),
    }))
}

#[instrument(skip(state, body))]
pub async fn patch_user(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    AppPath(uid): AppPath<Uuid>,
    AppJson(body): AppJson<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = update_user(&state, user_id, uid, body).await?;
    Ok(Json(UserResponse {
        user: UserProfile::from(&user),
    }))
}
