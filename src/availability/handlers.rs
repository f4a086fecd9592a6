use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{AvailabilityResponse, ReplaceAvailabilityRequest};
use super::services::{get_availability, replace_availability};
use crate::{
    auth::extractors::AuthUser,
    error::ApiResult,
    extract::{AppJson, AppPath},
    state::AppState,
};

pub fn availability_routes() -> Router<AppState> {
    Router::new()
        .route("/availability", get(get_own).put(replace_own))
        .route("/availability/:uid", get(get_for_user))
}

#[instrument(skip(state))]
pub async fn get_own(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
) -> ApiResult<Json<AvailabilityResponse>> {
    let windows = get_availability(&state, user_id).await?;
    Ok(Json(AvailabilityResponse { user_id, windows }))
}

#[instrument(skip(state))]
pub async fn get_for_user(
    State(state): State<AppState>,
    AppPath(uid): AppPath<Uuid>,
) -> ApiResult<Json<AvailabilityResponse>> {
    let windows = get_availability(&state, uid).await?;
    Ok(Json(AvailabilityResponse {
        user_id: uid,
        windows,
    }))
}

#[instrument(skip(state, body))]
pub async fn replace_own(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    AppJson(body): AppJson<ReplaceAvailabilityRequest>,
) -> ApiResult<Json<AvailabilityResponse>> {
    let windows = replace_availability(&state, user_id, &body.windows).await?;
    Ok(Json(AvailabilityResponse { user_id, windows }))
}
