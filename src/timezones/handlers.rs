use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    extract::AppPath,
    state::AppState,
    timezones::repo_types::TimeZone,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeZoneList {
    pub time_zones: Vec<TimeZone>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeZoneResponse {
    pub time_zone: TimeZone,
}

pub fn time_zone_routes() -> Router<AppState> {
    Router::new()
        .route("/timezone/all", get(list_time_zones))
        .route("/timezone/:tzid", get(get_time_zone))
}

#[instrument(skip(state))]
pub async fn list_time_zones(State(state): State<AppState>) -> ApiResult<Json<TimeZoneList>> {
    let time_zones = state.time_zones.list().await?;
    Ok(Json(TimeZoneList { time_zones }))
}

#[instrument(skip(state))]
pub async fn get_time_zone(
    State(state): State<AppState>,
    AppPath(tzid): AppPath<Uuid>,
) -> ApiResult<Json<TimeZoneResponse>> {
    let time_zone = state
        .time_zones
        .find_by_id(tzid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Could not find a Time Zone with the given id.".into()))?;
    Ok(Json(TimeZoneResponse { time_zone }))
}
