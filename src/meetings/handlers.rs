use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use super::dto::{
    CreateMeetingRequest, MeetingDto, MeetingResponse, UpcomingMeetingDto, UpcomingMeetingList,
    UpcomingQuery, ValidatePinRequest, ValidatePinResponse,
};
use super::services::{
    cancel_meeting, confirm_meeting, decline_meeting, get_meeting, list_upcoming, request_meeting,
    validate_room_pin, MeetingOutcome,
};
use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
};

pub fn meeting_routes() -> Router<AppState> {
    Router::new()
        .route("/meeting", post(create_meeting))
        .route("/meeting/upcoming", get(get_upcoming))
        .route("/meeting/:mid", get(get_meeting_by_id))
        .route("/meeting/:mid/confirm", post(confirm))
        .route("/meeting/:mid/decline", post(decline))
        .route("/meeting/:mid/cancel", post(cancel))
        .route("/meetingRoom/validate", post(validate_pin))
}

fn outcome_response(out: MeetingOutcome) -> Json<MeetingResponse> {
    Json(MeetingResponse {
        meeting: MeetingDto::from(&out.meeting),
        email_sent: Some(out.email_sent),
    })
}

#[instrument(skip(state, body))]
pub async fn create_meeting(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    AppJson(body): AppJson<CreateMeetingRequest>,
) -> ApiResult<(StatusCode, Json<MeetingResponse>)> {
    let out = request_meeting(&state, user_id, body).await?;
    Ok((StatusCode::CREATED, outcome_response(out)))
}

#[instrument(skip(state))]
pub async fn get_upcoming(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    AppQuery(q): AppQuery<UpcomingQuery>,
) -> ApiResult<Json<UpcomingMeetingList>> {
    let meetings =
        list_upcoming(&state, user_id, q.status, q.from, OffsetDateTime::now_utc()).await?;
    Ok(Json(UpcomingMeetingList {
        meetings: meetings.iter().map(UpcomingMeetingDto::from).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn get_meeting_by_id(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    AppPath(mid): AppPath<Uuid>,
) -> ApiResult<Json<MeetingResponse>> {
    let meeting = get_meeting(&state, user_id, mid).await?;
    Ok(Json(MeetingResponse {
        meeting: MeetingDto::from(&meeting),
        email_sent: None,
    }))
}

#[instrument(skip(state))]
pub async fn confirm(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    AppPath(mid): AppPath<Uuid>,
) -> ApiResult<Json<MeetingResponse>> {
    Ok(outcome_response(confirm_meeting(&state, user_id, mid).await?))
}

#[instrument(skip(state))]
pub async fn decline(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    AppPath(mid): AppPath<Uuid>,
) -> ApiResult<Json<MeetingResponse>> {
    Ok(outcome_response(decline_meeting(&state, user_id, mid).await?))
}

#[instrument(skip(state))]
pub async fn cancel(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    AppPath(mid): AppPath<Uuid>,
) -> ApiResult<Json<MeetingResponse>> {
    Ok(outcome_response(cancel_meeting(&state, user_id, mid).await?))
}

#[instrument(skip(state, body))]
pub async fn validate_pin(
    State(state): State<AppState>,
    _auth: AuthUser,
    AppJson(body): AppJson<ValidatePinRequest>,
) -> ApiResult<Json<ValidatePinResponse>> {
    if !validate_room_pin(&state, &body.room_id, &body.pin).await? {
        return Err(ApiError::InvalidPin);
    }
    Ok(Json(ValidatePinResponse { valid: true }))
}
