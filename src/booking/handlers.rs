use axum::{extract::State, routing::get, Json, Router};
use time::OffsetDateTime;
use tracing::instrument;

use super::dto::{BookingPageResponse, BookingQuery, BusySlot};
use super::services::resolve_by_link;
use crate::{
    error::ApiResult,
    extract::{AppPath, AppQuery},
    state::AppState,
    users::dto::PublicProfile,
};

pub fn booking_routes() -> Router<AppState> {
    Router::new().route("/user/link/:lid", get(get_booking_page))
}

#[instrument(skip(state))]
pub async fn get_booking_page(
    State(state): State<AppState>,
    AppPath(lid): AppPath<String>,
    AppQuery(q): AppQuery<BookingQuery>,
) -> ApiResult<Json<BookingPageResponse>> {
    let page = resolve_by_link(&state, &lid, q.from, OffsetDateTime::now_utc()).await?;
    Ok(Json(BookingPageResponse {
        user: PublicProfile::from(&page.owner),
        busy: page.busy.iter().map(BusySlot::from).collect(),
        windows: page.windows,
    }))
}
