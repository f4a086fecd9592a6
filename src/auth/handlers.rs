use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, SignInRequest, SignUpRequest},
        services::{sign_in, sign_up},
    },
    error::ApiResult,
    extract::AppJson,
    state::AppState,
    users::dto::UserProfile,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/user/signup", post(signup))
        .route("/user/signin", post(signin))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignUpRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let out = sign_up(&state, payload, OffsetDateTime::now_utc()).await?;
    let user = UserProfile::from(&out.user);
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user,
            token: out.token,
            email_sent: Some(out.email_sent),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn signin(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignInRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (user, token) = sign_in(&state, payload).await?;
    let user = UserProfile::from(&user);
    Ok(Json(AuthResponse {
        user,
        token,
        email_sent: None,
    }))
}
