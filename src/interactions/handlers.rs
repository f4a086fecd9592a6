use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{debug, instrument};

use super::dto::{
    ConfirmEmailRequest, MessageResponse, PasswordResetConfirm, PasswordResetRequest,
    TokenIssuedResponse,
};
use super::repo_types::InteractionKind;
use super::services::{redeem_token, request_email_confirmation, request_password_reset};
use crate::{auth::extractors::AuthUser, error::ApiResult, extract::AppJson, state::AppState};

pub fn interaction_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/confirm-email/request", post(resend_confirmation))
        .route("/auth/confirm-email", post(confirm_email))
        .route("/auth/password-reset/request", post(start_password_reset))
        .route("/auth/password-reset", post(finish_password_reset))
}

#[instrument(skip(state))]
pub async fn resend_confirmation(
    State(state): State<AppState>,
    AuthUser { user_id, email }: AuthUser,
) -> ApiResult<Json<TokenIssuedResponse>> {
    debug!(%email, "confirmation email requested");
    let issued = request_email_confirmation(&state, user_id, OffsetDateTime::now_utc()).await?;
    Ok(Json(TokenIssuedResponse {
        message: "Confirmation email requested.".into(),
        email_sent: issued.email_sent,
    }))
}

#[instrument(skip(state, body))]
pub async fn confirm_email(
    State(state): State<AppState>,
    AppJson(body): AppJson<ConfirmEmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    redeem_token(
        &state,
        &body.token,
        InteractionKind::EmailConfirmation,
        None,
        OffsetDateTime::now_utc(),
    )
    .await?;
    Ok(Json(MessageResponse {
        message: "Email confirmed.".into(),
    }))
}

#[instrument(skip(state, body))]
pub async fn start_password_reset(
    State(state): State<AppState>,
    AppJson(body): AppJson<PasswordResetRequest>,
) -> ApiResult<Json<TokenIssuedResponse>> {
    let issued = request_password_reset(&state, &body.email, OffsetDateTime::now_utc()).await?;
    Ok(Json(TokenIssuedResponse {
        message: "Password reset requested.".into(),
        email_sent: issued.email_sent,
    }))
}

#[instrument(skip(state, body))]
pub async fn finish_password_reset(
    State(state): State<AppState>,
    AppJson(body): AppJson<PasswordResetConfirm>,
) -> ApiResult<Json<MessageResponse>> {
    redeem_token(
        &state,
        &body.token,
        InteractionKind::PasswordReset,
        Some(&body.password),
        OffsetDateTime::now_utc(),
    )
    .await?;
    Ok(Json(MessageResponse {
        message: "Password updated.".into(),
    }))
}
