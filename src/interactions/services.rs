use time::{Duration, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{check_new_password, hash_password};
use crate::email::{notify, templates};
use crate::error::{ApiError, ApiResult};
use crate::interactions::repo_types::{
    InteractionKind, InteractionToken, NewInteractionToken, Redemption, TokenEffect,
};
use crate::state::AppState;
use crate::users::repo_types::User;
use crate::users::services::user_not_found;

pub struct IssuedToken {
    pub token: InteractionToken,
    pub email_sent: bool,
}

pub fn generate_token() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn deep_link(base_url: &str, kind: InteractionKind, token: &str) -> String {
    let path = match kind {
        InteractionKind::EmailConfirmation => "confirm-email",
        InteractionKind::PasswordReset => "reset-password",
    };
    format!("{base_url}/{path}/{token}")
}

/// Stores a fresh token and emails its deep link to the user.
pub async fn issue_token(
    st: &AppState,
    user: &User,
    kind: InteractionKind,
    now: OffsetDateTime,
) -> ApiResult<IssuedToken> {
    let token = st
        .interactions
        .insert(NewInteractionToken {
            user_id: user.id,
            kind,
            token: generate_token(),
            expires_at: now + Duration::hours(st.config.token_ttl_hours),
        })
        .await?;

    let link = deep_link(&st.config.app_base_url, kind, &token.token);
    let content = match kind {
        InteractionKind::EmailConfirmation => {
            templates::email_confirmation(&user.preferred_language_code, &user.first_name, &link)
        }
        InteractionKind::PasswordReset => {
            templates::password_reset(&user.preferred_language_code, &user.first_name, &link)
        }
    };
    let email_sent = notify(st.mailer.as_ref(), &user.email, &content).await;

    info!(user_id = %user.id, kind = ?kind, email_sent, "interaction token issued");
    Ok(IssuedToken { token, email_sent })
}

pub async fn request_email_confirmation(
    st: &AppState,
    user_id: Uuid,
    now: OffsetDateTime,
) -> ApiResult<IssuedToken> {
    let user = st.users.find_by_id(user_id).await?.ok_or_else(user_not_found)?;
    if user.is_email_confirmed {
        return Err(ApiError::Conflict("Email is already confirmed.".into()));
    }
    issue_token(st, &user, InteractionKind::EmailConfirmation, now).await
}

pub async fn request_password_reset(
    st: &AppState,
    email: &str,
    now: OffsetDateTime,
) -> ApiResult<IssuedToken> {
    let email = crate::auth::services::normalize_email(email);
    let user = st
        .users
        .find_active_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::NotFound("Could not find a user with the given email.".into()))?;
    issue_token(st, &user, InteractionKind::PasswordReset, now).await
}

/// Looks the token up, checks expiry and the replay policy, then applies its effect:
/// email confirmation flips the confirmed flag, password reset stores a new hash.
pub async fn redeem_token(
    st: &AppState,
    token: &str,
    kind: InteractionKind,
    new_password: Option<&str>,
    now: OffsetDateTime,
) -> ApiResult<Uuid> {
    let found = st
        .interactions
        .find(token, kind)
        .await?
        .ok_or_else(|| ApiError::NotFound("Could not find the given token.".into()))?;

    if found.is_expired(now) {
        warn!(user_id = %found.user_id, kind = ?kind, "expired token");
        return Err(ApiError::Expired("The token has expired.".into()));
    }

    let used = || ApiError::Expired("The token has already been used.".into());
    let single_use = st.config.single_use_tokens;
    if single_use && found.consumed_at.is_some() {
        return Err(used());
    }

    let new_hash = match kind {
        InteractionKind::EmailConfirmation => None,
        InteractionKind::PasswordReset => {
            let password = new_password.unwrap_or_default();
            check_new_password(password)?;
            Some(hash_password(password)?)
        }
    };
    let effect = match new_hash.as_deref() {
        None => TokenEffect::ConfirmEmail,
        Some(hash) => TokenEffect::SetPasswordHash(hash),
    };

    let consume_at = single_use.then_some(now);
    match st.interactions.redeem(&found, effect, consume_at).await? {
        Redemption::Applied => {}
        Redemption::AlreadyUsed => {
            warn!(user_id = %found.user_id, "token consumed concurrently");
            return Err(used());
        }
        Redemption::UserMissing => return Err(user_not_found()),
    }

    info!(user_id = %found.user_id, kind = ?kind, "interaction token redeemed");
    Ok(found.user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::testing::{sign_up, test_state, test_state_with, RecordingMailer};

    fn hours(h: i64) -> Duration {
        Duration::hours(h)
    }

    #[test]
    fn deep_links_embed_token() {
        assert_eq!(
            deep_link("https://app.example", InteractionKind::PasswordReset, "abc"),
            "https://app.example/reset-password/abc"
        );
        assert_eq!(
            deep_link("https://app.example", InteractionKind::EmailConfirmation, "abc"),
            "https://app.example/confirm-email/abc"
        );
    }

    #[tokio::test]
    async fn issued_token_expires_in_a_day_and_is_emailed() {
        let mailer = RecordingMailer::new();
        let st = test_state_with(|_| {}, mailer.clone());
        let user = sign_up(&st, "alice@x.com").await;
        let now = OffsetDateTime::now_utc();

        let issued = issue_token(&st, &user, InteractionKind::PasswordReset, now).await.unwrap();
        assert_eq!(issued.token.expires_at, now + hours(24));
        assert!(issued.email_sent);

        let last = mailer.last_to("alice@x.com").expect("email recorded");
        assert!(last.html.contains(&issued.token.token));
        assert!(last.html.contains("/reset-password/"));
    }

    #[tokio::test]
    async fn confirm_email_sets_flag() {
        let st = test_state();
        let user = sign_up(&st, "alice@x.com").await;
        let now = OffsetDateTime::now_utc();
        let issued = request_email_confirmation(&st, user.id, now).await.unwrap();

        redeem_token(&st, &issued.token.token, InteractionKind::EmailConfirmation, None, now)
            .await
            .unwrap();
        assert!(st.users.find_by_id(user.id).await.unwrap().unwrap().is_email_confirmed);

        let again = request_email_confirmation(&st, user.id, now).await;
        assert!(matches!(again.err(), Some(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn password_reset_rehashes_credential() {
        let st = test_state();
        let user = sign_up(&st, "alice@x.com").await;
        let now = OffsetDateTime::now_utc();
        let issued = request_password_reset(&st, "ALICE@x.com", now).await.unwrap();

        redeem_token(
            &st,
            &issued.token.token,
            InteractionKind::PasswordReset,
            Some("brand-new"),
            now + hours(1),
        )
        .await
        .unwrap();

        let stored = st.users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(verify_password("brand-new", &stored.password_hash).unwrap());
        assert!(!verify_password("secret1", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn password_reset_requires_new_password() {
        let st = test_state();
        sign_up(&st, "alice@x.com").await;
        let now = OffsetDateTime::now_utc();
        let issued = request_password_reset(&st, "alice@x.com", now).await.unwrap();
        let err = redeem_token(&st, &issued.token.token, InteractionKind::PasswordReset, Some("123"), now)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        // a rejected attempt does not burn the token
        redeem_token(&st, &issued.token.token, InteractionKind::PasswordReset, Some("123456"), now)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reset_for_unknown_email_is_not_found() {
        let st = test_state();
        let err = request_password_reset(&st, "ghost@x.com", OffsetDateTime::now_utc()).await;
        assert!(matches!(err.err(), Some(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn expired_token_is_gone() {
        let st = test_state();
        sign_up(&st, "alice@x.com").await;
        let issued_at = OffsetDateTime::now_utc();
        let issued = request_password_reset(&st, "alice@x.com", issued_at).await.unwrap();

        let err = redeem_token(
            &st,
            &issued.token.token,
            InteractionKind::PasswordReset,
            Some("another1"),
            issued_at + hours(25),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Expired(_)));
        assert_eq!(err.status_code().as_u16(), 410);
    }

    #[tokio::test]
    async fn unknown_or_wrong_kind_token_is_not_found() {
        let st = test_state();
        let user = sign_up(&st, "alice@x.com").await;
        let now = OffsetDateTime::now_utc();
        let issued = request_email_confirmation(&st, user.id, now).await.unwrap();

        let err = redeem_token(&st, &issued.token.token, InteractionKind::PasswordReset, Some("abcdef"), now)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = redeem_token(&st, "nope", InteractionKind::EmailConfirmation, None, now)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn token_of_missing_user_is_not_burned() {
        let st = test_state();
        let now = OffsetDateTime::now_utc();
        let orphan = st
            .interactions
            .insert(NewInteractionToken {
                user_id: Uuid::new_v4(),
                kind: InteractionKind::EmailConfirmation,
                token: generate_token(),
                expires_at: now + hours(1),
            })
            .await
            .unwrap();

        let err = redeem_token(&st, &orphan.token, InteractionKind::EmailConfirmation, None, now)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let stored = st
            .interactions
            .find(&orphan.token, InteractionKind::EmailConfirmation)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.consumed_at.is_none());
    }

    #[tokio::test]
    async fn single_use_token_cannot_be_replayed() {
        let st = test_state();
        let user = sign_up(&st, "alice@x.com").await;
        let now = OffsetDateTime::now_utc();
        let issued = request_email_confirmation(&st, user.id, now).await.unwrap();
        let token = issued.token.token;

        redeem_token(&st, &token, InteractionKind::EmailConfirmation, None, now)
            .await
            .unwrap();
        let err = redeem_token(&st, &token, InteractionKind::EmailConfirmation, None, now)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Expired(_)));
    }

    #[tokio::test]
    async fn reusable_tokens_redeem_until_expiry() {
        let st = test_state_with(|cfg| cfg.single_use_tokens = false, RecordingMailer::new());
        sign_up(&st, "alice@x.com").await;
        let now = OffsetDateTime::now_utc();
        let issued = request_password_reset(&st, "alice@x.com", now).await.unwrap();
        let token = issued.token.token;

        for i in 0..3 {
            redeem_token(
                &st,
                &token,
                InteractionKind::PasswordReset,
                Some("repeat-pass"),
                now + hours(i),
            )
            .await
            .unwrap();
        }
        let err = redeem_token(
            &st,
            &token,
            InteractionKind::PasswordReset,
            Some("repeat-pass"),
            now + hours(24) + Duration::seconds(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Expired(_)));
    }
}
