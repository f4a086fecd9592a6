use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::claims::Claims;
use super::dto::{JwtKeys, SignInRequest, SignUpRequest};
use super::password::{check_new_password, hash_password, verify_password};
use crate::config::JwtConfig;
use crate::error::{ApiError, ApiResult};
use crate::interactions::{repo_types::InteractionKind, services::issue_token};
use crate::state::AppState;
use crate::store::duplicate_column;
use crate::users::repo_types::{NewUser, User};

const LINK_ID_LEN: usize = 7;
const LINK_ID_ATTEMPTS: usize = 5;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid");
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(1) as u64) * 60),
        }
    }

    pub fn sign(&self, user_id: Uuid, email: &str) -> anyhow::Result<String> {
        let claims = Claims::for_session(
            user_id,
            email,
            &self.issuer,
            &self.audience,
            OffsetDateTime::now_utc(),
            TimeDuration::seconds(self.ttl.as_secs() as i64),
        );
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

fn session_token(st: &AppState, user: &User) -> ApiResult<String> {
    JwtKeys::from_ref(st).sign(user.id, &user.email).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::Internal(e.to_string())
    })
}

/// Last characters of a fresh UUID; retried while an existing user owns it.
async fn generate_link_id(st: &AppState) -> ApiResult<String> {
    for _ in 0..LINK_ID_ATTEMPTS {
        let simple = Uuid::new_v4().simple().to_string();
        let candidate = simple[simple.len() - LINK_ID_LEN..].to_string();
        if !st.users.link_exists(&candidate).await? {
            return Ok(candidate);
        }
        debug!(%candidate, "link id collision");
    }
    Err(link_unavailable())
}

fn link_unavailable() -> ApiError {
    ApiError::Conflict("Could not allocate a unique link, please try again.".into())
}

fn user_exists() -> ApiError {
    ApiError::Conflict("User already exists, please try to login instead.".into())
}

pub struct SignUpOutcome {
    pub user: User,
    pub token: String,
    pub email_sent: bool,
}

pub async fn sign_up(
    st: &AppState,
    mut req: SignUpRequest,
    now: OffsetDateTime,
) -> ApiResult<SignUpOutcome> {
    req.email = normalize_email(&req.email);
    let first_name = req.first_name.trim().to_string();
    let last_name = req.last_name.trim().to_string();

    if !is_valid_email(&req.email) || first_name.is_empty() || last_name.is_empty() {
        warn!(email = %req.email, "invalid sign up input");
        return Err(ApiError::Validation(
            "Invalid input information. Please check your data.".into(),
        ));
    }
    check_new_password(&req.password)?;

    if st.users.find_active_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(user_exists());
    }

    let time_zone = match req.time_zone_id {
        Some(id) => st.time_zones.find_by_id(id).await?,
        None => {
            st.time_zones
                .find_by_abbreviation(&st.config.signup.time_zone)
                .await?
        }
    }
    .ok_or_else(|| {
        ApiError::Validation(
            "Provided Time Zone is not valid. Cannot create user with the given information."
                .into(),
        )
    })?;

    let password_hash = hash_password(&req.password)?;
    let unique_link_id = generate_link_id(st).await?;

    let inserted = st
        .users
        .insert(NewUser {
            email: req.email,
            first_name,
            last_name,
            password_hash,
            preferred_language_code: req
                .preferred_language_code
                .unwrap_or_else(|| st.config.signup.language.clone()),
            time_zone_id: time_zone.id,
            unique_link_id,
            country_code: req
                .country_code
                .or_else(|| Some(st.config.signup.country.clone())),
        })
        .await;
    // a concurrent sign up can still win the unique index after the lookup above
    let user = match inserted {
        Ok(user) => user,
        Err(e) => {
            return Err(match duplicate_column(&e) {
                Some("email") => {
                    warn!(error = %e, "email registered concurrently");
                    user_exists()
                }
                Some(_) => link_unavailable(),
                None => e.into(),
            })
        }
    };

    let token = session_token(st, &user)?;
    let email_sent = match issue_token(st, &user, InteractionKind::EmailConfirmation, now).await {
        Ok(issued) => issued.email_sent,
        Err(e) => {
            error!(user_id = %user.id, error = %e, "confirmation token not issued");
            false
        }
    };

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok(SignUpOutcome {
        user,
        token,
        email_sent,
    })
}

pub async fn sign_in(st: &AppState, req: SignInRequest) -> ApiResult<(User, String)> {
    let email = normalize_email(&req.email);
    let bad_credentials = || ApiError::Authentication("Cannot Sign In. Bad credentials.".into());

    if !is_valid_email(&email) || req.password.is_empty() {
        return Err(ApiError::Validation(
            "Invalid input information. Please check your data.".into(),
        ));
    }

    let Some(user) = st.users.find_active_by_email(&email).await? else {
        warn!(%email, "sign in unknown email");
        return Err(bad_credentials());
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(%email, user_id = %user.id, "sign in invalid password");
        return Err(bad_credentials());
    }

    let token = session_token(st, &user)?;
    info!(user_id = %user.id, "user signed in");
    Ok((user, token))
}
