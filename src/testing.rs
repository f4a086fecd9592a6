//! Shared fixtures for unit tests: an in-memory state and a mailer that records
//! instead of sending.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::auth::dto::SignUpRequest;
use crate::auth::services;
use crate::config::{
    AppConfig, EmailConfig, EmailProviderConfig, JwtConfig, SignupDefaults, StoreBackend,
    TransitionPolicy,
};
use crate::email::{EmailContent, EmailError, Mailer};
use crate::state::AppState;
use crate::store::memory::MemoryStore;
use crate::users::repo_types::User;

#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<(String, EmailContent)>>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails, nothing is recorded.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, EmailContent)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_to(&self, to: &str) -> Option<EmailContent> {
        self.sent()
            .into_iter()
            .rev()
            .find(|(rcpt, _)| rcpt == to)
            .map(|(_, content)| content)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, content: &EmailContent) -> Result<(), EmailError> {
        if self.fail {
            return Err(EmailError::SendFailed("smtp unavailable".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), content.clone()));
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        store: StoreBackend::Memory,
        database_url: None,
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "slotbook".into(),
            audience: "slotbook-users".into(),
            ttl_minutes: 60,
        },
        email: EmailConfig {
            provider: EmailProviderConfig::Log,
            from_address: "no-reply@slotbook.local".into(),
            from_name: Some("Slotbook".into()),
        },
        app_base_url: "http://localhost:3000".into(),
        token_ttl_hours: 24,
        single_use_tokens: true,
        transitions: TransitionPolicy::Guarded,
        signup: SignupDefaults {
            time_zone: "CST".into(),
            language: "es".into(),
            country: "cr".into(),
        },
    }
}

pub fn test_state_with(configure: impl FnOnce(&mut AppConfig), mailer: RecordingMailer) -> AppState {
    let mut config = test_config();
    configure(&mut config);
    AppState::from_store(
        Arc::new(MemoryStore::new()),
        Arc::new(config),
        Arc::new(mailer),
    )
}

pub fn test_state_with_mailer(mailer: RecordingMailer) -> AppState {
    test_state_with(|_| {}, mailer)
}

pub fn test_state() -> AppState {
    test_state_with_mailer(RecordingMailer::new())
}

pub fn signup_request(email: &str, password: &str) -> SignUpRequest {
    SignUpRequest {
        email: email.into(),
        first_name: "Test".into(),
        last_name: "User".into(),
        password: password.into(),
        time_zone_id: None,
        preferred_language_code: None,
        country_code: None,
    }
}

/// Registers `email` with password `secret1`.
pub async fn sign_up(st: &AppState, email: &str) -> User {
    services::sign_up(st, signup_request(email, "secret1"), OffsetDateTime::now_utc())
        .await
        .map(|out| out.user)
        .unwrap_or_else(|e| panic!("sign up {email}: {e}"))
}
