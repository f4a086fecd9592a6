//! Outbound email.
//!
//! Sending is awaited by the request that triggers it, but a failed send never
//! fails that request: callers get `false` back and report `emailSent: false`.

mod smtp;
pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{EmailConfig, EmailProviderConfig};
pub use templates::EmailContent;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown email service: {0}")]
    UnknownService(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, content: &EmailContent) -> Result<(), EmailError>;
}

/// Writes messages to the log instead of delivering them. Used for local runs.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, content: &EmailContent) -> Result<(), EmailError> {
        info!(to, subject = %content.subject, "email (log provider)");
        Ok(())
    }
}

pub fn create_mailer(config: &EmailConfig) -> Result<Arc<dyn Mailer>, EmailError> {
    let sender = smtp::sender(&config.from_address, config.from_name.as_deref());
    match &config.provider {
        EmailProviderConfig::Smtp {
            host,
            port,
            username,
            password,
            use_tls,
        } => Ok(Arc::new(smtp::SmtpMailer::new(
            host,
            *port,
            username.clone(),
            password.clone(),
            *use_tls,
            sender,
        )?)),
        EmailProviderConfig::Service {
            name,
            username,
            password,
        } => Ok(Arc::new(smtp::SmtpMailer::for_service(
            name,
            username.clone(),
            password.clone(),
            sender,
        )?)),
        EmailProviderConfig::Log => Ok(Arc::new(LogMailer)),
    }
}

/// Sends `content` and reports whether it went out.
pub async fn notify(mailer: &dyn Mailer, to: &str, content: &EmailContent) -> bool {
    match mailer.send(to, content).await {
        Ok(()) => true,
        Err(e) => {
            warn!(to, subject = %content.subject, error = %e, "email not sent");
            false
        }
    }
}
