use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use super::{EmailContent, EmailError, Mailer};

pub(super) fn sender(address: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{name} <{address}>"),
        None => address.to_string(),
    }
}

/// Host and port of the providers that can be selected by name.
pub(super) fn service_endpoint(name: &str) -> Option<(&'static str, u16)> {
    let endpoint = match name.trim().to_ascii_lowercase().as_str() {
        "gmail" => ("smtp.gmail.com", 587),
        "outlook" | "hotmail" | "office365" => ("smtp.office365.com", 587),
        "yahoo" => ("smtp.mail.yahoo.com", 465),
        "zoho" => ("smtp.zoho.com", 465),
        "sendgrid" => ("smtp.sendgrid.net", 587),
        "mailgun" => ("smtp.mailgun.org", 587),
        _ => return None,
    };
    Some(endpoint)
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        username: Option<String>,
        password: Option<String>,
        use_tls: bool,
        from: String,
    ) -> Result<Self, EmailError> {
        let mut builder = if use_tls {
            let tls = TlsParameters::new(host.to_string())
                .map_err(|e| EmailError::InvalidConfig(format!("TLS configuration error: {e}")))?;
            // 465 is implicit TLS, everything else upgrades with STARTTLS
            if port == 465 {
                AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                    .map_err(|e| EmailError::InvalidConfig(format!("SMTP relay error: {e}")))?
                    .port(port)
                    .tls(Tls::Wrapper(tls))
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                    .map_err(|e| EmailError::InvalidConfig(format!("SMTP relay error: {e}")))?
                    .port(port)
                    .tls(Tls::Required(tls))
            }
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port)
        };

        if let (Some(user), Some(pass)) = (username, password) {
            builder = builder.credentials(Credentials::new(user, pass));
        }

        let from = from
            .parse()
            .map_err(|e| EmailError::InvalidConfig(format!("Invalid from address: {e}")))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    pub fn for_service(
        name: &str,
        username: String,
        password: String,
        from: String,
    ) -> Result<Self, EmailError> {
        let (host, port) =
            service_endpoint(name).ok_or_else(|| EmailError::UnknownService(name.to_string()))?;
        Self::new(host, port, Some(username), Some(password), true, from)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, content: &EmailContent) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .map_err(|e| EmailError::InvalidConfig(format!("Invalid to address: {e}")))?)
            .subject(content.subject.clone())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(content.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(content.html.clone()),
                    ),
            )
            .map_err(|e| EmailError::SendFailed(format!("Failed to build email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;
        Ok(())
    }
}
