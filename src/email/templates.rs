//! Notification bodies, in English and Spanish.

use time::{format_description::FormatItem, macros::format_description, OffsetDateTime, UtcOffset};

const WHEN: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute] UTC");

#[derive(Debug, Clone, PartialEq)]
pub struct EmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lang {
    En,
    Es,
}

impl Lang {
    fn from_code(code: &str) -> Self {
        if code.trim().to_ascii_lowercase().starts_with("es") {
            Lang::Es
        } else {
            Lang::En
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingEvent {
    Requested,
    Confirmed,
    Declined,
    Canceled,
}

/// What a meeting email talks about. `recipient` is a first name,
/// `counterpart` the other participant's full name.
pub struct MeetingNotice<'a> {
    pub recipient: &'a str,
    pub counterpart: &'a str,
    pub subject: &'a str,
    pub start_at: OffsetDateTime,
    pub link: &'a str,
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn when(at: OffsetDateTime) -> String {
    let at = at.to_offset(UtcOffset::UTC);
    at.format(WHEN).unwrap_or_else(|_| at.to_string())
}

/// Greeting, one paragraph and a call-to-action link, as text and HTML.
fn render(subject: String, greeting: &str, body: &str, cta: &str, link: &str) -> EmailContent {
    let text = format!("{greeting}\n\n{body}\n\n{cta}: {link}\n\n--\nSlotbook");
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <style>
        body {{ font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; background: #f5f5f5; }}
        .card {{ max-width: 560px; margin: 40px auto; background: white; border-radius: 8px; padding: 32px; }}
        .cta {{ display: inline-block; padding: 12px 20px; background: #2563eb; color: white; border-radius: 6px; text-decoration: none; }}
        .footer {{ margin-top: 24px; color: #888; font-size: 12px; }}
    </style>
</head>
<body>
    <div class="card">
        <p>{greeting}</p>
        <p>{body}</p>
        <p><a class="cta" href="{link}">{cta}</a></p>
        <div class="footer">Slotbook</div>
    </div>
</body>
</html>"#,
        greeting = escape(greeting),
        body = escape(body),
        cta = escape(cta),
        link = escape(link),
    );
    EmailContent {
        subject,
        text,
        html,
    }
}

pub fn email_confirmation(lang: &str, first_name: &str, link: &str) -> EmailContent {
    match Lang::from_code(lang) {
        Lang::En => render(
            "Confirm your email".into(),
            &format!("Hi {first_name},"),
            "Please confirm your email address. The link is valid for 24 hours.",
            "Confirm email",
            link,
        ),
        Lang::Es => render(
            "Confirma tu correo".into(),
            &format!("Hola {first_name},"),
            "Por favor confirma tu dirección de correo. El enlace es válido por 24 horas.",
            "Confirmar correo",
            link,
        ),
    }
}

pub fn password_reset(lang: &str, first_name: &str, link: &str) -> EmailContent {
    match Lang::from_code(lang) {
        Lang::En => render(
            "Reset your password".into(),
            &format!("Hi {first_name},"),
            "We received a request to reset your password. The link is valid for 24 hours. \
             If it wasn't you, ignore this email.",
            "Choose a new password",
            link,
        ),
        Lang::Es => render(
            "Restablece tu contraseña".into(),
            &format!("Hola {first_name},"),
            "Recibimos una solicitud para restablecer tu contraseña. El enlace es válido por \
             24 horas. Si no fuiste tú, ignora este correo.",
            "Elegir nueva contraseña",
            link,
        ),
    }
}

pub fn meeting_update(lang: &str, event: MeetingEvent, n: &MeetingNotice<'_>) -> EmailContent {
    let at = when(n.start_at);
    let (who, what) = (n.counterpart, n.subject);
    match Lang::from_code(lang) {
        Lang::En => {
            let (subject, body) = match event {
                MeetingEvent::Requested => (
                    format!("New meeting request: {what}"),
                    format!("{who} would like to meet with you on {at} about \"{what}\"."),
                ),
                MeetingEvent::Confirmed => (
                    format!("Meeting confirmed: {what}"),
                    format!("{who} confirmed your meeting \"{what}\" on {at}."),
                ),
                MeetingEvent::Declined => (
                    format!("Meeting declined: {what}"),
                    format!("{who} declined your meeting \"{what}\" on {at}."),
                ),
                MeetingEvent::Canceled => (
                    format!("Meeting canceled: {what}"),
                    format!("{who} canceled the meeting \"{what}\" on {at}."),
                ),
            };
            render(subject, &format!("Hi {},", n.recipient), &body, "View meeting", n.link)
        }
        Lang::Es => {
            let (subject, body) = match event {
                MeetingEvent::Requested => (
                    format!("Nueva solicitud de reunión: {what}"),
                    format!("{who} quiere reunirse contigo el {at} sobre \"{what}\"."),
                ),
                MeetingEvent::Confirmed => (
                    format!("Reunión confirmada: {what}"),
                    format!("{who} confirmó tu reunión \"{what}\" del {at}."),
                ),
                MeetingEvent::Declined => (
                    format!("Reunión rechazada: {what}"),
                    format!("{who} rechazó tu reunión \"{what}\" del {at}."),
                ),
                MeetingEvent::Canceled => (
                    format!("Reunión cancelada: {what}"),
                    format!("{who} canceló la reunión \"{what}\" del {at}."),
                ),
            };
            render(subject, &format!("Hola {},", n.recipient), &body, "Ver reunión", n.link)
        }
    }
}
