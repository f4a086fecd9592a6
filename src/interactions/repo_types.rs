use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionKind {
    EmailConfirmation = 1,
    PasswordReset = 2,
}

impl InteractionKind {
    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::EmailConfirmation),
            2 => Some(Self::PasswordReset),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: InteractionKind,
    pub token: String,
    pub expires_at: OffsetDateTime,
    pub consumed_at: Option<OffsetDateTime>,
}

impl InteractionToken {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at < now
    }
}

/// Raw row; `kind` is stored as its numeric code.
#[derive(Debug, FromRow)]
pub struct InteractionTokenRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: i16,
    pub token: String,
    pub expires_at: OffsetDateTime,
    pub consumed_at: Option<OffsetDateTime>,
}

impl TryFrom<InteractionTokenRow> for InteractionToken {
    type Error = anyhow::Error;

    fn try_from(r: InteractionTokenRow) -> Result<Self, Self::Error> {
        let kind = InteractionKind::from_code(r.kind)
            .ok_or_else(|| anyhow::anyhow!("unknown interaction kind {}", r.kind))?;
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            kind,
            token: r.token,
            expires_at: r.expires_at,
            consumed_at: r.consumed_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewInteractionToken {
    pub user_id: Uuid,
    pub kind: InteractionKind,
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// What redeeming a token does to its user.
#[derive(Debug, Clone, Copy)]
pub enum TokenEffect<'a> {
    ConfirmEmail,
    SetPasswordHash(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redemption {
    Applied,
    /// Another redemption consumed the token first.
    AlreadyUsed,
    UserMissing,
}
