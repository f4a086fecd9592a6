use anyhow::Context;
use async_trait::async_trait;
use time::OffsetDateTime;

use crate::interactions::repo_types::{
    InteractionKind, InteractionToken, InteractionTokenRow, NewInteractionToken, Redemption,
    TokenEffect,
};
use crate::store::postgres::PgStore;

#[async_trait]
pub trait InteractionRepo: Send + Sync {
    async fn insert(&self, token: NewInteractionToken) -> anyhow::Result<InteractionToken>;
    async fn find(&self, token: &str, kind: InteractionKind)
        -> anyhow::Result<Option<InteractionToken>>;
    /// Applies `effect` to the token's user in one unit of work. With `consume_at`
    /// set, the token is also flipped from unused to used; only one caller wins.
    async fn redeem(
        &self,
        token: &InteractionToken,
        effect: TokenEffect<'_>,
        consume_at: Option<OffsetDateTime>,
    ) -> anyhow::Result<Redemption>;
}

#[async_trait]
impl InteractionRepo for PgStore {
    async fn insert(&self, token: NewInteractionToken) -> anyhow::Result<InteractionToken> {
        let row = sqlx::query_as::<_, InteractionTokenRow>(
            r#"
            INSERT INTO interaction_tokens (user_id, kind, token, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, kind, token, expires_at, consumed_at
            "#,
        )
        .bind(token.user_id)
        .bind(token.kind.code())
        .bind(&token.token)
        .bind(token.expires_at)
        .fetch_one(&self.db)
        .await
        .context("insert interaction token")?;
        row.try_into()
    }

    async fn find(
        &self,
        token: &str,
        kind: InteractionKind,
    ) -> anyhow::Result<Option<InteractionToken>> {
        let row = sqlx::query_as::<_, InteractionTokenRow>(
            r#"
            SELECT id, user_id, kind, token, expires_at, consumed_at
              FROM interaction_tokens
             WHERE token = $1 AND kind = $2
            "#,
        )
        .bind(token)
        .bind(kind.code())
        .fetch_optional(&self.db)
        .await
        .context("find interaction token")?;
        row.map(InteractionToken::try_from).transpose()
    }

    async fn redeem(
        &self,
        token: &InteractionToken,
        effect: TokenEffect<'_>,
        consume_at: Option<OffsetDateTime>,
    ) -> anyhow::Result<Redemption> {
        // dropping the transaction on an early return rolls it back
        let mut tx = self.db.begin().await.context("begin token redemption")?;

        if let Some(at) = consume_at {
            let res = sqlx::query(
                "UPDATE interaction_tokens SET consumed_at = $2 WHERE id = $1 AND consumed_at IS NULL",
            )
            .bind(token.id)
            .bind(at)
            .execute(&mut *tx)
            .await
            .context("consume interaction token")?;
            if res.rows_affected() != 1 {
                return Ok(Redemption::AlreadyUsed);
            }
        }

        let res = match effect {
            TokenEffect::ConfirmEmail => {
                sqlx::query("UPDATE users SET is_email_confirmed = TRUE WHERE id = $1")
                    .bind(token.user_id)
                    .execute(&mut *tx)
                    .await
            }
            TokenEffect::SetPasswordHash(hash) => {
                sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
                    .bind(token.user_id)
                    .bind(hash)
                    .execute(&mut *tx)
                    .await
            }
        }
        .context("apply token effect")?;
        if res.rows_affected() != 1 {
            return Ok(Redemption::UserMissing);
        }

        tx.commit().await.context("commit token redemption")?;
        Ok(Redemption::Applied)
    }
}
