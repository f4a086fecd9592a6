use async_trait::async_trait;
use uuid::Uuid;

use crate::store::{postgres::PgStore, DuplicateKey};
use crate::users::repo_types::{NewUser, User, UserPatch, UserSummary};

const USER_COLUMNS: &str = r#"
    id, email, first_name, last_name, password_hash, image_url, is_active,
    preferred_language_code, is_email_confirmed, time_zone_id, unique_link_id,
    country_code, created_at
"#;

/// Turns a unique-constraint failure on `users` into a [`DuplicateKey`].
fn unique_violation(err: sqlx::Error) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            let column = match db.constraint() {
                Some("users_unique_link_id_key") => "unique_link_id",
                _ => "email",
            };
            DuplicateKey { column }.into()
        }
        _ => err.into(),
    }
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_active_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_link(&self, link_id: &str) -> anyhow::Result<Option<User>>;
    async fn link_exists(&self, link_id: &str) -> anyhow::Result<bool>;
    async fn list(&self) -> anyhow::Result<Vec<User>>;
    async fn insert(&self, user: NewUser) -> anyhow::Result<User>;
    async fn update_profile(&self, id: Uuid, patch: UserPatch) -> anyhow::Result<Option<User>>;
    /// One round-trip for any number of ids; unknown ids are skipped.
    async fn summaries(&self, ids: &[Uuid]) -> anyhow::Result<Vec<UserSummary>>;
}

#[async_trait]
impl UserRepo for PgStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_active_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND is_active"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_link(&self, link_id: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE unique_link_id = $1"
        ))
        .bind(link_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn link_exists(&self, link_id: &str) -> anyhow::Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE unique_link_id = $1)")
                .bind(link_id)
                .fetch_one(&self.db)
                .await?;
        Ok(exists)
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn insert(&self, user: NewUser) -> anyhow::Result<User> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, first_name, last_name, password_hash,
                               preferred_language_code, time_zone_id, unique_link_id, country_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(&user.preferred_language_code)
        .bind(user.time_zone_id)
        .bind(&user.unique_link_id)
        .bind(&user.country_code)
        .fetch_one(&self.db)
        .await
        .map_err(unique_violation)?;
        Ok(created)
    }

    async fn update_profile(&self, id: Uuid, patch: UserPatch) -> anyhow::Result<Option<User>> {
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                preferred_language_code = COALESCE($4, preferred_language_code),
                time_zone_id = COALESCE($5, time_zone_id),
                country_code = COALESCE($6, country_code),
                image_url = COALESCE($7, image_url)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.first_name)
        .bind(patch.last_name)
        .bind(patch.preferred_language_code)
        .bind(patch.time_zone_id)
        .bind(patch.country_code)
        .bind(patch.image_url)
        .fetch_optional(&self.db)
        .await?;
        Ok(updated)
    }

    async fn summaries(&self, ids: &[Uuid]) -> anyhow::Result<Vec<UserSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, first_name, last_name, email
              FROM users
             WHERE id = ANY($1)
            "#,
        )
        .bind(ids.to_vec())
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
