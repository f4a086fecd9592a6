//! Process-local store used by tests and `STORE_BACKEND=memory`.
//!
//! Mirrors the Postgres backend: same uniqueness rules, same ordering, and the
//! same check-and-set behavior for status and token writes. Every operation runs
//! under one lock, so multi-row writes are atomic.

use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::availability::repo::AvailabilityRepo;
use crate::availability::repo_types::{AvailabilityWindow, NewWindow};
use crate::interactions::repo::InteractionRepo;
use crate::interactions::repo_types::{
    InteractionKind, InteractionToken, NewInteractionToken, Redemption, TokenEffect,
};
use crate::meetings::repo::MeetingRepo;
use crate::meetings::repo_types::{Meeting, MeetingQuery, MeetingStatus, NewMeeting};
use crate::timezones::repo::TimeZoneRepo;
use crate::timezones::repo_types::{TimeZone, SEED_TIME_ZONES};
use crate::users::repo::UserRepo;
use crate::store::DuplicateKey;
use crate::users::repo_types::{NewUser, User, UserPatch, UserSummary};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    time_zones: Vec<TimeZone>,
    windows: Vec<AvailabilityWindow>,
    tokens: Vec<InteractionToken>,
    meetings: Vec<Meeting>,
}

pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let time_zones = SEED_TIME_ZONES
            .iter()
            .map(|(abbreviation, name, utc_offset)| TimeZone {
                id: Uuid::new_v4(),
                abbreviation: abbreviation.to_string(),
                name: name.to_string(),
                utc_offset: *utc_offset,
            })
            .collect();
        Self {
            tables: Mutex::new(Tables {
                time_zones,
                ..Tables::default()
            }),
        }
    }

    fn tables(&self) -> anyhow::Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.tables()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_active_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .tables()?
            .users
            .iter()
            .find(|u| u.is_active && u.email == email)
            .cloned())
    }

    async fn find_by_link(&self, link_id: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .tables()?
            .users
            .iter()
            .find(|u| u.unique_link_id == link_id)
            .cloned())
    }

    async fn link_exists(&self, link_id: &str) -> anyhow::Result<bool> {
        Ok(self.tables()?.users.iter().any(|u| u.unique_link_id == link_id))
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.tables()?.users.clone())
    }

    async fn insert(&self, user: NewUser) -> anyhow::Result<User> {
        let mut t = self.tables()?;
        if t.users.iter().any(|u| u.is_active && u.email == user.email) {
            return Err(DuplicateKey { column: "email" }.into());
        }
        if t.users.iter().any(|u| u.unique_link_id == user.unique_link_id) {
            return Err(DuplicateKey {
                column: "unique_link_id",
            }
            .into());
        }
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            password_hash: user.password_hash,
            image_url: None,
            is_active: true,
            preferred_language_code: user.preferred_language_code,
            is_email_confirmed: false,
            time_zone_id: user.time_zone_id,
            unique_link_id: user.unique_link_id,
            country_code: user.country_code,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(created.clone());
        Ok(created)
    }

    async fn update_profile(&self, id: Uuid, patch: UserPatch) -> anyhow::Result<Option<User>> {
        let mut t = self.tables()?;
        let Some(u) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(v) = patch.first_name {
            u.first_name = v;
        }
        if let Some(v) = patch.last_name {
            u.last_name = v;
        }
        if let Some(v) = patch.preferred_language_code {
            u.preferred_language_code = v;
        }
        if let Some(v) = patch.time_zone_id {
            u.time_zone_id = v;
        }
        if patch.country_code.is_some() {
            u.country_code = patch.country_code;
        }
        if patch.image_url.is_some() {
            u.image_url = patch.image_url;
        }
        Ok(Some(u.clone()))
    }

    async fn summaries(&self, ids: &[Uuid]) -> anyhow::Result<Vec<UserSummary>> {
        Ok(self
            .tables()?
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .map(UserSummary::from)
            .collect())
    }
}

#[async_trait]
impl TimeZoneRepo for MemoryStore {
    async fn list(&self) -> anyhow::Result<Vec<TimeZone>> {
        let mut zones = self.tables()?.time_zones.clone();
        zones.sort_by(|a, b| a.utc_offset.total_cmp(&b.utc_offset).then_with(|| a.abbreviation.cmp(&b.abbreviation)));
        Ok(zones)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<TimeZone>> {
        Ok(self.tables()?.time_zones.iter().find(|z| z.id == id).cloned())
    }

    async fn find_by_abbreviation(&self, abbreviation: &str) -> anyhow::Result<Option<TimeZone>> {
        Ok(self
            .tables()?
            .time_zones
            .iter()
            .find(|z| z.abbreviation == abbreviation)
            .cloned())
    }
}

#[async_trait]
impl AvailabilityRepo for MemoryStore {
    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<AvailabilityWindow>> {
        let mut windows: Vec<_> = self
            .tables()?
            .windows
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        windows.sort_by_key(|w| (w.week_day, w.to_time));
        Ok(windows)
    }

    async fn replace_for_user(
        &self,
        user_id: Uuid,
        windows: &[NewWindow],
    ) -> anyhow::Result<Vec<AvailabilityWindow>> {
        let mut t = self.tables()?;
        t.windows.retain(|w| w.user_id != user_id);
        let mut stored: Vec<_> = windows
            .iter()
            .map(|w| AvailabilityWindow {
                id: Uuid::new_v4(),
                user_id,
                week_day: w.week_day,
                from_time: w.from_time,
                to_time: w.to_time,
            })
            .collect();
        t.windows.extend(stored.iter().cloned());
        stored.sort_by_key(|w| (w.week_day, w.to_time));
        Ok(stored)
    }
}

#[async_trait]
impl InteractionRepo for MemoryStore {
    async fn insert(&self, token: NewInteractionToken) -> anyhow::Result<InteractionToken> {
        let mut t = self.tables()?;
        if t.tokens.iter().any(|x| x.token == token.token) {
            return Err(DuplicateKey { column: "token" }.into());
        }
        let created = InteractionToken {
            id: Uuid::new_v4(),
            user_id: token.user_id,
            kind: token.kind,
            token: token.token,
            expires_at: token.expires_at,
            consumed_at: None,
        };
        t.tokens.push(created.clone());
        Ok(created)
    }

    async fn find(
        &self,
        token: &str,
        kind: InteractionKind,
    ) -> anyhow::Result<Option<InteractionToken>> {
        Ok(self
            .tables()?
            .tokens
            .iter()
            .find(|x| x.token == token && x.kind == kind)
            .cloned())
    }

    async fn redeem(
        &self,
        token: &InteractionToken,
        effect: TokenEffect<'_>,
        consume_at: Option<OffsetDateTime>,
    ) -> anyhow::Result<Redemption> {
        let mut guard = self.tables()?;
        let t = &mut *guard;
        let Some(stored) = t.tokens.iter_mut().find(|x| x.id == token.id) else {
            return Ok(Redemption::AlreadyUsed);
        };
        if consume_at.is_some() && stored.consumed_at.is_some() {
            return Ok(Redemption::AlreadyUsed);
        }
        let Some(user) = t.users.iter_mut().find(|u| u.id == token.user_id) else {
            return Ok(Redemption::UserMissing);
        };
        match effect {
            TokenEffect::ConfirmEmail => user.is_email_confirmed = true,
            TokenEffect::SetPasswordHash(hash) => user.password_hash = hash.to_string(),
        }
        if let Some(at) = consume_at {
            stored.consumed_at = Some(at);
        }
        Ok(Redemption::Applied)
    }
}

#[async_trait]
impl MeetingRepo for MemoryStore {
    async fn insert(&self, m: NewMeeting) -> anyhow::Result<Meeting> {
        let mut t = self.tables()?;
        if t.meetings.iter().any(|x| x.room_id == m.room_id) {
            anyhow::bail!("duplicate key: meetings.room_id {}", m.room_id);
        }
        let created = Meeting {
            id: Uuid::new_v4(),
            organizer_id: m.organizer_id,
            attendee_id: m.attendee_id,
            status: MeetingStatus::Pending,
            start_at: m.start_at,
            end_at: m.end_at,
            from_time: m.from_time,
            to_time: m.to_time,
            subject: m.subject,
            notes: m.notes,
            room_id: m.room_id,
            room_pin: m.room_pin,
            created_at: OffsetDateTime::now_utc(),
        };
        t.meetings.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Meeting>> {
        Ok(self.tables()?.meetings.iter().find(|m| m.id == id).cloned())
    }

    async fn find_by_room(&self, room_id: &str) -> anyhow::Result<Option<Meeting>> {
        Ok(self
            .tables()?
            .meetings
            .iter()
            .find(|m| m.room_id == room_id)
            .cloned())
    }

    async fn set_status(
        &self,
        id: Uuid,
        expected: Option<MeetingStatus>,
        next: MeetingStatus,
    ) -> anyhow::Result<Option<Meeting>> {
        let mut t = self.tables()?;
        let Some(m) = t
            .meetings
            .iter_mut()
            .find(|m| m.id == id && expected.map_or(true, |s| m.status == s))
        else {
            return Ok(None);
        };
        m.status = next;
        Ok(Some(m.clone()))
    }

    async fn list(&self, query: &MeetingQuery) -> anyhow::Result<Vec<Meeting>> {
        let mut found: Vec<_> = self
            .tables()?
            .meetings
            .iter()
            .filter(|m| query.matches(m))
            .cloned()
            .collect();
        found.sort_by_key(|m| m.start_at);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::duplicate_column;
    use time::Duration;

    fn new_user(email: &str, link: &str) -> NewUser {
        NewUser {
            email: email.into(),
            first_name: "A".into(),
            last_name: "B".into(),
            password_hash: "h".into(),
            preferred_language_code: "en".into(),
            time_zone_id: Uuid::new_v4(),
            unique_link_id: link.into(),
            country_code: None,
        }
    }

    #[tokio::test]
    async fn seeds_time_zones() {
        let store = MemoryStore::new();
        let zones = TimeZoneRepo::list(&store).await.unwrap();
        assert_eq!(zones.len(), SEED_TIME_ZONES.len());
        assert!(store.find_by_abbreviation("CST").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn enforces_unique_email_and_link() {
        let store = MemoryStore::new();
        UserRepo::insert(&store, new_user("a@x.com", "aaaaaaa")).await.unwrap();
        let email = UserRepo::insert(&store, new_user("a@x.com", "bbbbbbb")).await.unwrap_err();
        assert_eq!(duplicate_column(&email), Some("email"));
        let link = UserRepo::insert(&store, new_user("b@x.com", "aaaaaaa")).await.unwrap_err();
        assert_eq!(duplicate_column(&link), Some("unique_link_id"));
    }

    #[tokio::test]
    async fn status_write_checks_expected_value() {
        let store = MemoryStore::new();
        let now = OffsetDateTime::now_utc();
        let m = MeetingRepo::insert(
            &store,
            NewMeeting {
                organizer_id: Uuid::new_v4(),
                attendee_id: Uuid::new_v4(),
                start_at: now,
                end_at: now + Duration::hours(1),
                from_time: 0,
                to_time: 60,
                subject: "s".into(),
                notes: None,
                room_id: "room".into(),
                room_pin: "1234".into(),
            },
        )
        .await
        .unwrap();

        let stale = store
            .set_status(m.id, Some(MeetingStatus::Confirmed), MeetingStatus::Canceled)
            .await
            .unwrap();
        assert!(stale.is_none());

        let ok = store
            .set_status(m.id, Some(MeetingStatus::Pending), MeetingStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(ok.unwrap().status, MeetingStatus::Confirmed);

        let forced = store.set_status(m.id, None, MeetingStatus::Declined).await.unwrap();
        assert_eq!(forced.unwrap().status, MeetingStatus::Declined);
    }

    #[tokio::test]
    async fn token_is_consumed_once() {
        let store = MemoryStore::new();
        let user = UserRepo::insert(&store, new_user("a@x.com", "aaaaaaa")).await.unwrap();
        let tok = InteractionRepo::insert(
            &store,
            NewInteractionToken {
                user_id: user.id,
                kind: InteractionKind::PasswordReset,
                token: "t".into(),
                expires_at: OffsetDateTime::now_utc(),
            },
        )
        .await
        .unwrap();
        let now = OffsetDateTime::now_utc();
        let effect = TokenEffect::SetPasswordHash("new-hash");
        assert_eq!(store.redeem(&tok, effect, Some(now)).await.unwrap(), Redemption::Applied);
        assert_eq!(store.redeem(&tok, effect, Some(now)).await.unwrap(), Redemption::AlreadyUsed);

        let stored = UserRepo::find_by_id(&store, user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new-hash");
        let tok = store.find("t", InteractionKind::PasswordReset).await.unwrap().unwrap();
        assert_eq!(tok.consumed_at, Some(now));
    }

    #[tokio::test]
    async fn redemption_for_missing_user_leaves_token_unused() {
        let store = MemoryStore::new();
        let tok = InteractionRepo::insert(
            &store,
            NewInteractionToken {
                user_id: Uuid::new_v4(),
                kind: InteractionKind::EmailConfirmation,
                token: "orphan".into(),
                expires_at: OffsetDateTime::now_utc(),
            },
        )
        .await
        .unwrap();
        let outcome = store
            .redeem(&tok, TokenEffect::ConfirmEmail, Some(OffsetDateTime::now_utc()))
            .await
            .unwrap();
        assert_eq!(outcome, Redemption::UserMissing);
        let tok = store.find("orphan", InteractionKind::EmailConfirmation).await.unwrap().unwrap();
        assert!(tok.consumed_at.is_none());
    }
}
