use time::OffsetDateTime;
use tracing::debug;

use crate::availability::repo_types::AvailabilityWindow;
use crate::error::{ApiError, ApiResult};
use crate::meetings::repo_types::{Meeting, MeetingQuery, MeetingStatus};
use crate::meetings::services::start_of_week;
use crate::state::AppState;
use crate::users::repo_types::User;

/// Everything a visitor needs to pick a slot on someone's booking page.
#[derive(Debug)]
pub struct BookingPage {
    pub owner: User,
    pub windows: Vec<AvailabilityWindow>,
    pub busy: Vec<Meeting>,
}

/// Resolves a public link slug. Busy time is the owner's pending or confirmed
/// meetings as organizer that start after `from` (default: start of this week).
pub async fn resolve_by_link(
    st: &AppState,
    slug: &str,
    from: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> ApiResult<BookingPage> {
    let owner = st
        .users
        .find_by_link(slug)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::NotFound("Could not find a user for the given link.".into()))?;

    let windows = st.availability.list_for_user(owner.id).await?;
    let busy = st
        .meetings
        .list(&MeetingQuery {
            user_id: owner.id,
            organizer_only: true,
            statuses: vec![MeetingStatus::Pending, MeetingStatus::Confirmed],
            starts_after: from.unwrap_or_else(|| start_of_week(now)),
        })
        .await?;

    debug!(user_id = %owner.id, windows = windows.len(), busy = busy.len(), "booking link resolved");
    Ok(BookingPage {
        owner,
        windows,
        busy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::services::replace_availability;
    use crate::meetings::dto::CreateMeetingRequest;
    use crate::meetings::services::{decline_meeting, request_meeting};
    use crate::testing::{sign_up, test_state};
    use time::Duration;

    #[tokio::test]
    async fn resolves_profile_windows_and_busy_time() {
        let st = test_state();
        let owner = sign_up(&st, "owner@x.com").await;
        let guest = sign_up(&st, "guest@x.com").await;
        replace_availability(&st, owner.id, &["2-600-720".to_string(), "1-480-540".to_string()])
            .await
            .unwrap();

        let now = OffsetDateTime::now_utc();
        let mut ids = Vec::new();
        for h in [24, 48] {
            let start = now + Duration::hours(h);
            let out = request_meeting(
                &st,
                guest.id,
                CreateMeetingRequest {
                    organizer_id: owner.id,
                    start_at: start,
                    end_at: start + Duration::minutes(30),
                    from_time: 600,
                    to_time: 630,
                    subject: "Chat".into(),
                    notes: None,
                },
            )
            .await
            .unwrap();
            ids.push(out.meeting.id);
        }
        decline_meeting(&st, owner.id, ids[1]).await.unwrap();

        let page = resolve_by_link(&st, &owner.unique_link_id, None, now).await.unwrap();
        assert_eq!(page.owner.id, owner.id);
        assert_eq!(page.windows.len(), 2);
        assert_eq!(page.windows[0].week_day, 1);
        assert_eq!(page.busy.len(), 1);
        assert_eq!(page.busy[0].id, ids[0]);

        // the guest has no meetings as organizer
        let page = resolve_by_link(&st, &guest.unique_link_id, None, now).await.unwrap();
        assert!(page.busy.is_empty());
    }

    #[tokio::test]
    async fn unknown_slug_is_not_found() {
        let st = test_state();
        let err = resolve_by_link(&st, "zzzzzzz", None, OffsetDateTime::now_utc()).await;
        assert!(matches!(err, Err(ApiError::NotFound(_))));
    }
}
