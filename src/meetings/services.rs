use std::collections::HashMap;

use time::{Duration, OffsetDateTime, UtcOffset};
use tracing::{info, warn};
use uuid::Uuid;

use crate::availability::services::MINUTES_PER_DAY;
use crate::config::TransitionPolicy;
use crate::email::{notify, templates};
use crate::error::{ApiError, ApiResult};
use crate::meetings::dto::CreateMeetingRequest;
use crate::meetings::repo_types::{Meeting, MeetingQuery, MeetingStatus, NewMeeting};
use crate::meetings::room::{new_room_id, new_room_pin};
use crate::state::AppState;
use crate::users::repo_types::{User, UserSummary};
use crate::users::services::user_not_found;

pub struct MeetingOutcome {
    pub meeting: Meeting,
    pub email_sent: bool,
}

/// A meeting with both participants' contact summaries attached.
#[derive(Debug)]
pub struct UpcomingMeeting {
    pub meeting: Meeting,
    pub organizer: Option<UserSummary>,
    pub attendee: Option<UserSummary>,
}

fn meeting_not_found() -> ApiError {
    ApiError::NotFound("Could not find a meeting with the given id.".into())
}

/// Sunday 00:00 UTC of the week containing `now`.
pub fn start_of_week(now: OffsetDateTime) -> OffsetDateTime {
    let date = now.to_offset(UtcOffset::UTC).date();
    let back = date.weekday().number_days_from_sunday();
    (date - Duration::days(back.into())).midnight().assume_utc()
}

fn validate_request(attendee_id: Uuid, req: &CreateMeetingRequest) -> ApiResult<()> {
    if req.subject.trim().is_empty() {
        return Err(ApiError::Validation("Subject must not be empty.".into()));
    }
    if req.start_at >= req.end_at {
        return Err(ApiError::Validation("Meeting must start before it ends.".into()));
    }
    if req.from_time < 0 || req.to_time > MINUTES_PER_DAY || req.from_time >= req.to_time {
        return Err(ApiError::Validation("Invalid meeting time offsets.".into()));
    }
    if req.organizer_id == attendee_id {
        return Err(ApiError::Validation("You cannot request a meeting with yourself.".into()));
    }
    Ok(())
}

/// Sends the templated status email to `recipient`. Lookup failures only cost the email.
async fn notify_participant(
    st: &AppState,
    meeting: &Meeting,
    event: templates::MeetingEvent,
    recipient: &User,
    counterpart: &User,
) -> bool {
    let link = format!("{}/meeting/{}", st.config.app_base_url, meeting.id);
    let counterpart_name = counterpart.full_name();
    let content = templates::meeting_update(
        &recipient.preferred_language_code,
        event,
        &templates::MeetingNotice {
            recipient: &recipient.first_name,
            counterpart: &counterpart_name,
            subject: &meeting.subject,
            start_at: meeting.start_at,
            link: &link,
        },
    );
    notify(st.mailer.as_ref(), &recipient.email, &content).await
}

/// The caller is the attendee; the new meeting starts out pending and the
/// organizer is told about it.
pub async fn request_meeting(
    st: &AppState,
    attendee_id: Uuid,
    req: CreateMeetingRequest,
) -> ApiResult<MeetingOutcome> {
    validate_request(attendee_id, &req)
        .inspect_err(|e| warn!(%attendee_id, error = %e, "rejected meeting request"))?;

    let attendee = st.users.find_by_id(attendee_id).await?.ok_or_else(user_not_found)?;
    let organizer = st
        .users
        .find_by_id(req.organizer_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::NotFound("Could not find the requested organizer.".into()))?;

    let meeting = st
        .meetings
        .insert(NewMeeting {
            organizer_id: organizer.id,
            attendee_id: attendee.id,
            start_at: req.start_at,
            end_at: req.end_at,
            from_time: req.from_time,
            to_time: req.to_time,
            subject: req.subject.trim().to_string(),
            notes: req.notes,
            room_id: new_room_id(),
            room_pin: new_room_pin(),
        })
        .await?;

    let email_sent = notify_participant(
        st,
        &meeting,
        templates::MeetingEvent::Requested,
        &organizer,
        &attendee,
    )
    .await;

    info!(meeting_id = %meeting.id, organizer_id = %organizer.id, %attendee_id, email_sent, "meeting requested");
    Ok(MeetingOutcome {
        meeting,
        email_sent,
    })
}

async fn transition(
    st: &AppState,
    caller: Uuid,
    meeting_id: Uuid,
    next: MeetingStatus,
) -> ApiResult<MeetingOutcome> {
    let current = st
        .meetings
        .find_by_id(meeting_id)
        .await?
        .ok_or_else(meeting_not_found)?;

    if !current.is_participant(caller) {
        warn!(%caller, %meeting_id, "status change by non-participant");
        return Err(ApiError::Forbidden(
            "Only the meeting's participants can change it.".into(),
        ));
    }

    let updated = match st.config.transitions {
        TransitionPolicy::Guarded => {
            if !current.status.can_become(next) {
                warn!(%meeting_id, from = %current.status, to = %next, "illegal meeting transition");
                return Err(ApiError::Conflict(format!(
                    "A {} meeting cannot be {}.",
                    current.status, next
                )));
            }
            if current.status == next {
                return Ok(MeetingOutcome {
                    meeting: current,
                    email_sent: false,
                });
            }
            st.meetings
                .set_status(meeting_id, Some(current.status), next)
                .await?
                .ok_or_else(|| {
                    ApiError::Conflict("The meeting was changed meanwhile, please reload it.".into())
                })?
        }
        TransitionPolicy::Overwrite => st
            .meetings
            .set_status(meeting_id, None, next)
            .await?
            .ok_or_else(meeting_not_found)?,
    };

    let event = match next {
        MeetingStatus::Confirmed => templates::MeetingEvent::Confirmed,
        MeetingStatus::Declined => templates::MeetingEvent::Declined,
        MeetingStatus::Canceled => templates::MeetingEvent::Canceled,
        MeetingStatus::Pending => templates::MeetingEvent::Requested,
    };
    // the participant who did not act is the one told about it
    let recipient_id = updated.counterpart_of(caller);
    let counterpart_id = caller;
    let email_sent = match (
        st.users.find_by_id(recipient_id).await?,
        st.users.find_by_id(counterpart_id).await?,
    ) {
        (Some(recipient), Some(counterpart)) => {
            notify_participant(st, &updated, event, &recipient, &counterpart).await
        }
        _ => {
            warn!(%meeting_id, "participant missing, notification skipped");
            false
        }
    };

    info!(%meeting_id, %caller, from = %current.status, to = %next, email_sent, "meeting status changed");
    Ok(MeetingOutcome {
        meeting: updated,
        email_sent,
    })
}

pub async fn confirm_meeting(st: &AppState, caller: Uuid, id: Uuid) -> ApiResult<MeetingOutcome> {
    transition(st, caller, id, MeetingStatus::Confirmed).await
}

pub async fn decline_meeting(st: &AppState, caller: Uuid, id: Uuid) -> ApiResult<MeetingOutcome> {
    transition(st, caller, id, MeetingStatus::Declined).await
}

pub async fn cancel_meeting(st: &AppState, caller: Uuid, id: Uuid) -> ApiResult<MeetingOutcome> {
    transition(st, caller, id, MeetingStatus::Canceled).await
}

pub async fn get_meeting(st: &AppState, caller: Uuid, id: Uuid) -> ApiResult<Meeting> {
    let meeting = st.meetings.find_by_id(id).await?.ok_or_else(meeting_not_found)?;
    if !meeting.is_participant(caller) {
        return Err(ApiError::Forbidden(
            "Only the meeting's participants can see it.".into(),
        ));
    }
    Ok(meeting)
}

/// Meetings of `user_id` on either side starting after `from` (default: start of
/// the current week). Participant summaries come from a single batch lookup.
pub async fn list_upcoming(
    st: &AppState,
    user_id: Uuid,
    status: Option<MeetingStatus>,
    from: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> ApiResult<Vec<UpcomingMeeting>> {
    let meetings = st
        .meetings
        .list(&MeetingQuery {
            user_id,
            organizer_only: false,
            statuses: status.into_iter().collect(),
            starts_after: from.unwrap_or_else(|| start_of_week(now)),
        })
        .await?;

    let mut ids: Vec<Uuid> = meetings
        .iter()
        .flat_map(|m| [m.organizer_id, m.attendee_id])
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let people: HashMap<Uuid, UserSummary> = st
        .users
        .summaries(&ids)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    Ok(meetings
        .into_iter()
        .map(|meeting| UpcomingMeeting {
            organizer: people.get(&meeting.organizer_id).cloned(),
            attendee: people.get(&meeting.attendee_id).cloned(),
            meeting,
        })
        .collect())
}

/// `Ok(false)` on a wrong PIN, `NotFound` when the room does not exist.
pub async fn validate_room_pin(st: &AppState, room_id: &str, pin: &str) -> ApiResult<bool> {
    let meeting = st
        .meetings
        .find_by_room(room_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Could not find the given room.".into()))?;
    let valid = meeting.room_pin == pin;
    if !valid {
        warn!(room_id, "room PIN mismatch");
    }
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sign_up, test_state, test_state_with, RecordingMailer};
    use time::macros::datetime;

    fn request_for(organizer: &User, start_at: OffsetDateTime) -> CreateMeetingRequest {
        CreateMeetingRequest {
            organizer_id: organizer.id,
            start_at,
            end_at: start_at + Duration::minutes(30),
            from_time: 600,
            to_time: 630,
            subject: "Intro call".into(),
            notes: None,
        }
    }

    fn tomorrow() -> OffsetDateTime {
        OffsetDateTime::now_utc() + Duration::days(1)
    }

    fn overwrite_state() -> AppState {
        test_state_with(
            |cfg| cfg.transitions = TransitionPolicy::Overwrite,
            RecordingMailer::new(),
        )
    }

    #[test]
    fn week_starts_on_sunday_midnight() {
        // a Wednesday
        let now = datetime!(2024-05-15 13:45 UTC);
        assert_eq!(start_of_week(now), datetime!(2024-05-12 0:00 UTC));
        // Sunday itself
        let sunday = datetime!(2024-05-12 23:59 UTC);
        assert_eq!(start_of_week(sunday), datetime!(2024-05-12 0:00 UTC));
        // offsets are normalized to UTC first
        let local = datetime!(2024-05-12 01:00 +03:00);
        assert_eq!(start_of_week(local), datetime!(2024-05-05 0:00 UTC));
    }

    #[tokio::test]
    async fn request_creates_pending_meeting_and_emails_organizer() {
        let mailer = RecordingMailer::new();
        let st = test_state_with(|_| {}, mailer.clone());
        let org = sign_up(&st, "org@x.com").await;
        let att = sign_up(&st, "att@x.com").await;

        let out = request_meeting(&st, att.id, request_for(&org, tomorrow())).await.unwrap();
        assert_eq!(out.meeting.status, MeetingStatus::Pending);
        assert_eq!(out.meeting.organizer_id, org.id);
        assert_eq!(out.meeting.attendee_id, att.id);
        assert_eq!(out.meeting.room_pin.len(), 4);
        assert!(out.email_sent);

        let mail = mailer.last_to("org@x.com").expect("organizer notified");
        assert!(mail.html.contains("Intro call"));
    }

    #[tokio::test]
    async fn request_validates_input() {
        let st = test_state();
        let org = sign_up(&st, "org@x.com").await;
        let att = sign_up(&st, "att@x.com").await;

        let mut blank = request_for(&org, tomorrow());
        blank.subject = "  ".into();
        let mut backwards = request_for(&org, tomorrow());
        backwards.end_at = backwards.start_at;
        let mut offsets = request_for(&org, tomorrow());
        offsets.to_time = MINUTES_PER_DAY + 1;

        for req in [blank, backwards, offsets] {
            let err = request_meeting(&st, att.id, req).await;
            assert!(matches!(err.err(), Some(ApiError::Validation(_))));
        }

        let err = request_meeting(&st, org.id, request_for(&org, tomorrow())).await;
        assert!(matches!(err.err(), Some(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn request_with_unknown_organizer_is_not_found() {
        let st = test_state();
        let att = sign_up(&st, "att@x.com").await;
        let mut ghost = att.clone();
        ghost.id = Uuid::new_v4();
        let err = request_meeting(&st, att.id, request_for(&ghost, tomorrow())).await;
        assert!(matches!(err.err(), Some(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn email_failure_does_not_fail_request() {
        let st = test_state_with(|_| {}, RecordingMailer::failing());
        let org = sign_up(&st, "org@x.com").await;
        let att = sign_up(&st, "att@x.com").await;
        let out = request_meeting(&st, att.id, request_for(&org, tomorrow())).await.unwrap();
        assert!(!out.email_sent);
        assert!(st.meetings.find_by_id(out.meeting.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn guarded_transitions_follow_the_table() {
        let mailer = RecordingMailer::new();
        let st = test_state_with(|_| {}, mailer.clone());
        let org = sign_up(&st, "org@x.com").await;
        let att = sign_up(&st, "att@x.com").await;
        let id = request_meeting(&st, att.id, request_for(&org, tomorrow()))
            .await
            .unwrap()
            .meeting
            .id;

        let confirmed = confirm_meeting(&st, org.id, id).await.unwrap();
        assert_eq!(confirmed.meeting.status, MeetingStatus::Confirmed);
        assert!(mailer.last_to("att@x.com").is_some());

        // re-applying is a no-op
        let again = confirm_meeting(&st, org.id, id).await.unwrap();
        assert_eq!(again.meeting.status, MeetingStatus::Confirmed);

        let err = decline_meeting(&st, org.id, id).await;
        assert!(matches!(err.err(), Some(ApiError::Conflict(_))));

        let canceled = cancel_meeting(&st, att.id, id).await.unwrap();
        assert_eq!(canceled.meeting.status, MeetingStatus::Canceled);
        assert!(mailer.last_to("org@x.com").unwrap().subject.to_lowercase().contains("cancel"));

        let err = confirm_meeting(&st, org.id, id).await;
        assert!(matches!(err.err(), Some(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn organizer_hears_about_attendee_decisions() {
        let mailer = RecordingMailer::new();
        let st = test_state_with(|_| {}, mailer.clone());
        let org = sign_up(&st, "org@x.com").await;
        let att = sign_up(&st, "att@x.com").await;
        let id = request_meeting(&st, att.id, request_for(&org, tomorrow()))
            .await
            .unwrap()
            .meeting
            .id;
        let to_attendee = || mailer.sent().iter().filter(|(to, _)| to == "att@x.com").count();
        let before = to_attendee();

        let out = confirm_meeting(&st, att.id, id).await.unwrap();
        assert_eq!(out.meeting.status, MeetingStatus::Confirmed);
        assert!(out.email_sent);
        let mail = mailer.last_to("org@x.com").expect("organizer notified");
        assert!(mail.subject.contains("confirmada"), "{}", mail.subject);
        assert!(mail.html.contains("Test User"));
        assert_eq!(to_attendee(), before);
    }

    #[tokio::test]
    async fn attendee_hears_about_organizer_decline() {
        let mailer = RecordingMailer::new();
        let st = test_state_with(|_| {}, mailer.clone());
        let org = sign_up(&st, "org@x.com").await;
        let att = sign_up(&st, "att@x.com").await;
        let id = request_meeting(&st, att.id, request_for(&org, tomorrow()))
            .await
            .unwrap()
            .meeting
            .id;

        decline_meeting(&st, org.id, id).await.unwrap();
        let mail = mailer.last_to("att@x.com").expect("attendee notified");
        assert!(mail.subject.contains("rechazada"), "{}", mail.subject);
    }

    #[tokio::test]
    async fn overwrite_policy_ignores_prior_status() {
        let st = overwrite_state();
        let org = sign_up(&st, "org@x.com").await;
        let att = sign_up(&st, "att@x.com").await;
        let id = request_meeting(&st, att.id, request_for(&org, tomorrow()))
            .await
            .unwrap()
            .meeting
            .id;

        let out = decline_meeting(&st, org.id, id).await.unwrap();
        assert_eq!(out.meeting.status, MeetingStatus::Declined);
        let out = confirm_meeting(&st, org.id, id).await.unwrap();
        assert_eq!(out.meeting.status, MeetingStatus::Confirmed);
        let out = cancel_meeting(&st, att.id, id).await.unwrap();
        assert_eq!(out.meeting.status, MeetingStatus::Canceled);
        let out = confirm_meeting(&st, att.id, id).await.unwrap();
        assert_eq!(out.meeting.status, MeetingStatus::Confirmed);
    }

    #[tokio::test]
    async fn outsiders_cannot_touch_a_meeting() {
        let st = test_state();
        let org = sign_up(&st, "org@x.com").await;
        let att = sign_up(&st, "att@x.com").await;
        let eve = sign_up(&st, "eve@x.com").await;
        let id = request_meeting(&st, att.id, request_for(&org, tomorrow()))
            .await
            .unwrap()
            .meeting
            .id;

        for res in [
            confirm_meeting(&st, eve.id, id).await.err(),
            decline_meeting(&st, eve.id, id).await.err(),
            cancel_meeting(&st, eve.id, id).await.err(),
        ] {
            assert!(matches!(res, Some(ApiError::Forbidden(_))));
        }
        assert!(matches!(get_meeting(&st, eve.id, id).await, Err(ApiError::Forbidden(_))));
        assert_eq!(get_meeting(&st, att.id, id).await.unwrap().id, id);

        let missing = confirm_meeting(&st, org.id, Uuid::new_v4()).await;
        assert!(matches!(missing.err(), Some(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn confirmed_meeting_is_listed_with_participants() {
        let st = test_state();
        let org = sign_up(&st, "org@x.com").await;
        let att = sign_up(&st, "att@x.com").await;
        let now = OffsetDateTime::now_utc();
        let start = now + Duration::days(2);

        let confirmed = request_meeting(&st, att.id, request_for(&org, start)).await.unwrap();
        confirm_meeting(&st, org.id, confirmed.meeting.id).await.unwrap();
        // a second, still pending meeting must not show up under the status filter
        request_meeting(&st, att.id, request_for(&org, start + Duration::hours(2)))
            .await
            .unwrap();

        let listed = list_upcoming(
            &st,
            org.id,
            Some(MeetingStatus::Confirmed),
            Some(start - Duration::seconds(1)),
            now,
        )
        .await
        .unwrap();
        assert_eq!(listed.len(), 1);
        let item = &listed[0];
        assert_eq!(item.meeting.id, confirmed.meeting.id);
        assert_eq!(item.meeting.status, MeetingStatus::Confirmed);
        assert_eq!(item.organizer.as_ref().unwrap().email, "org@x.com");
        assert_eq!(item.attendee.as_ref().unwrap().email, "att@x.com");

        // both sides see both meetings without a filter, earliest first
        let all = list_upcoming(&st, att.id, None, None, now).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].meeting.start_at < all[1].meeting.start_at);

        // the lower bound is exclusive
        let none = list_upcoming(&st, org.id, None, Some(start + Duration::hours(2)), now)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn room_pin_check() {
        let st = test_state();
        let org = sign_up(&st, "org@x.com").await;
        let att = sign_up(&st, "att@x.com").await;
        let m = request_meeting(&st, att.id, request_for(&org, tomorrow()))
            .await
            .unwrap()
            .meeting;

        assert!(validate_room_pin(&st, &m.room_id, &m.room_pin).await.unwrap());
        let wrong = if m.room_pin == "1000" { "1001" } else { "1000" };
        assert!(!validate_room_pin(&st, &m.room_id, wrong).await.unwrap());

        let err = validate_room_pin(&st, "no-such-room", &m.room_pin).await;
        assert!(matches!(err, Err(ApiError::NotFound(_))));
    }
}
