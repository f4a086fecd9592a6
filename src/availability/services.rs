use tracing::{info, warn};
use uuid::Uuid;

use crate::availability::repo_types::{AvailabilityWindow, NewWindow};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// Parses `day-fromOffset-toOffset`. Day is 0..=6 with 0 = Sunday, offsets are
/// minutes of the day and the window must be non-empty.
pub fn parse_window(entry: &str) -> ApiResult<NewWindow> {
    let invalid = || ApiError::Validation(format!("Invalid availability window {entry:?}."));

    let mut parts = entry.trim().split('-');
    let (Some(day), Some(from), Some(to), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    let week_day: i16 = day.trim().parse().map_err(|_| invalid())?;
    let from_time: i32 = from.trim().parse().map_err(|_| invalid())?;
    let to_time: i32 = to.trim().parse().map_err(|_| invalid())?;

    if !(0..=6).contains(&week_day)
        || from_time < 0
        || to_time > MINUTES_PER_DAY
        || from_time >= to_time
    {
        return Err(invalid());
    }
    Ok(NewWindow {
        week_day,
        from_time,
        to_time,
    })
}

pub async fn get_availability(st: &AppState, user_id: Uuid) -> ApiResult<Vec<AvailabilityWindow>> {
    if st.users.find_by_id(user_id).await?.is_none() {
        return Err(ApiError::NotFound("Could not find a user with the given id.".into()));
    }
    Ok(st.availability.list_for_user(user_id).await?)
}

/// Every entry is validated before the stored set is touched.
pub async fn replace_availability(
    st: &AppState,
    user_id: Uuid,
    entries: &[String],
) -> ApiResult<Vec<AvailabilityWindow>> {
    let windows = entries
        .iter()
        .map(|e| parse_window(e))
        .collect::<ApiResult<Vec<_>>>()
        .inspect_err(|e| warn!(%user_id, error = %e, "rejected availability update"))?;

    let stored = st.availability.replace_for_user(user_id, &windows).await?;
    info!(%user_id, count = stored.len(), "availability replaced");
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sign_up, test_state};

    #[test]
    fn parses_compound_window() {
        let w = parse_window("1-480-720").unwrap();
        assert_eq!(
            w,
            NewWindow {
                week_day: 1,
                from_time: 480,
                to_time: 720
            }
        );
    }

    #[test]
    fn rejects_malformed_windows() {
        for bad in ["", "1-480", "1-480-720-9", "x-480-720", "7-0-60", "1-600-600", "1-900-800", "1--5-60", "2-0-1441"] {
            assert!(
                matches!(parse_window(bad), Err(ApiError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_full_day() {
        assert!(parse_window("0-0-1440").is_ok());
    }

    #[tokio::test]
    async fn replace_then_get_returns_same_set_in_order() {
        let st = test_state();
        let user = sign_up(&st, "owner@x.com").await;

        let input: Vec<String> = ["3-600-660", "1-900-960", "1-480-540", "0-60-120"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        replace_availability(&st, user.id, &input).await.unwrap();

        let got: Vec<(i16, i32, i32)> = get_availability(&st, user.id)
            .await
            .unwrap()
            .into_iter()
            .map(|w| (w.week_day, w.from_time, w.to_time))
            .collect();
        assert_eq!(got, vec![(0, 60, 120), (1, 480, 540), (1, 900, 960), (3, 600, 660)]);
    }

    #[tokio::test]
    async fn replace_discards_previous_windows() {
        let st = test_state();
        let user = sign_up(&st, "owner@x.com").await;

        replace_availability(&st, user.id, &["1-480-540".into(), "2-480-540".into()])
            .await
            .unwrap();
        replace_availability(&st, user.id, &["5-60-90".into()]).await.unwrap();

        let got = get_availability(&st, user.id).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].week_day, 5);
    }

    #[tokio::test]
    async fn malformed_entry_leaves_stored_set_untouched() {
        let st = test_state();
        let user = sign_up(&st, "owner@x.com").await;
        replace_availability(&st, user.id, &["1-480-540".into()]).await.unwrap();

        let err = replace_availability(&st, user.id, &["2-60-90".into(), "oops".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let got = get_availability(&st, user.id).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].week_day, 1);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let st = test_state();
        let err = get_availability(&st, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
