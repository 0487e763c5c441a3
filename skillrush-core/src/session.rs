//! Login tracking and streak computation
//!
//! A streak counts consecutive calendar days with at least one login.
//! Days are split at midnight in the configured zone, not by rolling
//! 24-hour windows.

use crate::config::DayBoundary;
use crate::credentials::{normalize_id, CredentialStore};
use crate::error::Result;
use crate::event::SyncEvent;
use crate::record::StudentRecord;
use crate::records::RecordStore;
use chrono::NaiveDate;

/// Streak after a login on `today`, given the previous login date.
///
/// A clock that moved backwards (negative gap) resets the streak.
pub fn next_streak(last_login: Option<NaiveDate>, streak: u32, today: NaiveDate) -> u32 {
    let Some(last) = last_login else {
        return 1;
    };
    match (today - last).num_days() {
        0 => streak.max(1),
        1 => streak.saturating_add(1),
        _ => 1,
    }
}

#[derive(Clone)]
pub struct LoginTracker {
    records: RecordStore,
    boundary: DayBoundary,
}

impl LoginTracker {
    pub fn new(records: RecordStore, boundary: DayBoundary) -> Self {
        Self { records, boundary }
    }

    /// Apply the streak transition for a login at `now`.
    pub fn apply_login(&self, record: &mut StudentRecord, now: i64) {
        let last = record.last_login.and_then(|ts| self.boundary.date_of(ts));
        record.streak = match self.boundary.date_of(now) {
            Some(today) => next_streak(last, record.streak, today),
            None => 1,
        };
        record.last_login = Some(now);
    }

    /// Record a successful login happening now.
    pub async fn touch_login(&self, id: &str) -> Result<StudentRecord> {
        self.touch_login_at(id, chrono::Utc::now().timestamp_millis()).await
    }

    /// Record a successful login at `now` (Unix millis) and enqueue a
    /// `login` event in the same transaction.
    pub async fn touch_login_at(&self, id: &str, now: i64) -> Result<StudentRecord> {
        let (record, seq) = self
            .records
            .update(id, |record| {
                self.apply_login(record, now);
                Ok(Some(SyncEvent::login(record.id.clone(), now)))
            })
            .await?;
        tracing::info!(
            "Login for {} (streak {}, outbox #{})",
            record.id,
            record.streak,
            seq.unwrap_or_default()
        );
        Ok(record)
    }

    /// Verify credentials and, on success, record the login.
    ///
    /// Returns `None` for bad credentials without saying which part was
    /// wrong.
    pub async fn login(
        &self,
        credentials: &CredentialStore,
        id: &str,
        password: &str,
    ) -> Result<Option<StudentRecord>> {
        let id = normalize_id(id);
        if id.is_empty() || password.is_empty() {
            return Ok(None);
        }
        if !credentials.verify(id, password).await? {
            return Ok(None);
        }
        self.touch_login(id).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::db::Database;
    use crate::error::StoreError;
    use crate::outbox::OutboxQueue;
    use chrono::{FixedOffset, TimeZone};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(n)
    }

    #[test]
    fn test_streak_transitions() {
        assert_eq!(next_streak(Some(day(0)), 3, day(0)), 3);
        assert_eq!(next_streak(Some(day(0)), 3, day(1)), 4);
        assert_eq!(next_streak(Some(day(0)), 3, day(3)), 1);
        assert_eq!(next_streak(None, 3, day(0)), 1);
    }

    #[test]
    fn test_same_day_never_leaves_zero() {
        assert_eq!(next_streak(Some(day(5)), 0, day(5)), 1);
    }

    #[test]
    fn test_clock_skew_resets() {
        assert_eq!(next_streak(Some(day(5)), 9, day(4)), 1);
    }

    proptest! {
        #[test]
        fn prop_streak_is_positive_and_bounded(prev in 0u32..10_000, last in -400i64..400, today in -400i64..400) {
            let next = next_streak(Some(day(last)), prev, day(today));
            prop_assert!(next >= 1);
            prop_assert!(next <= prev.max(1) + 1);
            if today == last + 1 {
                prop_assert_eq!(next, prev + 1);
            }
        }
    }

    fn ist() -> DayBoundary {
        DayBoundary::Fixed(FixedOffset::east_opt(330 * 60).unwrap())
    }

    fn millis(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        FixedOffset::east_opt(330 * 60)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn tracker() -> (LoginTracker, RecordStore) {
        let (tracker, records, _) = tracker_with_outbox();
        (tracker, records)
    }

    fn tracker_with_outbox() -> (LoginTracker, RecordStore, OutboxQueue) {
        let db = Arc::new(Database::open(&StoreConfig::in_memory()).unwrap());
        let records = RecordStore::new(db.clone());
        (LoginTracker::new(records.clone(), ist()), records, OutboxQueue::new(db))
    }

    #[test]
    fn test_calendar_day_not_rolling_window() {
        let (tracker, _) = tracker();
        let mut r = StudentRecord::new("s1".into(), "A".into(), "h".into(), 0);
        tracker.apply_login(&mut r, millis(2024, 5, 1, 23, 50));
        assert_eq!(r.streak, 1);
        // Twenty minutes later but on the next calendar day.
        tracker.apply_login(&mut r, millis(2024, 5, 2, 0, 10));
        assert_eq!(r.streak, 2);
        // Almost 48 hours later: two calendar days on, so reset.
        tracker.apply_login(&mut r, millis(2024, 5, 4, 0, 0));
        assert_eq!(r.streak, 1);
    }

    #[tokio::test]
    async fn test_touch_login_persists_and_enqueues() {
        let (tracker, records, outbox) = tracker_with_outbox();
        let r = StudentRecord::new("s1".into(), "A".into(), "h".into(), 0);
        records.put(&r).await.unwrap();

        let now = millis(2024, 6, 10, 9, 0);
        let updated = tracker.touch_login_at("s1", now).await.unwrap();
        assert_eq!(updated.streak, 1);
        assert_eq!(updated.last_login, Some(now));
        assert_eq!(records.get("s1").await.unwrap().unwrap(), updated);

        let events: Vec<_> = outbox.drain_all().await.unwrap().into_iter().map(|e| e.event).collect();
        assert_eq!(events, vec![SyncEvent::login("s1", now)]);
    }

    #[tokio::test]
    async fn test_login_and_verify_agree_on_padded_id() {
        let (tracker, records) = tracker();
        let credentials = CredentialStore::new(records, 4);
        credentials.register("s1", "A", "pw").await.unwrap();

        assert!(credentials.verify(" s1 ", "pw").await.unwrap());
        let record = tracker.login(&credentials, " s1 ", "pw").await.unwrap().unwrap();
        assert_eq!(record.id, "s1");
        assert_eq!(record.streak, 1);
    }

    #[tokio::test]
    async fn test_touch_login_unknown_student() {
        let (tracker, _) = tracker();
        let err = tracker.touch_login("ghost").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
