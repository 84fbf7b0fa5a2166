use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;
use tracing::info;

use frontdesk_core::domain::slot::{SlotDay, SlotTime};

use crate::repositories::{PracticeStore, RepositoryError};

/// Standard weekday opening hours: three morning and four afternoon slots.
const STANDARD_HOURS: &[u16] = &[9, 10, 11, 13, 14, 15, 16];

/// A block of bookable weekdays starting at `start`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedSchedule {
    pub start: NaiveDate,
    pub days: u32,
    pub times: Vec<SlotTime>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    pub days_added: usize,
    pub days_skipped: usize,
    pub slots_added: usize,
}

impl SeedSchedule {
    pub fn standard(start: NaiveDate, days: u32) -> Self {
        let times = STANDARD_HOURS.iter().filter_map(|hour| SlotTime::from_hm(*hour, 0)).collect();
        Self { start, days, times }
    }

    /// Calendar days in the block, weekends excluded.
    pub fn slot_days(&self) -> Vec<SlotDay> {
        (0..i64::from(self.days))
            .map(|offset| self.start + Duration::days(offset))
            .filter(|date| !matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
            .map(|date| SlotDay::new(date, self.times.clone()))
            .collect()
    }

    /// Adds the schedule's days to the store. Days that already have an entry
    /// keep their current availability, so seeding twice changes nothing.
    pub async fn apply(&self, store: &dyn PracticeStore) -> Result<SeedResult, RepositoryError> {
        let before = store.load().await?;
        let mut practice = before.clone();
        let mut result = SeedResult::default();

        for day in self.slot_days() {
            let slots = day.slots.len();
            if practice.slots.insert_day(day) {
                result.days_added += 1;
                result.slots_added += slots;
            } else {
                result.days_skipped += 1;
            }
        }

        store.commit(&practice, &practice.changed_collections(&before)).await?;
        info!(
            event_name = "store.seed.applied",
            start = %self.start,
            days_added = result.days_added,
            days_skipped = result.days_skipped,
            "seeded slot schedule"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::SeedSchedule;
    use crate::repositories::{InMemoryPracticeStore, PracticeStore};

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 20).expect("date")
    }

    #[test]
    fn standard_schedule_skips_weekends() {
        let days = SeedSchedule::standard(monday(), 14).slot_days();

        assert_eq!(days.len(), 10);
        assert!(days.iter().all(|day| day.slots.len() == 7));
        assert_eq!(days[0].slots[0].to_string(), "9:00 AM");
        assert_eq!(days[0].slots[6].to_string(), "4:00 PM");
    }

    #[tokio::test]
    async fn seeding_is_idempotent_and_keeps_bookings() {
        let store = InMemoryPracticeStore::default();
        let schedule = SeedSchedule::standard(monday(), 7);

        let first = schedule.apply(&store).await.expect("seed");
        assert_eq!(first.days_added, 5);
        assert_eq!(first.slots_added, 35);

        let mut practice = store.load().await.expect("load");
        let before = practice.clone();
        practice.slots.reserve(monday(), "9:00 AM".parse().expect("time")).expect("reserve");
        store.commit(&practice, &practice.changed_collections(&before)).await.expect("commit");

        let second = schedule.apply(&store).await.expect("reseed");
        assert_eq!(second.days_added, 0);
        assert_eq!(second.days_skipped, 5);
        assert_eq!(store.load().await.expect("reload").slots.open_count(monday()), 6);
    }
}
