use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::slot::{SlotDay, SlotTime, TimeOfDay};
use crate::errors::BookingError;

/// Open slots per day, kept sorted by date.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotBook {
    days: Vec<SlotDay>,
}

impl SlotBook {
    pub fn new(days: Vec<SlotDay>) -> Self {
        let mut book = Self::default();
        for day in days {
            book.insert_day(day);
        }
        book
    }

    pub fn days(&self) -> &[SlotDay] {
        &self.days
    }

    pub fn day(&self, date: NaiveDate) -> Option<&SlotDay> {
        self.position(date).ok().map(|index| &self.days[index])
    }

    /// Adds a day that is not yet tracked. Existing days are left untouched.
    pub fn insert_day(&mut self, day: SlotDay) -> bool {
        match self.position(day.date) {
            Ok(_) => false,
            Err(index) => {
                self.days.insert(index, SlotDay::new(day.date, day.slots));
                true
            }
        }
    }

    pub fn is_open(&self, date: NaiveDate, time: SlotTime) -> bool {
        self.day(date).is_some_and(|day| day.contains(time))
    }

    pub fn open_count(&self, date: NaiveDate) -> usize {
        self.day(date).map_or(0, |day| day.slots.len())
    }

    pub fn first_open(&self, date: NaiveDate, count: usize) -> Vec<SlotTime> {
        self.day(date).map(|day| day.slots.iter().copied().take(count).collect()).unwrap_or_default()
    }

    /// Earliest day strictly after `after` with at least `needed` open slots.
    pub fn nearest_day_with_capacity(&self, after: NaiveDate, needed: usize) -> Option<&SlotDay> {
        self.days.iter().find(|day| day.date > after && day.slots.len() >= needed)
    }

    pub fn list_available(&self, window: DateWindow, times: &[TimeOfDay]) -> Vec<SlotDay> {
        self.days
            .iter()
            .filter(|day| window.contains(day.date))
            .map(|day| {
                let slots = day
                    .slots
                    .iter()
                    .copied()
                    .filter(|slot| times.is_empty() || times.contains(&TimeOfDay::of(*slot)))
                    .collect::<Vec<_>>();
                SlotDay { date: day.date, slots }
            })
            .filter(|day| !day.slots.is_empty())
            .collect()
    }

    /// Puts a time back into availability. Releasing an already-open time is a
    /// no-op; the return value tells whether anything changed.
    pub fn release(&mut self, date: NaiveDate, time: SlotTime) -> bool {
        let index = match self.position(date) {
            Ok(index) => index,
            Err(index) => {
                self.days.insert(index, SlotDay { date, slots: Vec::new() });
                index
            }
        };

        let slots = &mut self.days[index].slots;
        match slots.binary_search(&time) {
            Ok(_) => false,
            Err(position) => {
                slots.insert(position, time);
                true
            }
        }
    }

    pub fn reserve(&mut self, date: NaiveDate, time: SlotTime) -> Result<(), BookingError> {
        let unavailable = || BookingError::SlotUnavailable { date, time };
        let index = self.position(date).map_err(|_| unavailable())?;
        let slots = &mut self.days[index].slots;
        let position = slots.binary_search(&time).map_err(|_| unavailable())?;
        slots.remove(position);
        Ok(())
    }

    /// Reserves several times on one day, all or nothing.
    pub fn reserve_batch(&mut self, date: NaiveDate, times: &[SlotTime]) -> Result<(), BookingError> {
        if let Some(missing) = times.iter().find(|time| !self.is_open(date, **time)) {
            return Err(BookingError::SlotUnavailable { date, time: *missing });
        }
        for time in times {
            self.reserve(date, *time)?;
        }
        Ok(())
    }

    fn position(&self, date: NaiveDate) -> Result<usize, usize> {
        self.days.binary_search_by_key(&date, |day| day.date)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    fn offset(reference: NaiveDate, from_days: i64, to_days: i64) -> Self {
        Self::new(reference + Duration::days(from_days), reference + Duration::days(to_days))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Slot search arguments in their raw conversational form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub preferred_times: Vec<String>,
    pub subjective_date: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlots {
    pub window: DateWindow,
    pub preferred_times: Vec<TimeOfDay>,
    pub days: Vec<SlotDay>,
}

/// Turns loosely specified dates into concrete windows relative to a
/// reference date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotCalendar {
    pub reference_date: NaiveDate,
    pub deployment_year: i32,
    pub default_window_days: u32,
}

impl SlotCalendar {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { reference_date, deployment_year: reference_date.year(), default_window_days: 14 }
    }

    pub fn query(&self, book: &SlotBook, query: &SlotQuery) -> AvailableSlots {
        let window = self.resolve_window(
            query.start_date.as_deref(),
            query.end_date.as_deref(),
            query.subjective_date.as_deref(),
        );
        let mut preferred_times = Vec::new();
        for bucket in query.preferred_times.iter().filter_map(|value| TimeOfDay::parse(value)) {
            if !preferred_times.contains(&bucket) {
                preferred_times.push(bucket);
            }
        }

        AvailableSlots { window, days: book.list_available(window, &preferred_times), preferred_times }
    }

    /// A subjective phrase wins over explicit dates; an unparseable start date
    /// falls back to the default window.
    pub fn resolve_window(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        subjective: Option<&str>,
    ) -> DateWindow {
        if let Some(phrase) = subjective.map(str::trim).filter(|phrase| !phrase.is_empty()) {
            return self.resolve_subjective(phrase);
        }

        let Some(start) = start.and_then(|value| self.parse_date(value)) else {
            return self.default_window(self.reference_date);
        };

        match end.and_then(|value| self.parse_date(value)) {
            Some(end) => DateWindow::new(start, end),
            None => self.default_window(start),
        }
    }

    pub fn resolve_subjective(&self, phrase: &str) -> DateWindow {
        let reference = self.reference_date;
        let phrase = phrase.trim().to_ascii_lowercase();
        let phrase = phrase.as_str();

        if phrase.contains("asap") || phrase.contains("as soon as possible") || phrase == "soon" {
            return DateWindow::offset(reference, 0, 3);
        }
        if phrase.contains("next week") {
            return if phrase.contains("early") {
                DateWindow::offset(reference, 7, 9)
            } else if phrase.contains("late") {
                DateWindow::offset(reference, 11, 13)
            } else {
                DateWindow::offset(reference, 7, 13)
            };
        }
        if phrase.contains("next month") {
            return DateWindow::offset(reference, 28, 41);
        }
        if phrase.contains("later this week") {
            return DateWindow::offset(reference, 2, 6);
        }
        if phrase.contains("this week") {
            return DateWindow::offset(reference, 0, 6);
        }
        if phrase.contains("tomorrow") {
            return DateWindow::offset(reference, 1, 1);
        }
        if phrase.contains("today") {
            return DateWindow::offset(reference, 0, 0);
        }

        DateWindow::offset(reference, 0, 6)
    }

    /// Parses `YYYY-MM-DD`, replacing a year outside the bookable range with
    /// the deployment year.
    pub fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        let mut parts = raw.trim().splitn(3, '-');
        let year = parts.next()?.parse::<i32>().ok()?;
        let month = parts.next()?.parse::<u32>().ok()?;
        let day = parts.next()?.parse::<u32>().ok()?;

        let year = if (self.deployment_year..=self.deployment_year + 1).contains(&year) {
            year
        } else {
            self.deployment_year
        };
        NaiveDate::from_ymd_opt(year, month, day)
    }

    fn default_window(&self, start: NaiveDate) -> DateWindow {
        let span = i64::from(self.default_window_days.max(1)) - 1;
        DateWindow::new(start, start + Duration::days(span))
    }
}
