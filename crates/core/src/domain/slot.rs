use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A bookable time of day, kept as minutes past midnight and rendered as a
/// 12-hour label such as `2:00 PM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotTime(u16);

impl SlotTime {
    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self(hour * 60 + minute))
    }

    pub fn minutes(&self) -> u16 {
        self.0
    }

    pub fn hour(&self) -> u16 {
        self.0 / 60
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotTimeParseError(pub String);

impl fmt::Display for SlotTimeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` is not a valid time label", self.0)
    }
}

impl std::error::Error for SlotTimeParseError {}

impl FromStr for SlotTime {
    type Err = SlotTimeParseError;

    /// Accepts `2:00 PM`, `2pm`, `02:00 p.m.` and 24-hour `14:00`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let error = || SlotTimeParseError(raw.to_string());
        let normalized = raw.trim().to_ascii_uppercase().replace('.', "");

        let (clock, pm) = if let Some(rest) = normalized.strip_suffix("AM") {
            (rest.trim(), Some(false))
        } else if let Some(rest) = normalized.strip_suffix("PM") {
            (rest.trim(), Some(true))
        } else {
            (normalized.as_str(), None)
        };

        let (hour, minute) = match clock.split_once(':') {
            Some((hour, minute)) if minute.len() == 2 => (hour.parse::<u16>(), minute.parse::<u16>()),
            Some(_) => return Err(error()),
            None => (clock.parse::<u16>(), Ok(0)),
        };
        let (hour, minute) = (hour.map_err(|_| error())?, minute.map_err(|_| error())?);

        let hour = match pm {
            Some(_) if hour == 0 || hour > 12 => return Err(error()),
            Some(pm) => hour % 12 + if pm { 12 } else { 0 },
            None => hour,
        };

        Self::from_hm(hour, minute).ok_or_else(error)
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hour = self.hour();
        let minute = self.0 % 60;
        let meridiem = if hour < 12 { "AM" } else { "PM" };
        let display_hour = match hour % 12 {
            0 => 12,
            other => other,
        };
        write!(f, "{display_hour}:{minute:02} {meridiem}")
    }
}

impl TryFrom<String> for SlotTime {
    type Error = SlotTimeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotTime> for String {
    fn from(value: SlotTime) -> Self {
        value.to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// Morning ends at noon, evening starts at 5 PM.
    pub fn of(time: SlotTime) -> Self {
        match time.hour() {
            0..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            _ => Self::Evening,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            "evening" => Some(Self::Evening),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDay {
    pub date: NaiveDate,
    pub slots: Vec<SlotTime>,
}

impl SlotDay {
    pub fn new(date: NaiveDate, mut slots: Vec<SlotTime>) -> Self {
        slots.sort();
        slots.dedup();
        Self { date, slots }
    }

    pub fn contains(&self, time: SlotTime) -> bool {
        self.slots.binary_search(&time).is_ok()
    }
}
