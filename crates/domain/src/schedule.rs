use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// A time-of-day interval in minutes from midnight, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    pub start: u16,
    pub end: u16,
}

impl DayRange {
    pub fn contains(&self, minute_of_day: u16) -> bool {
        self.start <= minute_of_day && minute_of_day < self.end
    }
}

/// Weekly pause schedule for blocked services.
///
/// A day with a range means service blocking is paused inside that range.
/// The schedule is consulted by the caller that assembles per-request
/// service rules; the matcher itself never sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    #[serde(default)]
    pub sun: Option<DayRange>,
    #[serde(default)]
    pub mon: Option<DayRange>,
    #[serde(default)]
    pub tue: Option<DayRange>,
    #[serde(default)]
    pub wed: Option<DayRange>,
    #[serde(default)]
    pub thu: Option<DayRange>,
    #[serde(default)]
    pub fri: Option<DayRange>,
    #[serde(default)]
    pub sat: Option<DayRange>,
}

impl WeeklySchedule {
    fn day(&self, weekday: Weekday) -> Option<DayRange> {
        match weekday {
            Weekday::Sun => self.sun,
            Weekday::Mon => self.mon,
            Weekday::Tue => self.tue,
            Weekday::Wed => self.wed,
            Weekday::Thu => self.thu,
            Weekday::Fri => self.fri,
            Weekday::Sat => self.sat,
        }
    }

    /// True when `now` falls inside the pause window of its weekday.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let minute = (now.hour() * 60 + now.minute()) as u16;
        self.day(now.weekday())
            .map(|range| range.contains(minute))
            .unwrap_or(false)
    }
}
