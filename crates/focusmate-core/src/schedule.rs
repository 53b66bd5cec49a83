//! Day/time schedules for scheduled blocking.
//!
//! All times are local wall-clock: a "22:00-06:00 on monday" schedule means
//! Monday evening through Tuesday morning in the user's timezone. Ranges
//! whose end does not come after their start wrap past midnight.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Day of the week, serialized as the lowercase English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// A start/end pair in "HH:MM" format, inclusive at both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

impl TimeRange {
    /// True when `now_minutes` (minutes since local midnight) falls inside
    /// this range. `end <= start` is treated as an overnight range.
    fn contains(&self, now_minutes: u32) -> bool {
        let (start, end) = match (minutes_of(&self.start), minutes_of(&self.end)) {
            (Some(start), Some(end)) => (start, end),
            // An unparsable bound makes the range inert, not an error.
            _ => return false,
        };
        if end <= start {
            now_minutes >= start || now_minutes <= end
        } else {
            now_minutes >= start && now_minutes <= end
        }
    }
}

/// Weekdays plus one or more time ranges. Ranges are OR-ed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub days: Vec<DayOfWeek>,
    pub time_ranges: Vec<TimeRange>,
}

impl Schedule {
    /// Whether `now` falls inside this schedule.
    pub fn is_within(&self, now: NaiveDateTime) -> bool {
        let today = DayOfWeek::from(now.weekday());
        if !self.days.contains(&today) {
            return false;
        }
        let now_minutes = now.hour() * 60 + now.minute();
        self.time_ranges.iter().any(|range| range.contains(now_minutes))
    }
}

/// Parse "HH:MM" to minutes since midnight.
pub(crate) fn minutes_of(time: &str) -> Option<u32> {
    let (hours, minutes) = time.split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}
