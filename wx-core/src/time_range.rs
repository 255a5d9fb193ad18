use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum TimeRangeError {
    #[error("relative range must look like <count><unit> with unit one of s, m, h, d, w, y: {0}")]
    Malformed(String),
    #[error("relative range overflows: {0}")]
    Overflow(String),
}

/// A time span handed to the store.
///
/// `Last` is relative to the moment the query runs; `Between` is
/// absolute with both bounds inclusive. Timestamps are UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Last(TimeDelta),
    Between {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

impl TimeRange {
    /// The whole calendar day `date`, 00:00:00 through 23:59:59.
    pub fn day(date: NaiveDate) -> TimeRange {
        let start = date.and_time(NaiveTime::MIN);
        TimeRange::Between {
            start,
            end: start + TimeDelta::days(1) - TimeDelta::seconds(1),
        }
    }

    /// Inclusive `[start, end]` bounds once `now` is known.
    pub fn resolve(&self, now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
        match *self {
            TimeRange::Last(span) => (now - span, now),
            TimeRange::Between { start, end } => (start, end),
        }
    }
}

/// Parses the relative shorthand `30m`, `6h`, `1d`, `2w`, `1y`.
impl FromStr for TimeRange {
    type Err = TimeRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| TimeRangeError::Malformed(s.to_string()))?;
        let (count, unit) = s.split_at(split);
        let count: i64 = count
            .parse()
            .map_err(|_| TimeRangeError::Malformed(s.to_string()))?;
        let span = match unit {
            "s" => TimeDelta::try_seconds(count),
            "m" => TimeDelta::try_minutes(count),
            "h" => TimeDelta::try_hours(count),
            "d" => TimeDelta::try_days(count),
            "w" => TimeDelta::try_weeks(count),
            "y" => count.checked_mul(365).and_then(TimeDelta::try_days),
            _ => return Err(TimeRangeError::Malformed(s.to_string())),
        };
        span.map(TimeRange::Last)
            .ok_or_else(|| TimeRangeError::Overflow(s.to_string()))
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRange::Last(span) => write!(f, "last {}s", span.num_seconds()),
            TimeRange::Between { start, end } => write!(f, "{start} .. {end}"),
        }
    }
}
