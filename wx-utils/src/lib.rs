//! Shared utility functions for WX crates.

/// Date utility functions
pub mod dates {
    use chrono::{NaiveDate, NaiveDateTime};

    /// Storage format for timestamps: lexical order is chronological.
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Timestamp layouts found in archives and the live feed.
    const ACCEPTED_TIMESTAMP_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        TIMESTAMP_FORMAT,
        "%d.%m.%Y %H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
        timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Parse a timestamp in any of the accepted layouts.
    pub fn parse_timestamp(s: &str) -> anyhow::Result<NaiveDateTime> {
        let s = s.trim();
        ACCEPTED_TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .ok_or_else(|| anyhow::anyhow!("unrecognized timestamp: {s}"))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_format_and_parse() {
            let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
            let formatted = format_date(&date);
            assert_eq!(formatted, "2023-06-15");
            assert_eq!(parse_date(&formatted).unwrap(), date);
        }

        #[test]
        fn test_parse_timestamp_layouts() {
            let expected = NaiveDate::from_ymd_opt(2007, 8, 1)
                .unwrap()
                .and_hms_opt(13, 40, 0)
                .unwrap();
            assert_eq!(parse_timestamp("2007-08-01T13:40:00").unwrap(), expected);
            assert_eq!(parse_timestamp("2007-08-01 13:40:00").unwrap(), expected);
            assert_eq!(parse_timestamp("01.08.2007 13:40:00").unwrap(), expected);
            assert!(parse_timestamp("yesterday").is_err());
        }

        #[test]
        fn test_storage_format_sorts_chronologically() {
            let a = parse_timestamp("2019-12-31T23:50:00").unwrap();
            let b = parse_timestamp("2020-01-01T00:00:00").unwrap();
            assert!(format_timestamp(&a) < format_timestamp(&b));
        }
    }
}

/// Conversion of station-local timestamps to UTC.
pub mod clock {
    use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};
    use serde::{Deserialize, Serialize};
    use std::str::FromStr;

    /// How the source labels its timestamps.
    ///
    /// The station archives call their column `timestamp_cet`. `Cet`
    /// reads it literally (UTC+1 all year). `CentralEuropean` applies the
    /// EU summer-time rule (UTC+2 between the last Sunday of March 02:00
    /// and the last Sunday of October 03:00 local time); the repeated hour
    /// in October resolves to summer time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum SourceClock {
        Utc,
        #[default]
        Cet,
        CentralEuropean,
    }

    impl SourceClock {
        /// Convert a source-local timestamp into UTC.
        pub fn to_utc(&self, local: NaiveDateTime) -> NaiveDateTime {
            match self {
                SourceClock::Utc => local,
                SourceClock::Cet => local - TimeDelta::hours(1),
                SourceClock::CentralEuropean => {
                    if is_summer_time(local) {
                        local - TimeDelta::hours(2)
                    } else {
                        local - TimeDelta::hours(1)
                    }
                }
            }
        }
    }

    impl FromStr for SourceClock {
        type Err = anyhow::Error;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_ascii_lowercase().as_str() {
                "utc" => Ok(SourceClock::Utc),
                "cet" => Ok(SourceClock::Cet),
                "central-european" | "cet-cest" => Ok(SourceClock::CentralEuropean),
                other => anyhow::bail!("unknown source clock: {other}"),
            }
        }
    }

    fn last_sunday(year: i32, month: u32) -> Option<NaiveDate> {
        let last_day = NaiveDate::from_ymd_opt(year, month + 1, 1)?.pred_opt()?;
        let back = last_day.weekday().num_days_from_sunday();
        last_day.checked_sub_signed(TimeDelta::days(i64::from(back)))
    }

    /// EU summer time, evaluated on local wall-clock time.
    fn is_summer_time(local: NaiveDateTime) -> bool {
        let year = local.year();
        let (Some(start), Some(end)) = (last_sunday(year, 3), last_sunday(year, 10)) else {
            return false;
        };
        let (Some(start), Some(end)) = (start.and_hms_opt(2, 0, 0), end.and_hms_opt(3, 0, 0)) else {
            return false;
        };
        local >= start && local < end
    }

}
