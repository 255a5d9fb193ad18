//! Read interface of the time-series store.
//!
//! The similarity engine only ever reads history through this trait, so
//! the SQLite store in `wx-db` and in-memory doubles in tests are
//! interchangeable.

use crate::attribute::Attribute;
use crate::table::Table;
use crate::time_range::TimeRange;
use chrono::{Datelike, Months, NaiveDate};

pub trait TimeSeriesStore {
    /// Rows of `station` within `range`. With `fields == None` every
    /// attribute with data is returned.
    fn query_range(
        &self,
        station: &str,
        range: &TimeRange,
        fields: Option<&[Attribute]>,
    ) -> anyhow::Result<Table>;

    /// One table per stored year holding the rows that fall within
    /// `months` months either side of `target`'s month/day in that year.
    /// Years without rows are omitted.
    fn query_yearly_window(
        &self,
        station: &str,
        fields: &[Attribute],
        target: NaiveDate,
        months: u32,
    ) -> anyhow::Result<Vec<Table>>;
}

impl<S: TimeSeriesStore + ?Sized> TimeSeriesStore for &S {
    fn query_range(
        &self,
        station: &str,
        range: &TimeRange,
        fields: Option<&[Attribute]>,
    ) -> anyhow::Result<Table> {
        (**self).query_range(station, range, fields)
    }

    fn query_yearly_window(
        &self,
        station: &str,
        fields: &[Attribute],
        target: NaiveDate,
        months: u32,
    ) -> anyhow::Result<Vec<Table>> {
        (**self).query_yearly_window(station, fields, target, months)
    }
}

/// Inclusive date bounds of the seasonal window around `target`'s
/// month/day in `year`.
///
/// February 29 falls back to February 28 in non-leap years.
pub fn yearly_window_bounds(target: NaiveDate, year: i32, months: u32) -> Option<(NaiveDate, NaiveDate)> {
    let anchor = NaiveDate::from_ymd_opt(year, target.month(), target.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, target.month(), target.day() - 1))?;
    let span = Months::new(months);
    Some((anchor.checked_sub_months(span)?, anchor.checked_add_months(span)?))
}
