//! Day Partitioner.
//!
//! Cuts a multi-year pull into calendar days and each day into fixed-size
//! windows anchored at midnight, so that window keys line up across days.

use crate::config::WindowSize;
use chrono::{NaiveDate, NaiveTime, TimeDelta};
use std::collections::{BTreeMap, BTreeSet};
use wx_core::table::sampling_interval;
use wx_core::{Attribute, Row, Table};

/// One calendar day of one station, split into windows.
#[derive(Debug, Clone)]
pub struct Day {
    pub date: NaiveDate,
    pub table: Table,
    pub windows: BTreeMap<NaiveTime, Table>,
}

impl Day {
    pub fn new(date: NaiveDate, table: Table, window_size: WindowSize) -> Self {
        let windows = partition_day(&table, window_size);
        Day {
            date,
            table,
            windows,
        }
    }

    /// A day is complete when it has at least as many windows as the
    /// reference calendar.
    pub fn is_complete(&self, expected_windows: usize) -> bool {
        self.windows.len() >= expected_windows
    }
}

/// Group rows of every table by calendar date, re-shaped onto `columns`.
///
/// Seasonal windows of neighbouring years may share a boundary day; its
/// rows are kept once.
pub fn partition(tables: &[Table], columns: &[Attribute]) -> BTreeMap<NaiveDate, Table> {
    let mut days: BTreeMap<NaiveDate, Table> = BTreeMap::new();
    for table in tables {
        let aligned = table.align(columns);
        for row in aligned.rows {
            days.entry(row.timestamp.date())
                .or_insert_with(|| Table::new(&aligned.station, columns.to_vec()))
                .push(row);
        }
    }
    for table in days.values_mut() {
        table.sort_by_time();
        table.rows.dedup_by_key(|row| row.timestamp);
    }
    days
}

/// Split one day into windows keyed by their start time of day.
pub fn partition_day(day: &Table, window_size: WindowSize) -> BTreeMap<NaiveTime, Table> {
    let mut windows: BTreeMap<NaiveTime, Vec<Row>> = BTreeMap::new();
    for row in &day.rows {
        windows
            .entry(window_size.window_start(row.timestamp))
            .or_default()
            .push(row.clone());
    }
    windows
        .into_iter()
        .map(|(key, rows)| (key, day.with_rows(rows)))
        .collect()
}

/// Window count of a day with full 10-minute coverage.
pub fn reference_window_count(window_size: WindowSize) -> usize {
    let midnight = NaiveDate::default().and_time(NaiveTime::MIN);
    let step = sampling_interval();
    let slots = TimeDelta::days(1).num_minutes() / step.num_minutes();
    (0..slots)
        .map(|i| window_size.window_start(midnight + step * i as i32))
        .collect::<BTreeSet<NaiveTime>>()
        .len()
}

/// Partition history into [`Day`]s, chronologically.
pub fn days(tables: &[Table], columns: &[Attribute], window_size: WindowSize) -> Vec<Day> {
    partition(tables, columns)
        .into_iter()
        .map(|(date, table)| Day::new(date, table, window_size))
        .collect()
}
