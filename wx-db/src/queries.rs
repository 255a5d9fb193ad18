//! Read queries over the measurement store.
//!
//! Tables are pivoted from the long format: one row per timestamp, one
//! column per attribute that carries at least one value in the result.

use crate::models::{LatestValue, StationInfo};
use crate::Database;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use rusqlite::{params, OptionalExtension};
use wx_core::store::yearly_window_bounds;
use wx_core::{Attribute, Table, TimeRange, TimeSeriesStore};
use wx_utils::dates::{format_timestamp, parse_timestamp};

impl Database {
    /// Rows of `station` with `start <= time <= end`.
    fn query_between(
        &self,
        station: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        fields: Option<&[Attribute]>,
    ) -> anyhow::Result<Table> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT time, attribute, value FROM measurements
             WHERE station_id = ?1 AND time >= ?2 AND time <= ?3
             ORDER BY time",
        )?;
        let raw = stmt
            .query_map(
                params![station, format_timestamp(&start), format_timestamp(&end)],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                    ))
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        let mut samples = Vec::with_capacity(raw.len());
        for (time, attribute, value) in raw {
            let Some(attribute) = Attribute::from_column(&attribute) else {
                continue;
            };
            samples.push((parse_timestamp(&time)?, attribute, value));
        }
        let requested = fields.unwrap_or(&Attribute::ALL[..]);
        let columns: Vec<Attribute> = requested
            .iter()
            .copied()
            .filter(|a| samples.iter().any(|(_, sa, v)| sa == a && v.is_some()))
            .collect();
        let table = Table::from_samples(station, &columns, samples);
        log::debug!(
            "query: {station} {start}..{end} returned {} rows x {} columns",
            table.len(),
            table.columns.len()
        );
        Ok(table)
    }

    /// Every station with its first and last timestamp.
    pub fn query_stations(&self) -> anyhow::Result<Vec<StationInfo>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT station_id, MIN(time), MAX(time), COUNT(*) FROM measurements
             GROUP BY station_id
             ORDER BY station_id",
        )?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter()
            .map(|(station_id, first, last, samples)| -> anyhow::Result<StationInfo> {
                Ok(StationInfo {
                    station_id,
                    first: parse_timestamp(&first)?,
                    last: parse_timestamp(&last)?,
                    samples,
                })
            })
            .collect()
    }

    /// Timestamp of the newest stored measurement of `station`.
    pub fn query_last_timestamp(&self, station: &str) -> anyhow::Result<Option<NaiveDateTime>> {
        let conn = self.conn()?;
        let last: Option<String> = conn.query_row(
            "SELECT MAX(time) FROM measurements WHERE station_id = ?1",
            params![station],
            |row| row.get(0),
        )?;
        last.map(|t| parse_timestamp(&t)).transpose()
    }

    /// Newest non-missing value of `attribute` at `station`.
    pub fn query_latest(&self, station: &str, attribute: Attribute) -> anyhow::Result<Option<LatestValue>> {
        let conn = self.conn()?;
        let latest: Option<(String, f64)> = conn
            .query_row(
                "SELECT time, value FROM measurements
                 WHERE station_id = ?1 AND attribute = ?2 AND value IS NOT NULL
                 ORDER BY time DESC
                 LIMIT 1",
                params![station, attribute.column()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        latest
            .map(|(time, value)| -> anyhow::Result<LatestValue> {
                Ok(LatestValue {
                    station_id: station.to_string(),
                    attribute,
                    timestamp: parse_timestamp(&time)?,
                    value,
                })
            })
            .transpose()
    }

    /// First and last calendar year with data for `station`.
    pub fn query_year_span(&self, station: &str) -> anyhow::Result<Option<(i32, i32)>> {
        let conn = self.conn()?;
        let (first, last): (Option<String>, Option<String>) = conn.query_row(
            "SELECT MIN(time), MAX(time) FROM measurements WHERE station_id = ?1",
            params![station],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        match (first, last) {
            (Some(first), Some(last)) => Ok(Some((
                parse_timestamp(&first)?.year(),
                parse_timestamp(&last)?.year(),
            ))),
            _ => Ok(None),
        }
    }
}

impl TimeSeriesStore for Database {
    fn query_range(
        &self,
        station: &str,
        range: &TimeRange,
        fields: Option<&[Attribute]>,
    ) -> anyhow::Result<Table> {
        let (start, end) = range.resolve(Utc::now().naive_utc());
        self.query_between(station, start, end, fields)
    }

    fn query_yearly_window(
        &self,
        station: &str,
        fields: &[Attribute],
        target: NaiveDate,
        months: u32,
    ) -> anyhow::Result<Vec<Table>> {
        let Some((first_year, last_year)) = self.query_year_span(station)? else {
            return Ok(Vec::new());
        };
        let mut tables = Vec::new();
        // a window anchored in year Y may reach into Y - 1 or Y + 1
        for year in first_year - 1..=last_year + 1 {
            let Some((start, end)) = yearly_window_bounds(target, year, months) else {
                continue;
            };
            let start = start.and_time(NaiveTime::MIN);
            let end = end.and_time(NaiveTime::MIN) + TimeDelta::days(1) - TimeDelta::seconds(1);
            let table = self.query_between(station, start, end, Some(fields))?;
            if !table.is_empty() {
                tables.push(table);
            }
        }
        log::info!(
            "query: {station} +-{months} months around {}: {} years with data",
            target.format("%m-%d"),
            tables.len()
        );
        Ok(tables)
    }
}
