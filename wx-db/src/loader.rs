//! CSV import of historical station archives.
//!
//! # CSV Format
//!
//! Header row required. One `timestamp_cet` column plus any number of
//! attribute columns named like [`Attribute::column`]; other columns are
//! ignored.
//!
//! ```text
//! timestamp_cet,air_temperature,water_temperature,humidity
//! 2007-04-15T12:00:00,14.3,11.1,52
//! 2007-04-15T12:10:00,14.5,.,51
//! ```
//!
//! `.`, `-`, `NaN` and empty cells are missing values and are stored as
//! `NULL`. Timestamps are converted to UTC with the given
//! [`SourceClock`].

use crate::models::LoadSummary;
use crate::Database;
use anyhow::{bail, Context};
use chrono::NaiveDateTime;
use flate2::read::GzDecoder;
use rusqlite::{params, Transaction};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use wx_core::{Attribute, Sample};
use wx_utils::clock::SourceClock;
use wx_utils::dates::{format_timestamp, parse_timestamp};

/// Name of the timestamp column in station archives.
pub const TIMESTAMP_COLUMN: &str = "timestamp_cet";

const MISSING_MARKERS: [&str; 4] = [".", "-", "", "NaN"];

const UPSERT: &str = "INSERT OR REPLACE INTO measurements (station_id, time, attribute, value)
                      VALUES (?1, ?2, ?3, ?4)";

impl Database {
    /// Load measurements of `station` from CSV text.
    pub fn load_measurements(
        &self,
        station: &str,
        csv_data: &str,
        clock: SourceClock,
    ) -> anyhow::Result<LoadSummary> {
        self.load_measurements_from(station, csv_data.as_bytes(), clock)
    }

    /// Load a CSV file; names ending in `.gz` are decompressed on the fly.
    pub fn load_measurements_file(
        &self,
        station: &str,
        path: &Path,
        clock: SourceClock,
    ) -> anyhow::Result<LoadSummary> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let reader = BufReader::new(file);
        let gzipped = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
        let summary = if gzipped {
            self.load_measurements_from(station, GzDecoder::new(reader), clock)
        } else {
            self.load_measurements_from(station, reader, clock)
        }
        .with_context(|| format!("importing {}", path.display()))?;
        Ok(summary)
    }

    /// Load measurements of `station` from any CSV reader, in one
    /// transaction.
    pub fn load_measurements_from<R: Read>(
        &self,
        station: &str,
        reader: R,
        clock: SourceClock,
    ) -> anyhow::Result<LoadSummary> {
        if station.trim().is_empty() {
            bail!("station name must not be empty");
        }
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let Some(time_index) = headers.iter().position(|h| h.trim() == TIMESTAMP_COLUMN) else {
            bail!("missing {TIMESTAMP_COLUMN} column, found: {:?}", headers.iter().collect::<Vec<_>>());
        };
        let mut columns: Vec<(usize, Attribute)> = Vec::new();
        for (index, header) in headers.iter().enumerate() {
            if index == time_index {
                continue;
            }
            match Attribute::from_column(header) {
                Some(attribute) => columns.push((index, attribute)),
                None => log::warn!("loader: ignoring unknown column {header:?}"),
            }
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut summary = LoadSummary::default();
        for result in rdr.records() {
            let record = result?;
            summary.rows += 1;
            let raw_time = record.get(time_index).unwrap_or("");
            let timestamp = match parse_timestamp(raw_time) {
                Ok(local) => clock.to_utc(local),
                Err(e) => {
                    log::debug!("loader: row {} skipped: {e}", summary.rows);
                    summary.skipped += 1;
                    continue;
                }
            };
            for (index, attribute) in &columns {
                let value = parse_value(record.get(*index).unwrap_or(""));
                upsert(&tx, station, timestamp, *attribute, value)?;
                summary.samples += 1;
                if value.is_none() {
                    summary.missing += 1;
                }
            }
        }
        tx.commit()?;
        log::info!(
            "loader: {station}: {} rows, {} samples ({} missing), {} skipped",
            summary.rows,
            summary.samples,
            summary.missing,
            summary.skipped
        );
        Ok(summary)
    }

    /// Insert or replace samples in one transaction. Returns how many were
    /// written.
    pub fn insert_samples(&self, samples: &[Sample]) -> anyhow::Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for sample in samples {
            upsert(&tx, &sample.station, sample.timestamp, sample.attribute, sample.value)?;
        }
        tx.commit()?;
        log::info!("loader: inserted {} samples", samples.len());
        Ok(samples.len())
    }
}

fn upsert(
    tx: &Transaction<'_>,
    station: &str,
    timestamp: NaiveDateTime,
    attribute: Attribute,
    value: Option<f64>,
) -> anyhow::Result<()> {
    tx.prepare_cached(UPSERT)?.execute(params![
        station,
        format_timestamp(&timestamp),
        attribute.column(),
        value
    ])?;
    Ok(())
}

/// Missing markers and unreadable cells become `None`.
fn parse_value(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if MISSING_MARKERS.contains(&raw) {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        Ok(_) => None,
        Err(_) => {
            log::debug!("loader: unreadable value {raw:?} stored as missing");
            None
        }
    }
}
