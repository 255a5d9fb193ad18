//! Table output plus the `latest` and `gaps` commands.

use std::io::{self, Write};
use wx_analog::gaps::{anomalies, resample};
use wx_core::table::sampling_interval;
use wx_core::{Attribute, Table, TimeRange, TimeSeriesStore};
use wx_db::Database;
use wx_utils::dates::format_timestamp;

/// Write `table` as CSV: a `timestamp` column (UTC) followed by one column
/// per attribute. Missing values are empty cells.
pub fn write_table<W: Write>(table: &Table, writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec!["timestamp"];
    header.extend(table.columns.iter().map(|a| a.column()));
    wtr.write_record(&header)?;
    for row in &table.rows {
        let mut record = vec![format_timestamp(&row.timestamp)];
        record.extend(row.values.iter().map(|v| v.map(|v| v.to_string()).unwrap_or_default()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn run_latest(db: &Database, station: Option<&str>, attribute: Option<Attribute>) -> anyhow::Result<()> {
    let stations: Vec<String> = match station {
        Some(station) => vec![station.to_string()],
        None => db.query_stations()?.into_iter().map(|s| s.station_id).collect(),
    };
    let attributes: Vec<Attribute> = match attribute {
        Some(attribute) => vec![attribute],
        None => Attribute::ALL.to_vec(),
    };
    for station in &stations {
        for attribute in &attributes {
            if let Some(latest) = db.query_latest(station, *attribute)? {
                println!(
                    "{station:<16} {:<24} {:>10} at {}",
                    attribute.column(),
                    latest.value,
                    format_timestamp(&latest.timestamp)
                );
            }
        }
    }
    Ok(())
}

pub fn run_gaps(db: &Database, station: &str, range: &TimeRange, fill: bool) -> anyhow::Result<()> {
    let mut table = db.query_range(station, range, None)?;
    if fill {
        table = resample(&table, sampling_interval())?;
    }
    let found = anomalies(&table);
    log::info!("{station}: {} of {} rows have missing values", found.len(), table.len());
    let stdout = io::stdout();
    write_table(&found, stdout.lock())
}
