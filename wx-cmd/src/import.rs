//! Import of historical station archives into the store.

use log::info;
use std::path::Path;
use wx_db::Database;
use wx_utils::clock::SourceClock;

/// Load one archive file (plain or gzipped CSV) for `station`.
pub fn run_import(db: &Database, station: &str, file: &Path, clock: SourceClock) -> anyhow::Result<()> {
    info!("Importing {} for {station} ({clock:?} timestamps)", file.display());
    let summary = db.load_measurements_file(station, file, clock)?;
    if summary.skipped > 0 {
        log::warn!("{} rows of {} had unreadable timestamps", summary.skipped, file.display());
    }
    println!(
        "{station}: {} rows, {} samples, {} missing, {} skipped",
        summary.rows, summary.samples, summary.missing, summary.skipped
    );
    if let Some(last) = db.query_last_timestamp(station)? {
        info!("{station} now ends at {last}");
    }
    Ok(())
}
