//! SQL schema of the measurement store.

/// Returns the full SQL schema as a single batch string.
///
/// `measurements` holds one row per station, UTC timestamp
/// (`YYYY-MM-DD HH:MM:SS`, so text order is time order) and attribute
/// column name. `value` is `NULL` when the station reported the attribute
/// as missing.
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS measurements (
        station_id TEXT NOT NULL,
        time TEXT NOT NULL,
        attribute TEXT NOT NULL,
        value REAL,
        PRIMARY KEY (station_id, time, attribute)
    );
    CREATE INDEX IF NOT EXISTS idx_measurements_time ON measurements(time);
    CREATE INDEX IF NOT EXISTS idx_measurements_station_attribute ON measurements(station_id, attribute, time);
    "#
}
