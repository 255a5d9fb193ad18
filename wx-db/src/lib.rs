//! SQLite store for 10-minute weather station measurements.
//!
//! Measurements live in one long-format table keyed by station, UTC
//! timestamp and attribute, with missing values kept as `NULL`. Reads come
//! back as [`wx_core::Table`]s through the [`wx_core::TimeSeriesStore`]
//! trait, which is what the analog search consumes.
//!
//! # Usage
//!
//! ```rust
//! use wx_core::{Attribute, TimeRange, TimeSeriesStore};
//! use wx_db::Database;
//! use wx_utils::clock::SourceClock;
//!
//! let db = Database::new().unwrap();
//! db.load_measurements(
//!     "mythenquai",
//!     "timestamp_cet,air_temperature,humidity\n2021-11-25T00:00:00,4.2,81\n2021-11-25T00:10:00,4.1,.\n",
//!     SourceClock::Utc,
//! )
//! .unwrap();
//!
//! let day = chrono::NaiveDate::from_ymd_opt(2021, 11, 25).unwrap();
//! let table = db.query_range("mythenquai", &TimeRange::day(day), None).unwrap();
//! assert_eq!(table.columns, vec![Attribute::AirTemperature, Attribute::Humidity]);
//! assert_eq!(table.rows[1].values, vec![Some(4.1), None]);
//! ```
//!
//! # Tables
//!
//! See [`schema::create_schema`] for the SQL schema.

pub mod schema;
mod loader;
mod queries;
pub mod models;

use anyhow::anyhow;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Handle to the measurement store.
///
/// Cheap to clone; clones share one connection, so a handle can be moved
/// to other threads.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Create a new in-memory database with the schema applied.
    pub fn new() -> anyhow::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Open (or create) a database file and apply the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        log::info!("opened measurement store {}", path.display());
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(schema::create_schema())?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("measurement store connection poisoned"))
    }
}
