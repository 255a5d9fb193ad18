//! Query and import result structs.

use chrono::NaiveDateTime;
use serde::Serialize;
use wx_core::Attribute;

/// Counts reported by a CSV import.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct LoadSummary {
    /// Data rows read, including skipped ones.
    pub rows: usize,
    /// Measurements written, missing ones included.
    pub samples: usize,
    /// Measurements written as `NULL`.
    pub missing: usize,
    /// Rows dropped because their timestamp could not be read.
    pub skipped: usize,
}

/// Most recent non-missing value of one attribute.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LatestValue {
    pub station_id: String,
    pub attribute: Attribute,
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// Coverage of one station in the store.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StationInfo {
    pub station_id: String,
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
    pub samples: i64,
}
