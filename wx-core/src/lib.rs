//! Core types for 10-minute weather station telemetry.
//!
//! Attributes and their normalization table, the tabular row shape the
//! store hands out, time ranges, and the [`store::TimeSeriesStore`] read
//! interface consumed by the similarity engine.

pub mod attribute;
pub mod date_range;
pub mod store;
pub mod table;
pub mod time_range;

pub use attribute::{Attribute, AttributeError, AttributeLimits};
pub use store::TimeSeriesStore;
pub use table::{Row, Sample, Table};
pub use time_range::TimeRange;
