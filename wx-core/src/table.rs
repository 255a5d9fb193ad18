use crate::attribute::Attribute;
use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;
use std::collections::BTreeMap;

/// Base sampling interval of the station feed, in minutes.
pub const SAMPLING_INTERVAL_MINUTES: i64 = 10;

/// Base sampling interval of the station feed.
pub fn sampling_interval() -> TimeDelta {
    TimeDelta::minutes(SAMPLING_INTERVAL_MINUTES)
}

/// A single measurement in long format.
///
/// `value` is `None` when the station reported the attribute as missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub station: String,
    pub timestamp: NaiveDateTime,
    pub attribute: Attribute,
    pub value: Option<f64>,
}

/// One timestamped row of a [`Table`]; `values` follows the table's columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub timestamp: NaiveDateTime,
    pub values: Vec<Option<f64>>,
}

impl Row {
    pub fn new(timestamp: NaiveDateTime, values: Vec<Option<f64>>) -> Self {
        Row { timestamp, values }
    }

    /// True if at least one column is missing in this row.
    pub fn has_missing(&self) -> bool {
        self.values.iter().any(Option::is_none)
    }
}

/// Timestamped rows of one station, one column per attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub station: String,
    pub columns: Vec<Attribute>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(station: &str, columns: Vec<Attribute>) -> Self {
        Table {
            station: station.to_string(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Pivot long-format measurements into a table with the given columns.
    ///
    /// Measurements of attributes outside `columns` are dropped. Rows are
    /// ordered by timestamp; cells without a measurement are `None`.
    pub fn from_samples<I>(station: &str, columns: &[Attribute], samples: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDateTime, Attribute, Option<f64>)>,
    {
        let mut by_time: BTreeMap<NaiveDateTime, Vec<Option<f64>>> = BTreeMap::new();
        for (timestamp, attribute, value) in samples {
            let Some(index) = columns.iter().position(|c| *c == attribute) else {
                continue;
            };
            let row = by_time
                .entry(timestamp)
                .or_insert_with(|| vec![None; columns.len()]);
            row[index] = value;
        }
        Table {
            station: station.to_string(),
            columns: columns.to_vec(),
            rows: by_time
                .into_iter()
                .map(|(timestamp, values)| Row { timestamp, values })
                .collect(),
        }
    }

    pub fn push(&mut self, row: Row) {
        debug_assert_eq!(row.values.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, attribute: Attribute) -> Option<usize> {
        self.columns.iter().position(|c| *c == attribute)
    }

    pub fn has_column(&self, attribute: Attribute) -> bool {
        self.column_index(attribute).is_some()
    }

    /// Same station and columns, different rows.
    pub fn with_rows(&self, rows: Vec<Row>) -> Table {
        Table {
            station: self.station.clone(),
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Re-shape onto `attributes`, in the requested order. Attributes the
    /// table does not carry become all-missing columns.
    pub fn align(&self, attributes: &[Attribute]) -> Table {
        let indexes: Vec<Option<usize>> = attributes.iter().map(|a| self.column_index(*a)).collect();
        Table {
            station: self.station.clone(),
            columns: attributes.to_vec(),
            rows: self
                .rows
                .iter()
                .map(|row| Row {
                    timestamp: row.timestamp,
                    values: indexes
                        .iter()
                        .map(|i| i.and_then(|i| row.values.get(i).copied().flatten()))
                        .collect(),
                })
                .collect(),
        }
    }

    /// `(timestamp, value)` pairs of one column, including missing cells.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = (NaiveDateTime, Option<f64>)> + '_ {
        self.rows
            .iter()
            .map(move |row| (row.timestamp, row.values.get(index).copied().flatten()))
    }

    pub fn sort_by_time(&mut self) {
        self.rows.sort_by_key(|row| row.timestamp);
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.rows.iter().map(|r| r.timestamp).min()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.rows.iter().map(|r| r.timestamp).max()
    }
}
