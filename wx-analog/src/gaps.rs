//! Gap handling for station tables: fill missing sampling slots and pick
//! out rows with missing measurements.

use crate::error::{AnalogError, Result};
use chrono::{NaiveDateTime, TimeDelta};
use log::debug;
use std::collections::BTreeMap;
use wx_core::{Row, Table};

/// Put `table` on a regular grid of `step` starting at its first timestamp.
///
/// Slots without a row become rows of `None`; rows off the grid are
/// dropped.
pub fn resample(table: &Table, step: TimeDelta) -> Result<Table> {
    if step <= TimeDelta::zero() {
        return Err(AnalogError::InvalidConfig(format!("resample step must be positive, got {step}")));
    }
    let (Some(first), Some(last)) = (table.first_timestamp(), table.last_timestamp()) else {
        return Ok(table.clone());
    };

    let by_time: BTreeMap<NaiveDateTime, &Row> = table.rows.iter().map(|r| (r.timestamp, r)).collect();
    let mut rows = Vec::new();
    let mut filled = 0;
    let mut slot = first;
    while slot <= last {
        match by_time.get(&slot) {
            Some(row) => rows.push((*row).clone()),
            None => {
                rows.push(Row::new(slot, vec![None; table.columns.len()]));
                filled += 1;
            }
        }
        slot += step;
    }
    let dropped = table.len() + filled - rows.len();
    debug!(
        "{}: resampled {} rows to {} slots of {step}, {filled} filled, {dropped} off grid",
        table.station,
        table.len(),
        rows.len()
    );
    Ok(table.with_rows(rows))
}

/// Rows with at least one missing value, in their original order.
pub fn anomalies(table: &Table) -> Table {
    table.with_rows(table.rows.iter().filter(|r| r.has_missing()).cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wx_core::table::sampling_interval;
    use wx_core::Attribute;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 11, 25)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn table(rows: Vec<(NaiveDateTime, Vec<Option<f64>>)>) -> Table {
        let mut t = Table::new("tiefenbrunnen", vec![Attribute::AirTemperature, Attribute::WaterLevel]);
        for (ts, values) in rows {
            t.push(Row::new(ts, values));
        }
        t
    }

    #[test]
    fn resample_fills_missing_slots() {
        let t = table(vec![
            (at(0, 0), vec![Some(1.0), Some(406.0)]),
            (at(0, 10), vec![Some(1.1), Some(406.0)]),
            (at(0, 40), vec![Some(1.4), Some(406.1)]),
        ]);
        let resampled = resample(&t, sampling_interval()).unwrap();
        let times: Vec<NaiveDateTime> = resampled.rows.iter().map(|r| r.timestamp).collect();
        assert_eq!(times, vec![at(0, 0), at(0, 10), at(0, 20), at(0, 30), at(0, 40)]);
        assert_eq!(resampled.rows[2].values, vec![None, None]);
        assert_eq!(resampled.rows[4].values, vec![Some(1.4), Some(406.1)]);
    }

    #[test]
    fn resample_drops_rows_off_grid() {
        let t = table(vec![
            (at(0, 0), vec![Some(1.0), None]),
            (at(0, 5), vec![Some(1.05), None]),
            (at(0, 10), vec![Some(1.1), None]),
        ]);
        let resampled = resample(&t, sampling_interval()).unwrap();
        assert_eq!(resampled.len(), 2);
    }

    #[test]
    fn resample_rejects_non_positive_step() {
        let t = table(vec![(at(0, 0), vec![Some(1.0), None])]);
        assert!(resample(&t, TimeDelta::zero()).is_err());
        assert!(resample(&table(vec![]), sampling_interval()).unwrap().is_empty());
    }

    #[test]
    fn anomalies_keep_rows_with_missing_values() {
        let t = table(vec![
            (at(0, 0), vec![Some(1.0), Some(406.0)]),
            (at(0, 10), vec![None, Some(406.0)]),
            (at(0, 20), vec![Some(1.2), Some(406.0)]),
            (at(0, 30), vec![Some(1.3), None]),
        ]);
        let found = anomalies(&t);
        let times: Vec<NaiveDateTime> = found.rows.iter().map(|r| r.timestamp).collect();
        assert_eq!(times, vec![at(0, 10), at(0, 30)]);
    }
}
