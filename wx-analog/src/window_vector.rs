//! Window Vectorizer.
//!
//! A window becomes one coordinate per attribute describing how far the
//! attribute drifted between the first and the last valid sample of the
//! window, normalized into `[-weight, +weight]`. Only the two endpoints
//! are used, so the vector captures direction of change rather than
//! absolute level.

use crate::error::{AnalogError, Result};
use chrono::NaiveDateTime;
use log::warn;
use wx_core::table::SAMPLING_INTERVAL_MINUTES;
use wx_core::{Attribute, AttributeLimits, Table};

/// Per-attribute drift signature of one window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowVector(Vec<f64>);

impl WindowVector {
    pub fn new(coordinates: Vec<f64>) -> Self {
        WindowVector(coordinates)
    }

    pub fn coordinates(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.0.iter().map(|c| c * c).sum::<f64>().sqrt()
    }

    pub fn dot(&self, other: &WindowVector) -> Result<f64> {
        if self.len() != other.len() {
            return Err(AnalogError::VectorLengthMismatch {
                expected: self.len(),
                actual: other.len(),
            });
        }
        Ok(self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum())
    }
}

/// Vectorize one window. `limits` follows `window.columns`.
///
/// Fails with [`AnalogError::IncompleteWindow`] when the window is empty or
/// any attribute lacks two valid samples at least one sampling step apart.
pub fn vectorize(window: &Table, limits: &[AttributeLimits]) -> Result<WindowVector> {
    if limits.len() != window.columns.len() {
        return Err(AnalogError::VectorLengthMismatch {
            expected: window.columns.len(),
            actual: limits.len(),
        });
    }
    if window.is_empty() {
        return Err(AnalogError::IncompleteWindow("empty window".to_string()));
    }

    let mut coordinates = Vec::with_capacity(limits.len());
    for (index, (attribute, limits)) in window.columns.iter().zip(limits.iter()).enumerate() {
        if !limits.is_valid() {
            return Err(AnalogError::InvalidLimits {
                attribute: *attribute,
                limits: *limits,
            });
        }
        let ((first_at, first), (last_at, last)) = endpoints(window, index).ok_or_else(|| {
            AnalogError::IncompleteWindow(format!("{attribute} has no valid sample"))
        })?;
        let steps = (last_at - first_at).num_minutes() / SAMPLING_INTERVAL_MINUTES;
        if steps <= 0 {
            return Err(AnalogError::IncompleteWindow(format!(
                "{attribute} spans less than one sampling step"
            )));
        }
        coordinates.push(scale_delta(*attribute, last - first, limits, steps));
    }
    Ok(WindowVector(coordinates))
}

/// Earliest and latest non-missing `(timestamp, value)` of one column.
fn endpoints(window: &Table, index: usize) -> Option<((NaiveDateTime, f64), (NaiveDateTime, f64))> {
    let mut first: Option<(NaiveDateTime, f64)> = None;
    let mut last: Option<(NaiveDateTime, f64)> = None;
    for (timestamp, value) in window.column_values(index) {
        let Some(value) = value else { continue };
        if first.map_or(true, |(t, _)| timestamp < t) {
            first = Some((timestamp, value));
        }
        if last.map_or(true, |(t, _)| timestamp > t) {
            last = Some((timestamp, value));
        }
    }
    Some((first?, last?))
}

/// Map `delta` onto `[-weight, weight]`; the limits are per sampling step
/// and get widened by `steps`.
fn scale_delta(attribute: Attribute, delta: f64, limits: &AttributeLimits, steps: i64) -> f64 {
    let min = limits.min * steps as f64;
    let max = limits.max * steps as f64;
    if delta < min {
        warn!(
            "{attribute}: delta {delta} below {min} over {steps} steps, clamped to {}",
            -limits.weight
        );
        -limits.weight
    } else if delta > max {
        warn!(
            "{attribute}: delta {delta} above {max} over {steps} steps, clamped to {}",
            limits.weight
        );
        limits.weight
    } else {
        ((delta - min) / (max - min) * 2.0 - 1.0) * limits.weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};
    use wx_core::Row;

    const EPS: f64 = 1e-9;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 11, 25)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn window(columns: Vec<Attribute>, rows: Vec<(i64, Vec<Option<f64>>)>) -> Table {
        let mut table = Table::new("mythenquai", columns);
        for (minutes, values) in rows {
            table.push(Row::new(start() + TimeDelta::minutes(minutes), values));
        }
        table
    }

    fn two_columns() -> Vec<Attribute> {
        vec![Attribute::AirTemperature, Attribute::Humidity]
    }

    #[test]
    fn drift_over_one_step_maps_linearly() {
        // whole day as one window, two samples one step apart
        let table = window(two_columns(), vec![(0, vec![Some(3.0), Some(60.0)]), (10, vec![Some(8.0), Some(60.0)])]);
        let limits = [AttributeLimits::new(-10.0, 10.0, 1.0), AttributeLimits::new(-40.0, 40.0, 0.3)];
        let vector = vectorize(&table, &limits).unwrap();
        assert!((vector.coordinates()[0] - 0.5).abs() < EPS);
        assert!(vector.coordinates()[1].abs() < EPS);
    }

    #[test]
    fn bounds_map_to_weight() {
        let limits = [AttributeLimits::new(-2.0, 2.0, 0.8), AttributeLimits::new(-2.0, 2.0, 0.8)];
        // three steps: scaled range is [-6, 6]
        let table = window(two_columns(), vec![(0, vec![Some(0.0), Some(0.0)]), (30, vec![Some(-6.0), Some(6.0)])]);
        let vector = vectorize(&table, &limits).unwrap();
        assert!((vector.coordinates()[0] + 0.8).abs() < EPS);
        assert!((vector.coordinates()[1] - 0.8).abs() < EPS);
    }

    #[test]
    fn out_of_range_drift_is_clamped() {
        let limits = [AttributeLimits::new(-1.0, 1.0, 1.0), AttributeLimits::new(-1.0, 1.0, 0.5)];
        let table = window(two_columns(), vec![(0, vec![Some(0.0), Some(0.0)]), (10, vec![Some(-25.0), Some(40.0)])]);
        let vector = vectorize(&table, &limits).unwrap();
        assert_eq!(vector.coordinates(), &[-1.0, 0.5]);
    }

    #[test]
    fn coordinates_stay_within_weight() {
        let limits = [AttributeLimits::new(-1.5, 0.5, 0.7), AttributeLimits::new(-3.0, 3.0, 2.0)];
        for (a, b) in [(-100.0, 3.3), (0.2, -0.1), (7.0, 99.0), (-1.4, -18.0)] {
            let table = window(
                two_columns(),
                vec![(0, vec![Some(0.0), Some(0.0)]), (20, vec![Some(a), Some(b)])],
            );
            let vector = vectorize(&table, &limits).unwrap();
            for (c, l) in vector.coordinates().iter().zip(limits.iter()) {
                assert!(c.abs() <= l.weight + EPS, "{c} outside +-{}", l.weight);
            }
        }
    }

    #[test]
    fn missing_values_only_move_endpoints() {
        let table = window(
            two_columns(),
            vec![
                (0, vec![None, Some(50.0)]),
                (10, vec![Some(1.0), None]),
                (20, vec![Some(2.0), Some(55.0)]),
                (30, vec![Some(3.0), None]),
            ],
        );
        let limits = [AttributeLimits::new(-1.0, 1.0, 1.0), AttributeLimits::new(-10.0, 10.0, 1.0)];
        let vector = vectorize(&table, &limits).unwrap();
        // temperature: 1.0 -> 3.0 over two steps, range [-2, 2]
        assert!((vector.coordinates()[0] - 1.0).abs() < EPS);
        // humidity: 50 -> 55 over two steps, range [-20, 20]
        assert!((vector.coordinates()[1] - 0.25).abs() < EPS);
    }

    #[test]
    fn single_timestamp_is_incomplete() {
        let table = window(two_columns(), vec![(0, vec![Some(1.0), Some(2.0)])]);
        let limits = [AttributeLimits::new(-1.0, 1.0, 1.0); 2];
        assert!(matches!(vectorize(&table, &limits), Err(AnalogError::IncompleteWindow(_))));
    }

    #[test]
    fn sub_step_span_is_incomplete() {
        let table = window(two_columns(), vec![(0, vec![Some(1.0), Some(2.0)]), (5, vec![Some(1.5), Some(2.0)])]);
        let limits = [AttributeLimits::new(-1.0, 1.0, 1.0); 2];
        assert!(matches!(vectorize(&table, &limits), Err(AnalogError::IncompleteWindow(_))));
    }

    #[test]
    fn attribute_without_values_is_incomplete() {
        let table = window(two_columns(), vec![(0, vec![Some(1.0), None]), (60, vec![Some(2.0), None])]);
        let limits = [AttributeLimits::new(-1.0, 1.0, 1.0); 2];
        assert!(matches!(vectorize(&table, &limits), Err(AnalogError::IncompleteWindow(_))));
    }

    #[test]
    fn empty_window_is_incomplete() {
        let table = window(two_columns(), vec![]);
        let limits = [AttributeLimits::new(-1.0, 1.0, 1.0); 2];
        assert!(matches!(vectorize(&table, &limits), Err(AnalogError::IncompleteWindow(_))));
    }

    #[test]
    fn limits_must_match_columns() {
        let table = window(two_columns(), vec![(0, vec![Some(1.0), Some(2.0)]), (10, vec![Some(1.0), Some(2.0)])]);
        let limits = [AttributeLimits::new(-1.0, 1.0, 1.0)];
        assert!(matches!(
            vectorize(&table, &limits),
            Err(AnalogError::VectorLengthMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn dot_requires_equal_lengths() {
        let a = WindowVector::new(vec![1.0, 0.0]);
        let b = WindowVector::new(vec![1.0, 0.0, 0.0]);
        assert!(a.dot(&b).is_err());
        assert!((a.dot(&a).unwrap() - 1.0).abs() < EPS);
        assert!((WindowVector::new(vec![3.0, 4.0]).norm() - 5.0).abs() < EPS);
    }
}
