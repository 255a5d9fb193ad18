//! Magnitude Prefilter.
//!
//! Cheap first pass before the cosine ranking: each day is reduced to the
//! norm of its per-attribute means, and candidates whose norm is too far
//! from the query's are dropped.

use crate::error::{AnalogError, Result};
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeSet;
use wx_core::{AttributeLimits, Table};

/// Normalized Euclidean norm of the per-attribute daily means.
///
/// Each mean is scaled by `weight_i * range_0 / range_i` so attributes of
/// different units become comparable to the first one. `None` when any
/// column has no value at all, or `limits` does not follow the columns.
pub fn daily_magnitude(day: &Table, limits: &[AttributeLimits]) -> Option<f64> {
    if limits.is_empty() || limits.len() != day.columns.len() {
        return None;
    }
    let reference_range = limits[0].range();
    let mut sum_of_squares = 0.0;
    for (index, limits) in limits.iter().enumerate() {
        let (sum, count) = day
            .column_values(index)
            .filter_map(|(_, value)| value)
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            return None;
        }
        let mean = sum / count as f64;
        let scaled = mean * limits.weight * reference_range / limits.range();
        sum_of_squares += scaled * scaled;
    }
    Some(sum_of_squares.sqrt())
}

/// Admits candidates whose magnitude lies within a tolerance band of the
/// query's magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeFilter {
    percent: f64,
}

impl MagnitudeFilter {
    /// `percent` of the spread between the closest and the farthest
    /// candidate that is still admitted.
    pub fn new(percent: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(AnalogError::InvalidConfig(format!(
                "mean_in_range_percent must lie in [0, 100], got {percent}"
            )));
        }
        Ok(MagnitudeFilter { percent })
    }

    /// Dates of the admitted candidates.
    pub fn admit(&self, query: f64, candidates: &[(NaiveDate, f64)]) -> BTreeSet<NaiveDate> {
        let diffs: Vec<(NaiveDate, f64)> = candidates
            .iter()
            .map(|(date, magnitude)| (*date, (magnitude - query).abs()))
            .collect();
        let Some(best) = diffs.iter().map(|(_, d)| *d).reduce(f64::min) else {
            return BTreeSet::new();
        };
        let worst = diffs.iter().map(|(_, d)| *d).fold(best, f64::max);
        let threshold = best + (worst - best) * self.percent / 100.0;
        let admitted: BTreeSet<NaiveDate> = diffs
            .into_iter()
            .filter(|(_, diff)| *diff <= threshold)
            .map(|(date, _)| date)
            .collect();
        debug!(
            "magnitude {query:.4}: best {best:.4}, worst {worst:.4}, threshold {threshold:.4}, admitted {} of {}",
            admitted.len(),
            candidates.len()
        );
        admitted
    }
}
