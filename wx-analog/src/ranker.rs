//! Similarity Ranker.
//!
//! Compares every candidate day window by window against the query day and
//! keeps the day with the smallest mean angular distance.

use crate::error::{AnalogError, Result};
use crate::partition::Day;
use crate::window_vector::{vectorize, WindowVector};
use chrono::{NaiveDate, NaiveTime};
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::f64::consts::FRAC_PI_2;
use wx_core::AttributeLimits;

/// Upper bound of the angular distance after clamping.
pub const MAX_DISTANCE: f64 = FRAC_PI_2;

/// Window vectors of the query day with their norms, keyed by window start.
#[derive(Debug, Clone)]
pub struct QueryVectors {
    pub date: NaiveDate,
    windows: BTreeMap<NaiveTime, (WindowVector, f64)>,
}

impl QueryVectors {
    /// Vectorize every window of the query day once. Windows that cannot be
    /// vectorized are skipped; a day without any vector is an error.
    pub fn build(day: &Day, limits: &[AttributeLimits]) -> Result<Self> {
        let mut windows = BTreeMap::new();
        for (key, window) in &day.windows {
            match vectorize(window, limits) {
                Ok(vector) => {
                    let norm = vector.norm();
                    windows.insert(*key, (vector, norm));
                }
                Err(AnalogError::IncompleteWindow(reason)) => {
                    debug!("query {} window {key}: {reason}, fewer windows will be compared", day.date);
                }
                Err(e) => return Err(e),
            }
        }
        if windows.is_empty() {
            return Err(AnalogError::UnvectorizableDay(day.date));
        }
        Ok(QueryVectors {
            date: day.date,
            windows,
        })
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn get(&self, key: &NaiveTime) -> Option<&(WindowVector, f64)> {
        self.windows.get(key)
    }
}

/// `arccos` of the cosine similarity, with the similarity clamped to
/// `[0, 1]`. `None` for zero-length vectors.
pub fn angular_distance(a: &WindowVector, a_norm: f64, b: &WindowVector, b_norm: f64) -> Result<Option<f64>> {
    if a_norm == 0.0 || b_norm == 0.0 {
        return Ok(None);
    }
    let similarity = a.dot(b)? / (a_norm * b_norm);
    Ok(Some(similarity.clamp(0.0, 1.0).acos()))
}

/// Mean angular distance of `candidate` to the query, over the windows both
/// days could vectorize. `None` when no window is comparable.
pub fn score_day(query: &QueryVectors, candidate: &Day, limits: &[AttributeLimits]) -> Result<Option<f64>> {
    let mut distances = Vec::with_capacity(candidate.windows.len());
    for (key, window) in &candidate.windows {
        let Some((query_vector, query_norm)) = query.get(key) else {
            continue;
        };
        let vector = match vectorize(window, limits) {
            Ok(vector) => vector,
            Err(AnalogError::IncompleteWindow(reason)) => {
                debug!("{} window {key} skipped: {reason}", candidate.date);
                continue;
            }
            Err(e) => return Err(e),
        };
        if let Some(distance) = angular_distance(&vector, vector.norm(), query_vector, *query_norm)? {
            distances.push(distance);
        }
    }
    if distances.is_empty() {
        return Ok(None);
    }
    Ok(Some(distances.iter().sum::<f64>() / distances.len() as f64))
}

/// Outcome of a ranking pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    /// Best candidate, or the query date when nothing could be scored.
    pub date: NaiveDate,
    /// Mean angular distance in radians, `None` for the fallback.
    pub mean_distance: Option<f64>,
    pub scored_days: usize,
}

impl Match {
    pub fn is_fallback(&self) -> bool {
        self.mean_distance.is_none()
    }
}

/// Rank `candidates` (chronological) against the query and return the
/// nearest one. Ties keep the earlier day.
pub fn rank(query: &QueryVectors, candidates: &[&Day], limits: &[AttributeLimits]) -> Result<Match> {
    let mut best: Option<(NaiveDate, f64)> = None;
    let mut scored_days = 0;
    let total = candidates.len();
    let mut reported = 0;

    for (done, candidate) in candidates.iter().enumerate() {
        if candidate.date != query.date {
            match score_day(query, candidate, limits)? {
                Some(distance) => {
                    scored_days += 1;
                    if best.map_or(true, |(_, d)| distance < d) {
                        best = Some((candidate.date, distance));
                    }
                }
                None => debug!("{} has no window comparable to {}", candidate.date, query.date),
            }
        }

        let percent = (done + 1) * 100 / total;
        if percent / 10 > reported {
            reported = percent / 10;
            info!("{}% of {total} candidates ranked", reported * 10);
        }
    }

    let found = match best {
        Some((date, distance)) => Match {
            date,
            mean_distance: Some(distance),
            scored_days,
        },
        None => Match {
            date: query.date,
            mean_distance: None,
            scored_days,
        },
    };
    match found.mean_distance {
        Some(distance) => info!(
            "nearest day to {} is {} (mean distance {distance:.4} rad, {:.1} deg, {scored_days} days scored)",
            query.date,
            found.date,
            distance.to_degrees()
        ),
        None => info!("no candidate comparable to {}, falling back to the day itself", query.date),
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WindowSize;
    use chrono::{NaiveDateTime, TimeDelta};
    use wx_core::{Attribute, Row, Table};

    const EPS: f64 = 1e-9;

    fn limits() -> Vec<AttributeLimits> {
        vec![AttributeLimits::new(-1.0, 1.0, 1.0), AttributeLimits::new(-1.0, 1.0, 1.0)]
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 11, d).unwrap()
    }

    fn midnight(date: NaiveDate) -> NaiveDateTime {
        date.and_hms_opt(0, 0, 0).unwrap()
    }

    /// A day of 2h windows; each window drifts by `drifts[i]` per attribute
    /// between its first and second sample.
    fn day(date: NaiveDate, drifts: &[(Option<f64>, Option<f64>)]) -> Day {
        let mut table = Table::new("mythenquai", vec![Attribute::AirTemperature, Attribute::Humidity]);
        for (i, (a, b)) in drifts.iter().enumerate() {
            let start = midnight(date) + TimeDelta::hours(2 * i as i64);
            table.push(Row::new(start, vec![a.map(|_| 0.0), b.map(|_| 0.0)]));
            table.push(Row::new(start + TimeDelta::minutes(10), vec![*a, *b]));
        }
        Day::new(date, table, WindowSize::from_hours(2).unwrap())
    }

    fn full(date: NaiveDate, a: f64, b: f64) -> Day {
        day(date, &[(Some(a), Some(b)); 12])
    }

    #[test]
    fn day_matches_itself() {
        let query = full(date(25), 0.5, -0.25);
        let vectors = QueryVectors::build(&query, &limits()).unwrap();
        assert_eq!(vectors.len(), 12);
        let twin = full(date(3), 0.5, -0.25);
        let distance = score_day(&vectors, &twin, &limits()).unwrap().unwrap();
        assert!(distance.abs() < 1e-6);
    }

    #[test]
    fn opposite_drift_is_clamped_to_right_angle() {
        let query = QueryVectors::build(&full(date(25), 0.5, 0.5), &limits()).unwrap();
        let opposite = full(date(1), -0.5, -0.5);
        let distance = score_day(&query, &opposite, &limits()).unwrap().unwrap();
        assert!((distance - MAX_DISTANCE).abs() < EPS);
    }

    #[test]
    fn nearest_candidate_wins() {
        let query_day = full(date(25), 0.5, 0.0);
        let query = QueryVectors::build(&query_day, &limits()).unwrap();
        let far = full(date(1), 0.0, 0.5);
        let near = full(date(2), 0.5, 0.1);
        let found = rank(&query, &[&far, &near], &limits()).unwrap();
        assert_eq!(found.date, date(2));
        assert_eq!(found.scored_days, 2);
        assert!(found.mean_distance.unwrap() < MAX_DISTANCE);
    }

    #[test]
    fn unscorable_candidate_never_wins() {
        let query = QueryVectors::build(&full(date(25), 0.5, 0.0), &limits()).unwrap();
        // every window lacks humidity, so no vector can be built
        let broken = day(date(1), &[(Some(0.5), None); 12]);
        let weak = full(date(2), 0.0, 0.5);
        let found = rank(&query, &[&broken, &weak], &limits()).unwrap();
        assert_eq!(found.date, date(2));
        assert_eq!(found.scored_days, 1);
    }

    #[test]
    fn ties_keep_the_earlier_day() {
        let query = QueryVectors::build(&full(date(25), 0.5, 0.0), &limits()).unwrap();
        let first = full(date(1), 0.0, 0.5);
        let second = full(date(2), 0.0, 0.5);
        let found = rank(&query, &[&first, &second], &limits()).unwrap();
        assert_eq!(found.date, date(1));
    }

    #[test]
    fn ranking_is_repeatable() {
        let query = QueryVectors::build(&full(date(25), 0.3, -0.2), &limits()).unwrap();
        let candidates = [full(date(1), 0.1, 0.4), full(date(2), 0.3, -0.1), full(date(3), -0.3, 0.2)];
        let refs: Vec<&Day> = candidates.iter().collect();
        let first = rank(&query, &refs, &limits()).unwrap();
        let second = rank(&query, &refs, &limits()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.date, date(2));
    }

    #[test]
    fn nothing_scored_falls_back_to_query_date() {
        let query = QueryVectors::build(&full(date(25), 0.5, 0.0), &limits()).unwrap();
        let broken = day(date(1), &[(None, Some(0.5)); 12]);
        let found = rank(&query, &[&broken], &limits()).unwrap();
        assert_eq!(found.date, date(25));
        assert!(found.is_fallback());
        assert_eq!(rank(&query, &[], &limits()).unwrap().date, date(25));
    }

    #[test]
    fn query_day_is_not_its_own_candidate() {
        let query_day = full(date(25), 0.5, 0.0);
        let query = QueryVectors::build(&query_day, &limits()).unwrap();
        let other = full(date(1), 0.0, 0.5);
        let found = rank(&query, &[&other, &query_day], &limits()).unwrap();
        assert_eq!(found.date, date(1));
    }

    #[test]
    fn windows_missing_from_query_are_ignored() {
        // query only vectorizes its first window
        let mut drifts = vec![(Some(0.5), None); 12];
        drifts[0] = (Some(0.5), Some(0.0));
        let query = QueryVectors::build(&day(date(25), &drifts), &limits()).unwrap();
        assert_eq!(query.len(), 1);
        let candidate = full(date(1), 0.5, 0.0);
        let distance = score_day(&query, &candidate, &limits()).unwrap().unwrap();
        assert!(distance.abs() < 1e-6);
    }

    #[test]
    fn zero_vectors_are_not_compared() {
        let query = QueryVectors::build(&full(date(25), 0.5, 0.0), &limits()).unwrap();
        let flat = full(date(1), 0.0, 0.0);
        assert_eq!(score_day(&query, &flat, &limits()).unwrap(), None);
    }

    #[test]
    fn unvectorizable_query_is_fatal() {
        let query = day(date(25), &[(None, Some(0.1)); 12]);
        assert!(matches!(
            QueryVectors::build(&query, &limits()),
            Err(AnalogError::UnvectorizableDay(d)) if d == date(25)
        ));
    }
}
