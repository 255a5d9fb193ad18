//! Forecast Composer.
//!
//! Wires the store, the prefilter and the ranker together: find the
//! historical day that evolved most like `target`, then hand out the day
//! that followed it as the forecast.

use crate::config::ForecastConfig;
use crate::error::{AnalogError, Result};
use crate::magnitude::{daily_magnitude, MagnitudeFilter};
use crate::partition::{days, reference_window_count, Day};
use crate::ranker::{rank, Match, QueryVectors};
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeSet;
use wx_core::{Attribute, AttributeLimits, Table, TimeRange, TimeSeriesStore};

/// The analog match for `target` and the day that followed it.
#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub station: String,
    pub target: NaiveDate,
    pub matched: Match,
    pub predicted_date: NaiveDate,
    /// Every stored attribute of `predicted_date`.
    pub data: Table,
}

pub struct Forecaster<S> {
    store: S,
    config: ForecastConfig,
}

impl<S: TimeSeriesStore> Forecaster<S> {
    pub fn new(store: S, config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Forecaster { store, config })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Preferred attributes the query day actually carries, in configured
    /// order.
    pub fn usable_attributes(&self, query: &Table) -> Vec<Attribute> {
        self.config
            .attributes
            .iter()
            .copied()
            .filter(|a| query.has_column(*a))
            .collect()
    }

    /// Historical day of `station` most similar to `target`.
    pub fn nearest_day(&self, station: &str, target: NaiveDate) -> Result<Match> {
        let pulled = self
            .store
            .query_range(station, &TimeRange::day(target), Some(&self.config.attributes))?;
        if pulled.is_empty() {
            return Err(AnalogError::NoData {
                station: station.to_string(),
                date: target,
            });
        }
        let usable = self.usable_attributes(&pulled);
        if usable.len() < 2 {
            return Err(AnalogError::InsufficientAttributes { found: usable.len() });
        }
        let limits = self.config.limits_for_all(&usable);
        let window_size = self.config.window_size;
        info!(
            "searching {station} around {target} (+-{} months) on {} with {window_size} windows",
            self.config.months,
            usable.iter().map(|a| a.column()).collect::<Vec<_>>().join(", ")
        );

        let query_day = Day::new(target, pulled.align(&usable), window_size);
        let query = QueryVectors::build(&query_day, &limits)?;

        let history = self
            .store
            .query_yearly_window(station, &usable, target, self.config.months)?;
        let history: Vec<Day> = days(&history, &usable, window_size)
            .into_iter()
            .filter(|day| day.date != target)
            .collect();
        info!("{} historical days in season", history.len());

        let admitted = self.prefilter(&query_day, &history, &limits)?;
        let expected_windows = reference_window_count(window_size);
        let candidates: Vec<&Day> = history
            .iter()
            .filter(|day| admitted.contains(&day.date))
            .filter(|day| {
                let complete = day.is_complete(expected_windows);
                if !complete {
                    debug!(
                        "{} has {} of {expected_windows} windows, skipped",
                        day.date,
                        day.windows.len()
                    );
                }
                complete
            })
            .collect();
        info!("{} candidates after prefilter and completeness check", candidates.len());

        rank(&query, &candidates, &limits)
    }

    /// Nearest day plus the full record of the day after it.
    pub fn forecast(&self, station: &str, target: NaiveDate) -> Result<Forecast> {
        let matched = self.nearest_day(station, target)?;
        if matched.is_fallback() {
            warn!("no analog found for {station} on {target}, the forecast repeats the following day");
        }
        let predicted_date = matched.date.succ_opt().ok_or_else(|| AnalogError::NoData {
            station: station.to_string(),
            date: matched.date,
        })?;
        let data = self
            .store
            .query_range(station, &TimeRange::day(predicted_date), None)?;
        if data.is_empty() {
            return Err(AnalogError::NoData {
                station: station.to_string(),
                date: predicted_date,
            });
        }
        info!("forecast for {station} after {target}: {predicted_date} ({} rows)", data.len());
        Ok(Forecast {
            station: station.to_string(),
            target,
            matched,
            predicted_date,
            data,
        })
    }

    fn prefilter(
        &self,
        query_day: &Day,
        history: &[Day],
        limits: &[AttributeLimits],
    ) -> Result<BTreeSet<NaiveDate>> {
        let filter = MagnitudeFilter::new(self.config.mean_in_range_percent)?;
        let Some(query_magnitude) = daily_magnitude(&query_day.table, limits) else {
            warn!("{} has no magnitude, prefilter disabled", query_day.date);
            return Ok(history.iter().map(|d| d.date).collect());
        };
        let magnitudes: Vec<(NaiveDate, f64)> = history
            .iter()
            .filter_map(|day| daily_magnitude(&day.table, limits).map(|m| (day.date, m)))
            .collect();
        Ok(filter.admit(query_magnitude, &magnitudes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WindowSize;
    use crate::testing::MemoryStore;
    use chrono::NaiveDateTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn config() -> ForecastConfig {
        let mut config = ForecastConfig {
            attributes: vec![Attribute::AirTemperature, Attribute::Humidity],
            window_size: WindowSize::from_hours(12).unwrap(),
            mean_in_range_percent: 100.0,
            ..ForecastConfig::default()
        };
        config.limits.insert(Attribute::AirTemperature, AttributeLimits::new(-1.0, 1.0, 1.0));
        config.limits.insert(Attribute::Humidity, AttributeLimits::new(-1.0, 1.0, 1.0));
        config
    }

    /// Samples every 6 hours, so each 12h window has two samples. Each
    /// window drifts by `(a, b)`.
    fn add_day(store: &mut MemoryStore, day: NaiveDate, a: f64, b: f64) {
        for h in [0, 6, 12, 18] {
            let ts: NaiveDateTime = day.and_hms_opt(h, 0, 0).unwrap();
            let step = if h % 12 == 0 { 0.0 } else { 1.0 };
            store.insert("mythenquai", ts, Attribute::AirTemperature, Some(10.0 + a * 36.0 * step));
            store.insert("mythenquai", ts, Attribute::Humidity, Some(70.0 + b * 36.0 * step));
            store.insert("mythenquai", ts, Attribute::WindDirection, Some(180.0));
        }
    }

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::default();
        add_day(&mut store, date(2021, 11, 25), 0.5, 0.0);
        add_day(&mut store, date(2020, 11, 20), 0.0, 0.5);
        add_day(&mut store, date(2019, 11, 30), 0.5, 0.1);
        add_day(&mut store, date(2019, 12, 1), -0.2, 0.2);
        add_day(&mut store, date(2018, 11, 26), 0.4, 0.3);
        store
    }

    #[test]
    fn forecast_returns_day_after_best_match() {
        let forecaster = Forecaster::new(seeded(), config()).unwrap();
        let forecast = forecaster.forecast("mythenquai", date(2021, 11, 25)).unwrap();
        assert_eq!(forecast.matched.date, date(2019, 11, 30));
        assert_eq!(forecast.predicted_date, date(2019, 12, 1));
        // the follow-up day carries every stored attribute
        assert!(forecast.data.has_column(Attribute::WindDirection));
        assert_eq!(forecast.data.len(), 4);
    }

    #[test]
    fn single_usable_attribute_is_rejected() {
        let mut store = MemoryStore::default();
        let day = date(2021, 11, 25);
        for h in 0..24 {
            let ts = day.and_hms_opt(h, 0, 0).unwrap();
            store.insert("mythenquai", ts, Attribute::AirTemperature, Some(f64::from(h)));
        }
        let forecaster = Forecaster::new(store, config()).unwrap();
        assert!(matches!(
            forecaster.nearest_day("mythenquai", day),
            Err(AnalogError::InsufficientAttributes { found: 1 })
        ));
    }

    #[test]
    fn incomplete_day_is_never_a_candidate() {
        let mut store = seeded();
        // perfect twin of the target, but only the morning window
        let twin = date(2017, 11, 25);
        for (h, step) in [(0, 0.0), (6, 1.0)] {
            let ts = twin.and_hms_opt(h, 0, 0).unwrap();
            store.insert("mythenquai", ts, Attribute::AirTemperature, Some(10.0 + 18.0 * step));
            store.insert("mythenquai", ts, Attribute::Humidity, Some(70.0));
        }
        let forecaster = Forecaster::new(store, config()).unwrap();
        let found = forecaster.nearest_day("mythenquai", date(2021, 11, 25)).unwrap();
        assert_ne!(found.date, twin);
        assert_eq!(found.date, date(2019, 11, 30));
    }

    #[test]
    fn missing_target_day_is_no_data() {
        let forecaster = Forecaster::new(seeded(), config()).unwrap();
        assert!(matches!(
            forecaster.nearest_day("mythenquai", date(2021, 6, 1)),
            Err(AnalogError::NoData { .. })
        ));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut bad = config();
        bad.mean_in_range_percent = -5.0;
        assert!(Forecaster::new(seeded(), bad).is_err());
    }

    #[test]
    fn store_failures_pass_through() {
        let mut store = seeded();
        store.fail_with("database is locked");
        let forecaster = Forecaster::new(store, config()).unwrap();
        let err = forecaster.nearest_day("mythenquai", date(2021, 11, 25)).unwrap_err();
        assert!(matches!(err, AnalogError::Store(_)));
        assert_eq!(err.to_string(), "database is locked");
    }

    #[test]
    fn no_comparable_candidate_falls_back_to_target() {
        let mut store = MemoryStore::default();
        add_day(&mut store, date(2021, 11, 25), 0.5, 0.0);
        add_day(&mut store, date(2021, 11, 26), 0.0, 0.0);
        let forecaster = Forecaster::new(store, config()).unwrap();
        let forecast = forecaster.forecast("mythenquai", date(2021, 11, 25)).unwrap();
        assert!(forecast.matched.is_fallback());
        assert_eq!(forecast.predicted_date, date(2021, 11, 26));
    }

    #[test]
    fn prefilter_narrows_candidates() {
        let mut tight = config();
        tight.mean_in_range_percent = 0.0;
        let mut store = seeded();
        // same drift as the best match but at a very different level
        let shifted = date(2016, 11, 24);
        for h in [0, 6, 12, 18] {
            let ts = shifted.and_hms_opt(h, 0, 0).unwrap();
            let step = if h % 12 == 0 { 0.0 } else { 1.0 };
            store.insert("mythenquai", ts, Attribute::AirTemperature, Some(30.0 + 18.0 * step));
            store.insert("mythenquai", ts, Attribute::Humidity, Some(20.0));
        }
        let forecaster = Forecaster::new(store, tight).unwrap();
        let found = forecaster.nearest_day("mythenquai", date(2021, 11, 25)).unwrap();
        assert_ne!(found.date, shifted);
        assert_eq!(found.scored_days, 1);
    }
}
