//! Forecast configuration.
//!
//! Everything the search needs besides the store is carried by an explicit
//! [`ForecastConfig`] value owned by the caller. It deserializes from JSON
//! with every field optional:
//!
//! ```json
//! {
//!   "attributes": ["air_temperature", "humidity", "barometric_pressure_qfe"],
//!   "limits": { "humidity": { "min": -8.0, "max": 8.0, "weight": 0.4 } },
//!   "window_size": "4h",
//!   "months": 1,
//!   "mean_in_range_percent": 25.0
//! }
//! ```

use crate::error::{AnalogError, Result};
use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use wx_core::table::SAMPLING_INTERVAL_MINUTES;
use wx_core::{Attribute, AttributeLimits};

const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Length of the sub-windows a day is cut into, anchored at midnight.
///
/// A whole number of sampling steps (10 minutes) that divides a day, so
/// every window of every day has the same length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WindowSize {
    seconds: u32,
}

impl WindowSize {
    pub fn from_minutes(minutes: u32) -> Result<Self> {
        let seconds = minutes
            .checked_mul(60)
            .ok_or_else(|| AnalogError::InvalidConfig(format!("window of {minutes} minutes")))?;
        if minutes < SAMPLING_INTERVAL_MINUTES as u32 || seconds > SECONDS_PER_DAY {
            return Err(AnalogError::InvalidConfig(format!(
                "window size must lie between {SAMPLING_INTERVAL_MINUTES} minutes and 24 hours, got {minutes} minutes"
            )));
        }
        if minutes % SAMPLING_INTERVAL_MINUTES as u32 != 0 || SECONDS_PER_DAY % seconds != 0 {
            return Err(AnalogError::InvalidConfig(format!(
                "window size must be a multiple of {SAMPLING_INTERVAL_MINUTES} minutes that divides a day, got {minutes} minutes"
            )));
        }
        Ok(WindowSize { seconds })
    }

    pub fn from_hours(hours: u32) -> Result<Self> {
        let minutes = hours
            .checked_mul(60)
            .ok_or_else(|| AnalogError::InvalidConfig(format!("window of {hours} hours")))?;
        Self::from_minutes(minutes)
    }

    /// Start of the window containing `timestamp`, as time of day.
    pub fn window_start(&self, timestamp: NaiveDateTime) -> NaiveTime {
        let since_midnight = timestamp.time().num_seconds_from_midnight();
        let start = since_midnight - since_midnight % self.seconds;
        NaiveTime::from_num_seconds_from_midnight_opt(start, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        WindowSize { seconds: 4 * 60 * 60 }
    }
}

impl FromStr for WindowSize {
    type Err = AnalogError;

    /// `90m`, `2h`, `4h`, `24h`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let malformed = || AnalogError::InvalidConfig(format!("window size must look like 30m or 4h: {s}"));
        if let Some(hours) = s.strip_suffix('h') {
            WindowSize::from_hours(hours.parse().map_err(|_| malformed())?)
        } else if let Some(minutes) = s.strip_suffix("min").or_else(|| s.strip_suffix('m')) {
            WindowSize::from_minutes(minutes.parse().map_err(|_| malformed())?)
        } else {
            Err(malformed())
        }
    }
}

impl TryFrom<String> for WindowSize {
    type Error = AnalogError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<WindowSize> for String {
    fn from(value: WindowSize) -> Self {
        value.to_string()
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.seconds % 3600 == 0 {
            write!(f, "{}h", self.seconds / 3600)
        } else {
            write!(f, "{}m", self.seconds / 60)
        }
    }
}

/// Parameters of one analog-day search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Preferred attributes, in vector coordinate order. Only those present
    /// in the query day are used.
    pub attributes: Vec<Attribute>,
    /// Overrides of [`Attribute::default_limits`].
    pub limits: BTreeMap<Attribute, AttributeLimits>,
    pub window_size: WindowSize,
    /// Seasonal window half-width, in months, around the target date.
    pub months: u32,
    /// Magnitude prefilter tolerance, 0 (closest only) to 100 (no filtering).
    pub mean_in_range_percent: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            attributes: vec![
                Attribute::AirTemperature,
                Attribute::Humidity,
                Attribute::BarometricPressure,
                Attribute::DewPoint,
                Attribute::WaterTemperature,
            ],
            limits: BTreeMap::new(),
            window_size: WindowSize::default(),
            months: 1,
            mean_in_range_percent: 25.0,
        }
    }
}

impl ForecastConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: ForecastConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn limits_for(&self, attribute: Attribute) -> AttributeLimits {
        self.limits
            .get(&attribute)
            .copied()
            .unwrap_or_else(|| attribute.default_limits())
    }

    pub fn limits_for_all(&self, attributes: &[Attribute]) -> Vec<AttributeLimits> {
        attributes.iter().map(|a| self.limits_for(*a)).collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.attributes.len() < 2 {
            return Err(AnalogError::InsufficientAttributes {
                found: self.attributes.len(),
            });
        }
        let unique: BTreeSet<&Attribute> = self.attributes.iter().collect();
        if unique.len() != self.attributes.len() {
            return Err(AnalogError::InvalidConfig("attributes must not repeat".to_string()));
        }
        for attribute in &self.attributes {
            let limits = self.limits_for(*attribute);
            if !limits.is_valid() {
                return Err(AnalogError::InvalidLimits {
                    attribute: *attribute,
                    limits,
                });
            }
        }
        if !(0.0..=100.0).contains(&self.mean_in_range_percent) {
            return Err(AnalogError::InvalidConfig(format!(
                "mean_in_range_percent must lie in [0, 100], got {}",
                self.mean_in_range_percent
            )));
        }
        if self.months > 6 {
            return Err(AnalogError::InvalidConfig(format!(
                "months must not exceed 6 (seasonal windows would overlap), got {}",
                self.months
            )));
        }
        Ok(())
    }
}
