use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors raised when mapping column names onto attributes.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum AttributeError {
    #[error("unknown attribute column: {0}")]
    Unknown(String),
}

/// A physical quantity reported by a station every 10 minutes.
///
/// The serialized form is the stable column name used by the station
/// data feed, the CSV archives and the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    #[serde(rename = "air_temperature")]
    AirTemperature,
    #[serde(rename = "water_temperature")]
    WaterTemperature,
    #[serde(rename = "dew_point")]
    DewPoint,
    #[serde(rename = "precipitation")]
    Precipitation,
    #[serde(rename = "water_level")]
    WaterLevel,
    #[serde(rename = "barometric_pressure_qfe")]
    BarometricPressure,
    #[serde(rename = "humidity")]
    Humidity,
    #[serde(rename = "wind_direction")]
    WindDirection,
    #[serde(rename = "wind_force_avg_10min")]
    WindForceAvg10Min,
    #[serde(rename = "wind_gust_max_10min")]
    WindGustMax10Min,
    #[serde(rename = "wind_speed_avg_10min")]
    WindSpeedAvg10Min,
    #[serde(rename = "windchill")]
    WindChill,
    #[serde(rename = "global_radiation")]
    GlobalRadiation,
}

/// Normalization entry for one attribute.
///
/// `min`/`max` bound the admissible drift over a single 10-minute step;
/// `weight` is the magnitude of the vector coordinate at either bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeLimits {
    pub min: f64,
    pub max: f64,
    pub weight: f64,
}

impl AttributeLimits {
    pub const fn new(min: f64, max: f64, weight: f64) -> Self {
        AttributeLimits { min, max, weight }
    }

    /// Width of the admissible drift range.
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// True when the range is non-empty and the weight is a finite,
    /// non-negative number.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min < self.max
            && self.weight.is_finite()
            && self.weight >= 0.0
    }
}

impl Attribute {
    /// Every attribute in canonical column order.
    pub const ALL: [Attribute; 13] = [
        Attribute::AirTemperature,
        Attribute::WaterTemperature,
        Attribute::DewPoint,
        Attribute::Precipitation,
        Attribute::WaterLevel,
        Attribute::BarometricPressure,
        Attribute::Humidity,
        Attribute::WindDirection,
        Attribute::WindForceAvg10Min,
        Attribute::WindGustMax10Min,
        Attribute::WindSpeedAvg10Min,
        Attribute::WindChill,
        Attribute::GlobalRadiation,
    ];

    /// Stable column name.
    pub fn column(&self) -> &'static str {
        match self {
            Attribute::AirTemperature => "air_temperature",
            Attribute::WaterTemperature => "water_temperature",
            Attribute::DewPoint => "dew_point",
            Attribute::Precipitation => "precipitation",
            Attribute::WaterLevel => "water_level",
            Attribute::BarometricPressure => "barometric_pressure_qfe",
            Attribute::Humidity => "humidity",
            Attribute::WindDirection => "wind_direction",
            Attribute::WindForceAvg10Min => "wind_force_avg_10min",
            Attribute::WindGustMax10Min => "wind_gust_max_10min",
            Attribute::WindSpeedAvg10Min => "wind_speed_avg_10min",
            Attribute::WindChill => "windchill",
            Attribute::GlobalRadiation => "global_radiation",
        }
    }

    pub fn from_column(column: &str) -> Option<Attribute> {
        Attribute::ALL
            .iter()
            .copied()
            .find(|a| a.column() == column.trim())
    }

    /// Default per-10-minute drift limits.
    ///
    /// Units follow the station feed: °C, %, hPa, mm, m, m/s, Bft, °, W/m².
    pub fn default_limits(&self) -> AttributeLimits {
        match self {
            Attribute::AirTemperature => AttributeLimits::new(-2.0, 2.0, 1.0),
            Attribute::WaterTemperature => AttributeLimits::new(-0.5, 0.5, 0.3),
            Attribute::DewPoint => AttributeLimits::new(-2.0, 2.0, 0.5),
            Attribute::Precipitation => AttributeLimits::new(-2.0, 2.0, 0.2),
            Attribute::WaterLevel => AttributeLimits::new(-0.05, 0.05, 0.3),
            Attribute::BarometricPressure => AttributeLimits::new(-1.0, 1.0, 0.5),
            Attribute::Humidity => AttributeLimits::new(-10.0, 10.0, 0.5),
            Attribute::WindDirection => AttributeLimits::new(-180.0, 180.0, 0.1),
            Attribute::WindForceAvg10Min => AttributeLimits::new(-2.0, 2.0, 0.2),
            Attribute::WindGustMax10Min => AttributeLimits::new(-8.0, 8.0, 0.2),
            Attribute::WindSpeedAvg10Min => AttributeLimits::new(-5.0, 5.0, 0.3),
            Attribute::WindChill => AttributeLimits::new(-3.0, 3.0, 0.3),
            Attribute::GlobalRadiation => AttributeLimits::new(-300.0, 300.0, 0.3),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Attribute {
    type Err = AttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::from_column(s).ok_or_else(|| AttributeError::Unknown(s.to_string()))
    }
}
