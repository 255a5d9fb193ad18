//! Analog-day search over 10-minute station history.
//!
//! A day is cut into windows, every window is reduced to a per-attribute
//! drift vector, and historical days of the same season are ranked by mean
//! angular distance to the query day. The day after the best match is the
//! forecast.

pub mod config;
pub mod error;
pub mod forecast;
pub mod gaps;
pub mod magnitude;
pub mod partition;
pub mod ranker;
pub mod window_vector;

pub use config::{ForecastConfig, WindowSize};
pub use error::{AnalogError, Result};
pub use forecast::{Forecast, Forecaster};
pub use ranker::Match;
