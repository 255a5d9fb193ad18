//! `similar` and `forecast` commands.

use crate::report::write_table;
use crate::SearchArgs;
use anyhow::Context;
use log::info;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use wx_analog::{ForecastConfig, Forecaster};
use wx_db::Database;

/// Configuration from `--config` (or defaults) with the flags applied on
/// top.
pub fn load_config(args: &SearchArgs) -> anyhow::Result<ForecastConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            ForecastConfig::from_json(&json).with_context(|| format!("parsing {}", path.display()))?
        }
        None => ForecastConfig::default(),
    };
    if let Some(window) = args.window {
        config.window_size = window;
    }
    if let Some(months) = args.months {
        config.months = months;
    }
    if let Some(percent) = args.percent {
        config.mean_in_range_percent = percent;
    }
    if !args.attributes.is_empty() {
        config.attributes = args.attributes.clone();
    }
    config.validate()?;
    Ok(config)
}

pub fn run_similar(db: Database, args: &SearchArgs, json: bool) -> anyhow::Result<()> {
    let forecaster = Forecaster::new(db, load_config(args)?)?;
    let found = forecaster.nearest_day(&args.station, args.date)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }
    match found.mean_distance {
        Some(distance) => println!(
            "{} {}: nearest day {} (mean angular distance {:.4} rad, {} days compared)",
            args.station, args.date, found.date, distance, found.scored_days
        ),
        None => println!(
            "{} {}: no comparable day found, {} days compared",
            args.station, args.date, found.scored_days
        ),
    }
    Ok(())
}

pub fn run_forecast(db: Database, args: &SearchArgs, output: Option<&Path>) -> anyhow::Result<()> {
    let forecaster = Forecaster::new(db, load_config(args)?)?;
    let forecast = forecaster.forecast(&args.station, args.date)?;
    info!(
        "{} {}: matched {}, forecast from {}",
        forecast.station, forecast.target, forecast.matched.date, forecast.predicted_date
    );
    match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            write_table(&forecast.data, file)?;
            info!("Forecast written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_table(&forecast.data, &mut lock)?;
            lock.flush()?;
        }
    }
    Ok(())
}
