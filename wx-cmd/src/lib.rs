//! Command implementations for the WX CLI.
//!
//! Provides subcommands for importing station archives, fetching new
//! measurements, searching analog days and reporting on stored data.

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use wx_analog::WindowSize;
use wx_core::{Attribute, TimeRange};
use wx_db::Database;
use wx_utils::clock::SourceClock;
use wx_utils::dates::parse_date;

pub mod fetch;
pub mod forecast;
pub mod import;
pub mod report;

/// Search parameters shared by `similar` and `forecast`. Flags override
/// the values of `--config`.
#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Station name, e.g. mythenquai
    #[arg(short, long)]
    pub station: String,

    /// Day to find an analog for (YYYY-MM-DD, UTC)
    #[arg(short, long, value_parser = parse_date)]
    pub date: NaiveDate,

    /// JSON file with a forecast configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Window size, e.g. 4h or 90m
    #[arg(short, long)]
    pub window: Option<WindowSize>,

    /// Months either side of the date searched in every year
    #[arg(short, long)]
    pub months: Option<u32>,

    /// Magnitude prefilter tolerance in percent (0-100)
    #[arg(short, long)]
    pub percent: Option<f64>,

    /// Attributes to compare, comma separated column names
    #[arg(short, long, value_delimiter = ',')]
    pub attributes: Vec<Attribute>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import a historical station archive (CSV, optionally .gz)
    Import {
        /// Station the archive belongs to
        #[arg(short, long)]
        station: String,

        /// Path to the CSV archive
        #[arg(short, long)]
        file: PathBuf,

        /// How the archive's timestamps are labelled: utc, cet or central-european
        #[arg(long, default_value = "cet")]
        clock: SourceClock,
    },

    /// Fetch measurements newer than the last stored one from the live API
    Fetch {
        /// Station name
        #[arg(short, long)]
        station: String,

        /// First day to fetch when nothing is stored yet (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        since: Option<NaiveDate>,

        /// Base URL of the measurements API
        #[arg(long, default_value = fetch::DEFAULT_BASE_URL)]
        base_url: String,

        /// Number of attempts per day on connection failures
        #[arg(long, default_value_t = 3)]
        attempts: u32,

        /// How the feed labels its timestamps: utc, cet or central-european
        #[arg(long, default_value = "cet")]
        clock: SourceClock,
    },

    /// Print the historical day most similar to a given day
    Similar {
        #[command(flatten)]
        search: SearchArgs,

        /// Print the match as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the day after the most similar historical day as CSV
    Forecast {
        #[command(flatten)]
        search: SearchArgs,

        /// Output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the newest stored value per attribute
    Latest {
        /// Station name; all stations when omitted
        #[arg(short, long)]
        station: Option<String>,

        /// Limit to a single attribute
        #[arg(short, long)]
        attribute: Option<Attribute>,
    },

    /// List rows with missing values within a time range
    Gaps {
        /// Station name
        #[arg(short, long)]
        station: String,

        /// Relative range such as 1d, 2w or 1y
        #[arg(short, long, default_value = "1w")]
        range: TimeRange,

        /// Fill absent 10-minute slots before listing
        #[arg(long)]
        resample: bool,
    },
}

pub async fn run(db_path: &Path, command: Command) -> anyhow::Result<()> {
    let db = Database::open(db_path)?;
    match command {
        Command::Import { station, file, clock } => import::run_import(&db, &station, &file, clock),
        Command::Fetch {
            station,
            since,
            base_url,
            attempts,
            clock,
        } => {
            let retry = fetch::RetryPolicy {
                max_attempts: attempts.max(1),
                ..fetch::RetryPolicy::default()
            };
            let fetcher = fetch::Fetcher::new(&base_url, retry)?;
            fetch::run_fetch(&db, &fetcher, &station, since, clock).await
        }
        Command::Similar { search, json } => forecast::run_similar(db, &search, json),
        Command::Forecast { search, output } => forecast::run_forecast(db, &search, output.as_deref()),
        Command::Latest { station, attribute } => report::run_latest(&db, station.as_deref(), attribute),
        Command::Gaps {
            station,
            range,
            resample,
        } => report::run_gaps(&db, &station, &range, resample),
    }
}
