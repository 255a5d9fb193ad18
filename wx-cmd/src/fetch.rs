//! Incremental fetch from the live measurements API.
//!
//! One request per station and day:
//! `{base_url}/measurements/{station}?startDate=YYYY-MM-DD&endDate=YYYY-MM-DD`.
//! The response carries `result[].values.<attribute>.value` plus the
//! local timestamp in `values.timestamp_cet.value` (`DD.MM.YYYY HH:MM:SS`).
//! Only samples newer than the last stored one are written.

use anyhow::{anyhow, Context};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use wx_core::date_range::DateRange;
use wx_core::{Attribute, Sample};
use wx_db::Database;
use wx_utils::clock::SourceClock;
use wx_utils::dates::{format_date, parse_timestamp};

pub const DEFAULT_BASE_URL: &str = "https://tecdottir.herokuapp.com";

/// Bounded exponential backoff for connection failures. HTTP error
/// statuses are not retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Pause after failed attempt `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor)
    }
}

pub struct Fetcher {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(base_url: &str, retry: RetryPolicy) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Fetcher {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn day_url(&self, station: &str) -> String {
        format!("{}/measurements/{station}", self.base_url)
    }

    /// Raw JSON body for one day of `station`.
    pub async fn fetch_day(&self, station: &str, day: NaiveDate) -> anyhow::Result<String> {
        let url = self.day_url(station);
        let day_str = format_date(&day);
        let mut attempt = 1;
        loop {
            let sent = self
                .client
                .get(&url)
                .query(&[("startDate", day_str.as_str()), ("endDate", day_str.as_str())])
                .send()
                .await;
            match sent {
                Ok(response) => {
                    let response = response
                        .error_for_status()
                        .with_context(|| format!("{station} {day_str}"))?;
                    return Ok(response.text().await?);
                }
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt < self.retry.max_attempts => {
                    let pause = self.retry.delay(attempt);
                    warn!(
                        "Attempt {}/{}: request for {station} {day_str} failed: {e}, retrying in {} ms",
                        attempt,
                        self.retry.max_attempts,
                        pause.as_millis()
                    );
                    tokio::time::sleep(pause).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(anyhow!(e).context(format!(
                        "request for {station} {day_str} failed after {attempt} attempts"
                    )))
                }
            }
        }
    }
}

/// Samples of one API response, converted to UTC, keeping only those
/// strictly after `after`.
pub fn parse_day(
    station: &str,
    body: &str,
    clock: SourceClock,
    after: Option<NaiveDateTime>,
) -> anyhow::Result<Vec<Sample>> {
    let json: Value = serde_json::from_str(body)?;
    let results = json
        .get("result")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("response has no result array"))?;

    let mut samples = Vec::new();
    for entry in results {
        let Some(values) = entry.get("values").and_then(Value::as_object) else {
            continue;
        };
        let Some(raw_time) = values
            .get("timestamp_cet")
            .and_then(|v| v.get("value"))
            .and_then(Value::as_str)
        else {
            debug!("fetch: entry without timestamp skipped");
            continue;
        };
        let timestamp = clock.to_utc(parse_timestamp(raw_time)?);
        if after.is_some_and(|last| timestamp <= last) {
            continue;
        }
        for (key, field) in values {
            let Some(attribute) = Attribute::from_column(key) else {
                continue;
            };
            samples.push(Sample {
                station: station.to_string(),
                timestamp,
                attribute,
                value: field_value(field.get("value")),
            });
        }
    }
    Ok(samples)
}

/// Numbers pass through; strings are parsed; `.` and the like are missing.
fn field_value(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Fetch every day from the last stored sample (or `since`) up to today
/// and store what is new.
pub async fn run_fetch(
    db: &Database,
    fetcher: &Fetcher,
    station: &str,
    since: Option<NaiveDate>,
    clock: SourceClock,
) -> anyhow::Result<()> {
    let last = db.query_last_timestamp(station)?;
    let start = match (last, since) {
        (Some(last), _) => last.date(),
        (None, Some(since)) => since,
        (None, None) => anyhow::bail!("nothing stored for {station} yet, pass --since"),
    };
    let today = Utc::now().date_naive();
    if start > today {
        info!("Station {station} is up to date");
        return Ok(());
    }

    let days = DateRange(start, today);
    info!("Fetching {} days of {station} from {start} to {today}", days.days());
    let mut stored = 0;
    let mut after = last;
    for day in days {
        let body = fetcher.fetch_day(station, day).await?;
        let samples = parse_day(station, &body, clock, after)?;
        if let Some(newest) = samples.iter().map(|s| s.timestamp).max() {
            after = Some(newest);
        }
        stored += db.insert_samples(&samples)?;
        debug!("{station} {day}: {} new samples", samples.len());
    }
    info!("Fetch complete: {stored} samples stored for {station}");
    Ok(())
}
