use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{
    DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
    Weekday,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{BucketedSeries, RawSample, SeriesPoint, TimeSeriesSample};
use crate::source::lenient_f64;

/// The range a chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Day,
    #[default]
    Week,
    Month,
    SixMonths,
    Year,
}

/// How samples are grouped into chart points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketPolicy {
    /// One point per sample
    None,
    /// Local calendar day
    Day,
    /// ISO week, starting Monday
    Week,
    /// Calendar month
    Month,
}

impl Timeframe {
    pub const ALL: [Timeframe; 5] = [
        Self::Day,
        Self::Week,
        Self::Month,
        Self::SixMonths,
        Self::Year,
    ];

    /// How far back from "now" samples stay visible.
    pub fn lookback(&self) -> Duration {
        match self {
            Self::Day => Duration::days(1),
            Self::Week => Duration::days(7),
            Self::Month => Duration::days(30),
            Self::SixMonths => Duration::days(182),
            Self::Year => Duration::days(365),
        }
    }

    pub fn bucket_policy(&self) -> BucketPolicy {
        match self {
            Self::Day => BucketPolicy::None,
            Self::Week | Self::Month => BucketPolicy::Day,
            Self::SixMonths => BucketPolicy::Week,
            Self::Year => BucketPolicy::Month,
        }
    }

    /// Short label for the segmented picker.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Day => "D",
            Self::Week => "W",
            Self::Month => "M",
            Self::SixMonths => "6M",
            Self::Year => "Y",
        }
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "d" => Ok(Self::Day),
            "week" | "w" => Ok(Self::Week),
            "month" | "m" => Ok(Self::Month),
            "six_months" | "6m" => Ok(Self::SixMonths),
            "year" | "y" => Ok(Self::Year),
            other => Err(anyhow!("Unknown timeframe: {}", other)),
        }
    }
}

impl BucketPolicy {
    /// The start instant of the bucket containing `ts`, using the calendar
    /// of `tz`.
    pub fn bucket_start<Tz: TimeZone>(&self, ts: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
        let local = ts.with_timezone(tz).date_naive();
        let start = match self {
            Self::None => return ts,
            Self::Day => local,
            Self::Week => {
                let week = local.iso_week();
                NaiveDate::from_isoywd_opt(week.year(), week.week(), Weekday::Mon)
                    .unwrap_or(local)
            }
            Self::Month => local.with_day(1).unwrap_or(local),
        };
        start_of_day(start, tz)
    }
}

/// First instant of `date` in `tz`. Where midnight falls in a DST gap the
/// first valid hour is used instead.
fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..3)
        .find_map(|h| {
            tz.from_local_datetime(&(midnight + Duration::hours(h)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Samples at or after `now - timeframe.lookback()`.
pub fn filter_window<'a>(
    samples: &'a [TimeSeriesSample],
    timeframe: Timeframe,
    now: DateTime<Utc>,
) -> Vec<&'a TimeSeriesSample> {
    let cutoff = now - timeframe.lookback();
    samples.iter().filter(|s| s.timestamp >= cutoff).collect()
}

/// Bucket `samples` for `timeframe` using the device clock and time zone.
pub fn bucket_series(samples: &[TimeSeriesSample], timeframe: Timeframe) -> BucketedSeries {
    bucket_series_at(samples, timeframe, Utc::now(), &Local)
}

/// Filter to the timeframe's window ending at `now`, group by the
/// timeframe's bucket policy in `tz`, and average each bucket.
///
/// Output is ascending by bucket start.
pub fn bucket_series_at<Tz: TimeZone>(
    samples: &[TimeSeriesSample],
    timeframe: Timeframe,
    now: DateTime<Utc>,
    tz: &Tz,
) -> BucketedSeries {
    let window = filter_window(samples, timeframe, now);
    let policy = timeframe.bucket_policy();

    if policy == BucketPolicy::None {
        let mut points: Vec<SeriesPoint> = window
            .iter()
            .map(|s| SeriesPoint {
                bucket_start: s.timestamp,
                value: s.value,
            })
            .collect();
        points.sort_by_key(|p| p.bucket_start);
        return points;
    }

    let mut buckets: BTreeMap<DateTime<Utc>, (f64, usize)> = BTreeMap::new();
    for sample in window {
        let key = policy.bucket_start(sample.timestamp, tz);
        let entry = buckets.entry(key).or_insert((0.0, 0));
        entry.0 += sample.value;
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(bucket_start, (sum, count))| SeriesPoint {
            bucket_start,
            value: sum / count as f64,
        })
        .collect()
}

/// Figures shown on a metric's stats card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub latest: f64,
    pub latest_at: DateTime<Utc>,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    /// Latest value minus earliest value
    pub change: f64,
    pub count: usize,
}

impl SeriesSummary {
    pub fn from_samples<'a>(
        samples: impl IntoIterator<Item = &'a TimeSeriesSample>,
    ) -> Option<Self> {
        let mut sorted: Vec<&TimeSeriesSample> = samples.into_iter().collect();
        sorted.sort_by_key(|s| s.timestamp);
        let first = sorted.first()?;
        let last = sorted.last()?;

        let sum: f64 = sorted.iter().map(|s| s.value).sum();
        let min = sorted.iter().map(|s| s.value).fold(f64::INFINITY, f64::min);
        let max = sorted
            .iter()
            .map(|s| s.value)
            .fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            latest: last.value,
            latest_at: last.timestamp,
            average: sum / sorted.len() as f64,
            min,
            max,
            change: last.value - first.value,
            count: sorted.len(),
        })
    }

    /// Summary of the samples inside `timeframe`'s window ending at `now`.
    pub fn for_timeframe(
        samples: &[TimeSeriesSample],
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        Self::from_samples(filter_window(samples, timeframe, now))
    }
}

/// Parse a service timestamp. Accepts RFC 3339, a naive
/// `YYYY-MM-DD HH:MM:SS` (with `T` or fractional seconds) taken as UTC,
/// and a bare date taken as midnight UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }
    Err(anyhow!("Unparseable timestamp: {:?}", input))
}

/// Convert service samples, dropping any whose timestamp or value cannot
/// be read. Dropped records are logged, never returned as errors.
pub fn parse_samples(raw: &[RawSample]) -> Vec<TimeSeriesSample> {
    raw.iter()
        .filter_map(|r| {
            let timestamp = match parse_timestamp(&r.date) {
                Ok(ts) => ts,
                Err(e) => {
                    warn!(id = %r.id, error = %e, "dropping sample");
                    return None;
                }
            };
            let Some(value) = lenient_f64(&r.value).filter(|v| v.is_finite()) else {
                warn!(id = %r.id, value = %r.value, "dropping sample with non-numeric value");
                return None;
            };
            Some(TimeSeriesSample {
                id: r.id.clone(),
                timestamp,
                value,
            })
        })
        .collect()
}
