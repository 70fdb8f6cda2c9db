//! Time bucketing and chart series derived from a (filtered) collection.
//! All keys are computed in UTC; records without a valid timestamp are skipped.

use crate::extract::{build, sonarqube, test};
use crate::metrics::{is_recorded_sample, TimelineEntry};
use crate::{classify, LogRecord, LogType, SeverityLevel};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// rolling window for the deployment success trend
const TREND_WINDOW: usize = 5;

// GRANULARITY //

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Hour,
    Day,
    Week,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
        }
    }

    /// Bucket key for a timestamp
    pub fn key(&self, ts: DateTime<Utc>) -> String {
        match self {
            Self::Hour => ts.format("%Y-%m-%d %H:00").to_string(),
            Self::Day => ts.format("%Y-%m-%d").to_string(),
            Self::Week => format!("{} (Week)", week_start(ts).format("%Y-%m-%d")),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownGranularity(pub String);

impl fmt::Display for UnknownGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown granularity '{}' (expected hour, day or week)", self.0)
    }
}

impl std::error::Error for UnknownGranularity {}

impl FromStr for Granularity {
    type Err = UnknownGranularity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            _ => Err(UnknownGranularity(s.to_string())),
        }
    }
}

/// `YYYY-MM-DD HH:00`, `YYYY-MM-DD` or `YYYY-MM-DD (Week)`; weeks start on Sunday.
pub fn time_key(ts: DateTime<Utc>, granularity: Granularity) -> String {
    granularity.key(ts)
}

fn week_start(ts: DateTime<Utc>) -> NaiveDate {
    let date = ts.date_naive();
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

fn day_key(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

// SERIES TYPES //

/// One keyed value of a bucketed series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket<T> {
    pub key: String,
    pub value: T,
}

fn into_buckets<T>(map: BTreeMap<String, T>) -> Vec<Bucket<T>> {
    map.into_iter().map(|(key, value)| Bucket { key, value }).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub rolling_rate: f64, // success % over the trailing window
    pub window: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationPoint {
    pub timestamp: DateTime<Utc>,
    pub seconds: f64,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoveragePoint {
    pub timestamp: DateTime<Utc>,
    pub coverage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityPoint {
    pub timestamp: DateTime<Utc>,
    pub bugs: f64,
    pub vulnerabilities: f64,
    pub code_smells: f64,
}

// SERIES //

/// Sum of timeline error counts per time key
pub fn error_timeline(timeline: &[TimelineEntry], granularity: Granularity) -> Vec<Bucket<u64>> {
    let mut sums: BTreeMap<String, u64> = BTreeMap::new();
    for entry in timeline {
        if let Some(ts) = entry.timestamp {
            *sums.entry(granularity.key(ts)).or_default() += entry.error_count;
        }
    }
    into_buckets(sums)
}

/// Deployments in time order with a rolling success rate over `min(5, n)` entries.
pub fn deployment_success_trend(timeline: &[TimelineEntry]) -> Vec<TrendPoint> {
    let mut deployments: Vec<(DateTime<Utc>, bool)> = timeline
        .iter()
        .filter(|e| e.log_type == LogType::Deployment)
        .filter_map(|e| e.timestamp.map(|ts| (ts, e.success)))
        .collect();
    deployments.sort_by_key(|(ts, _)| *ts);

    let window = TREND_WINDOW.min(deployments.len());
    (0..deployments.len())
        .map(|i| {
            let slice = &deployments[(i + 1).saturating_sub(window)..=i];
            let successes = slice.iter().filter(|(_, ok)| *ok).count();
            TrendPoint {
                timestamp: deployments[i].0,
                success: deployments[i].1,
                rolling_rate: successes as f64 / slice.len() as f64 * 100.0,
                window: slice.len(),
            }
        })
        .collect()
}

/// Deployment records per day
pub fn deployment_frequency(logs: &[&LogRecord]) -> Vec<Bucket<u64>> {
    let mut days: BTreeMap<String, u64> = BTreeMap::new();
    for log in logs.iter().filter(|log| classify(log) == LogType::Deployment) {
        if let Some(ts) = log.timestamp() {
            *days.entry(day_key(ts)).or_default() += 1;
        }
    }
    into_buckets(days)
}

/// Known severities per day; unknown severities are left out
pub fn severity_distribution(logs: &[&LogRecord]) -> Vec<Bucket<SeverityCounts>> {
    let mut days: BTreeMap<String, SeverityCounts> = BTreeMap::new();
    for log in logs {
        let Some(ts) = log.timestamp() else { continue };
        let level = log.severity_level();
        if level == SeverityLevel::Unknown {
            continue;
        }
        let counts = days.entry(day_key(ts)).or_default();
        match level {
            SeverityLevel::Critical => counts.critical += 1,
            SeverityLevel::High => counts.high += 1,
            SeverityLevel::Medium => counts.medium += 1,
            SeverityLevel::Low => counts.low += 1,
            SeverityLevel::Unknown => {}
        }
    }
    into_buckets(days)
}

// time-ordered points for one log type; extraction returning None drops the record
fn points<T>(
    logs: &[&LogRecord],
    log_type: LogType,
    point: impl Fn(DateTime<Utc>, &LogRecord) -> Option<T>,
    ts_of: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut out: Vec<T> = logs
        .iter()
        .filter(|log| classify(log) == log_type)
        .filter_map(|log| log.timestamp().and_then(|ts| point(ts, *log)))
        .collect();
    out.sort_by_key(|p| ts_of(p));
    out
}

/// Build durations over time, zero durations dropped
pub fn build_durations(logs: &[&LogRecord]) -> Vec<DurationPoint> {
    points(
        logs,
        LogType::Build,
        |timestamp, log| {
            build::duration_seconds(log)
                .filter(|s| is_recorded_sample(*s))
                .map(|seconds| DurationPoint {
                    timestamp,
                    seconds,
                    success: build::success(log),
                })
        },
        |p| p.timestamp,
    )
}

pub fn test_coverage(logs: &[&LogRecord]) -> Vec<CoveragePoint> {
    points(
        logs,
        LogType::Test,
        |timestamp, log| test::coverage(log).map(|coverage| CoveragePoint { timestamp, coverage }),
        |p| p.timestamp,
    )
}

/// SonarQube findings over time; a missing count reads as 0
pub fn code_quality(logs: &[&LogRecord]) -> Vec<QualityPoint> {
    points(
        logs,
        LogType::Sonarqube,
        |timestamp, log| {
            Some(QualityPoint {
                timestamp,
                bugs: sonarqube::bugs(log).unwrap_or(0.0),
                vulnerabilities: sonarqube::vulnerabilities(log).unwrap_or(0.0),
                code_smells: sonarqube::code_smells(log).unwrap_or(0.0),
            })
        },
        |p| p.timestamp,
    )
}

/// Weekly mean of `mttr_hours` over high/critical records, keyed by the week's Sunday
pub fn mttr_trend(logs: &[&LogRecord]) -> Vec<Bucket<f64>> {
    let mut weeks: BTreeMap<String, (f64, u32)> = BTreeMap::new();
    for log in logs {
        if log.severity_level() < SeverityLevel::High {
            continue;
        }
        let (Some(ts), Some(hours)) = (log.timestamp(), log.mttr_hours) else {
            continue;
        };
        let week = weeks
            .entry(week_start(ts).format("%Y-%m-%d").to_string())
            .or_default();
        week.0 += hours;
        week.1 += 1;
    }
    weeks
        .into_iter()
        .map(|(key, (total, count))| Bucket {
            key,
            value: total / f64::from(count),
        })
        .collect()
}
