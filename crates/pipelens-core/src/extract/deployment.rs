// Deployment metrics: success, duration and error counters

use super::{capture_duration, fatal_penalty, first_of, Strategy};
use crate::LogRecord;
use regex::Regex;
use std::sync::LazyLock;

static SUCCESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)deployment completed successfully").unwrap());
static DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)deployment duration:?\s*([0-9hms :]+)").unwrap());

const SUCCESS_STRATEGIES: [Strategy<bool>; 2] = [
    |log| log.deployment_success,
    |log| Some(succeeded_from_text(log.summary_text())),
];

const DURATION_STRATEGIES: [Strategy<f64>; 2] = [
    |log| log.deployment_duration.as_ref().map(|d| d.seconds()),
    |log| duration_text(log.summary_text()).map(|t| super::parse_duration(t) as f64),
];

pub fn succeeded_from_text(summary: &str) -> bool {
    SUCCESS.is_match(summary)
}

pub fn duration_text(summary: &str) -> Option<&str> {
    capture_duration(&DURATION, summary)
}

pub fn success(log: &LogRecord) -> bool {
    first_of(&SUCCESS_STRATEGIES, log).unwrap_or(false)
}

pub fn duration_seconds(log: &LogRecord) -> Option<f64> {
    first_of(&DURATION_STRATEGIES, log)
}

pub fn error_count(log: &LogRecord) -> f64 {
    log.deployment_error_count.unwrap_or(0.0) + fatal_penalty(log.deployment_fatal)
}
