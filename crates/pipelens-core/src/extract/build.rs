// Build metrics: success, duration and error counters

use super::{capture_duration, first_of, Strategy};
use crate::LogRecord;
use regex::Regex;
use std::sync::LazyLock;

static SUCCESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)build (success|successful)").unwrap());
static BUILD_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)build time:?\s*([0-9hms :]+)").unwrap());
static TOTAL_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)total time:?\s*([0-9hms :]+)").unwrap());

const SUCCESS_STRATEGIES: [Strategy<bool>; 2] = [
    |log| log.build_success,
    |log| Some(succeeded_from_text(log.summary_text())),
];

const DURATION_STRATEGIES: [Strategy<f64>; 2] = [
    |log| log.build_duration_seconds.as_ref().map(|d| d.seconds()),
    |log| duration_text(log.summary_text()).map(|t| super::parse_duration(t) as f64),
];

pub fn succeeded_from_text(summary: &str) -> bool {
    SUCCESS.is_match(summary)
}

/// Raw duration text after "build time" or, failing that, "total time".
pub fn duration_text(summary: &str) -> Option<&str> {
    capture_duration(&BUILD_TIME, summary).or_else(|| capture_duration(&TOTAL_TIME, summary))
}

pub fn success(log: &LogRecord) -> bool {
    first_of(&SUCCESS_STRATEGIES, log).unwrap_or(false)
}

/// Build duration in seconds, `None` when neither field nor text carries one.
pub fn duration_seconds(log: &LogRecord) -> Option<f64> {
    first_of(&DURATION_STRATEGIES, log)
}

pub fn error_count(log: &LogRecord) -> f64 {
    log.build_error_count.unwrap_or(0.0) + log.build_warning_count.unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DurationField;

    fn summary(text: &str) -> LogRecord {
        LogRecord {
            executive_summary: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_duration_from_text_when_field_missing() {
        let log = summary("Build time: 1h 5m");
        assert_eq!(duration_seconds(&log), Some(3900.0));

        let total = summary("Total time: 3m 20s (cached)");
        assert_eq!(duration_seconds(&total), Some(200.0));

        assert_eq!(duration_seconds(&summary("no timing here")), None);
    }

    #[test]
    fn test_duration_field_wins() {
        let log = LogRecord {
            build_duration_seconds: Some(DurationField::Seconds(0.0)),
            executive_summary: Some("Build time: 10m".to_string()),
            ..Default::default()
        };
        assert_eq!(duration_seconds(&log), Some(0.0));
    }

    #[test]
    fn test_success() {
        assert!(success(&summary("BUILD SUCCESSFUL in 4s")));
        assert!(!success(&summary("build failed")));
        let explicit = LogRecord {
            build_success: Some(false),
            executive_summary: Some("build success".to_string()),
            ..Default::default()
        };
        assert!(!success(&explicit));
    }
}
