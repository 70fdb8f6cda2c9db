//! Field extractors - recover metrics from structured fields, falling back to the summary text

pub mod build;
pub mod deployment;
pub mod duration;
pub mod sonarqube;

pub use duration::parse_duration;

use crate::{LogRecord, LogType};

/// One way of reading a metric off a record.
pub type Strategy<T> = fn(&LogRecord) -> Option<T>;

/// Run extraction strategies in order; the first one that yields a value wins.
pub fn first_of<T>(strategies: &[Strategy<T>], log: &LogRecord) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(log))
}

// tokens counted in the summary when no structured error count is available
const ERROR_TOKENS: [&str; 3] = ["ERROR:", "FAILED:", "FATAL:"];

/// Total error count for a record of the given type.
///
/// Generic `error_count` plus the type specific counters. When that adds up to zero the
/// `ERROR:`/`FAILED:`/`FATAL:` tokens in the summary are counted instead.
pub fn error_count(log: &LogRecord, log_type: &LogType) -> u64 {
    let specific = match log_type {
        LogType::Build => build::error_count(log),
        LogType::Deployment => deployment::error_count(log),
        LogType::Test => test::error_count(log),
        LogType::Sonarqube => sonarqube::error_count(log),
        LogType::Git => git_error_count(log),
        _ => 0.0,
    };
    let total = log.error_count.unwrap_or(0.0) + specific;

    if total == 0.0 {
        let summary = log.summary_text();
        return ERROR_TOKENS
            .iter()
            .map(|token| summary.matches(token).count() as u64)
            .sum();
    }
    total.max(0.0) as u64
}

/// Type specific success. Types without their own rule fall back to `status == "success"`.
pub fn success(log: &LogRecord, log_type: &LogType) -> bool {
    match log_type {
        LogType::Build => build::success(log),
        LogType::Deployment => deployment::success(log),
        LogType::Test => test::success(log),
        LogType::Sonarqube => sonarqube::success(log),
        _ => log.is_success(),
    }
}

fn git_error_count(log: &LogRecord) -> f64 {
    let listed = log.git_errors.as_ref().map_or(0, Vec::len) as f64;
    listed + fatal_penalty(log.git_fatal)
}

// a fatal flag counts as one extra error
pub(crate) fn fatal_penalty(flag: Option<bool>) -> f64 {
    if flag.unwrap_or(false) {
        1.0
    } else {
        0.0
    }
}

pub(crate) fn capture_duration<'t>(re: &regex::Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

pub(crate) fn capture_number(re: &regex::Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_of_respects_order() {
        let strategies: [Strategy<f64>; 2] = [|log| log.test_coverage, |_| Some(1.0)];
        let with_field = LogRecord {
            test_coverage: Some(0.0),
            ..Default::default()
        };
        // zero is a real answer, not a miss
        assert_eq!(first_of(&strategies, &with_field), Some(0.0));
        assert_eq!(first_of(&strategies, &LogRecord::default()), Some(1.0));
        assert_eq!(first_of::<f64>(&[], &LogRecord::default()), None);
    }

    #[test]
    fn test_error_count_per_type() {
        let log = LogRecord {
            error_count: Some(1.0),
            build_error_count: Some(2.0),
            build_warning_count: Some(3.0),
            deployment_error_count: Some(4.0),
            deployment_fatal: Some(true),
            test_error_count: Some(5.0),
            test_failures: Some(6.0),
            bugs: Some(7.0),
            vulnerabilities: Some(8.0),
            git_errors: Some(vec![json!("a"), json!("b")]),
            git_fatal: Some(true),
            ..Default::default()
        };
        assert_eq!(error_count(&log, &LogType::Build), 6);
        assert_eq!(error_count(&log, &LogType::Deployment), 6);
        assert_eq!(error_count(&log, &LogType::Test), 12);
        assert_eq!(error_count(&log, &LogType::Sonarqube), 16);
        assert_eq!(error_count(&log, &LogType::Git), 4);
        assert_eq!(error_count(&log, &LogType::Unknown), 1);
    }

    #[test]
    fn test_error_count_falls_back_to_tokens() {
        let log = LogRecord {
            llm_response: Some("ERROR: disk\nFAILED: step 2\nERROR: again\nFATAL: abort".into()),
            ..Default::default()
        };
        assert_eq!(error_count(&log, &LogType::Build), 4);
        assert_eq!(error_count(&LogRecord::default(), &LogType::Build), 0);
    }

    #[test]
    fn test_success_defaults_to_status() {
        let log = LogRecord {
            status: Some("success".into()),
            ..Default::default()
        };
        assert!(success(&log, &LogType::Git));
        assert!(success(&log, &LogType::Other("jenkins".into())));
        assert!(!success(&LogRecord::default(), &LogType::Unknown));
    }
}
