//! Metrics aggregator - single pass over a log collection into per-type buckets + timeline

use crate::extract::{self, build, deployment, sonarqube, test};
use crate::{classify, LogRecord, LogType, SeverityLevel};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Whether an extracted duration or direct count is kept as a sample.
///
/// Zero is treated like a missing value, so a genuine 0 second build is dropped.
/// Every zero-dropping decision in the aggregator goes through here.
pub fn is_recorded_sample(value: f64) -> bool {
    value != 0.0 && !value.is_nan()
}

fn push_recorded(samples: &mut Vec<f64>, value: Option<f64>) {
    if let Some(v) = value.filter(|v| is_recorded_sample(*v)) {
        samples.push(v);
    }
}

// BUCKETS //

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildMetrics {
    pub total: u64,
    pub success: u64,
    pub durations: Vec<f64>,
    pub errors: Vec<f64>,
    pub warnings: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeploymentMetrics {
    pub total: u64,
    pub success: u64,
    pub durations: Vec<f64>,
    pub errors: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TestMetrics {
    pub total: u64,
    pub success: u64,
    pub coverage: Vec<f64>,
    pub cases: Vec<f64>,
    pub failures: Vec<f64>,
    pub errors: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SonarMetrics {
    pub total: u64,
    pub success: u64,
    pub coverage: Vec<f64>,
    pub bugs: Vec<f64>,
    pub vulnerabilities: Vec<f64>,
    pub code_smells: Vec<f64>,
    pub quality_gates_passed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GitMetrics {
    pub total: u64,
    pub success: u64,
    pub errors: Vec<f64>,
    pub fatal: u64,
}

/// One derived fact per record, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub timestamp: Option<DateTime<Utc>>, // None = unparseable
    pub log_type: LogType,
    pub success: bool,
    pub error_count: u64,
    pub severity: SeverityLevel,
    pub deployment_success: Option<bool>,
    pub build_success: Option<bool>,
}

/// Everything derived from one (filtered) log collection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsAggregate {
    pub build: BuildMetrics,
    pub deployment: DeploymentMetrics,
    pub test: TestMetrics,
    pub sonarqube: SonarMetrics,
    pub git: GitMetrics,
    pub timeline: Vec<TimelineEntry>,
}

impl MetricsAggregate {
    /// Records of any type
    pub fn record_count(&self) -> usize {
        self.timeline.len()
    }

    fn record(&mut self, log: &LogRecord) {
        let log_type = classify(log);
        let success = extract::success(log, &log_type);

        match log_type {
            LogType::Build => {
                let bucket = &mut self.build;
                bucket.total += 1;
                bucket.success += u64::from(success);
                push_recorded(&mut bucket.durations, build::duration_seconds(log));
                push_recorded(&mut bucket.errors, log.build_error_count);
                push_recorded(&mut bucket.warnings, log.build_warning_count);
            }
            LogType::Deployment => {
                let bucket = &mut self.deployment;
                bucket.total += 1;
                bucket.success += u64::from(success);
                push_recorded(&mut bucket.durations, deployment::duration_seconds(log));
                push_recorded(&mut bucket.errors, log.deployment_error_count);
            }
            LogType::Test => {
                let bucket = &mut self.test;
                bucket.total += 1;
                bucket.success += u64::from(success);
                bucket.coverage.extend(test::coverage(log));
                push_recorded(&mut bucket.cases, log.test_cases_found);
                push_recorded(&mut bucket.failures, log.test_failures);
                push_recorded(&mut bucket.errors, log.test_error_count);
            }
            LogType::Sonarqube => {
                let bucket = &mut self.sonarqube;
                bucket.total += 1;
                bucket.success += u64::from(success);
                bucket.coverage.extend(sonarqube::code_coverage(log));
                bucket.bugs.extend(sonarqube::bugs(log));
                bucket.vulnerabilities.extend(sonarqube::vulnerabilities(log));
                bucket.code_smells.extend(sonarqube::code_smells(log));
                if sonarqube::quality_gate_passed(log) == Some(true) {
                    bucket.quality_gates_passed += 1;
                }
            }
            LogType::Git => {
                let bucket = &mut self.git;
                bucket.total += 1;
                bucket.success += u64::from(success);
                let listed = log.git_errors.as_ref().map_or(0, Vec::len) as f64;
                push_recorded(&mut bucket.errors, Some(listed));
                bucket.fatal += u64::from(log.git_fatal.unwrap_or(false));
            }
            _ => {}
        }

        self.timeline.push(TimelineEntry {
            timestamp: log.timestamp(),
            error_count: extract::error_count(log, &log_type),
            severity: log.severity_level(),
            deployment_success: (log_type == LogType::Deployment).then_some(success),
            build_success: (log_type == LogType::Build).then_some(success),
            log_type,
            success,
        });
    }
}

/// Aggregate a collection in one pass. Never fails; an empty input yields zeroed buckets.
pub fn aggregate<'a, I>(logs: I) -> MetricsAggregate
where
    I: IntoIterator<Item = &'a LogRecord>,
{
    let mut metrics = MetricsAggregate::default();
    for log in logs {
        metrics.record(log);
    }
    metrics
}

fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

// METRIC CARDS //

/// Headline numbers derived from an aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSummary {
    /// (build + deployment successes) / (build + deployment totals) * 100
    pub success_rate: f64,
    pub avg_build_duration: f64,
    /// errors per build/deployment run
    pub avg_error_rate: f64,
    pub total_errors: f64,
    /// test coverage mean, else sonarqube coverage mean, else 0
    pub avg_coverage: f64,
    pub runs: u64,
}

impl MetricsSummary {
    pub fn from_aggregate(metrics: &MetricsAggregate) -> Self {
        let runs = metrics.build.total + metrics.deployment.total;
        let successes = metrics.build.success + metrics.deployment.success;
        let total_errors: f64 = metrics.build.errors.iter().sum::<f64>()
            + metrics.deployment.errors.iter().sum::<f64>();

        let (success_rate, avg_error_rate) = if runs > 0 {
            (
                successes as f64 / runs as f64 * 100.0,
                total_errors / runs as f64,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            success_rate,
            avg_build_duration: mean(&metrics.build.durations).unwrap_or(0.0),
            avg_error_rate,
            total_errors,
            avg_coverage: mean(&metrics.test.coverage)
                .or_else(|| mean(&metrics.sonarqube.coverage))
                .unwrap_or(0.0),
            runs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(log_type: &str) -> LogRecord {
        LogRecord {
            log_type: Some(log_type.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_samples_are_dropped() {
        assert!(!is_recorded_sample(0.0));
        assert!(!is_recorded_sample(f64::NAN));
        assert!(is_recorded_sample(12.5));

        let log = LogRecord {
            build_duration_seconds: Some(crate::DurationField::Seconds(0.0)),
            build_error_count: Some(0.0),
            ..typed("build")
        };
        let metrics = aggregate([&log]);
        assert_eq!(metrics.build.total, 1);
        assert!(metrics.build.durations.is_empty());
        assert!(metrics.build.errors.is_empty());
    }

    #[test]
    fn test_zero_coverage_is_kept() {
        let log = LogRecord {
            test_coverage: Some(0.0),
            ..typed("test")
        };
        let sonar = LogRecord {
            bugs: Some(0.0),
            code_coverage: Some(0.0),
            ..typed("sonarqube")
        };
        let metrics = aggregate([&log, &sonar]);
        assert_eq!(metrics.test.coverage, vec![0.0]);
        assert_eq!(metrics.sonarqube.coverage, vec![0.0]);
        assert_eq!(metrics.sonarqube.bugs, vec![0.0]);
    }

    #[test]
    fn test_build_success_reads_build_field() {
        let log = LogRecord {
            build_success: Some(true),
            deployment_success: Some(false),
            ..typed("build")
        };
        let metrics = aggregate([&log]);
        assert_eq!(metrics.build.success, 1);
        assert_eq!(metrics.timeline[0].build_success, Some(true));
        assert_eq!(metrics.timeline[0].deployment_success, None);
    }

    #[test]
    fn test_timeline_covers_every_type() {
        let logs = [typed("git"), typed("nightly"), LogRecord::default()];
        let metrics = aggregate(&logs);
        assert_eq!(metrics.git.total, 1);
        assert_eq!(metrics.record_count(), 3);
        assert_eq!(metrics.timeline[1].log_type, LogType::Other("nightly".into()));
        assert!(metrics.timeline.iter().all(|e| e.timestamp.is_none()));
    }

    #[test]
    fn test_summary_formulas() {
        let logs = [
            LogRecord {
                build_success: Some(true),
                build_duration_seconds: Some(crate::DurationField::Seconds(100.0)),
                build_error_count: Some(2.0),
                ..typed("build")
            },
            LogRecord {
                build_success: Some(false),
                build_duration_seconds: Some(crate::DurationField::Text("5m".into())),
                ..typed("build")
            },
            LogRecord {
                deployment_success: Some(true),
                deployment_error_count: Some(4.0),
                ..typed("deployment")
            },
            LogRecord {
                code_coverage: Some(60.0),
                ..typed("sonarqube")
            },
        ];
        let summary = MetricsSummary::from_aggregate(&aggregate(&logs));
        assert!((summary.success_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.avg_build_duration, 200.0);
        assert_eq!(summary.total_errors, 6.0);
        assert_eq!(summary.avg_error_rate, 2.0);
        assert_eq!(summary.avg_coverage, 60.0);
        assert_eq!(summary.runs, 3);
    }

    #[test]
    fn test_empty_summary_has_no_division_by_zero() {
        let summary = MetricsSummary::from_aggregate(&aggregate(&Vec::<LogRecord>::new()));
        assert_eq!(summary, MetricsSummary::default());
    }
}
