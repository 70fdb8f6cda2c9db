//! Core types for pipelens CI/CD log analytics.
//! This crate holds the analysis record model shared across all components and the
//! pure classification, extraction, filtering and aggregation passes over it.

pub mod classify;
mod de;
pub mod extract;
pub mod filter;
pub mod insights;
pub mod metrics;
pub mod project;
pub mod series;
pub mod severity;
pub mod view;

pub use classify::{classify, LogType};
pub use filter::{
    available_environments, available_servers, available_severities, filter_logs,
    FilterSelection,
};
pub use insights::{count_by_type, severity_statistics, InsightCards, LogTypeCounts, SeverityStatistics};
pub use metrics::{aggregate, MetricsAggregate, MetricsSummary, TimelineEntry};
pub use project::{build_project_stats, DashboardTotals, ProjectStat, ProjectStatus, ToolCount};
pub use series::Granularity;
pub use severity::{normalize, SeverityLevel};
pub use view::AnalysisView;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ANALYSIS RECORD (what the backend returns) //

/// One stored analysis result for a project/tool/run.
///
/// Records are semi-structured: every field is optional and a field holding a value of
/// the wrong JSON type reads as absent rather than failing the whole record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogRecord {
    // raw timestamp as sent, parsed on demand (see `timestamp()`)
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,

    #[serde(default, deserialize_with = "de::text")]
    pub project: Option<String>,

    #[serde(default, deserialize_with = "de::text")]
    pub tool: Option<String>,

    // explicit override of classification
    #[serde(default, deserialize_with = "de::text")]
    pub log_type: Option<String>,

    #[serde(default, deserialize_with = "de::text")]
    pub environment: Option<String>,

    #[serde(default, deserialize_with = "de::text")]
    pub server: Option<String>,

    #[serde(default, deserialize_with = "de::text")]
    pub severity: Option<String>,

    #[serde(default, deserialize_with = "de::text")]
    pub severity_level: Option<String>,

    #[serde(default, deserialize_with = "de::text")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "de::text")]
    pub executive_summary: Option<String>,

    #[serde(default, deserialize_with = "de::text")]
    pub llm_response: Option<String>,

    // build
    #[serde(default, deserialize_with = "de::flag")]
    pub build_success: Option<bool>,
    #[serde(default, deserialize_with = "de::duration")]
    pub build_duration_seconds: Option<DurationField>,
    #[serde(default, deserialize_with = "de::number")]
    pub build_error_count: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub build_warning_count: Option<f64>,

    // deployment
    #[serde(default, deserialize_with = "de::flag")]
    pub deployment_success: Option<bool>,
    #[serde(default, deserialize_with = "de::duration")]
    pub deployment_duration: Option<DurationField>,
    #[serde(default, deserialize_with = "de::number")]
    pub deployment_error_count: Option<f64>,
    #[serde(default, deserialize_with = "de::flag")]
    pub deployment_fatal: Option<bool>,

    // test
    #[serde(default, deserialize_with = "de::number")]
    pub test_coverage: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub test_cases_found: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub test_error_count: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub test_failures: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub test_pass_rate: Option<f64>,

    // sonarqube
    #[serde(default, deserialize_with = "de::number")]
    pub code_coverage: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub bugs: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub vulnerabilities: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub code_smells: Option<f64>,
    #[serde(default, deserialize_with = "de::flag")]
    pub quality_gate_passed: Option<bool>,

    // generic + git
    #[serde(default, deserialize_with = "de::number")]
    pub error_count: Option<f64>,
    #[serde(default, deserialize_with = "de::sequence")]
    pub git_errors: Option<Vec<serde_json::Value>>,
    #[serde(default, deserialize_with = "de::flag")]
    pub git_fatal: Option<bool>,

    // llm assessment scores
    #[serde(default, deserialize_with = "de::number")]
    pub business_impact_score: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub confidence_score: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub technical_complexity: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub technical_debt_hours: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub mttr_hours: Option<f64>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>, // any field not modelled above
}

impl LogRecord {
    /// Parsed timestamp; `None` is the invalid-date sentinel.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_ref().and_then(de::parse_timestamp)
    }

    /// Timestamp as originally sent, rendered as a string.
    pub fn raw_timestamp(&self) -> Option<String> {
        match self.timestamp.as_ref()? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Narrative used as the extraction fallback: the first non-empty of
    /// `executive_summary` and `llm_response`.
    pub fn summary_text(&self) -> &str {
        non_empty(self.executive_summary.as_deref())
            .or_else(|| non_empty(self.llm_response.as_deref()))
            .unwrap_or("")
    }

    /// Free-form severity: `severity_level` wins over `severity`.
    pub fn severity_text(&self) -> Option<&str> {
        non_empty(self.severity_level.as_deref()).or_else(|| non_empty(self.severity.as_deref()))
    }

    pub fn severity_level(&self) -> SeverityLevel {
        normalize(self.severity_text().unwrap_or(""))
    }

    pub fn log_type(&self) -> LogType {
        classify(self)
    }

    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }

    /// First line of the executive summary, markdown bold prefix stripped.
    pub fn headline(&self) -> &str {
        let Some(summary) = non_empty(self.executive_summary.as_deref()) else {
            return "No summary available.";
        };
        let first = summary.lines().next().unwrap_or("");
        first.strip_prefix("**").map(str::trim_start).unwrap_or(first)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

// DURATION FIELD //

/// A duration field sent either as seconds or as text like `"1h 2m 3s"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationField {
    Seconds(f64),
    Text(String),
}

impl DurationField {
    pub fn seconds(&self) -> f64 {
        match self {
            DurationField::Seconds(s) => *s,
            DurationField::Text(t) => extract::parse_duration(t) as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrong_typed_fields_read_as_absent() {
        let record: LogRecord = serde_json::from_value(json!({
            "project": "checkout",
            "build_error_count": "many",
            "build_success": {"nested": true},
            "git_errors": "not a list",
            "timestamp": "yesterday-ish",
            "custom": 7
        }))
        .unwrap();

        assert_eq!(record.project.as_deref(), Some("checkout"));
        assert_eq!(record.build_error_count, None);
        assert_eq!(record.build_success, None);
        assert!(record.git_errors.is_none());
        assert!(record.timestamp().is_none());
        assert_eq!(record.extra.get("custom"), Some(&json!(7)));
    }

    #[test]
    fn test_summary_prefers_executive_summary() {
        let record = LogRecord {
            executive_summary: Some(String::new()),
            llm_response: Some("Build successful".to_string()),
            ..Default::default()
        };
        assert_eq!(record.summary_text(), "Build successful");
    }

    #[test]
    fn test_headline_strips_bold_marker() {
        let record = LogRecord {
            executive_summary: Some("**  Deploy finished\nmore detail".to_string()),
            ..Default::default()
        };
        assert_eq!(record.headline(), "Deploy finished");
        assert_eq!(LogRecord::default().headline(), "No summary available.");
    }

    #[test]
    fn test_duration_field_accepts_both_shapes() {
        let record: LogRecord = serde_json::from_value(json!({
            "build_duration_seconds": 42,
            "deployment_duration": "2m 5s"
        }))
        .unwrap();
        assert_eq!(record.build_duration_seconds.unwrap().seconds(), 42.0);
        assert_eq!(record.deployment_duration.unwrap().seconds(), 125.0);
    }
}
