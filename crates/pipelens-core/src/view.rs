//! Analysis view - everything the presentation layer renders for one project/tool,
//! recomputed from scratch for a collection + filter selection + granularity.

use crate::series::{self, Bucket, CoveragePoint, DurationPoint, QualityPoint, SeverityCounts, TrendPoint};
use crate::{
    aggregate, available_environments, available_servers, available_severities, count_by_type,
    filter_logs, severity_statistics, FilterSelection, Granularity, InsightCards, LogRecord,
    LogTypeCounts, MetricsAggregate, MetricsSummary, SeverityLevel, SeverityStatistics,
};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisView<'a> {
    pub selection: FilterSelection,
    pub granularity: Granularity,
    pub total_count: usize,
    pub filtered_count: usize,

    /// matching records, newest first; invalid timestamps sort last
    pub logs: Vec<&'a LogRecord>,

    pub metrics: MetricsAggregate,
    pub summary: MetricsSummary,
    pub insights: InsightCards,

    // computed over the full collection, not the filtered subset
    pub type_counts: LogTypeCounts,
    pub severity_stats: SeverityStatistics,

    // filter options, each narrowed by the upstream selection
    pub environments: Vec<String>,
    pub servers: Vec<String>,
    pub severities: Vec<SeverityLevel>,

    pub error_timeline: Vec<Bucket<u64>>,
    pub deployment_trend: Vec<TrendPoint>,
    pub deployment_frequency: Vec<Bucket<u64>>,
    pub severity_distribution: Vec<Bucket<SeverityCounts>>,
    pub build_durations: Vec<DurationPoint>,
    pub test_coverage: Vec<CoveragePoint>,
    pub code_quality: Vec<QualityPoint>,
    pub mttr: Vec<Bucket<f64>>,
}

impl<'a> AnalysisView<'a> {
    pub fn compute(logs: &'a [LogRecord], selection: &FilterSelection, granularity: Granularity) -> Self {
        let mut filtered = filter_logs(logs, selection);
        sort_newest_first(&mut filtered);

        let metrics = aggregate(filtered.iter().copied());
        let summary = MetricsSummary::from_aggregate(&metrics);
        let environment = selection.environment.as_deref();

        Self {
            selection: selection.clone(),
            granularity,
            total_count: logs.len(),
            filtered_count: filtered.len(),
            insights: InsightCards::from_logs(&filtered),
            type_counts: count_by_type(logs),
            severity_stats: severity_statistics(logs),
            environments: available_environments(logs),
            servers: available_servers(logs, environment),
            severities: available_severities(logs, environment, selection.server.as_deref()),
            error_timeline: series::error_timeline(&metrics.timeline, granularity),
            deployment_trend: series::deployment_success_trend(&metrics.timeline),
            deployment_frequency: series::deployment_frequency(&filtered),
            severity_distribution: series::severity_distribution(&filtered),
            build_durations: series::build_durations(&filtered),
            test_coverage: series::test_coverage(&filtered),
            code_quality: series::code_quality(&filtered),
            mttr: series::mttr_trend(&filtered),
            metrics,
            summary,
            logs: filtered,
        }
    }

    /// No record matched the selection (distinct from a failed fetch)
    pub fn is_empty(&self) -> bool {
        self.filtered_count == 0
    }
}

// stable: equal timestamps keep input order
fn sort_newest_first(logs: &mut [&LogRecord]) {
    logs.sort_by(|a, b| match (a.timestamp(), b.timestamp()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogType;
    use serde_json::json;

    fn record(env: &str, log_type: &str, ts: serde_json::Value) -> LogRecord {
        LogRecord {
            environment: Some(env.to_string()),
            log_type: Some(log_type.to_string()),
            timestamp: Some(ts),
            ..Default::default()
        }
    }

    #[test]
    fn test_newest_first_with_invalid_last() {
        let logs = vec![
            record("prod", "build", json!("bad")),
            record("prod", "build", json!("2024-01-01T00:00:00Z")),
            record("prod", "build", json!("2024-02-01T00:00:00Z")),
            record("prod", "build", json!(null)),
        ];
        let view = AnalysisView::compute(&logs, &FilterSelection::new(), Granularity::Day);
        let order: Vec<_> = view.logs.iter().map(|l| l.raw_timestamp()).collect();
        assert_eq!(
            order,
            vec![
                Some("2024-02-01T00:00:00Z".to_string()),
                Some("2024-01-01T00:00:00Z".to_string()),
                Some("bad".to_string()),
                None,
            ]
        );
    }

    #[test]
    fn test_counts_use_full_collection() {
        let logs = vec![
            record("prod", "build", json!("2024-01-01T00:00:00Z")),
            record("staging", "deployment", json!("2024-01-01T00:00:00Z")),
        ];
        let selection = FilterSelection::new().with_environment("prod");
        let view = AnalysisView::compute(&logs, &selection, Granularity::Hour);

        assert_eq!((view.total_count, view.filtered_count), (2, 1));
        assert_eq!(view.type_counts.all, 2);
        assert_eq!(view.metrics.record_count(), 1);
        assert_eq!(view.environments, vec!["prod", "staging"]);
        assert!(!view.is_empty());
    }

    #[test]
    fn test_empty_selection_result() {
        let logs = vec![record("prod", "build", json!("2024-01-01T00:00:00Z"))];
        let selection = FilterSelection::new().with_log_type(LogType::Test);
        let view = AnalysisView::compute(&logs, &selection, Granularity::Hour);
        assert!(view.is_empty());
        assert_eq!(view.summary, MetricsSummary::default());
        assert!(view.error_timeline.is_empty());
    }
}
