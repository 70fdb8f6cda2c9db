use async_trait::async_trait;
use pipelens_client::{load_dashboard, FetchError, LogQuery, LogSource, ProjectSession, Result};
use pipelens_core::{FilterSelection, Granularity, LogRecord, LogType, ProjectStatus, SeverityLevel};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

// in-memory backend that ignores server-side filters
#[derive(Default)]
struct MemorySource {
    projects: Vec<String>,
    analysis: Vec<LogRecord>,
    logs: Vec<LogRecord>,
    fail_logs: AtomicBool,
    fail_servers: bool,
    queries: Mutex<Vec<String>>,
}

fn unavailable(endpoint: &str) -> FetchError {
    FetchError::Status {
        endpoint: endpoint.to_string(),
        status: 503,
        body: "unavailable".to_string(),
    }
}

#[async_trait]
impl LogSource for MemorySource {
    async fn projects(&self) -> Result<Vec<String>> {
        Ok(self.projects.clone())
    }

    async fn environments(&self) -> Result<Vec<String>> {
        Ok(vec!["prod".to_string(), "staging".to_string()])
    }

    async fn servers(&self) -> Result<Vec<String>> {
        if self.fail_servers {
            return Err(unavailable("/servers"));
        }
        Ok(vec!["web-1".to_string()])
    }

    async fn analysis(&self) -> Result<Vec<LogRecord>> {
        Ok(self.analysis.clone())
    }

    async fn logs(&self, query: &LogQuery) -> Result<Vec<LogRecord>> {
        self.queries.lock().unwrap().push(query.path());
        if self.fail_logs.load(Ordering::SeqCst) {
            return Err(unavailable("/logs"));
        }
        Ok(self.logs.clone())
    }
}

fn record(value: serde_json::Value) -> LogRecord {
    serde_json::from_value(value).unwrap()
}

fn sample_source() -> MemorySource {
    MemorySource {
        projects: vec!["checkout".to_string(), "search".to_string()],
        analysis: vec![
            record(json!({"project": "checkout", "tool": "sonarqube", "status": "success", "timestamp": "2024-03-01T10:00:00Z"})),
            record(json!({"project": "checkout", "tool": "jenkins", "status": "success", "timestamp": "2024-03-02T10:00:00Z"})),
            record(json!({"project": "search", "tool": "git", "status": "failed", "timestamp": "2024-03-01T10:00:00Z"})),
        ],
        logs: vec![
            record(json!({"tool": "maven-build", "environment": "prod", "severity": "high", "build_success": true, "timestamp": "2024-03-01T10:00:00Z"})),
            record(json!({"tool": "k8s-deploy", "environment": "prod", "severity": "low", "deployment_success": false, "timestamp": "2024-03-01T11:00:00Z"})),
            record(json!({"tool": "maven-build", "environment": "staging", "severity": "high", "timestamp": "2024-03-01T12:00:00Z"})),
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_load_dashboard() {
    let source = sample_source();
    let dashboard = load_dashboard(&source).await.unwrap();

    assert_eq!(dashboard.projects.len(), 2);
    assert_eq!(dashboard.projects[0].name, "checkout");
    assert_eq!(dashboard.projects[0].status, ProjectStatus::Success);
    assert_eq!(dashboard.projects[1].status, ProjectStatus::Error);
    assert_eq!(dashboard.totals.total_records, 3);
    assert_eq!(dashboard.totals.overall_success_rate, 50);
    assert_eq!(dashboard.environments, vec!["prod", "staging"]);
    assert_eq!(dashboard.analysis.len(), 3);
}

#[tokio::test]
async fn test_load_dashboard_fails_as_a_whole() {
    let source = MemorySource {
        fail_servers: true,
        ..sample_source()
    };
    let err = load_dashboard(&source).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_session_filters_client_side() {
    let mut session = ProjectSession::new(sample_source(), "checkout", "maven-build")
        .with_granularity(Granularity::Day);
    assert_eq!(session.refresh().await.unwrap(), 3);

    session.set_selection(
        FilterSelection::new()
            .with_environment("prod")
            .with_log_type(LogType::Build),
    );
    // the backend ignored the filters, the view still applies them
    let view = session.view();
    assert_eq!(view.total_count, 3);
    assert_eq!(view.filtered_count, 1);
    assert_eq!(view.metrics.build.success, 1);
    assert_eq!(view.granularity, Granularity::Day);
    assert_eq!(view.error_timeline.len(), 1);
    assert_eq!(view.error_timeline[0].value, 0);
}

#[tokio::test]
async fn test_refresh_forwards_selection() {
    let mut session = ProjectSession::new(sample_source(), "checkout", "maven-build");
    session.set_selection(FilterSelection::new().with_severity(SeverityLevel::High));
    session.refresh().await.unwrap();
    let queries = session.source().queries.lock().unwrap().clone();
    assert_eq!(queries, vec!["/logs?project=checkout&tool=maven-build&severity=high"]);

    let view = session.view();
    assert_eq!(view.filtered_count, 2);
    assert!(view.logs.iter().all(|l| l.severity_level() == SeverityLevel::High));
}

#[tokio::test]
async fn test_widened_selection_reports_stale_fetch() {
    let mut session = ProjectSession::new(sample_source(), "checkout", "maven-build");
    assert!(session.fetched_selection().is_none());
    assert!(session.needs_refresh());

    let narrow = FilterSelection::new().with_environment("prod");
    session.set_selection(narrow.clone());
    session.refresh().await.unwrap();
    assert_eq!(session.fetched_selection(), Some(&narrow));
    assert!(!session.needs_refresh());

    session.set_selection(FilterSelection::new());
    assert_eq!(session.fetched_selection(), Some(&narrow));
    assert!(session.needs_refresh());

    session.refresh().await.unwrap();
    assert_eq!(session.fetched_selection(), Some(&FilterSelection::new()));
    assert!(!session.needs_refresh());
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_collection() {
    let mut session = ProjectSession::new(sample_source(), "checkout", "maven-build");
    session.refresh().await.unwrap();
    let before = session.logs();

    session.source().fail_logs.store(true, Ordering::SeqCst);
    session.set_selection(FilterSelection::new().with_server("web-1"));
    assert!(session.refresh().await.is_err());
    assert_eq!(session.logs().len(), before.len());
    assert_eq!(session.fetched_selection(), Some(&FilterSelection::new()));
    assert!(!session.view().is_empty());
}

#[tokio::test]
async fn test_empty_result_is_not_an_error() {
    let source = MemorySource {
        logs: Vec::new(),
        ..sample_source()
    };
    let mut session = ProjectSession::new(source, "checkout", "git");
    assert_eq!(session.refresh().await.unwrap(), 0);
    assert!(session.view().is_empty());
}
