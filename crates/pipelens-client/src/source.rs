// Log source abstraction over the dashboard backend endpoints

use crate::error::Result;
use async_trait::async_trait;
use pipelens_core::{FilterSelection, LogRecord};

/// Read-only access to the backend. `BackendClient` is the HTTP implementation;
/// tests plug in an in-memory one.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// GET /projects
    async fn projects(&self) -> Result<Vec<String>>;

    /// GET /environments
    async fn environments(&self) -> Result<Vec<String>>;

    /// GET /servers
    async fn servers(&self) -> Result<Vec<String>>;

    /// GET /analysis - full history across projects
    async fn analysis(&self) -> Result<Vec<LogRecord>>;

    /// GET /logs scoped to one project/tool
    async fn logs(&self, query: &LogQuery) -> Result<Vec<LogRecord>>;
}

/// Parameters of a `/logs` request. Optional filters are forwarded server-side
/// but are re-applied client-side, so a backend ignoring them is fine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    pub project: String,
    pub tool: String,
    pub environment: Option<String>,
    pub server: Option<String>,
    pub severity: Option<String>,
    pub log_type: Option<String>,
}

impl LogQuery {
    pub fn new(project: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            tool: tool.into(),
            ..Default::default()
        }
    }

    pub fn with_filters(mut self, selection: &FilterSelection) -> Self {
        self.environment = selection.environment.clone();
        self.server = selection.server.clone();
        self.severity = selection.severity.map(|s| s.to_string());
        self.log_type = selection.log_type.as_ref().map(|t| t.to_string());
        self
    }

    /// Path and query string, e.g. `/logs?project=a&tool=b&severity=high`
    pub fn path(&self) -> String {
        let mut path = format!(
            "/logs?project={}&tool={}",
            urlencoding::encode(&self.project),
            urlencoding::encode(&self.tool)
        );

        let optional = [
            ("environment", &self.environment),
            ("server", &self.server),
            ("severity", &self.severity),
            ("logType", &self.log_type),
        ];
        for (name, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                path.push_str(&format!("&{}={}", name, urlencoding::encode(value)));
            }
        }
        path
    }
}
