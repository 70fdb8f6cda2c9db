//! Filter engine - environment / server / severity / log type predicates over a collection

use crate::{classify, LogRecord, LogType, SeverityLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The current filter selection. Owned by the caller and passed into every
/// filtering/aggregation call; `None` on a dimension means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub severity: Option<SeverityLevel>,
    #[serde(default)]
    pub log_type: Option<LogType>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    // empty strings act as "no filter"
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = non_empty(environment.into());
        self
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = non_empty(server.into());
        self
    }

    pub fn with_severity(mut self, severity: SeverityLevel) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_log_type(mut self, log_type: LogType) -> Self {
        self.log_type = Some(log_type);
        self
    }

    /// Reset every dimension
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.environment.is_none()
            && self.server.is_none()
            && self.severity.is_none()
            && self.log_type.is_none()
    }

    /// True when the record satisfies every active dimension
    pub fn matches(&self, log: &LogRecord) -> bool {
        if let Some(env) = &self.environment {
            if log.environment.as_deref() != Some(env.as_str()) {
                return false;
            }
        }
        if let Some(server) = &self.server {
            if log.server.as_deref() != Some(server.as_str()) {
                return false;
            }
        }
        if let Some(severity) = self.severity {
            if log.severity_level() != severity {
                return false;
            }
        }
        if let Some(log_type) = &self.log_type {
            if &classify(log) != log_type {
                return false;
            }
        }
        true
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Keep the records matching the selection, preserving input order.
pub fn filter_logs<'a>(logs: &'a [LogRecord], selection: &FilterSelection) -> Vec<&'a LogRecord> {
    logs.iter().filter(|log| selection.matches(log)).collect()
}

// upstream narrowing for the option lists; empty values are ignored
fn narrowed<'a>(
    logs: &'a [LogRecord],
    environment: Option<&'a str>,
    server: Option<&'a str>,
) -> impl Iterator<Item = &'a LogRecord> {
    let environment = environment.filter(|e| !e.is_empty());
    let server = server.filter(|s| !s.is_empty());
    logs.iter().filter(move |log| {
        environment.map_or(true, |env| log.environment.as_deref() == Some(env))
            && server.map_or(true, |srv| log.server.as_deref() == Some(srv))
    })
}

/// Distinct non-empty environments, sorted.
pub fn available_environments(logs: &[LogRecord]) -> Vec<String> {
    distinct(logs.iter().filter_map(|log| log.environment.as_deref()))
}

/// Distinct servers, optionally narrowed to one environment, sorted.
pub fn available_servers(logs: &[LogRecord], environment: Option<&str>) -> Vec<String> {
    distinct(narrowed(logs, environment, None).filter_map(|log| log.server.as_deref()))
}

/// Distinct known severities, narrowed by environment and server, sorted by name.
pub fn available_severities(
    logs: &[LogRecord],
    environment: Option<&str>,
    server: Option<&str>,
) -> Vec<SeverityLevel> {
    let levels: BTreeSet<SeverityLevel> = narrowed(logs, environment, server)
        .map(LogRecord::severity_level)
        .filter(|level| *level != SeverityLevel::Unknown)
        .collect();
    let mut levels: Vec<SeverityLevel> = levels.into_iter().collect();
    levels.sort_by_key(|level| level.as_str());
    levels
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
