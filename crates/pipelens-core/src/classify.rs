//! Log type classification - maps a raw record to its canonical CI/CD log type

use crate::LogRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

// LOG TYPE //

/// Canonical log type.
///
/// Unrecognised tool names and explicit overrides outside the known set are carried
/// through as `Other` with their lower-cased text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogType {
    Build,
    Deployment,
    Test,
    Sonarqube,
    Git,
    GithubActions,
    Unknown,
    Other(String),
}

impl LogType {
    /// Map a lower-cased name onto a variant
    pub fn from_name(name: &str) -> Self {
        match name {
            "build" => Self::Build,
            "deployment" => Self::Deployment,
            "test" => Self::Test,
            "sonarqube" => Self::Sonarqube,
            "git" => Self::Git,
            "github_actions" => Self::GithubActions,
            "unknown" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Build => "build",
            Self::Deployment => "deployment",
            Self::Test => "test",
            Self::Sonarqube => "sonarqube",
            Self::Git => "git",
            Self::GithubActions => "github_actions",
            Self::Unknown => "unknown",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(&s.trim().to_lowercase()))
    }
}

impl From<String> for LogType {
    fn from(s: String) -> Self {
        Self::from_name(&s.trim().to_lowercase())
    }
}

impl From<LogType> for String {
    fn from(t: LogType) -> Self {
        t.as_str().to_string()
    }
}

// CLASSIFIER //

// summary keywords used to split generic GitHub Actions runs (matched on lower-cased text)
static SONAR_SUMMARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sonarqube|quality gate").unwrap());
static TEST_SUMMARY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"test(?:ing|s|ed)").unwrap());
static BUILD_SUMMARY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"build").unwrap());
static DEPLOY_SUMMARY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"deploy").unwrap());

/// Classify a record. Pure: identical input always yields the identical type.
///
/// Order: explicit `log_type` override, then tool name keywords, then `Unknown`.
pub fn classify(log: &LogRecord) -> LogType {
    if let Some(explicit) = log.log_type.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return LogType::from_name(&explicit.to_lowercase());
    }

    match log.tool.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(tool) => classify_tool(&tool.to_lowercase(), log.summary_text()),
        None => LogType::Unknown,
    }
}

fn classify_tool(tool: &str, summary: &str) -> LogType {
    if tool.contains("sonar") {
        return LogType::Sonarqube;
    }
    if tool.contains("test") {
        return LogType::Test;
    }
    if tool.contains("build") {
        return LogType::Build;
    }
    if tool.contains("deploy") {
        return LogType::Deployment;
    }
    // "github_actions" also contains "git", so the exact match goes first
    if tool == "github_actions" {
        return classify_summary(&summary.to_lowercase()).unwrap_or(LogType::GithubActions);
    }
    if tool.contains("git") {
        return LogType::Git;
    }
    LogType::from_name(tool)
}

fn classify_summary(summary: &str) -> Option<LogType> {
    if SONAR_SUMMARY.is_match(summary) {
        Some(LogType::Sonarqube)
    } else if TEST_SUMMARY.is_match(summary) {
        Some(LogType::Test)
    } else if BUILD_SUMMARY.is_match(summary) {
        Some(LogType::Build)
    } else if DEPLOY_SUMMARY.is_match(summary) {
        Some(LogType::Deployment)
    } else {
        None
    }
}
