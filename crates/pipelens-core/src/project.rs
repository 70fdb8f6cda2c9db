//! Project stats builder - per-project summary cards over the full analysis set

use crate::LogRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// records without a tool are grouped under this name
const UNKNOWN_TOOL: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Success,
    Warning,
    Error,
}

impl ProjectStatus {
    /// Any non-success record makes the project `Error`; otherwise a rate in [50, 70) is `Warning`.
    pub fn classify(error_count: u64, success_rate: f64) -> Self {
        if error_count > 0 {
            Self::Error
        } else if (50.0..70.0).contains(&success_rate) {
            Self::Warning
        } else {
            Self::Success
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub success: u64,
    pub error: u64,
}

/// Summary card for one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectStat {
    pub name: String,
    pub count: u64,
    pub tools: Vec<ToolCount>, // first-seen order
    pub success_rate: f64,     // 0-100, one decimal
    pub latest_timestamp: Option<String>,
    pub status: ProjectStatus,
    pub status_counts: StatusCounts,
}

impl ProjectStat {
    fn build(name: &str, analysis: &[LogRecord]) -> Self {
        let mut tools: Vec<ToolCount> = Vec::new();
        let mut counts = StatusCounts::default();
        let mut latest: Option<(DateTime<Utc>, &LogRecord)> = None;
        let mut first_raw: Option<&LogRecord> = None;
        let mut count = 0u64;

        for record in analysis.iter().filter(|r| r.project.as_deref() == Some(name)) {
            count += 1;

            let tool = record.tool.as_deref().unwrap_or(UNKNOWN_TOOL);
            match tools.iter_mut().find(|t| t.name == tool) {
                Some(entry) => entry.count += 1,
                None => tools.push(ToolCount {
                    name: tool.to_string(),
                    count: 1,
                }),
            }

            if record.is_success() {
                counts.success += 1;
            } else {
                counts.error += 1;
            }

            // strict comparison: the first record holding the max wins
            if let Some(ts) = record.timestamp() {
                if latest.map_or(true, |(best, _)| ts > best) {
                    latest = Some((ts, record));
                }
            }
            if first_raw.is_none() && record.raw_timestamp().is_some() {
                first_raw = Some(record);
            }
        }

        let success_rate = if count > 0 {
            round_one_decimal(counts.success as f64 / count as f64 * 100.0)
        } else {
            0.0
        };

        Self {
            name: name.to_string(),
            count,
            tools,
            success_rate,
            latest_timestamp: latest
                .map(|(_, record)| record)
                .or(first_raw)
                .and_then(LogRecord::raw_timestamp),
            status: ProjectStatus::classify(counts.error, success_rate),
            status_counts: counts,
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Build one card per project name, in the order given.
pub fn build_project_stats<S: AsRef<str>>(project_names: &[S], analysis: &[LogRecord]) -> Vec<ProjectStat> {
    project_names
        .iter()
        .map(|name| ProjectStat::build(name.as_ref(), analysis))
        .collect()
}

/// Dashboard-wide headline numbers
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DashboardTotals {
    pub total_projects: usize,
    pub total_records: u64,
    pub overall_success_rate: u32, // mean of per-project rates, rounded
}

impl DashboardTotals {
    pub fn from_stats(stats: &[ProjectStat]) -> Self {
        let overall = if stats.is_empty() {
            0.0
        } else {
            stats.iter().map(|s| s.success_rate).sum::<f64>() / stats.len() as f64
        };
        Self {
            total_projects: stats.len(),
            total_records: stats.iter().map(|s| s.count).sum(),
            overall_success_rate: overall.round() as u32,
        }
    }
}
