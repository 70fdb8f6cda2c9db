//! Insight cards and collection-wide counters (type counts, severity statistics)

use crate::{classify, LogRecord, LogType, SeverityLevel};
use serde::Serialize;

// TYPE COUNTS //

/// Records per log type. Types outside the listed ones count toward `all` only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LogTypeCounts {
    pub all: u64,
    pub build: u64,
    pub deployment: u64,
    pub test: u64,
    pub sonarqube: u64,
    pub github_actions: u64,
}

pub fn count_by_type<'a, I>(logs: I) -> LogTypeCounts
where
    I: IntoIterator<Item = &'a LogRecord>,
{
    let mut counts = LogTypeCounts::default();
    for log in logs {
        counts.all += 1;
        match classify(log) {
            LogType::Build => counts.build += 1,
            LogType::Deployment => counts.deployment += 1,
            LogType::Test => counts.test += 1,
            LogType::Sonarqube => counts.sonarqube += 1,
            LogType::GithubActions => counts.github_actions += 1,
            _ => {}
        }
    }
    counts
}

// SEVERITY STATISTICS //

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityStatistics {
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
    pub total: u64, // includes unknown
}

impl SeverityStatistics {
    pub fn count(&self, level: SeverityLevel) -> u64 {
        match level {
            SeverityLevel::Critical => self.critical,
            SeverityLevel::High => self.high,
            SeverityLevel::Medium => self.medium,
            SeverityLevel::Low => self.low,
            SeverityLevel::Unknown => self
                .total
                .saturating_sub(self.critical + self.high + self.medium + self.low),
        }
    }
}

pub fn severity_statistics<'a, I>(logs: I) -> SeverityStatistics
where
    I: IntoIterator<Item = &'a LogRecord>,
{
    let mut stats = SeverityStatistics::default();
    for log in logs {
        stats.total += 1;
        match log.severity_level() {
            SeverityLevel::Critical => stats.critical += 1,
            SeverityLevel::High => stats.high += 1,
            SeverityLevel::Medium => stats.medium += 1,
            SeverityLevel::Low => stats.low += 1,
            SeverityLevel::Unknown => {}
        }
    }
    stats
}

// INSIGHT CARDS //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Low,
    Medium,
    High,
}

impl Band {
    /// `High` above `high`, `Medium` above `medium`, else `Low`
    pub fn of(value: f64, medium: f64, high: f64) -> Self {
        if value > high {
            Self::High
        } else if value > medium {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Statistics over the records carrying one score field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreCard {
    pub count: usize,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub total: f64,
    pub band: Band,
}

impl ScoreCard {
    fn from_samples(samples: &[f64], medium: f64, high: f64) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let total: f64 = samples.iter().sum();
        let avg = total / samples.len() as f64;
        Some(Self {
            count: samples.len(),
            avg,
            min: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            total,
            band: Band::of(avg, medium, high),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SecurityCard {
    pub count: usize,
    pub total_vulnerabilities: f64,
    pub avg_vulnerabilities: f64,
    pub quality_gate_pass_rate: f64,
    pub band: Band,
}

/// LLM assessment cards. A card is `None` when no record carries its field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsightCards {
    pub business_impact: Option<ScoreCard>,
    pub confidence: Option<ScoreCard>,
    pub complexity: Option<ScoreCard>,
    pub technical_debt: Option<ScoreCard>,
    pub security: Option<SecurityCard>,
    pub llm_coverage: f64, // % of records with a non-blank llm_response
}

impl InsightCards {
    pub fn from_logs(logs: &[&LogRecord]) -> Self {
        let samples = |field: fn(&LogRecord) -> Option<f64>| -> Vec<f64> {
            logs.iter()
                .filter_map(|log| field(log))
                .filter(|v| !v.is_nan())
                .collect()
        };

        Self {
            business_impact: ScoreCard::from_samples(&samples(|l| l.business_impact_score), 4.0, 7.0),
            confidence: ScoreCard::from_samples(&samples(|l| l.confidence_score), 4.0, 7.0),
            complexity: ScoreCard::from_samples(&samples(|l| l.technical_complexity), 4.0, 7.0),
            technical_debt: ScoreCard::from_samples(&samples(|l| l.technical_debt_hours), 10.0, 20.0),
            security: security_card(logs),
            llm_coverage: llm_coverage(logs),
        }
    }
}

fn security_card(logs: &[&LogRecord]) -> Option<SecurityCard> {
    let scanned: Vec<(&LogRecord, f64)> = logs
        .iter()
        .filter_map(|log| log.vulnerabilities.map(|v| (*log, v)))
        .filter(|(_, v)| !v.is_nan())
        .collect();
    if scanned.is_empty() {
        return None;
    }

    let count = scanned.len();
    let total: f64 = scanned.iter().map(|(_, v)| v).sum();
    let passed = scanned
        .iter()
        .filter(|(log, _)| log.quality_gate_passed == Some(true))
        .count();
    let avg = total / count as f64;

    Some(SecurityCard {
        count,
        total_vulnerabilities: total,
        avg_vulnerabilities: avg,
        quality_gate_pass_rate: passed as f64 / count as f64 * 100.0,
        band: Band::of(avg, 2.0, 5.0),
    })
}

fn llm_coverage(logs: &[&LogRecord]) -> f64 {
    if logs.is_empty() {
        return 0.0;
    }
    let with_llm = logs
        .iter()
        .filter(|log| log.llm_response.as_deref().is_some_and(|r| !r.trim().is_empty()))
        .count();
    with_llm as f64 / logs.len() as f64 * 100.0
}
