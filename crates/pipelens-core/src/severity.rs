//! Severity normalization - free-form severity text to a fixed ordinal level

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity levels (ordered from lowest to highest)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    #[default]
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityLevel {
    /// Known levels in matching priority order
    pub const PRIORITY: [SeverityLevel; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSeverity(pub String);

impl fmt::Display for UnknownSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown severity level: {}", self.0)
    }
}

impl std::error::Error for UnknownSeverity {}

impl FromStr for SeverityLevel {
    type Err = UnknownSeverity;

    /// Parse an exact level name (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            "unknown" => Ok(Self::Unknown),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}

/// Normalize severity text by case-insensitive substring containment.
/// Priority is critical > high > medium > low; empty or unmatched text is `Unknown`.
pub fn normalize(text: &str) -> SeverityLevel {
    let lower = text.to_lowercase();
    SeverityLevel::PRIORITY
        .into_iter()
        .find(|level| lower.contains(level.as_str()))
        .unwrap_or(SeverityLevel::Unknown)
}
