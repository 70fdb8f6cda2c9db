// SonarQube metrics: coverage, issue counts and quality gate

use super::{capture_number, first_of, Strategy};
use crate::LogRecord;
use regex::Regex;
use std::sync::LazyLock;

static CODE_COVERAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)code coverage:?\s*([0-9]+\.?[0-9]*)%").unwrap());
static BUGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)bugs:?\s*([0-9]+)").unwrap());
static VULNERABILITIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)vulnerabilities:?\s*([0-9]+)").unwrap());
static CODE_SMELLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)code smells:?\s*([0-9]+)").unwrap());
static GATE_FAILED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)quality gate failed").unwrap());

const COVERAGE_STRATEGIES: [Strategy<f64>; 2] = [
    |log| log.code_coverage,
    |log| text_number(&CODE_COVERAGE, log),
];
const BUG_STRATEGIES: [Strategy<f64>; 2] = [|log| log.bugs, |log| text_number(&BUGS, log)];
const VULNERABILITY_STRATEGIES: [Strategy<f64>; 2] = [
    |log| log.vulnerabilities,
    |log| text_number(&VULNERABILITIES, log),
];
const SMELL_STRATEGIES: [Strategy<f64>; 2] = [
    |log| log.code_smells,
    |log| text_number(&CODE_SMELLS, log),
];
const GATE_STRATEGIES: [Strategy<bool>; 2] = [
    |log| log.quality_gate_passed,
    |log| gate_from_text(log.summary_text()),
];

fn text_number(re: &Regex, log: &LogRecord) -> Option<f64> {
    capture_number(re, log.summary_text())
}

/// Quality gate from text: passed unless the summary says it failed; `None` without text.
pub fn gate_from_text(summary: &str) -> Option<bool> {
    if summary.is_empty() {
        return None;
    }
    Some(!GATE_FAILED.is_match(summary))
}

pub fn code_coverage(log: &LogRecord) -> Option<f64> {
    first_of(&COVERAGE_STRATEGIES, log)
}

pub fn bugs(log: &LogRecord) -> Option<f64> {
    first_of(&BUG_STRATEGIES, log)
}

pub fn vulnerabilities(log: &LogRecord) -> Option<f64> {
    first_of(&VULNERABILITY_STRATEGIES, log)
}

pub fn code_smells(log: &LogRecord) -> Option<f64> {
    first_of(&SMELL_STRATEGIES, log)
}

pub fn quality_gate_passed(log: &LogRecord) -> Option<bool> {
    first_of(&GATE_STRATEGIES, log)
}

/// Success is the quality gate; a record with no gate data at all counts as passed.
pub fn success(log: &LogRecord) -> bool {
    match log.quality_gate_passed {
        Some(passed) => passed,
        None => !GATE_FAILED.is_match(log.summary_text()),
    }
}

pub fn error_count(log: &LogRecord) -> f64 {
    log.bugs.unwrap_or(0.0) + log.vulnerabilities.unwrap_or(0.0)
}
