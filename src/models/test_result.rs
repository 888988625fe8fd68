//! Test result models
//!
//! Defines per-case results, per-suite reports and the final run report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::assertions::AssertionError;

/// Message of a synthesized result for a case that never completed
pub const TIMEOUT_MESSAGE: &str = "Timeout exceeded. Was completion callback invoked?";

/// Error captured from a failing case
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    pub stack: String,
}

impl From<AssertionError> for ErrorInfo {
    fn from(err: AssertionError) -> Self {
        Self {
            message: err.message,
            stack: err.stack,
        }
    }
}

/// Result of a single test case
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub is_pass: bool,
    pub message: String,
    pub error: Option<ErrorInfo>,
    /// Set only on results synthesized for cases still pending at the deadline
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub timed_out: bool,
}

impl TestResult {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            is_pass: true,
            message: message.into(),
            error: None,
            timed_out: false,
        }
    }

    pub fn fail(message: impl Into<String>, error: impl Into<ErrorInfo>) -> Self {
        Self {
            is_pass: false,
            message: message.into(),
            error: Some(error.into()),
            timed_out: false,
        }
    }

    /// Synthesized failure for a case still pending when its suite timed out
    pub fn timeout(message: impl Into<String>, timeout_ms: u64) -> Self {
        let mut result = Self::fail(
            message,
            ErrorInfo {
                message: TIMEOUT_MESSAGE.to_string(),
                stack: format!("suite timeout of {timeout_ms}ms elapsed"),
            },
        );
        result.timed_out = true;
        result
    }

    pub fn is_timeout(&self) -> bool {
        self.timed_out
    }

    pub fn symbol(&self) -> &'static str {
        if self.is_pass {
            "✓"
        } else {
            "✗"
        }
    }

    /// Panel-style label, `passed: <message>` or `FAILED: <message>`
    pub fn label(&self) -> String {
        if self.is_pass {
            format!("passed: {}", self.message)
        } else {
            format!("FAILED: {}", self.message)
        }
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.symbol(), self.label())?;
        if let Some(err) = &self.error {
            write!(f, " - {}", err.message)?;
        }
        Ok(())
    }
}

/// How a suite run reached its finished state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteOutcome {
    /// Every case was collected before the timer fired
    Completed,
    /// The timer fired with at least one case still pending
    TimedOut,
}

impl fmt::Display for SuiteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuiteOutcome::Completed => write!(f, "completed"),
            SuiteOutcome::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Results of one suite, in case registration order
///
/// Holds no wall-clock data, so two runs of the same suite compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub suite_title: String,
    /// Declaration index of the suite in its registry
    pub index: usize,
    pub outcome: SuiteOutcome,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub results: Vec<TestResult>,
}

impl SuiteReport {
    pub fn new(
        index: usize,
        suite_title: impl Into<String>,
        outcome: SuiteOutcome,
        results: Vec<TestResult>,
    ) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.is_pass).count();
        let timed_out = results.iter().filter(|r| r.is_timeout()).count();

        Self {
            suite_title: suite_title.into(),
            index,
            outcome,
            total,
            passed,
            failed: total - passed,
            timed_out,
            results,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.passed == self.total
    }

    /// Find the first result with the given message
    pub fn result(&self, message: &str) -> Option<&TestResult> {
        self.results.iter().find(|r| r.message == message)
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Suite {} - {}", self.index + 1, self.suite_title)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for result in &self.results {
            writeln!(f, "  {result}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Timeout: {}",
            self.total, self.passed, self.failed, self.timed_out
        )?;
        writeln!(f, "Pass Rate: {:.1}% | {}", self.pass_rate(), self.outcome)
    }
}

/// Final report of a run, suites in declaration order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub suites: Vec<SuiteReport>,
}

impl RunReport {
    pub fn new(suites: Vec<SuiteReport>) -> Self {
        Self { suites }
    }

    pub fn total(&self) -> usize {
        self.suites.iter().map(|s| s.total).sum()
    }

    pub fn passed(&self) -> usize {
        self.suites.iter().map(|s| s.passed).sum()
    }

    pub fn failed(&self) -> usize {
        self.suites.iter().map(|s| s.failed).sum()
    }

    pub fn timed_out(&self) -> usize {
        self.suites.iter().map(|s| s.timed_out).sum()
    }

    pub fn pass_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            (self.passed() as f64 / total as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.suites.iter().all(SuiteReport::is_all_passed)
    }

    /// Suite titles in report order
    pub fn titles(&self) -> Vec<&str> {
        self.suites.iter().map(|s| s.suite_title.as_str()).collect()
    }

    /// First suite with the given title
    pub fn suite(&self, title: &str) -> Option<&SuiteReport> {
        self.suites.iter().find(|s| s.suite_title == title)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for suite in &self.suites {
            writeln!(f, "{suite}")?;
        }
        writeln!(
            f,
            "Suites: {} | Cases: {} | Pass: {} | Fail: {}",
            self.suites.len(),
            self.total(),
            self.passed(),
            self.failed()
        )
    }
}

/// Wall-clock timing of one run, reported next to its [`RunReport`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Per-suite durations, in report order
    pub suite_durations_ms: Vec<u64>,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Started: {} | Duration: {}ms",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.duration_ms
        )
    }
}
