//! Output formatters for run reports
//!
//! Provides table, JSON, CSV, and summary output formats. The table format
//! mirrors a report panel: one `passed:` / `FAILED:` line per case with the
//! failure trace indented below it.

use serde::Serialize;
use std::str::FromStr;

use crate::error::HarnessError;
use crate::executor::AggregateResult;
use crate::models::{RunReport, RunStats, SuiteReport, TestResult};

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl FromStr for OutputFormat {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Ok(OutputFormat::JsonPretty),
            "csv" => Ok(OutputFormat::Csv),
            "summary" => Ok(OutputFormat::Summary),
            _ => Err(HarnessError::UnknownFormat(s.to_string())),
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    suite_index: usize,
    suite_title: &'a str,
    case_index: usize,
    message: &'a str,
    is_pass: bool,
    error: &'a str,
}

/// Report formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn paint(&self, text: &str, color: &str) -> String {
        if self.colorize {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn to_json<T: Serialize>(&self, value: &T) -> Result<String, HarnessError> {
        let json = if self.format == OutputFormat::JsonPretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }

    /// Format a single case result
    pub fn format_result(&self, result: &TestResult) -> Result<String, HarnessError> {
        match self.format {
            OutputFormat::Json | OutputFormat::JsonPretty => self.to_json(result),
            OutputFormat::Summary => Ok(result.to_string()),
            OutputFormat::Table | OutputFormat::Csv => Ok(self.format_result_table(result)),
        }
    }

    fn format_result_table(&self, result: &TestResult) -> String {
        let color = if result.is_pass { GREEN } else { RED };
        let mut output = format!(
            "  {} {}",
            result.symbol(),
            self.paint(&result.label(), color)
        );

        if let Some(err) = &result.error {
            output.push_str(&format!("\n      {}", err.message));
            for line in err.stack.lines().filter(|l| !l.trim().is_empty()) {
                output.push_str(&format!("\n        {}", line.trim_end()));
            }
        }

        output
    }

    /// Format one suite report
    pub fn format_suite(&self, suite: &SuiteReport) -> Result<String, HarnessError> {
        match self.format {
            OutputFormat::Table => Ok(self.format_suite_table(suite)),
            OutputFormat::Json | OutputFormat::JsonPretty => self.to_json(suite),
            OutputFormat::Csv => self.format_csv(std::slice::from_ref(suite)),
            OutputFormat::Summary => Ok(self.format_suite_brief(suite)),
        }
    }

    fn format_suite_table(&self, suite: &SuiteReport) -> String {
        let mut output = String::new();

        output.push_str("\n╔══════════════════════════════════════════════════════════════╗\n");
        output.push_str(&format!(
            "║  Suite {:3} - {:47}║\n",
            suite.index + 1,
            suite.suite_title
        ));
        output.push_str("╚══════════════════════════════════════════════════════════════╝\n");

        for result in &suite.results {
            output.push_str(&self.format_result_table(result));
            output.push('\n');
        }

        let passed = self.paint(&suite.passed.to_string(), GREEN);
        let failed = if suite.failed > 0 {
            self.paint(&suite.failed.to_string(), RED)
        } else {
            suite.failed.to_string()
        };
        output.push_str(&format!(
            "  ── Total: {} | Pass: {} | Fail: {} | Timeout: {} ({})\n",
            suite.total, passed, failed, suite.timed_out, suite.outcome
        ));

        output
    }

    fn format_suite_brief(&self, suite: &SuiteReport) -> String {
        format!(
            "{}: {}/{} passed ({:.1}%)",
            suite.suite_title,
            suite.passed,
            suite.total,
            suite.pass_rate()
        )
    }

    fn format_csv(&self, suites: &[SuiteReport]) -> Result<String, HarnessError> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        for suite in suites {
            for (case_index, result) in suite.results.iter().enumerate() {
                writer.serialize(CsvRow {
                    suite_index: suite.index,
                    suite_title: &suite.suite_title,
                    case_index,
                    message: &result.message,
                    is_pass: result.is_pass,
                    error: result.error.as_ref().map(|e| e.message.as_str()).unwrap_or(""),
                })?;
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| HarnessError::Csv(e.into_error().into()))?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Format a full run report
    pub fn format_report(&self, report: &RunReport) -> Result<String, HarnessError> {
        match self.format {
            OutputFormat::Table => Ok(self.format_report_table(report)),
            OutputFormat::Json | OutputFormat::JsonPretty => self.to_json(report),
            OutputFormat::Csv => self.format_csv(&report.suites),
            OutputFormat::Summary => {
                let mut lines: Vec<String> = report
                    .suites
                    .iter()
                    .map(|s| self.format_suite_brief(s))
                    .collect();
                lines.push(self.format_totals(report));
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a run report together with its timing
    ///
    /// JSON output nests the timing under a `stats` key next to `suites`.
    /// CSV output has no place for timing and matches [`Self::format_report`].
    pub fn format_run(
        &self,
        report: &RunReport,
        stats: &RunStats,
    ) -> Result<String, HarnessError> {
        match self.format {
            OutputFormat::Json | OutputFormat::JsonPretty => {
                #[derive(Serialize)]
                struct TimedRunJson<'a> {
                    #[serde(flatten)]
                    report: &'a RunReport,
                    stats: &'a RunStats,
                }

                self.to_json(&TimedRunJson { report, stats })
            }
            OutputFormat::Csv => self.format_report(report),
            OutputFormat::Table | OutputFormat::Summary => {
                let mut output = self.format_report(report)?;
                if !output.ends_with('\n') {
                    output.push('\n');
                }
                output.push_str(&stats.to_string());
                Ok(output)
            }
        }
    }

    fn format_report_table(&self, report: &RunReport) -> String {
        let mut output = String::new();
        for suite in &report.suites {
            output.push_str(&self.format_suite_table(suite));
        }
        output.push_str("\n═══════════════════════════════════════════════════════════════\n");
        output.push_str(&self.format_totals(report));
        output.push_str("\n═══════════════════════════════════════════════════════════════\n");
        output
    }

    fn format_totals(&self, report: &RunReport) -> String {
        let rate = format!("{:.1}%", report.pass_rate());
        let rate = if report.is_all_passed() {
            self.paint(&rate, GREEN)
        } else {
            self.paint(&rate, RED)
        };
        format!(
            "Suites: {} | Cases: {} | Pass: {} | Fail: {} | Timeout: {} | Rate: {}",
            report.suites.len(),
            report.total(),
            report.passed(),
            report.failed(),
            report.timed_out(),
            rate
        )
    }

    /// Format aggregate results across rounds
    pub fn format_aggregate(&self, aggregate: &AggregateResult) -> Result<String, HarnessError> {
        match self.format {
            OutputFormat::Json | OutputFormat::JsonPretty => {
                #[derive(Serialize)]
                struct CaseRateJson<'a> {
                    suite: usize,
                    case: usize,
                    suite_title: &'a str,
                    message: &'a str,
                    pass_rate: f64,
                    timeouts: u32,
                }

                #[derive(Serialize)]
                struct AggregateJson<'a> {
                    total_rounds: u32,
                    overall_pass_rate: f64,
                    cases: Vec<CaseRateJson<'a>>,
                }

                let json = AggregateJson {
                    total_rounds: aggregate.total_rounds,
                    overall_pass_rate: aggregate.overall_pass_rate,
                    cases: aggregate
                        .case_stats
                        .iter()
                        .map(|(key, stats)| CaseRateJson {
                            suite: key.suite,
                            case: key.case,
                            suite_title: &stats.suite_title,
                            message: &stats.message,
                            pass_rate: stats.pass_rate(),
                            timeouts: stats.timeouts,
                        })
                        .collect(),
                };
                self.to_json(&json)
            }
            _ => Ok(self.format_aggregate_table(aggregate)),
        }
    }

    fn format_aggregate_table(&self, aggregate: &AggregateResult) -> String {
        let mut output = String::new();

        output.push_str("\n═══════════════════════════════════════════════════════════════\n");
        output.push_str(&format!(
            " Aggregate Results ({} rounds)\n",
            aggregate.total_rounds
        ));
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str(&format!(
            " Overall Pass Rate: {:.1}%\n\n",
            aggregate.overall_pass_rate
        ));

        output.push_str(" Case Pass Rates:\n");
        output.push_str(" ───────────────────────────────────────────────────────────\n");

        for stats in aggregate.case_stats.values() {
            let rate = stats.pass_rate();
            let bar_len = ((rate / 5.0) as usize).min(20);
            let bar = "█".repeat(bar_len);
            let empty = "░".repeat(20 - bar_len);

            let rate_str = format!("{rate:5.1}%");
            let rate_str = if rate >= 90.0 {
                self.paint(&rate_str, GREEN)
            } else if rate >= 50.0 {
                self.paint(&rate_str, YELLOW)
            } else {
                self.paint(&rate_str, RED)
            };

            output.push_str(&format!(
                " {:28} {}{} {}\n",
                format!("{} / {}", stats.suite_title, stats.message),
                bar,
                empty,
                rate_str
            ));
        }

        output.push_str(" ───────────────────────────────────────────────────────────\n");

        let flaky = aggregate.flaky_cases();
        if !flaky.is_empty() {
            output.push_str("\n Flaky Cases:\n");
            for (_, stats) in flaky.iter().take(5) {
                output.push_str(&format!(
                    "   - {} / {} ({:.1}%)\n",
                    stats.suite_title,
                    stats.message,
                    stats.pass_rate()
                ));
            }
        }

        output
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::AssertionError;
    use crate::executor::aggregate_rounds;
    use crate::models::SuiteOutcome;
    use chrono::Utc;

    fn sample_report() -> RunReport {
        let suite = SuiteReport::new(
            0,
            "module",
            SuiteOutcome::TimedOut,
            vec![
                TestResult::pass("should be 4"),
                TestResult::fail(
                    "should fail",
                    AssertionError::with_stack("2 != 3", "at src/demo.rs:10:5"),
                ),
                TestResult::timeout("waits", 500),
            ],
        );
        RunReport::new(vec![suite])
    }

    fn sample_stats() -> RunStats {
        RunStats {
            started_at: Utc::now(),
            duration_ms: 12,
            suite_durations_ms: vec![12],
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>().ok(), Some(OutputFormat::Json));
        assert_eq!("TABLE".parse::<OutputFormat>().ok(), Some(OutputFormat::Table));
        assert!("unknown".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_formatter_creation() {
        let formatter = ResultFormatter::new(OutputFormat::Json).no_color();
        assert_eq!(formatter.format(), OutputFormat::Json);
        assert!(!formatter.colorize);
    }

    #[test]
    fn test_table_uses_panel_labels() {
        let formatter = ResultFormatter::new(OutputFormat::Table).no_color();
        let output = formatter.format_report(&sample_report()).unwrap();

        assert!(output.contains("passed: should be 4"));
        assert!(output.contains("FAILED: should fail"));
        assert!(output.contains("2 != 3"));
        assert!(output.contains("at src/demo.rs:10:5"));
        assert!(output.contains("Timeout exceeded"));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_json_report() {
        let formatter = ResultFormatter::new(OutputFormat::Json);
        let output = formatter.format_report(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["suites"][0]["suite_title"], "module");
        assert_eq!(value["suites"][0]["results"][0]["is_pass"], true);
        assert_eq!(value["suites"][0]["results"][0]["error"], serde_json::Value::Null);
    }

    #[test]
    fn test_csv_report() {
        let formatter = ResultFormatter::new(OutputFormat::Csv);
        let output = formatter.format_report(&sample_report()).unwrap();
        let lines: Vec<_> = output.lines().collect();

        assert_eq!(
            lines[0],
            "suite_index,suite_title,case_index,message,is_pass,error"
        );
        assert_eq!(lines[1], "0,module,0,should be 4,true,");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_summary_report() {
        let formatter = ResultFormatter::new(OutputFormat::Summary).no_color();
        let output = formatter.format_report(&sample_report()).unwrap();
        assert!(output.starts_with("module: 1/3 passed"));
    }

    #[test]
    fn test_format_run_adds_timing() {
        let report = sample_report();
        let stats = sample_stats();

        let json = ResultFormatter::new(OutputFormat::Json)
            .format_run(&report, &stats)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["suites"][0]["suite_title"], "module");
        assert_eq!(value["stats"]["duration_ms"], 12);
        assert_eq!(value["stats"]["suite_durations_ms"][0], 12);

        let table = ResultFormatter::new(OutputFormat::Table)
            .no_color()
            .format_run(&report, &stats)
            .unwrap();
        assert!(table.contains("FAILED: should fail"));
        assert!(table.ends_with("Duration: 12ms"));

        let csv = ResultFormatter::new(OutputFormat::Csv);
        assert_eq!(
            csv.format_run(&report, &stats).unwrap(),
            csv.format_report(&report).unwrap()
        );
    }

    #[test]
    fn test_report_json_has_no_wall_clock_fields() {
        let output = ResultFormatter::new(OutputFormat::Json)
            .format_report(&sample_report())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(value.get("started_at").is_none());
        assert!(value["suites"][0].get("duration_ms").is_none());
        assert_eq!(value["suites"][0]["results"][2]["timed_out"], true);
    }

    #[test]
    fn test_format_aggregate() {
        let aggregate = aggregate_rounds(&[sample_report(), sample_report()]);
        let formatter = ResultFormatter::new(OutputFormat::Table).no_color();
        let output = formatter.format_aggregate(&aggregate).unwrap();
        assert!(output.contains("Aggregate Results (2 rounds)"));
        assert!(output.contains("module / should be 4"));
    }
}
