//! Aggregation across repeated runs
//!
//! Suites are reusable, so the same registry can be run several times.
//! These helpers fold the resulting reports into per-case statistics.

use std::collections::BTreeMap;

use crate::models::RunReport;

/// Identifies one case by suite declaration index and case position
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaseKey {
    pub suite: usize,
    pub case: usize,
}

/// Statistics for a single case across rounds
#[derive(Clone, Debug, Default)]
pub struct CaseStats {
    pub suite_title: String,
    pub message: String,
    pub passes: u32,
    pub failures: u32,
    pub timeouts: u32,
}

impl CaseStats {
    pub fn runs(&self) -> u32 {
        self.passes + self.failures
    }

    pub fn pass_rate(&self) -> f64 {
        let runs = self.runs();
        if runs > 0 {
            (self.passes as f64 / runs as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Aggregate results across multiple runs
#[derive(Clone, Debug)]
pub struct AggregateResult {
    pub total_rounds: u32,
    pub case_stats: BTreeMap<CaseKey, CaseStats>,
    pub overall_pass_rate: f64,
}

impl AggregateResult {
    /// Cases that both passed and failed, lowest pass rate first
    pub fn flaky_cases(&self) -> Vec<(CaseKey, &CaseStats)> {
        let mut cases: Vec<_> = self
            .case_stats
            .iter()
            .filter(|(_, stats)| stats.passes > 0 && stats.failures > 0)
            .map(|(key, stats)| (*key, stats))
            .collect();
        cases.sort_by(|a, b| a.1.pass_rate().total_cmp(&b.1.pass_rate()));
        cases
    }

    /// Cases that passed in every round
    pub fn stable_cases(&self) -> Vec<CaseKey> {
        self.case_stats
            .iter()
            .filter(|(_, stats)| stats.failures == 0 && stats.passes > 0)
            .map(|(key, _)| *key)
            .collect()
    }
}

/// Fold a series of run reports into per-case statistics
pub fn aggregate_rounds(reports: &[RunReport]) -> AggregateResult {
    let total_rounds = reports.len() as u32;
    let mut case_stats: BTreeMap<CaseKey, CaseStats> = BTreeMap::new();

    for report in reports {
        for suite in &report.suites {
            for (case, result) in suite.results.iter().enumerate() {
                let key = CaseKey {
                    suite: suite.index,
                    case,
                };
                let stats = case_stats.entry(key).or_insert_with(|| CaseStats {
                    suite_title: suite.suite_title.clone(),
                    message: result.message.clone(),
                    ..CaseStats::default()
                });

                if result.is_pass {
                    stats.passes += 1;
                } else {
                    stats.failures += 1;
                    if result.is_timeout() {
                        stats.timeouts += 1;
                    }
                }
            }
        }
    }

    let overall_pass_rate = if reports.is_empty() {
        0.0
    } else {
        reports.iter().map(RunReport::pass_rate).sum::<f64>() / reports.len() as f64
    };

    AggregateResult {
        total_rounds,
        case_stats,
        overall_pass_rate,
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::assertions::AssertionError;
    use crate::models::{SuiteOutcome, SuiteReport, TestResult};

    fn round(second: TestResult) -> RunReport {
        let suite = SuiteReport::new(
            0,
            "net",
            SuiteOutcome::Completed,
            vec![TestResult::pass("connects"), second],
        );
        RunReport::new(vec![suite])
    }

    #[test]
    fn test_aggregate_rounds() {
        let reports = vec![
            round(TestResult::pass("retries")),
            round(TestResult::fail(
                "retries",
                AssertionError::with_stack("refused", ""),
            )),
            round(TestResult::timeout("retries", 100)),
        ];

        let aggregate = aggregate_rounds(&reports);
        assert_eq!(aggregate.total_rounds, 3);

        let connects = &aggregate.case_stats[&CaseKey { suite: 0, case: 0 }];
        assert_eq!(connects.passes, 3);
        assert_eq!(connects.pass_rate(), 100.0);

        let retries = &aggregate.case_stats[&CaseKey { suite: 0, case: 1 }];
        assert_eq!(retries.message, "retries");
        assert_eq!(retries.passes, 1);
        assert_eq!(retries.failures, 2);
        assert_eq!(retries.timeouts, 1);

        assert_eq!(aggregate.stable_cases(), vec![CaseKey { suite: 0, case: 0 }]);
        let flaky = aggregate.flaky_cases();
        assert_eq!(flaky.len(), 1);
        assert_eq!(flaky[0].0, CaseKey { suite: 0, case: 1 });
    }

    #[test]
    fn test_only_synthesized_timeouts_are_counted() {
        let reports = vec![round(TestResult::fail(
            "retries",
            AssertionError::with_stack(crate::models::TIMEOUT_MESSAGE, ""),
        ))];

        let aggregate = aggregate_rounds(&reports);
        let retries = &aggregate.case_stats[&CaseKey { suite: 0, case: 1 }];
        assert_eq!(retries.failures, 1);
        assert_eq!(retries.timeouts, 0);
    }

    #[test]
    fn test_aggregate_empty() {
        let aggregate = aggregate_rounds(&[]);
        assert_eq!(aggregate.total_rounds, 0);
        assert!(aggregate.case_stats.is_empty());
        assert_eq!(aggregate.overall_pass_rate, 0.0);
    }
}
