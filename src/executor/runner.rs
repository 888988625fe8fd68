//! Suite runner
//!
//! Drives every suite of a registry and assembles the run report.

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::models::{RunReport, RunStats, SuiteReport};
use crate::registry::{Registry, Suite};
use crate::utils::Timer;

/// Runner for the suites of a [`Registry`]
///
/// Suites are started in declaration order and polled concurrently. The
/// report lists them by declaration index whatever order they finish in.
#[derive(Clone, Debug, Default)]
pub struct Runner {
    only: Option<String>,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the run to suites with this title
    pub fn only(mut self, title: impl Into<String>) -> Self {
        self.only = Some(title.into());
        self
    }

    fn selects(&self, suite: &Suite) -> bool {
        self.only
            .as_deref()
            .map(|title| suite.title() == title)
            .unwrap_or(true)
    }

    /// Run every selected suite once
    pub async fn run(&self, registry: &Registry) -> RunReport {
        self.run_timed(registry).await.0
    }

    /// Run every selected suite once, also returning wall-clock timing
    pub async fn run_timed(&self, registry: &Registry) -> (RunReport, RunStats) {
        let started_at = Utc::now();
        let timer = Timer::start("run");

        let selected: Vec<&Suite> = registry
            .suites()
            .iter()
            .map(|suite| &**suite)
            .filter(|suite| self.selects(suite))
            .collect();

        info!(
            "Starting run of {} of {} suite(s)",
            selected.len(),
            registry.len()
        );

        let mut pending: FuturesUnordered<_> = selected
            .iter()
            .map(|suite| async move {
                let suite_timer = Timer::start(format!("suite {}", suite.index()));
                let report = suite.run().await;
                (suite.index(), report, suite_timer.elapsed_ms())
            })
            .collect();

        let mut finished: HashMap<usize, (SuiteReport, u64)> =
            HashMap::with_capacity(selected.len());
        while let Some((index, report, duration_ms)) = pending.next().await {
            debug!(
                "Suite {} '{}' finished ({} of {})",
                index,
                report.suite_title,
                finished.len() + 1,
                selected.len()
            );
            finished.insert(index, (report, duration_ms));
        }

        let mut ordered: Vec<(usize, (SuiteReport, u64))> = finished.into_iter().collect();
        ordered.sort_by_key(|(index, _)| *index);

        let (suites, suite_durations_ms): (Vec<SuiteReport>, Vec<u64>) =
            ordered.into_iter().map(|(_, entry)| entry).unzip();

        let report = RunReport::new(suites);
        let stats = RunStats {
            started_at,
            duration_ms: timer.elapsed_ms(),
            suite_durations_ms,
        };

        info!(
            "Run completed in {}ms - Pass: {}/{} ({:.1}%)",
            stats.duration_ms,
            report.passed(),
            report.total(),
            report.pass_rate()
        );

        (report, stats)
    }

    /// Run every selected suite `rounds` times, one round after another
    pub async fn run_rounds(&self, registry: &Registry, rounds: u32) -> Vec<RunReport> {
        let mut reports = Vec::new();

        for round in 1..=rounds {
            info!("=== Round {}/{} ===", round, rounds);
            reports.push(self.run(registry).await);
        }

        reports
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::assertions::{assert_equals, fail};
    use crate::registry::SuiteOptions;
    use std::time::Duration;

    fn deferred(delay_ms: u64) -> impl Fn(crate::executor::Done) -> crate::assertions::CaseResult {
        move |done| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                done.complete();
            });
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_math_example() {
        let mut registry = Registry::new();
        registry.register("math", |ctx| {
            let assert = ctx.assert();
            ctx.it("2+2", move || assert.equals(2 + 2, 4, None));
        });

        let report = registry.run().await;
        assert_eq!(report.suites.len(), 1);
        assert_eq!(report.suites[0].suite_title, "math");
        assert_eq!(
            report.suites[0].results,
            vec![crate::models::TestResult::pass("2+2")]
        );
    }

    #[tokio::test]
    async fn test_report_follows_declaration_order() {
        let mut registry = Registry::new();
        registry
            .register("A", |ctx| {
                ctx.it_async("slow", deferred(80));
            })
            .register("B", |ctx| {
                ctx.it_async("fast", deferred(1));
            })
            .register("C", |ctx| {
                ctx.it("sync", || Ok(()));
            });

        let report = Runner::new().run(&registry).await;
        assert_eq!(report.titles(), vec!["A", "B", "C"]);
        assert!(report.is_all_passed());
        let indices: Vec<_> = report.suites.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_suites_time_out_independently() {
        let mut registry = Registry::new();
        registry
            .register_with("stuck", SuiteOptions::timeout_ms(50), |ctx| {
                ctx.it_async("never completes", |_done| Ok(()));
            })
            .register("fine", |ctx| {
                ctx.it_async("completes", deferred(5));
            });

        let report = registry.run().await;
        assert_eq!(report.suite("stuck").unwrap().timed_out, 1);
        assert!(report.suite("fine").unwrap().is_all_passed());
        assert_eq!(report.total(), 2);
    }

    #[tokio::test]
    async fn test_rerun_is_structurally_identical() {
        let mut registry = Registry::new();
        registry.register("stable", |ctx| {
            ctx.it("passes", || assert_equals("a", "a", None));
            ctx.it("fails", || fail("always"));
            ctx.it_async("defers", deferred(2));
        });

        let runner = Runner::new();
        let first = runner.run(&registry).await;
        let second = registry.run().await;

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_run_timed_reports_durations_in_suite_order() {
        let mut registry = Registry::new();
        registry
            .register("slow", |ctx| {
                ctx.it_async("waits", deferred(40));
            })
            .register("quick", |ctx| {
                ctx.it("returns", || Ok(()));
            });

        let (report, stats) = Runner::new().run_timed(&registry).await;
        assert_eq!(report.titles(), vec!["slow", "quick"]);
        assert_eq!(stats.suite_durations_ms.len(), 2);
        assert!(stats.suite_durations_ms[0] >= 40);
        assert!(stats.duration_ms >= stats.suite_durations_ms[0]);
    }

    #[tokio::test]
    async fn test_only_filter() {
        let mut registry = Registry::new();
        registry
            .register("keep", |ctx| {
                ctx.it("a", || Ok(()));
            })
            .register("skip", |ctx| {
                ctx.it("b", || Ok(()));
            })
            .register("keep", |ctx| {
                ctx.it("c", || Ok(()));
            });

        let report = Runner::new().only("keep").run(&registry).await;
        assert_eq!(report.titles(), vec!["keep", "keep"]);
        let indices: Vec<_> = report.suites.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[tokio::test]
    async fn test_run_rounds() {
        let mut registry = Registry::new();
        registry.register("rounds", |ctx| {
            ctx.it("passes", || Ok(()));
        });

        let reports = Runner::new().run_rounds(&registry, 3).await;
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(RunReport::is_all_passed));
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let report = Registry::new().run().await;
        assert!(report.suites.is_empty());
        assert_eq!(report.total(), 0);
    }
}
