//! Per-suite execution scheduler
//!
//! A [`SuiteRun`] owns the ephemeral state of one run of one suite: result
//! slots, the done counter, the completion channel and the timeout timer.
//! Cases run in registration order; asynchronous cases report back through
//! their [`Done`] handle. The run then waits on whichever comes first, the
//! last completion or the timer, and finishes exactly once.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::assertions::protect;
use crate::models::{Callback, SuiteOutcome, SuiteReport, TestResult};
use crate::registry::Suite;
use crate::utils::Timer;

/// State shared between a run and the completion handles it hands out
#[derive(Debug, Default)]
struct RunShared {
    finished: AtomicBool,
}

impl RunShared {
    /// First caller wins; every later call returns false
    fn try_finish(&self) -> bool {
        self.finished
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

/// Completion handle of one asynchronous case in one run
///
/// Calling [`Done::complete`] marks the case as passed. The handle is cheap
/// to clone and can be moved into spawned tasks. Calls after the suite has
/// finished are ignored.
#[derive(Clone)]
pub struct Done {
    index: usize,
    tx: mpsc::UnboundedSender<usize>,
    shared: Arc<RunShared>,
}

impl Done {
    fn new(index: usize, tx: mpsc::UnboundedSender<usize>, shared: Arc<RunShared>) -> Self {
        Self { index, tx, shared }
    }

    /// Signal that the case completed successfully
    pub fn complete(&self) {
        if self.shared.is_finished() || self.tx.send(self.index).is_err() {
            debug!("Ignoring completion of case {} after suite finished", self.index);
        }
    }

    /// Registration index of the case this handle belongs to
    pub fn case_index(&self) -> usize {
        self.index
    }

    /// Whether the run this handle belongs to has already finished
    pub fn is_finished(&self) -> bool {
        self.shared.is_finished()
    }
}

impl fmt::Debug for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Done")
            .field("index", &self.index)
            .field("finished", &self.shared.is_finished())
            .finish()
    }
}

/// One run of one suite
///
/// [`SuiteRun::execute`] consumes the run, so a run finishes at most once.
pub struct SuiteRun<'a> {
    suite: &'a Suite,
    slots: Vec<Option<TestResult>>,
    collected: usize,
    done_count: usize,
    shared: Arc<RunShared>,
}

impl<'a> SuiteRun<'a> {
    pub fn new(suite: &'a Suite) -> Self {
        Self {
            suite,
            slots: vec![None; suite.len()],
            collected: 0,
            done_count: 0,
            shared: Arc::new(RunShared::default()),
        }
    }

    /// Run every case and wait for completion or timeout
    pub async fn execute(mut self) -> SuiteReport {
        let timer = Timer::start(format!("suite '{}'", self.suite.title()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        info!(
            "Running suite '{}' ({} cases, {} async)",
            self.suite.title(),
            self.suite.len(),
            self.suite.async_count()
        );

        let deadline = tokio::time::sleep(self.suite.timeout());
        tokio::pin!(deadline);

        self.start_cases(&tx);

        let outcome = loop {
            if self.is_complete() {
                break SuiteOutcome::Completed;
            }

            tokio::select! {
                biased;
                Some(index) = rx.recv() => self.on_complete(index),
                () = &mut deadline => break SuiteOutcome::TimedOut,
            }
        };

        // Stop accepting completions before the timer is dropped
        rx.close();
        let duration_ms = timer.stop().as_millis() as u64;
        self.finish(outcome, duration_ms)
    }

    fn start_cases(&mut self, tx: &mpsc::UnboundedSender<usize>) {
        let suite = self.suite;

        for (index, case) in suite.cases().iter().enumerate() {
            debug!("Starting case {}: {}", index, case);

            match case.callback() {
                Callback::Sync(callback) => {
                    let result = match protect(|| callback()) {
                        Ok(()) => TestResult::pass(case.message()),
                        Err(err) => TestResult::fail(case.message(), err),
                    };
                    self.collect(index, result);
                }
                Callback::Async(callback) => {
                    let done = Done::new(index, tx.clone(), self.shared.clone());
                    if let Err(err) = protect(|| callback(done)) {
                        debug!("Async case {} raised before completing", index);
                        self.collect(index, TestResult::fail(case.message(), err));
                        self.done_count += 1;
                    }
                }
            }
        }
    }

    fn on_complete(&mut self, index: usize) {
        let suite = self.suite;
        self.done_count += 1;

        let Some(case) = suite.cases().get(index) else {
            return;
        };
        if self.is_collected(index) {
            debug!("Case {} already collected, ignoring completion", index);
            return;
        }
        self.collect(index, TestResult::pass(case.message()));
    }

    fn collect(&mut self, index: usize, result: TestResult) {
        if let Some(slot) = self.slots.get_mut(index) {
            if slot.is_none() {
                debug!("  {}", result);
                *slot = Some(result);
                self.collected += 1;
            }
        }
    }

    fn is_collected(&self, index: usize) -> bool {
        self.slots.get(index).map(Option::is_some).unwrap_or(true)
    }

    fn is_complete(&self) -> bool {
        self.done_count >= self.suite.async_count() && self.collected == self.slots.len()
    }

    fn finish(self, outcome: SuiteOutcome, duration_ms: u64) -> SuiteReport {
        let suite = self.suite;
        let first = self.shared.try_finish();
        debug_assert!(first, "suite run finished twice");

        let timeout_ms = suite.timeout_ms();
        let results: Vec<TestResult> = self
            .slots
            .into_iter()
            .zip(suite.cases())
            .map(|(slot, case)| {
                slot.unwrap_or_else(|| {
                    warn!(
                        "Case '{}' in suite '{}' did not complete within {}ms",
                        case.message(),
                        suite.title(),
                        timeout_ms
                    );
                    TestResult::timeout(case.message(), timeout_ms)
                })
            })
            .collect();

        let report = SuiteReport::new(
            suite.index(),
            suite.title(),
            outcome,
            results,
        );

        info!(
            "Suite '{}' {} in {}ms - Pass: {}/{}",
            report.suite_title, outcome, duration_ms, report.passed, report.total
        );

        report
    }
}
