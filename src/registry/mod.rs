//! Suite registry
//!
//! Suites are registered through a [`SuiteContext`] handed to a registration
//! closure and stored in declaration order. A registry is owned by its
//! caller; independent registries can run side by side.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::assertions::{Assert, CaseResult};
use crate::executor::{Done, Runner, SuiteRun};
use crate::models::{RunReport, SuiteReport, TestCase};

/// Timeout applied to suites registered without an override
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Per-suite registration options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteOptions {
    pub timeout_ms: Option<u64>,
}

impl SuiteOptions {
    pub fn timeout_ms(ms: u64) -> Self {
        Self {
            timeout_ms: Some(ms),
        }
    }
}

/// A named, ordered group of test cases
#[derive(Debug)]
pub struct Suite {
    index: usize,
    title: String,
    cases: Vec<TestCase>,
    async_count: usize,
    timeout_ms: u64,
}

impl Suite {
    fn new(index: usize, title: String, timeout_ms: u64) -> Self {
        Self {
            index,
            title,
            cases: Vec::new(),
            async_count: 0,
            timeout_ms,
        }
    }

    /// Declaration index in the owning registry
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn async_count(&self) -> usize {
        self.async_count
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Run every case once and report the results
    pub async fn run(&self) -> SuiteReport {
        SuiteRun::new(self).execute().await
    }

    fn push(&mut self, case: TestCase) {
        if case.is_async() {
            self.async_count += 1;
        }
        self.cases.push(case);
    }
}

/// Registration context passed to a suite's registration closure
pub struct SuiteContext<'a> {
    suite: &'a mut Suite,
}

impl<'a> SuiteContext<'a> {
    /// Register a synchronous case
    pub fn it<F>(&mut self, message: impl Into<String>, callback: F) -> &mut Self
    where
        F: Fn() -> CaseResult + Send + Sync + 'static,
    {
        self.suite.push(TestCase::sync(message, callback));
        self
    }

    /// Register an asynchronous case, finished by calling [`Done::complete`]
    pub fn it_async<F>(&mut self, message: impl Into<String>, callback: F) -> &mut Self
    where
        F: Fn(Done) -> CaseResult + Send + Sync + 'static,
    {
        self.suite.push(TestCase::asynchronous(message, callback));
        self
    }

    /// Assertion functions, capturable by test callbacks
    pub fn assert(&self) -> Assert {
        Assert
    }

    pub fn title(&self) -> &str {
        &self.suite.title
    }
}

/// Ordered collection of registered suites
#[derive(Debug)]
pub struct Registry {
    suites: Vec<Arc<Suite>>,
    default_timeout_ms: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            suites: Vec::new(),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Use a different timeout for suites registered without an override
    pub fn with_default_timeout(mut self, timeout_ms: u64) -> Self {
        self.default_timeout_ms = timeout_ms;
        self
    }

    pub fn default_timeout_ms(&self) -> u64 {
        self.default_timeout_ms
    }

    /// Register a suite with default options
    pub fn register<F>(&mut self, title: impl Into<String>, registration: F) -> &mut Self
    where
        F: FnOnce(&mut SuiteContext<'_>),
    {
        self.register_with(title, SuiteOptions::default(), registration)
    }

    /// Register a suite. The closure runs synchronously; a panic inside it
    /// propagates and leaves the registry unchanged.
    pub fn register_with<F>(
        &mut self,
        title: impl Into<String>,
        options: SuiteOptions,
        registration: F,
    ) -> &mut Self
    where
        F: FnOnce(&mut SuiteContext<'_>),
    {
        let timeout_ms = options.timeout_ms.unwrap_or(self.default_timeout_ms);
        let mut suite = Suite::new(self.suites.len(), title.into(), timeout_ms);

        registration(&mut SuiteContext { suite: &mut suite });

        debug!(
            "Registered suite '{}' ({} cases, {} async, {}ms timeout)",
            suite.title,
            suite.len(),
            suite.async_count,
            suite.timeout_ms
        );

        self.suites.push(Arc::new(suite));
        self
    }

    pub fn suites(&self) -> &[Arc<Suite>] {
        &self.suites
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    /// All suites with the given title, in declaration order
    pub fn find<'s>(&'s self, title: &'s str) -> impl Iterator<Item = &'s Arc<Suite>> + 's {
        self.suites.iter().filter(move |s| s.title == title)
    }

    /// Run every suite with a default runner
    pub async fn run(&self) -> RunReport {
        Runner::new().run(self).await
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CaseMode;
    use std::panic::{self, AssertUnwindSafe};

    #[test]
    fn test_register_appends_cases_in_order() {
        let mut registry = Registry::new();
        registry.register("math", |ctx| {
            let assert = ctx.assert();
            ctx.it("adds", move || assert.equals(2 + 2, 4, None));
            ctx.it_async("waits", |done| {
                done.complete();
                Ok(())
            });
            ctx.it("subtracts", move || assert.equals(4 - 2, 2, None));
        });

        let suite = &registry.suites()[0];
        assert_eq!(suite.title(), "math");
        assert_eq!(suite.len(), 3);
        assert_eq!(suite.async_count(), 1);
        assert_eq!(suite.timeout_ms(), DEFAULT_TIMEOUT_MS);

        let modes: Vec<_> = suite.cases().iter().map(TestCase::mode).collect();
        assert_eq!(modes, vec![CaseMode::Sync, CaseMode::Async, CaseMode::Sync]);
        let messages: Vec<_> = suite.cases().iter().map(TestCase::message).collect();
        assert_eq!(messages, vec!["adds", "waits", "subtracts"]);
    }

    #[test]
    fn test_duplicate_titles_stay_distinct() {
        let mut registry = Registry::new();
        registry
            .register("same", |ctx| {
                ctx.it("first", || Ok(()));
            })
            .register("same", |ctx| {
                ctx.it("second", || Ok(()));
                ctx.it("third", || Ok(()));
            });

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.find("same").count(), 2);
        assert_eq!(registry.suites()[0].len(), 1);
        assert_eq!(registry.suites()[1].len(), 2);
        assert_eq!(registry.suites()[1].index(), 1);
    }

    #[test]
    fn test_timeout_override() {
        let mut registry = Registry::new().with_default_timeout(500);
        registry
            .register("default", |_| {})
            .register_with("custom", SuiteOptions::timeout_ms(50), |_| {});

        assert_eq!(registry.suites()[0].timeout_ms(), 500);
        assert_eq!(registry.suites()[1].timeout_ms(), 50);
        assert_eq!(registry.suites()[1].timeout(), Duration::from_millis(50));
    }

    #[test]
    fn test_registration_panic_propagates() {
        let mut registry = Registry::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            registry.register("broken", |ctx| {
                ctx.it("never stored", || Ok(()));
                panic!("bad registration");
            });
        }));

        assert!(result.is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_context_title() {
        let mut registry = Registry::new();
        let mut seen = String::new();
        registry.register("named", |ctx| seen = ctx.title().to_string());
        assert_eq!(seen, "named");
    }
}
