//! suite-harness - embeddable test-orchestration engine
//!
//! Registers named suites of synchronous and asynchronous test cases,
//! runs them with a per-suite timeout on asynchronous completion, and
//! produces a structured pass/fail report.
//!
//! ## Features
//!
//! - Caller-owned [`Registry`], no process-wide state
//! - Explicit `it` / `it_async` registration, async cases finish through [`Done`]
//! - Results always in registration order, suites always in declaration order
//! - Cases that never complete become timeout failures instead of disappearing
//! - Table, JSON, CSV and summary output of the final report
//!
//! ## Usage
//!
//! ```no_run
//! use suite_harness::Registry;
//!
//! # async fn example() {
//! let mut registry = Registry::new();
//! registry.register("math", |ctx| {
//!     let assert = ctx.assert();
//!     ctx.it("2+2", move || assert.equals(2 + 2, 4, None));
//!     ctx.it_async("deferred", |done| {
//!         tokio::spawn(async move { done.complete() });
//!         Ok(())
//!     });
//! });
//!
//! let report = registry.run().await;
//! assert!(report.is_all_passed());
//! # }
//! ```

pub mod assertions;
pub mod cli;
pub mod config;
pub mod demo;
pub mod error;
pub mod executor;
pub mod models;
pub mod output;
pub mod registry;
pub mod utils;

pub use assertions::{
    assert_arrays_equal, assert_equals, assert_not_equals, assert_throws, assert_throws_with,
    Assert, AssertionError, CaseResult,
};
pub use error::HarnessError;
pub use executor::{aggregate_rounds, Done, Runner};
pub use models::{CaseMode, ErrorInfo, RunReport, RunStats, SuiteReport, TestCase, TestResult};
pub use registry::{Registry, Suite, SuiteContext, SuiteOptions, DEFAULT_TIMEOUT_MS};
