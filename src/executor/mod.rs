//! Suite execution engine
//!
//! Provides the per-suite scheduler, the registry-wide runner and
//! aggregation across repeated runs.

mod rounds;
mod runner;
mod scheduler;

pub use rounds::{aggregate_rounds, AggregateResult, CaseKey, CaseStats};
pub use runner::Runner;
pub use scheduler::{Done, SuiteRun};
