//! Data models for suite execution
//!
//! Test cases as registered, and the results and reports a run produces.

mod test_case;
mod test_result;

pub use test_case::{AsyncCallback, CaseMode, SyncCallback, TestCase};
pub(crate) use test_case::Callback;
pub use test_result::{
    ErrorInfo, RunReport, RunStats, SuiteOutcome, SuiteReport, TestResult, TIMEOUT_MESSAGE,
};
