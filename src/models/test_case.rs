//! Test case model
//!
//! A test case is one registered callback plus its declared execution mode.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::assertions::CaseResult;
use crate::executor::Done;

/// Callback of a synchronous case
pub type SyncCallback = Box<dyn Fn() -> CaseResult + Send + Sync>;

/// Callback of an asynchronous case; receives the case's completion handle
pub type AsyncCallback = Box<dyn Fn(Done) -> CaseResult + Send + Sync>;

/// How a case signals that it has finished
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseMode {
    /// Finished when the callback returns
    Sync,
    /// Finished when the callback invokes its [`Done`] handle
    Async,
}

impl CaseMode {
    pub fn is_async(&self) -> bool {
        matches!(self, CaseMode::Async)
    }
}

impl fmt::Display for CaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseMode::Sync => write!(f, "sync"),
            CaseMode::Async => write!(f, "async"),
        }
    }
}

pub(crate) enum Callback {
    Sync(SyncCallback),
    Async(AsyncCallback),
}

/// A registered unit of work. Immutable once created.
pub struct TestCase {
    message: String,
    callback: Callback,
}

impl TestCase {
    /// Create a synchronous case
    pub fn sync<F>(message: impl Into<String>, callback: F) -> Self
    where
        F: Fn() -> CaseResult + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            callback: Callback::Sync(Box::new(callback)),
        }
    }

    /// Create an asynchronous case
    pub fn asynchronous<F>(message: impl Into<String>, callback: F) -> Self
    where
        F: Fn(Done) -> CaseResult + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            callback: Callback::Async(Box::new(callback)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn mode(&self) -> CaseMode {
        match self.callback {
            Callback::Sync(_) => CaseMode::Sync,
            Callback::Async(_) => CaseMode::Async,
        }
    }

    pub fn is_async(&self) -> bool {
        self.mode().is_async()
    }

    pub(crate) fn callback(&self) -> &Callback {
        &self.callback
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("message", &self.message)
            .field("mode", &self.mode())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.message, self.mode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_modes() {
        let sync = TestCase::sync("adds", || Ok(()));
        let deferred = TestCase::asynchronous("waits", |done| {
            done.complete();
            Ok(())
        });

        assert_eq!(sync.mode(), CaseMode::Sync);
        assert!(!sync.is_async());
        assert_eq!(deferred.mode(), CaseMode::Async);
        assert!(deferred.is_async());
    }

    #[test]
    fn test_case_display() {
        let case = TestCase::sync("should be 4", || Ok(()));
        assert_eq!(case.to_string(), "should be 4 [sync]");
        assert_eq!(case.message(), "should be 4");
    }
}
