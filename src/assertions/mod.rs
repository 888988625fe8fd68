//! Assertion helpers for test cases
//!
//! Every helper returns [`CaseResult`] so callbacks can chain them with `?`.
//! A failing helper produces an [`AssertionError`] carrying the message and
//! the location of the failing call.

use std::any::{type_name, Any};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::cell::Cell;
use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe, Location};
use std::sync::Once;
use thiserror::Error;
use tracing::debug;

/// Outcome of a test callback. `Err` means the callback raised.
pub type CaseResult = Result<(), AssertionError>;

/// Failure raised by an assertion or a test callback
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{message}")]
pub struct AssertionError {
    pub message: String,
    pub stack: String,
}

impl AssertionError {
    /// Create an error at the caller's location
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: capture_stack(Location::caller()),
        }
    }

    /// Create an error with an explicit trace
    pub fn with_stack(message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: stack.into(),
        }
    }

    /// Convert a caught panic payload
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "callback panicked".to_string()
        };

        let stack = format!("panicked: {message}");
        Self { message, stack }
    }
}

fn capture_stack(location: &Location<'_>) -> String {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => format!("at {location}\n{backtrace}"),
        _ => format!("at {location}"),
    }
}

thread_local! {
    /// Depth of nested `protect` calls on this thread
    static CAPTURING: Cell<usize> = const { Cell::new(0) };
}

static QUIET_HOOK: Once = Once::new();

/// Install a panic hook that stays silent for panics raised under `protect`
///
/// Panics on other threads, or outside a protected callback, still go to the
/// previously installed hook.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let default_hook = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURING.with(Cell::get) > 0 {
                debug!(location = ?info.location(), "Captured panic in test callback");
            } else {
                default_hook(info);
            }
        }));
    });
}

/// Marks the current thread as capturing panics until dropped
struct CaptureScope;

impl CaptureScope {
    fn enter() -> Self {
        install_quiet_hook();
        CAPTURING.with(|depth| depth.set(depth.get() + 1));
        CaptureScope
    }
}

impl Drop for CaptureScope {
    fn drop(&mut self) {
        CAPTURING.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Run a callback, turning a panic into an `Err`
pub(crate) fn protect<F>(callback: F) -> CaseResult
where
    F: FnOnce() -> CaseResult,
{
    let _scope = CaptureScope::enter();
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(result) => result,
        Err(payload) => Err(AssertionError::from_panic(payload.as_ref())),
    }
}

/// Name of a callable type, if it has one (closures don't)
fn callable_name<F>() -> Option<&'static str> {
    let name = type_name::<F>();
    if name.contains("{{closure}}") {
        None
    } else {
        name.rsplit("::").next()
    }
}

/// Fail unconditionally
#[track_caller]
pub fn fail(message: impl Into<String>) -> CaseResult {
    Err(AssertionError::new(message))
}

/// Fail unless `actual == expected`
#[track_caller]
pub fn assert_equals<A, E>(actual: A, expected: E, message: Option<&str>) -> CaseResult
where
    A: PartialEq<E> + Debug,
    E: Debug,
{
    if actual == expected {
        return Ok(());
    }

    let message = message
        .map(str::to_string)
        .unwrap_or_else(|| format!("{actual:?} != {expected:?}"));
    Err(AssertionError::new(message))
}

/// Fail when `actual == expected`
#[track_caller]
pub fn assert_not_equals<A, E>(actual: A, expected: E, message: Option<&str>) -> CaseResult
where
    A: PartialEq<E> + Debug,
    E: Debug,
{
    if actual != expected {
        return Ok(());
    }

    let message = message
        .map(str::to_string)
        .unwrap_or_else(|| format!("{actual:?} == {expected:?}"));
    Err(AssertionError::new(message))
}

/// Fail on a length mismatch or any index-aligned element mismatch
#[track_caller]
pub fn assert_arrays_equal<A, E>(actual: &[A], expected: &[E], message: Option<&str>) -> CaseResult
where
    A: PartialEq<E> + Debug,
    E: Debug,
{
    if actual.len() != expected.len() {
        let message = message.map(str::to_string).unwrap_or_else(|| {
            format!(
                "array lengths differ: {} != {}",
                actual.len(),
                expected.len()
            )
        });
        return Err(AssertionError::new(message));
    }

    let mismatch = actual
        .iter()
        .zip(expected)
        .enumerate()
        .find(|(_, (a, e))| *a != *e);

    match mismatch {
        None => Ok(()),
        Some((index, (a, e))) => {
            let message = message
                .map(str::to_string)
                .unwrap_or_else(|| format!("arrays differ at index {index}: {a:?} != {e:?}"));
            Err(AssertionError::new(message))
        }
    }
}

/// Pass only if `callback` raises
#[track_caller]
pub fn assert_throws<F>(callback: F, message: Option<&str>) -> CaseResult
where
    F: FnOnce() -> CaseResult,
{
    let name = callable_name::<F>();
    if protect(callback).is_err() {
        return Ok(());
    }
    Err(AssertionError::new(not_raised_message(name, message)))
}

/// Pass only if `callback(args)` raises
#[track_caller]
pub fn assert_throws_with<A, F>(callback: F, args: A, message: Option<&str>) -> CaseResult
where
    F: FnOnce(A) -> CaseResult,
{
    let name = callable_name::<F>();
    if protect(move || callback(args)).is_err() {
        return Ok(());
    }
    Err(AssertionError::new(not_raised_message(name, message)))
}

fn not_raised_message(name: Option<&str>, message: Option<&str>) -> String {
    match (message, name) {
        (Some(message), _) => message.to_string(),
        (None, Some(name)) => format!("expected `{name}` to raise, but it returned normally"),
        (None, None) => "expected callback to raise, but it returned normally".to_string(),
    }
}

/// Assertion functions bound to a suite's registration context
///
/// `Assert` is `Copy`, so a test callback can capture it by value.
#[derive(Clone, Copy, Debug, Default)]
pub struct Assert;

impl Assert {
    #[track_caller]
    pub fn equals<A, E>(self, actual: A, expected: E, message: Option<&str>) -> CaseResult
    where
        A: PartialEq<E> + Debug,
        E: Debug,
    {
        assert_equals(actual, expected, message)
    }

    #[track_caller]
    pub fn not_equals<A, E>(self, actual: A, expected: E, message: Option<&str>) -> CaseResult
    where
        A: PartialEq<E> + Debug,
        E: Debug,
    {
        assert_not_equals(actual, expected, message)
    }

    #[track_caller]
    pub fn arrays_equal<A, E>(self, actual: &[A], expected: &[E], message: Option<&str>) -> CaseResult
    where
        A: PartialEq<E> + Debug,
        E: Debug,
    {
        assert_arrays_equal(actual, expected, message)
    }

    #[track_caller]
    pub fn throws<F>(self, callback: F, message: Option<&str>) -> CaseResult
    where
        F: FnOnce() -> CaseResult,
    {
        assert_throws(callback, message)
    }

    #[track_caller]
    pub fn throws_with<A, F>(self, callback: F, args: A, message: Option<&str>) -> CaseResult
    where
        F: FnOnce(A) -> CaseResult,
    {
        assert_throws_with(callback, args, message)
    }

    #[track_caller]
    pub fn fail(self, message: impl Into<String>) -> CaseResult {
        fail(message)
    }
}
