//! Built-in demo suites
//!
//! A small module of suites exercising every case shape: passing and
//! failing sync cases, deferred async cases, and an async case whose
//! deferred assertion fails so it never signals completion.

use std::time::Duration;
use tracing::debug;

use crate::assertions::{assert_equals, fail, CaseResult};
use crate::registry::{Registry, SuiteOptions};

/// Timeout of the `module` suite, whose last case never completes
pub const MODULE_TIMEOUT_MS: u64 = 500;

fn checked_divide((dividend, divisor): (i64, i64)) -> CaseResult {
    if divisor == 0 {
        return fail(format!("cannot divide {dividend} by zero"));
    }
    Ok(())
}

fn always_succeeds() -> CaseResult {
    Ok(())
}

/// Register the demo suites, in declaration order `module`, `timers`, `assertions`
pub fn register_demo_suites(registry: &mut Registry) {
    registry.register_with(
        "module",
        SuiteOptions::timeout_ms(MODULE_TIMEOUT_MS),
        |ctx| {
            let assert = ctx.assert();
            ctx.it("should be 4", move || assert.equals(2 + 2, 4, None));
            ctx.it("should fail", move || assert.equals(1 + 1, 3, None));
            ctx.it_async("should fail after a delay", |done| {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    match assert_equals("foo", "bar", None) {
                        Ok(()) => done.complete(),
                        Err(err) => debug!("Deferred assertion failed: {}", err),
                    }
                });
                Ok(())
            });
        },
    );

    registry.register("timers", |ctx| {
        let assert = ctx.assert();
        ctx.it_async("resolves after a delay", |done| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                done.complete();
            });
            Ok(())
        });
        ctx.it_async("resolves immediately", |done| {
            done.complete();
            Ok(())
        });
        ctx.it("arrays match", move || {
            assert.arrays_equal(&[1, 2, 3], &[1, 2, 3], None)
        });
    });

    registry.register("assertions", |ctx| {
        let assert = ctx.assert();
        ctx.it("values differ", move || assert.not_equals("left", "right", None));
        ctx.it("division by zero raises", move || {
            assert.throws_with(checked_divide, (1, 0), None)
        });
        ctx.it("missing raise is reported", move || {
            assert.throws(always_succeeds, None)
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SuiteOutcome;

    #[test]
    fn test_demo_registration() {
        let mut registry = Registry::new();
        register_demo_suites(&mut registry);

        let titles: Vec<_> = registry.suites().iter().map(|s| s.title()).collect();
        assert_eq!(titles, vec!["module", "timers", "assertions"]);
        assert_eq!(registry.suites()[0].async_count(), 1);
        assert_eq!(registry.suites()[0].timeout_ms(), MODULE_TIMEOUT_MS);
        assert_eq!(registry.suites()[1].async_count(), 2);
    }

    #[tokio::test]
    async fn test_demo_run() {
        let mut registry = Registry::new();
        register_demo_suites(&mut registry);

        let report = registry.run().await;
        assert_eq!(report.titles(), vec!["module", "timers", "assertions"]);

        let module = &report.suites[0];
        assert_eq!(module.outcome, SuiteOutcome::TimedOut);
        assert_eq!(module.passed, 1);
        assert_eq!(module.timed_out, 1);

        assert!(report.suites[1].is_all_passed());

        let assertions = &report.suites[2];
        assert_eq!(assertions.passed, 2);
        let missing = assertions.result("missing raise is reported").unwrap();
        assert!(missing
            .error
            .as_ref()
            .unwrap()
            .message
            .contains("`always_succeeds`"));
    }
}
