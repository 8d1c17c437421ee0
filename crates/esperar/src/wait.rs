//! The conditional-wait engine.
//!
//! A [`Waiter`] is a transient execution context created per wait call: it
//! binds a target, the target's description, and a [`Config`], and retries a
//! [`WaitTask`] against the target until the task succeeds or the deadline
//! expires. Poll attempts are strictly sequential; the sleep between
//! attempts is the only suspension point in the library.
//!
//! Assertions, actions, and reads all go through the same loop: conditions,
//! commands, and queries implement [`WaitTask`], which is how the implicit
//! pre-wait is applied uniformly instead of being scattered through every
//! operation body.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::time::Instant;
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::result::{duration_ms, EsperarError, EsperarResult, WaitFailure};

// =============================================================================
// WAIT TASK
// =============================================================================

/// A named, retryable operation against a target.
///
/// `apply` either yields a value (ending the wait early) or fails; failures
/// whose kind is in the config's ignored set are treated as
/// "not yet" and retried, anything else propagates immediately.
pub trait WaitTask<T: ?Sized> {
    /// Value produced on success (`()` for conditions and commands)
    type Output;

    /// Description used in timeout diagnostics
    fn description(&self) -> String;

    /// Attempt the operation against the target right now
    fn apply(&self, target: &T) -> EsperarResult<Self::Output>;
}

// =============================================================================
// WAITER
// =============================================================================

/// Polling loop bound to a target and a configuration.
///
/// Holds no state across calls; create one per wait.
pub struct Waiter<'a, T: ?Sized> {
    target: &'a T,
    target_description: String,
    config: &'a Config,
}

impl<'a, T: ?Sized> Waiter<'a, T> {
    /// Create a waiter over `target`, described as `target_description`
    pub fn new(target: &'a T, target_description: impl Into<String>, config: &'a Config) -> Self {
        Self {
            target,
            target_description: target_description.into(),
            config,
        }
    }

    /// Retry `task` until it succeeds or the deadline expires.
    ///
    /// A timeout of zero means exactly one attempt and no sleep. The
    /// deadline is checked after every attempt, so a zero poll interval can
    /// busy-poll but never loop forever.
    ///
    /// # Errors
    ///
    /// [`EsperarError::Timeout`] when the deadline elapses, carrying the
    /// task description, the target description, the last observed
    /// diagnostic, elapsed time, and any configured attachments. Errors
    /// outside the ignored set propagate on first occurrence.
    pub fn until<K: WaitTask<T>>(&self, task: &K) -> EsperarResult<K::Output> {
        let task_description = task.description();
        let started = Instant::now();
        let deadline = started + self.config.timeout();
        let poll_interval = self.config.poll_interval();

        self.config
            .notify_wait_start(&self.target_description, &task_description);
        trace!(
            target_description = %self.target_description,
            task = %task_description,
            "wait started"
        );

        let mut last: Option<EsperarError> = None;
        loop {
            match task.apply(self.target) {
                Ok(value) => {
                    debug!(
                        target_description = %self.target_description,
                        task = %task_description,
                        elapsed_ms = duration_ms(started.elapsed()),
                        "wait satisfied"
                    );
                    return Ok(value);
                }
                Err(err) if self.config.ignores(err.kind()) => {
                    trace!(%err, "attempt failed, retrying");
                    last = Some(err);
                }
                Err(err) => return Err(err),
            }

            if Instant::now() >= deadline {
                break;
            }
            if !poll_interval.is_zero() {
                std::thread::sleep(poll_interval);
            }
        }

        let elapsed = started.elapsed();
        let (screenshot_base64, page_source) = self.capture_attachments();
        let failure = WaitFailure {
            condition: task_description,
            locator: self.target_description.clone(),
            elapsed_ms: duration_ms(elapsed),
            diagnostic: last
                .as_ref()
                .map_or_else(|| "condition was never satisfied".to_string(), |e| e.to_string()),
            screenshot_base64,
            page_source,
        };
        warn!(%failure, "wait timed out");
        self.config.notify_wait_failure(&failure);
        Err(EsperarError::timeout(failure, last))
    }

    /// Capture screenshot/page-source attachments per config.
    ///
    /// Capture failures must never mask the timeout itself; they are logged
    /// and dropped so the textual diagnostic survives intact.
    fn capture_attachments(&self) -> (Option<String>, Option<String>) {
        let Ok(driver) = self.config.driver() else {
            return (None, None);
        };
        let screenshot = if self.config.save_screenshot_on_failure() {
            match driver.screenshot() {
                Ok(bytes) => Some(STANDARD.encode(bytes)),
                Err(err) => {
                    warn!(%err, "screenshot capture failed");
                    None
                }
            }
        } else {
            None
        };
        let page_source = if self.config.save_page_source_on_failure() {
            match driver.page_source() {
                Ok(markup) => Some(markup),
                Err(err) => {
                    warn!(%err, "page source capture failed");
                    None
                }
            }
        } else {
            None
        };
        (screenshot, page_source)
    }
}

impl<T: ?Sized> std::fmt::Debug for Waiter<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Waiter")
            .field("target_description", &self.target_description)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::result::{DriverError, ErrorKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn init_logs() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("esperar=trace")
            .try_init();
    }

    /// Task that fails transiently for the first `failures` attempts
    struct FlakyTask {
        failures: usize,
        attempts: AtomicUsize,
    }

    impl FlakyTask {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                attempts: AtomicUsize::new(0),
            }
        }

        fn attempt_count(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    impl WaitTask<()> for FlakyTask {
        type Output = usize;

        fn description(&self) -> String {
            "flaky task".to_string()
        }

        fn apply(&self, (): &()) -> EsperarResult<usize> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                Err(EsperarError::mismatch("ready", format!("attempt {attempt}")))
            } else {
                Ok(attempt)
            }
        }
    }

    fn quick_config() -> Config {
        Config::new()
            .with_timeout(Duration::from_millis(500))
            .with_poll_interval(Duration::from_millis(10))
    }

    mod early_exit_tests {
        use super::*;

        #[test]
        fn test_immediate_success_takes_one_attempt() {
            init_logs();
            let task = FlakyTask::new(0);
            let config = quick_config();
            let waiter = Waiter::new(&(), "target", &config);
            assert!(waiter.until(&task).is_ok());
            assert_eq!(task.attempt_count(), 1);
        }

        #[test]
        fn test_success_after_n_failures_stops_polling() {
            let task = FlakyTask::new(3);
            let config = quick_config();
            let waiter = Waiter::new(&(), "target", &config);
            assert_eq!(waiter.until(&task).unwrap(), 3);
            assert_eq!(task.attempt_count(), 4);
        }

        #[test]
        fn test_eventual_success_bounded_by_poll_interval() {
            let task = FlakyTask::new(5);
            let config = quick_config();
            let waiter = Waiter::new(&(), "target", &config);
            let started = Instant::now();
            assert!(waiter.until(&task).is_ok());
            let elapsed = started.elapsed();
            assert!(elapsed >= Duration::from_millis(50), "elapsed {elapsed:?}");
            assert!(elapsed < Duration::from_millis(400), "elapsed {elapsed:?}");
        }
    }

    mod timeout_tests {
        use super::*;

        #[test]
        fn test_timeout_elapsed_is_at_least_the_deadline() {
            let task = FlakyTask::new(usize::MAX);
            let config = Config::new()
                .with_timeout(Duration::from_millis(100))
                .with_poll_interval(Duration::from_millis(10));
            let waiter = Waiter::new(&(), "target", &config);
            let started = Instant::now();
            let err = waiter.until(&task).unwrap_err();
            let elapsed = started.elapsed();
            assert_eq!(err.kind(), ErrorKind::Timeout);
            assert!(elapsed >= Duration::from_millis(100), "elapsed {elapsed:?}");
            assert!(elapsed < Duration::from_millis(250), "elapsed {elapsed:?}");
        }

        #[test]
        fn test_zero_timeout_means_exactly_one_attempt() {
            let task = FlakyTask::new(usize::MAX);
            let config = Config::new()
                .with_timeout(Duration::ZERO)
                .with_poll_interval(Duration::from_millis(50));
            let waiter = Waiter::new(&(), "target", &config);
            assert!(waiter.until(&task).is_err());
            assert_eq!(task.attempt_count(), 1);
        }

        #[test]
        fn test_zero_poll_interval_terminates() {
            let task = FlakyTask::new(usize::MAX);
            let config = Config::new()
                .with_timeout(Duration::from_millis(20))
                .with_poll_interval(Duration::ZERO);
            let waiter = Waiter::new(&(), "target", &config);
            let err = waiter.until(&task).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Timeout);
        }

        #[test]
        fn test_timeout_report_contents() {
            let task = FlakyTask::new(usize::MAX);
            let config = Config::new()
                .with_timeout(Duration::from_millis(30))
                .with_poll_interval(Duration::from_millis(5));
            let waiter = Waiter::new(&(), "element(css:button)", &config);
            let err = waiter.until(&task).unwrap_err();
            let report = err.wait_failure().unwrap();
            assert_eq!(report.condition, "flaky task");
            assert_eq!(report.locator, "element(css:button)");
            assert!(report.elapsed_ms >= 30);
            assert!(report.diagnostic.contains("expected ready"));
        }

        #[test]
        fn test_timeout_carries_last_cause() {
            let task = FlakyTask::new(usize::MAX);
            let config = Config::new().with_timeout(Duration::ZERO);
            let waiter = Waiter::new(&(), "target", &config);
            let err = waiter.until(&task).unwrap_err();
            let source = std::error::Error::source(&err).expect("cause attached");
            assert!(source.to_string().contains("attempt 0"));
        }
    }

    mod propagation_tests {
        use super::*;

        struct FatalTask;

        impl WaitTask<()> for FatalTask {
            type Output = ();

            fn description(&self) -> String {
                "fatal task".to_string()
            }

            fn apply(&self, (): &()) -> EsperarResult<()> {
                Err(EsperarError::driver(
                    "element(css:a)",
                    DriverError::transport("connection refused"),
                ))
            }
        }

        #[test]
        fn test_unexpected_fault_propagates_on_first_attempt() {
            let config = quick_config();
            let waiter = Waiter::new(&(), "target", &config);
            let err = waiter.until(&FatalTask).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Transport);
        }

        #[test]
        fn test_widened_ignored_set_retries_the_fault() {
            let config = Config::new()
                .with_timeout(Duration::from_millis(20))
                .with_poll_interval(Duration::from_millis(5))
                .also_ignoring(ErrorKind::Transport);
            let waiter = Waiter::new(&(), "target", &config);
            let err = waiter.until(&FatalTask).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Timeout);
        }
    }

    mod hook_tests {
        use super::*;

        #[test]
        fn test_failure_hook_receives_report() {
            let seen = Arc::new(std::sync::Mutex::new(None));
            let sink = Arc::clone(&seen);
            let config = Config::new()
                .with_timeout(Duration::ZERO)
                .with_on_wait_failure(Arc::new(move |failure: &WaitFailure| {
                    *sink.lock().unwrap() = Some(failure.clone());
                }));
            let waiter = Waiter::new(&(), "target", &config);
            let _ = waiter.until(&FlakyTask::new(usize::MAX));
            let report = seen.lock().unwrap().clone().expect("hook invoked");
            assert_eq!(report.condition, "flaky task");
        }

        #[test]
        fn test_start_hook_invoked_once_per_wait() {
            let calls = Arc::new(AtomicUsize::new(0));
            let counted = Arc::clone(&calls);
            let config = quick_config().with_on_wait_start(Arc::new(move |_, _| {
                counted.fetch_add(1, Ordering::SeqCst);
            }));
            let waiter = Waiter::new(&(), "target", &config);
            let _ = waiter.until(&FlakyTask::new(2));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    mod condition_task_tests {
        use super::*;

        #[test]
        fn test_condition_and_its_negation_are_exclusive_under_wait() {
            let condition: Condition<u32> = Condition::new("be zero", |n: &u32| {
                if *n == 0 {
                    Ok(())
                } else {
                    Err(EsperarError::mismatch("zero", format!("{n}")))
                }
            });
            let config = Config::new().with_timeout(Duration::ZERO);
            for state in [0_u32, 7] {
                let waiter = Waiter::new(&state, "number", &config);
                let direct = waiter.until(&condition).is_ok();
                let inverse = waiter.until(&condition.not()).is_ok();
                assert_ne!(direct, inverse, "exactly one must hold for {state}");
            }
        }
    }
}
