//! Bounded retries of transient RPC failures.

use backon::{ExponentialBuilder, Retryable};
use std::{fmt::Display, future::Future, time::Duration};
use strait_poller::PollerError;

/// Classifies errors that may succeed when retried.
pub trait Transient {
    /// Returns `true` if retrying the failed operation may succeed.
    fn is_transient(&self) -> bool;
}

impl Transient for PollerError {
    fn is_transient(&self) -> bool {
        PollerError::is_transient(self)
    }
}

const MIN_DELAY: Duration = Duration::from_millis(250);
const MAX_DELAY: Duration = Duration::from_secs(8);
const MAX_ATTEMPTS: usize = 5;

/// Runs `operation`, retrying transient failures with jittered exponential backoff.
///
/// Non-transient errors are returned immediately, and the last error is returned once the
/// attempts are exhausted.
pub async fn retry_transient<T, E, F, Fut>(name: &'static str, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    let backoff = ExponentialBuilder::default()
        .with_min_delay(MIN_DELAY)
        .with_max_delay(MAX_DELAY)
        .with_max_times(MAX_ATTEMPTS)
        .with_jitter();

    operation
        .retry(backoff)
        .when(|err: &E| err.is_transient())
        .notify(|err: &E, after: Duration| {
            warn!(target: "retry", operation = name, %err, ?after, "Transient failure, retrying");
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("transient")]
        Transient,
        #[error("fatal")]
        Fatal,
    }

    impl Transient for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, Self::Transient)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result = retry_transient("test", || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(TestError::Transient)
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_errors_are_not_retried() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: Result<(), _> = retry_transient("test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TestError::Fatal)
        })
        .await;
        assert!(matches!(result, Err(TestError::Fatal)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_are_bounded() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: Result<(), _> = retry_transient("test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TestError::Transient)
        })
        .await;
        assert!(matches!(result, Err(TestError::Transient)));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS + 1);
    }
}
