use crate::config::RetryConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Classifies errors the retry executor may retry
pub trait IsTransient {
    /// Returns true if the failed operation may succeed when repeated later
    fn is_transient(&self) -> bool;
}

/// Bounded exponential backoff for rate-limited operations
///
/// # Retry Logic
///
/// | Outcome of attempt `n` (0-indexed) | Action |
/// |-----------|--------|
/// | Success | Return the value |
/// | Transient error | Sleep `base_delay * 2^n`, try again |
/// | Other error | Return the error immediately |
///
/// After `max_attempts` transient failures one final attempt is made and its outcome is
/// returned whatever it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.base_delay())
    }

    /// Returns the backoff before retrying after failed attempt `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Runs an operation under this policy
    ///
    /// # Arguments
    ///
    /// * `operation` - Name used in log messages
    /// * `f` - Produces a fresh future for every attempt
    ///
    /// # Returns
    ///
    /// The first success, the first non-transient error, or the outcome of the final attempt
    ///
    /// # Example
    ///
    /// ```no_run
    /// use corpus_mirror::store::{RetryPolicy, StoreClient};
    ///
    /// # async fn example(store: &dyn StoreClient) {
    /// let policy = RetryPolicy::default();
    /// let meta = policy.run("get_metadata", move || store.get_metadata("abc")).await;
    /// # }
    /// ```
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: IsTransient + Display,
    {
        for attempt in 0..self.max_attempts {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        "{} rate limited (attempt {}/{}), retrying in {:?}: {}",
                        operation,
                        attempt + 1,
                        self.max_attempts,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }

        tracing::debug!("{}: final attempt", operation);
        f().await
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    enum TestError {
        Transient,
        Fatal,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl IsTransient for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, Self::Transient)
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(4), Duration::from_secs(16));
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, TestError> = fast_policy(5)
            .run("op", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_then_success() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, TestError> = fast_policy(5)
            .run("op", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok(1)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, TestError> = fast_policy(5)
            .run("op", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Fatal)
            })
            .await;
        assert!(matches!(result, Err(TestError::Fatal)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_persistent_transient_makes_final_attempt() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, TestError> = fast_policy(3)
            .run("op", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Transient)
            })
            .await;
        assert!(matches!(result, Err(TestError::Transient)));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_final_attempt_can_succeed() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, TestError> = fast_policy(2)
            .run("op", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok(9)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_calls_once() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, TestError> = fast_policy(0)
            .run("op", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Transient)
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
