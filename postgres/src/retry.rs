//! Retrying transactions that lose a serialization race.
//!
//! Under `SERIALIZABLE` isolation PostgreSQL aborts one of two conflicting
//! transactions with SQLSTATE `40001` (or `40P01` on deadlock). Such aborts
//! are safe to retry from the start.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// SQLSTATE for `serialization_failure`
pub const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE for `deadlock_detected`
pub const DEADLOCK_DETECTED: &str = "40P01";

/// Retry policy for transient transaction failures
///
/// Exponential backoff with jitter.
///
/// # Example
///
/// ```
/// use estate_postgres::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default()
///     .with_max_attempts(3)
///     .with_initial_delay(Duration::from_millis(5));
/// assert!(policy.should_retry(2));
/// assert!(!policy.should_retry(3));
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    max_attempts: u32,

    /// Delay before the first retry
    initial_delay: Duration,

    /// Cap on the delay between retries
    max_delay: Duration,

    /// Multiplier for exponential backoff
    backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Create a policy with default settings
    ///
    /// Defaults:
    /// - `max_attempts`: 5
    /// - `initial_delay`: 10 ms
    /// - `max_delay`: 500 ms
    /// - `backoff_multiplier`: 2.0
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
        }
    }

    /// Set maximum attempts
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the delay before the first retry
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the cap on the delay between retries
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay before retry number `attempt` (1-based)
    ///
    /// `min(initial_delay * multiplier^(attempt-1), max_delay) * random(0.5..=1.0)`
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        #[allow(clippy::cast_possible_wrap)] // attempts stay tiny
        let exponent = attempt.saturating_sub(1) as i32;
        let base_secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped_secs = base_secs.min(self.max_delay.as_secs_f64());

        let jitter = rand::thread_rng().gen_range(0.5..=1.0);
        Duration::from_secs_f64(capped_secs * jitter)
    }

    /// Maximum number of attempts
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another attempt is allowed after `attempts` have been made
    #[must_use]
    pub const fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    /// Run `attempt` until it succeeds, fails for a non-retryable reason, or
    /// the attempts are used up.
    ///
    /// # Errors
    ///
    /// Returns the last error from `attempt`.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T, sqlx::Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match attempt().await {
                Err(err) if is_retryable(&err) && self.should_retry(attempts) => {
                    let delay = self.delay_for_attempt(attempts);
                    metrics::counter!("store.transaction.retries", "operation" => operation)
                        .increment(1);
                    tracing::debug!(operation, attempts, ?delay, "Retrying serialization failure");
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `err` is a serialization failure or deadlock.
#[must_use]
pub fn is_retryable(err: &sqlx::Error) -> bool {
    sqlstate(err).is_some_and(|code| code == SERIALIZATION_FAILURE || code == DEADLOCK_DETECTED)
}

/// SQLSTATE of a database error, if any.
#[must_use]
pub fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|code| code.into_owned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_is_capped_and_jittered() {
        let policy = RetryPolicy::new()
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(300));

        let first = policy.delay_for_attempt(1);
        assert!(first >= Duration::from_millis(50) && first <= Duration::from_millis(100));

        let late = policy.delay_for_attempt(10);
        assert!(late <= Duration::from_millis(300));
        assert!(late >= Duration::from_millis(150));
    }

    #[test]
    fn test_non_database_errors_are_not_retried() {
        assert!(!is_retryable(&sqlx::Error::RowNotFound));
        assert!(!is_retryable(&sqlx::Error::PoolTimedOut));
    }

    #[tokio::test]
    async fn test_run_returns_first_non_retryable_result() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new();

        let result: Result<(), sqlx::Error> = policy
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(sqlx::Error::RowNotFound) }
            })
            .await;

        assert!(matches!(result, Err(sqlx::Error::RowNotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
