use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use shared_config::AppConfig;

use crate::repository::StoreError;

/// Bounded retry for optimistic-lock conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.booking_max_retries, config.retry_base_delay())
    }

    /// `base * 2^attempt`, attempt counted from zero.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(25))
    }
}

/// Errors that can tell a lost optimistic-lock race apart from a real failure.
pub trait ConflictAware: fmt::Display {
    fn is_version_conflict(&self) -> bool;
}

impl ConflictAware for StoreError {
    fn is_version_conflict(&self) -> bool {
        StoreError::is_version_conflict(self)
    }
}

/// Runs `operation` until it succeeds, fails with anything other than a
/// version conflict, or the attempt budget runs out. The closure is expected
/// to re-read whatever state it depends on.
pub async fn retry_on_conflict<T, E, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, E>
where
    E: ConflictAware,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Err(err) if err.is_version_conflict() && attempt + 1 < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                debug!("Version conflict on attempt {}, retrying in {:?}: {}", attempt + 1, delay, err);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                if err.is_version_conflict() {
                    warn!("Giving up after {} attempts: {}", policy.max_attempts, err);
                }
                return Err(err);
            }
            Ok(value) => return Ok(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn conflict() -> StoreError {
        StoreError::VersionConflict {
            entity: "slot",
            id: "x".to_string(),
            expected: 0,
        }
    }

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        assert_eq!(policy.delay_for(0), Duration::from_millis(10));
        assert_eq!(policy.delay_for(1), Duration::from_millis(20));
        assert_eq!(policy.delay_for(2), Duration::from_millis(40));
    }

    #[tokio::test]
    async fn succeeds_after_transient_conflicts() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let counter = calls.clone();
        let result = retry_on_conflict(policy, || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(conflict())
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_when_budget_is_spent() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(2, Duration::from_millis(1));

        let counter = calls.clone();
        let result: Result<(), _> = retry_on_conflict(policy, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(conflict())
            }
        })
        .await;

        assert!(result.unwrap_err().is_version_conflict());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = retry_on_conflict(RetryPolicy::default(), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Backend("down".to_string()))
            }
        })
        .await;

        assert_eq!(result, Err(StoreError::Backend("down".to_string())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
