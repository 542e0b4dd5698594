//! Concurrency limiter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::admission::Rejection;

/// Bounds how many requests run the guarded chain at once.
///
/// A request waits at most `wait` for a slot; the wait is asynchronous and
/// never blocks a worker thread.
#[derive(Debug)]
pub struct Slowdown {
    limit: usize,
    wait: Duration,
    slots: Arc<Semaphore>,
    rejected: AtomicU64,
}

impl Slowdown {
    pub fn new(limit: usize, wait: Duration) -> Self {
        Self {
            limit,
            wait,
            slots: Arc::new(Semaphore::new(limit)),
            rejected: AtomicU64::new(0),
        }
    }

    /// Reserve a slot, waiting up to the configured allowance.
    pub async fn admit(&self) -> Result<AdmissionPermit, Rejection> {
        if let Ok(permit) = Arc::clone(&self.slots).try_acquire_owned() {
            return Ok(AdmissionPermit { _permit: permit });
        }

        if !self.wait.is_zero() {
            let acquire = Arc::clone(&self.slots).acquire_owned();
            if let Ok(Ok(permit)) = tokio::time::timeout(self.wait, acquire).await {
                return Ok(AdmissionPermit { _permit: permit });
            }
        }

        self.rejected.fetch_add(1, Ordering::Relaxed);
        Err(Rejection::TooManyConcurrent)
    }

    /// Requests currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.limit - self.slots.available_permits()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Rejections since creation.
    pub fn rejected_total(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

/// A held slot; released when dropped, including during unwinding or cancellation.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_permits_are_released_on_drop() {
        let slowdown = Slowdown::new(1, Duration::ZERO);

        let permit = slowdown.admit().await.unwrap();
        assert_eq!(slowdown.in_flight(), 1);
        assert_eq!(slowdown.admit().await.unwrap_err(), Rejection::TooManyConcurrent);

        drop(permit);
        assert_eq!(slowdown.in_flight(), 0);
        assert!(slowdown.admit().await.is_ok());
        assert_eq!(slowdown.rejected_total(), 1);
    }

    #[tokio::test]
    async fn test_waiter_gets_freed_slot() {
        let slowdown = Arc::new(Slowdown::new(1, Duration::from_secs(5)));
        let permit = slowdown.admit().await.unwrap();

        let waiter = {
            let slowdown = Arc::clone(&slowdown);
            tokio::spawn(async move { slowdown.admit().await.is_ok() })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(permit);

        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_wait_expiry_rejects() {
        let slowdown = Slowdown::new(1, Duration::from_millis(30));
        let _held = slowdown.admit().await.unwrap();

        let started = std::time::Instant::now();
        assert_eq!(slowdown.admit().await.unwrap_err(), Rejection::TooManyConcurrent);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_panicking_holder_releases_slot() {
        let slowdown = Arc::new(Slowdown::new(1, Duration::ZERO));

        let task = {
            let slowdown = Arc::clone(&slowdown);
            tokio::spawn(async move {
                let _permit = slowdown.admit().await.unwrap();
                panic!("guarded work failed");
            })
        };

        assert!(task.await.is_err());
        assert_eq!(slowdown.in_flight(), 0);
    }
}
