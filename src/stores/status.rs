use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::warn;

use super::lock;
use crate::error::AppError;

/// Loading and error flags shared by every store.
///
/// `is_loading` counts in-flight operations, so overlapping calls do not
/// clear each other's flag.
#[derive(Debug, Default)]
pub struct StoreStatus {
    in_flight: AtomicUsize,
    error: Mutex<Option<String>>,
}

pub struct LoadingGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl StoreStatus {
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn error(&self) -> Option<String> {
        lock(&self.error).clone()
    }

    pub fn clear_error(&self) {
        *lock(&self.error) = None;
    }

    /// Marks an operation as started and clears the previous error.
    pub fn begin(&self) -> LoadingGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.clear_error();
        LoadingGuard {
            in_flight: &self.in_flight,
        }
    }

    pub fn record(&self, operation: &str, err: &AppError) {
        warn!("{} failed: {}", operation, err);
        *lock(&self.error) = Some(err.to_string());
    }

    /// Runs `operation` with the loading flag raised. A failure is recorded
    /// and still returned to the caller.
    pub async fn track<T, F>(&self, operation: &str, future: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        let _loading = self.begin();
        let result = future.await;
        if let Err(err) = &result {
            self.record(operation, err);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn track_records_and_returns_failure() {
        let status = StoreStatus::default();
        let result: Result<(), AppError> = status
            .track("load widgets", async { Err(AppError::Validation("boom".into())) })
            .await;

        assert!(result.is_err());
        assert_eq!(status.error().as_deref(), Some("boom"));
        assert!(!status.is_loading());
    }

    #[tokio::test]
    async fn loading_flag_counts_overlapping_operations() {
        let status = StoreStatus::default();
        let first = status.begin();
        let second = status.begin();
        drop(first);
        assert!(status.is_loading());
        drop(second);
        assert!(!status.is_loading());
    }

    #[tokio::test]
    async fn begin_clears_previous_error() {
        let status = StoreStatus::default();
        status.record("load widgets", &AppError::Unauthenticated);
        let _ = status.track("load widgets", async { Ok::<_, AppError>(()) }).await;
        assert_eq!(status.error(), None);
    }
}
