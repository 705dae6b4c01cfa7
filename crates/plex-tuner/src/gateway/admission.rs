//! Tuner admission control: `0 ≤ inUse ≤ TunerCount`, incremented on admission and
//! decremented on every exit path via an RAII guard.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::errors::{AppError, AppResult};

#[derive(Clone)]
pub struct TunerCounter {
    inner: Arc<Mutex<u32>>,
    limit: u32,
}

impl TunerCounter {
    pub fn new(limit: u32) -> Self {
        let limit = if limit == 0 { 2 } else { limit };
        Self { inner: Arc::new(Mutex::new(0)), limit }
    }

    /// Attempt to admit one more stream. Returns a guard that releases the slot on drop, or
    /// `AppError::TunersInUse` if the tuner count is already exhausted.
    pub async fn acquire(&self) -> AppResult<TunerGuard> {
        let mut in_use = self.inner.lock().await;
        if *in_use >= self.limit {
            return Err(AppError::TunersInUse { limit: self.limit });
        }
        *in_use += 1;
        Ok(TunerGuard { counter: self.inner.clone() })
    }

    pub async fn in_use(&self) -> u32 {
        *self.inner.lock().await
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// Decrements the tuner-in-use counter when dropped, regardless of whether the stream
/// handler returned normally, errored, or was cancelled mid-flight.
pub struct TunerGuard {
    counter: Arc<Mutex<u32>>,
}

impl Drop for TunerGuard {
    fn drop(&mut self) {
        let counter = self.counter.clone();
        tokio::spawn(async move {
            let mut in_use = counter.lock().await;
            *in_use = in_use.saturating_sub(1);
        });
    }
}
