//! In-flight request accounting for drain decisions.
//!
//! # Responsibilities
//! - Count requests whose handler invocation has started but not finished
//! - Guarantee the count drops on every exit path, including panics
//!
//! The gauge exists purely so shutdown can wait for in-flight work; it does
//! no admission control.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Gauge of requests currently inside the handler chain.
///
/// Cloning shares the underlying count; one counter belongs to one HTTP
/// service.
#[derive(Debug, Clone, Default)]
pub struct InflightCounter {
    count: Arc<AtomicU64>,
}

impl InflightCounter {
    /// Create a new counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request entering the handler chain. Returns a guard that
    /// decrements on drop.
    pub fn track(&self) -> InflightGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        InflightGuard {
            count: Arc::clone(&self.count),
        }
    }

    /// Current number of in-flight requests.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    /// Resolve once the count reaches zero, polling at `interval`.
    ///
    /// Callers bound this with a timeout; the future itself never gives up.
    pub async fn drained(&self, interval: Duration) {
        while self.count.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(interval).await;
        }
    }
}

/// Guard that tracks one request's lifetime.
/// Decrements the in-flight count when dropped.
#[derive(Debug)]
pub struct InflightGuard {
    count: Arc<AtomicU64>,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::SeqCst);
    }
}
