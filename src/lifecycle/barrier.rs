//! Join barrier over running service tasks.

use tokio::sync::watch;

/// Counter-based synchronization point that unblocks once every tracked
/// task has finished.
///
/// Each running service holds a [`BarrierToken`]; the token releases its
/// slot on drop, so a service task that panics still lowers the count.
#[derive(Debug)]
pub struct JoinBarrier {
    count: watch::Sender<usize>,
}

impl JoinBarrier {
    /// A barrier tracking nothing.
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self { count }
    }

    /// Track one more task. Must be called before the task is spawned so a
    /// waiter can never observe zero between registration and launch.
    pub fn enter(&self) -> BarrierToken {
        self.count.send_modify(|count| *count += 1);
        BarrierToken {
            count: self.count.clone(),
        }
    }

    /// Number of tracked tasks still running.
    pub fn running(&self) -> usize {
        *self.count.borrow()
    }

    /// Resolve once the count reaches zero (immediately if it already is).
    pub async fn wait(&self) {
        let mut observer = self.count.subscribe();
        // The sender lives in self, so the channel cannot close under us.
        let _ = observer.wait_for(|count| *count == 0).await;
    }
}

impl Default for JoinBarrier {
    fn default() -> Self {
        Self::new()
    }
}

/// Slot held by one running task; released on drop.
#[derive(Debug)]
pub struct BarrierToken {
    count: watch::Sender<usize>,
}

impl Drop for BarrierToken {
    fn drop(&mut self) {
        self.count
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}
