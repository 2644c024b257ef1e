//! Scheduled Removal Module
//!
//! One-shot removal tasks spawned on the tokio runtime. Each task sleeps for
//! an entry's TTL and then asks the store to drop that entry, provided the
//! entry still belongs to the same `set` that armed the timer.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

// == Scheduled Removal ==
/// Cancellable handle to a pending removal.
#[derive(Debug)]
pub struct ScheduledRemoval {
    handle: JoinHandle<()>,
    generation: u64,
}

impl ScheduledRemoval {
    /// Spawns `on_fire` on `runtime` to run once `delay` has elapsed.
    ///
    /// The deadline counts from this call, not from the task's first poll.
    /// The callback always runs on a later poll, never inline, even for a
    /// zero delay.
    pub fn spawn<F>(runtime: &Handle, delay: Duration, generation: u64, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        // `None` only for delays too large to represent as an instant
        let deadline = Instant::now().checked_add(delay);
        let handle = runtime.spawn(async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => tokio::time::sleep(delay).await,
            }
            on_fire();
        });

        Self { handle, generation }
    }

    /// Generation of the entry this removal was armed for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cancels the removal. A cancelled removal never fires.
    pub fn cancel(self) {
        self.handle.abort();
    }
}
