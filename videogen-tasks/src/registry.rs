use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::types::TaskId;

struct TrackedPoll {
    generation: u64,
    token: CancellationToken,
}

/// In-memory map from task id to the cancellation handle of its running poll
///
/// All mutations go through one mutex, which is never held across an await
/// point. At most one poll is tracked per id: tracking an id that is already
/// tracked cancels the older poll.
#[derive(Default)]
pub struct TaskRegistry {
    polls: Mutex<HashMap<TaskId, TrackedPoll>>,
    next_generation: AtomicU64,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn polls(&self) -> MutexGuard<'_, HashMap<TaskId, TrackedPoll>> {
        // The map holds no invariant a panicking holder could break halfway
        self.polls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a poll for `id`, superseding any poll already tracked for it
    ///
    /// The entry is removed when the returned guard is dropped.
    pub fn track(self: &Arc<Self>, id: TaskId) -> TrackedPollGuard {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let previous = self.polls().insert(
            id.clone(),
            TrackedPoll {
                generation,
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            log::warn!("Task {id} was already being polled; cancelling the earlier poll");
            previous.token.cancel();
        }

        TrackedPollGuard {
            registry: Arc::clone(self),
            id,
            generation,
            token,
        }
    }

    /// Cancel the poll tracked for `id`. Returns whether one was tracked.
    pub fn cancel(&self, id: &TaskId) -> bool {
        let removed = self.polls().remove(id);
        match removed {
            Some(poll) => {
                log::info!("Cancelling poll for task {id}");
                poll.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every tracked poll
    pub fn cancel_all(&self) {
        let drained: Vec<_> = self.polls().drain().collect();
        for (id, poll) in drained {
            log::info!("Cancelling poll for task {id}");
            poll.token.cancel();
        }
    }

    pub fn is_tracked(&self, id: &TaskId) -> bool {
        self.polls().contains_key(id)
    }

    pub fn tracked_count(&self) -> usize {
        self.polls().len()
    }

    fn untrack(&self, id: &TaskId, generation: u64) {
        let mut polls = self.polls();
        // A newer poll may have replaced this one; leave it alone
        if polls.get(id).is_some_and(|poll| poll.generation == generation) {
            polls.remove(id);
        }
    }
}

/// Registration of one running poll. Untracks itself on drop.
pub struct TrackedPollGuard {
    registry: Arc<TaskRegistry>,
    id: TaskId,
    generation: u64,
    token: CancellationToken,
}

impl TrackedPollGuard {
    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the poll has been cancelled or superseded
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

impl Drop for TrackedPollGuard {
    fn drop(&mut self) {
        self.registry.untrack(&self.id, self.generation);
    }
}
