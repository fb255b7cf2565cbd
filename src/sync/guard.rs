//! Single-slot task guards.
//!
//! A [`TaskSlot`] admits at most one holder at a time. Acquiring never waits:
//! a caller that finds the slot taken is told so and is expected to skip its
//! work rather than queue behind the current holder.

use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct TaskSlot {
    lock: Arc<Mutex<()>>,
}

/// Proof of holding a [`TaskSlot`]; the slot frees up when this is dropped.
pub struct SlotGuard {
    _permit: OwnedMutexGuard<()>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the slot if it is free.
    pub fn try_acquire(&self) -> Option<SlotGuard> {
        self.lock
            .clone()
            .try_lock_owned()
            .ok()
            .map(|permit| SlotGuard { _permit: permit })
    }

    pub fn is_busy(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}
