//! Single-slot, overwrite-latest mailbox
//!
//! The producer (capture thread) replaces the slot; consumers read the newest
//! value whenever they get around to it. Values are published as `Arc<T>`, so
//! a reader always holds either the previous or the new complete value.
//!
//! ```text
//! capture thread ──publish──▶ [ slot: Arc<T>, generation ] ◀──latest / wait_newer── consumer
//! ```

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Slot<T> {
    value: Option<Arc<T>>,
    generation: u64,
    closed: bool,
}

/// Overwrite-latest cell shared between one producer and any number of readers
#[derive(Debug)]
pub struct LatestMailbox<T> {
    slot: Mutex<Slot<T>>,
    changed: Condvar,
}

impl<T> Default for LatestMailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LatestMailbox<T> {
    /// Empty mailbox at generation 0
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                generation: 0,
                closed: false,
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        // Slot writes are a single swap; a poisoned slot is still whole
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the slot with `value`, returning the new generation
    ///
    /// The lock is held only for the pointer swap; the previous value is
    /// dropped after it is released.
    pub fn publish(&self, value: T) -> u64 {
        self.publish_arc(Arc::new(value))
    }

    /// Replace the slot with an already shared value
    pub fn publish_arc(&self, value: Arc<T>) -> u64 {
        let (previous, generation) = {
            let mut slot = self.lock();
            slot.generation += 1;
            (slot.value.replace(value), slot.generation)
        };
        self.changed.notify_all();
        drop(previous);
        generation
    }

    /// Newest value, if anything was published
    pub fn latest(&self) -> Option<Arc<T>> {
        self.lock().value.clone()
    }

    /// Newest value together with its generation
    pub fn snapshot(&self) -> Option<(u64, Arc<T>)> {
        let slot = self.lock();
        slot.value.clone().map(|v| (slot.generation, v))
    }

    /// Number of values published so far
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Block until a value newer than `seen` is published, the mailbox is
    /// closed, or `timeout` elapses
    ///
    /// Returns `None` on timeout or close.
    pub fn wait_newer(&self, seen: u64, timeout: Duration) -> Option<(u64, Arc<T>)> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.lock();

        while slot.generation <= seen && !slot.closed {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            slot = match self.changed.wait_timeout(slot, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }

        if slot.generation <= seen {
            return None;
        }
        slot.value.clone().map(|v| (slot.generation, v))
    }

    /// Wake all waiters; later `wait_newer` calls return immediately
    pub fn close(&self) {
        self.lock().closed = true;
        self.changed.notify_all();
    }

    /// Whether [`LatestMailbox::close`] was called
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
