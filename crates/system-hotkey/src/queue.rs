use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use crate::Hotkey;

/// Default queue capacity; enough to buffer bursts between polls at any
/// reasonable poll cadence.
pub(crate) const DEFAULT_CAPACITY: usize = 64;

/// A triggered hotkey drained from the event queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// The combination that was pressed
    pub hotkey: Hotkey,
    /// Monotonic timestamp taken when the hook observed the press
    pub at: Instant,
}

/// Bounded FIFO bridging the hook callback thread to the poll path.
///
/// `push` runs in the hook callback context: the critical section is a
/// ring operation on a preallocated deque, with no allocation and no
/// syscalls. When full, the oldest entry is dropped so the most recent
/// press is never silently lost, and a counter records the drop.
#[derive(Debug)]
pub(crate) struct EventQueue {
    entries: Mutex<VecDeque<Event>>,
    capacity: usize,
    dropped: AtomicU64,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Append a triggered hotkey, evicting the oldest entry on overflow.
    pub fn push(&self, hotkey: Hotkey) {
        let event = Event {
            hotkey,
            at: Instant::now(),
        };
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.capacity {
            entries.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        entries.push_back(event);
    }

    /// Remove and return all queued events, oldest first.
    ///
    /// The replacement deque is allocated before taking the lock and the
    /// drained one converted after releasing it, so the critical section
    /// is a pointer swap and `push` is never blocked behind an
    /// allocation.
    pub fn drain_all(&self) -> Vec<Event> {
        let mut drained = VecDeque::with_capacity(self.capacity);
        {
            let mut entries = self.entries.lock().unwrap();
            std::mem::swap(&mut *entries, &mut drained);
        }
        drained.into()
    }

    /// Discard everything still queued.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Number of events evicted by overflow since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
