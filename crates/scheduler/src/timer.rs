//! Deadline timer queue
//!
//! Single-threaded queue of delayed tasks. The owner drives it from its event
//! loop by calling [`TimerQueue::pop_due`] with the current instant; nothing in
//! here sleeps or spawns. Timers fire in deadline order, and in scheduling
//! order for equal deadlines.

use crate::cancel::CancellationToken;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

/// Unique timer identifier
pub type TimerId = u64;

/// Handle to a scheduled timer
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: TimerId,
    due: Instant,
    token: CancellationToken,
}

impl TimerHandle {
    /// Timer identifier
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Deadline the timer was scheduled for
    pub fn due(&self) -> Instant {
        self.due
    }

    /// Cancel the timer; it will be skipped when its deadline passes
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the timer was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug)]
struct Entry<K> {
    id: TimerId,
    due: Instant,
    kind: K,
    insertion_order: u64,
    token: CancellationToken,
}

impl<K> PartialEq for Entry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<K> Eq for Entry<K> {}

impl<K> PartialOrd for Entry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Entry<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max heap: earliest deadline must compare greatest.
        match other.due.cmp(&self.due) {
            Ordering::Equal => other.insertion_order.cmp(&self.insertion_order),
            ordering => ordering,
        }
    }
}

/// Queue of cancellable delayed tasks keyed by a caller-defined kind
///
/// # Example
///
/// ```
/// use std::time::{Duration, Instant};
/// use viewer_scheduler::TimerQueue;
///
/// let start = Instant::now();
/// let mut timers = TimerQueue::new();
/// timers.schedule("release", start + Duration::from_millis(50));
///
/// assert!(timers.pop_due(start).is_empty());
/// assert_eq!(timers.pop_due(start + Duration::from_millis(50)), vec!["release"]);
/// ```
#[derive(Debug)]
pub struct TimerQueue<K> {
    heap: BinaryHeap<Entry<K>>,
    live: HashMap<TimerId, CancellationToken>,
    next_id: TimerId,
    insertion_counter: u64,
}

impl<K: Clone + PartialEq> TimerQueue<K> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            live: HashMap::new(),
            next_id: 1,
            insertion_counter: 0,
        }
    }

    /// Schedule `kind` to fire at `due`
    pub fn schedule(&mut self, kind: K, due: Instant) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;

        let insertion_order = self.insertion_counter;
        self.insertion_counter += 1;

        let token = CancellationToken::new();
        self.live.insert(id, token.clone());
        self.heap.push(Entry {
            id,
            due,
            kind,
            insertion_order,
            token: token.clone(),
        });

        TimerHandle { id, due, token }
    }

    /// Cancel every pending timer of this kind, then schedule a new one
    ///
    /// Used for last-request-wins deadlines such as navigation timeouts.
    pub fn reschedule(&mut self, kind: K, due: Instant) -> TimerHandle {
        self.cancel_kind(&kind);
        self.schedule(kind, due)
    }

    /// Cancel a timer by ID
    ///
    /// Returns `true` if the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.live.remove(&id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel all pending timers of the given kind
    ///
    /// Returns the number of timers cancelled.
    pub fn cancel_kind(&mut self, kind: &K) -> usize {
        let ids: Vec<TimerId> = self
            .heap
            .iter()
            .filter(|entry| entry.kind == *kind && !entry.token.is_cancelled())
            .map(|entry| entry.id)
            .collect();

        ids.into_iter().filter(|id| self.cancel(*id)).count()
    }

    /// Cancel every pending timer and empty the queue
    ///
    /// Returns the number of timers cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.len();
        for token in self.live.values() {
            token.cancel();
        }
        self.live.clear();
        self.heap.clear();
        count
    }

    /// Whether a timer of this kind is waiting to fire
    pub fn is_pending(&self, kind: &K) -> bool {
        self.heap
            .iter()
            .any(|entry| entry.kind == *kind && !entry.token.is_cancelled())
    }

    /// Earliest deadline among live timers
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap
            .iter()
            .filter(|entry| !entry.token.is_cancelled())
            .map(|entry| entry.due)
            .min()
    }

    /// Remove and return every live timer whose deadline is at or before `now`
    ///
    /// Cancelled timers are discarded silently.
    pub fn pop_due(&mut self, now: Instant) -> Vec<K> {
        let mut fired = Vec::new();

        while let Some(entry) = self.heap.peek() {
            if entry.due > now {
                break;
            }

            let Some(entry) = self.heap.pop() else {
                break;
            };

            if entry.token.is_cancelled() {
                continue;
            }

            self.live.remove(&entry.id);
            fired.push(entry.kind);
        }

        fired
    }

    /// Number of live timers
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no live timers remain
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

impl<K: Clone + PartialEq> Default for TimerQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}
