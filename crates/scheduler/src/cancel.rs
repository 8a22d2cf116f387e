//! Cancellation tokens for pending timers
//!
//! A timer stays in the queue until its deadline passes, but it only fires if
//! its token has not been cancelled in the meantime. Holders of a
//! [`TimerHandle`](crate::TimerHandle) can cancel without touching the queue.
//!
//! The queue lives on one event loop, so the flag is a plain shared cell.

use std::cell::Cell;
use std::rc::Rc;

/// Cancellation token shared between a queued timer and its handle
///
/// Multiple clones observe the same cancellation state. Tokens are `!Send`
/// and stay on the thread that created them.
///
/// # Example
///
/// ```
/// use viewer_scheduler::CancellationToken;
///
/// let token = CancellationToken::new();
/// let held = token.clone();
///
/// token.cancel();
/// assert!(held.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancellationToken {
    /// Create a new token in the non-cancelled state
    pub fn new() -> Self {
        Self {
            cancelled: Rc::new(Cell::new(false)),
        }
    }

    /// Cancel this token
    ///
    /// Idempotent. All clones observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// Check if this token has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
