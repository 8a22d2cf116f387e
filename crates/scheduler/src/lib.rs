//! Viewer Scheduler Library
//!
//! Cancellable deadline timers for the viewport engine.
//!
//! Grace periods, debounce releases and navigation timeouts are explicit
//! timers owned by whoever drives the event loop. The owner schedules a timer
//! kind with a deadline and later drains whatever is due.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use viewer_scheduler::TimerQueue;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum Timer {
//!     GuardRelease,
//!     FileSwitchGrace,
//! }
//!
//! let now = Instant::now();
//! let mut timers = TimerQueue::new();
//! timers.schedule(Timer::GuardRelease, now + Duration::from_millis(50));
//! timers.schedule(Timer::FileSwitchGrace, now + Duration::from_millis(200));
//!
//! // Teardown cancels everything still pending.
//! timers.cancel_all();
//! assert!(timers.pop_due(now + Duration::from_secs(1)).is_empty());
//! ```

mod cancel;
mod timer;

pub use cancel::CancellationToken;
pub use timer::{TimerHandle, TimerId, TimerQueue};
