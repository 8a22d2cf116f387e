//! Feedback-loop suppression for broadcast navigation events
//!
//! Every navigation event a component broadcasts is tagged with that
//! component's source id. While the dispatch is still settling, an event with
//! the same source id arriving inside the debounce window is an echo of our own
//! broadcast and must not be processed again. Events from any other source
//! always pass, since cross-component propagation has to keep working.

use crate::events::SourceId;
use std::time::{Duration, Instant};

/// Default window during which an echo of our own dispatch is dropped.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// Default delay between a dispatch and releasing the guard.
pub const DEFAULT_RELEASE_DELAY: Duration = Duration::from_millis(50);

/// Debounce-by-identity guard.
#[derive(Debug, Clone)]
pub struct NavigationEventGuard {
    is_processing: bool,
    last_event_timestamp: Option<Instant>,
    last_source_id: Option<SourceId>,
    debounce_window: Duration,
}

impl NavigationEventGuard {
    pub fn new(debounce_window: Duration) -> Self {
        Self {
            is_processing: false,
            last_event_timestamp: None,
            last_source_id: None,
            debounce_window,
        }
    }

    /// Whether an event from `source_id` observed at `now` is an echo.
    pub fn should_suppress(&self, source_id: &SourceId, now: Instant) -> bool {
        if !self.is_processing || self.last_source_id.as_ref() != Some(source_id) {
            return false;
        }

        self.last_event_timestamp
            .is_some_and(|dispatched| {
                now.saturating_duration_since(dispatched) < self.debounce_window
            })
    }

    /// Record that `source_id` is dispatching at `now`.
    pub fn begin_dispatch(&mut self, source_id: &SourceId, now: Instant) {
        self.is_processing = true;
        self.last_event_timestamp = Some(now);
        self.last_source_id = Some(source_id.clone());
    }

    /// Release the guard once downstream listeners have settled.
    pub fn end_dispatch(&mut self) {
        self.is_processing = false;
    }

    pub fn reset(&mut self) {
        self.is_processing = false;
        self.last_event_timestamp = None;
        self.last_source_id = None;
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn last_source_id(&self) -> Option<&SourceId> {
        self.last_source_id.as_ref()
    }

    pub fn debounce_window(&self) -> Duration {
        self.debounce_window
    }
}

impl Default for NavigationEventGuard {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}
