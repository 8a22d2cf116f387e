//! Viewport coordinator
//!
//! Top-level state machine tying scroll observation, programmatic navigation,
//! keyboard input and external events together. It is the only writer of the
//! [`DocumentViewStateStore`]; everything else reads derived state or
//! subscribes.
//!
//! Per document the coordinator is `Idle`, `ScrollTracking` (geometry drives
//! the page) or `ProgrammaticNavigating` (a jump is animating and its
//! optimistic page must not be overridden by geometry). Workspace-wide, a
//! change of current document opens a `FileSwitching` grace period during which
//! scroll-driven updates are ignored so the resolver cannot fight the switch.
//!
//! Time is injected: every entry point takes `now` and fires the timers due
//! by then before doing anything else, so an expired grace period or hold
//! never outlives its deadline. The host still calls
//! [`ViewportCoordinator::tick`] when idle to release guards on time.

use crate::collaborators::{FileRegistry, ScrollOptions, ScrollPrimitive, ScrollTicket};
use crate::config::SyncConfig;
use crate::events::{
    EventBus, NavigationEvent, PageChanged, PageVisibilityChanged, SourceId, Subscribers,
    SubscriptionId,
};
use crate::geometry::{resolve, GeometryProvider, Visibility};
use crate::guard::NavigationEventGuard;
use crate::store::{
    DocumentViewState, DocumentViewStateStore, DocumentViewUpdate, WorkspaceViewState,
};
use crate::types::{clamp_page, DocumentKey, PageNumber};
use crate::window::{PageWindow, WindowCalculator};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, trace, warn};
use viewer_scheduler::TimerQueue;

/// Minimum and maximum supported zoom percentages.
pub const MIN_ZOOM_PERCENT: u16 = 25;
pub const MAX_ZOOM_PERCENT: u16 = 400;
pub const DEFAULT_ZOOM_PERCENT: u16 = 100;

/// Navigation phase of one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationPhase {
    #[default]
    Idle,
    ScrollTracking,
    ProgrammaticNavigating(ScrollTicket),
}

/// Keys the coordinator understands. Filtering out keystrokes aimed at text
/// inputs is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavigationKey {
    ArrowUp,
    ArrowDown,
    PageUp,
    PageDown,
    Home,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TimerKind {
    GuardRelease,
    FileSwitchGrace,
    NavigationTimeout(DocumentKey),
    ScrollIdle(DocumentKey),
}

/// Multi-document viewport synchronization engine.
#[derive(Debug)]
pub struct ViewportCoordinator<R, S> {
    config: SyncConfig,
    registry: R,
    scroller: S,
    store: DocumentViewStateStore,
    phases: HashMap<DocumentKey, NavigationPhase>,
    current: Option<DocumentKey>,
    zoom_level: u16,
    windows: WindowCalculator,
    guard: NavigationEventGuard,
    timers: TimerQueue<TimerKind>,
    events: EventBus,
    observers: Subscribers<WorkspaceViewState>,
    disposed: bool,
}

impl<R: FileRegistry, S: ScrollPrimitive> ViewportCoordinator<R, S> {
    pub fn new(config: SyncConfig, registry: R, scroller: S) -> Self {
        Self {
            windows: WindowCalculator::new(config.window_radius),
            guard: NavigationEventGuard::new(config.debounce_window()),
            config,
            registry,
            scroller,
            store: DocumentViewStateStore::new(),
            phases: HashMap::new(),
            current: None,
            zoom_level: DEFAULT_ZOOM_PERCENT,
            timers: TimerQueue::new(),
            events: EventBus::new(),
            observers: Subscribers::new(),
            disposed: false,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn source_id(&self) -> &SourceId {
        &self.config.source_id
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    pub fn scroller(&self) -> &S {
        &self.scroller
    }

    pub fn scroller_mut(&mut self) -> &mut S {
        &mut self.scroller
    }

    pub fn store(&self) -> &DocumentViewStateStore {
        &self.store
    }

    /// State of one document; defaults if it is not open.
    pub fn document_state(&self, key: &DocumentKey) -> DocumentViewState {
        self.store.get(key)
    }

    /// Mirror of the current document, derived on every call.
    pub fn workspace_view(&self) -> WorkspaceViewState {
        WorkspaceViewState::derive(&self.store, self.current.as_ref(), self.zoom_level)
    }

    pub fn current_document(&self) -> Option<&DocumentKey> {
        self.current.as_ref()
    }

    pub fn phase(&self, key: &DocumentKey) -> NavigationPhase {
        self.phases.get(key).copied().unwrap_or_default()
    }

    /// Whether scroll-driven updates are suppressed after a document switch.
    pub fn is_file_switching(&self) -> bool {
        self.timers.is_pending(&TimerKind::FileSwitchGrace)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn guard(&self) -> &NavigationEventGuard {
        &self.guard
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn subscribe_events(
        &mut self,
        listener: impl FnMut(&NavigationEvent) + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    /// Listen for committed workspace changes. Listeners always observe the
    /// store and the current document already updated together.
    pub fn subscribe_state(
        &mut self,
        listener: impl FnMut(&WorkspaceViewState) + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe_events(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn unsubscribe_state(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Register a newly opened document. Its page count stays 0 until the
    /// renderer reports it. The first document opened becomes current.
    pub fn open_document(&mut self, key: DocumentKey) {
        if self.disposed {
            return;
        }
        if !self.registry.contains(&key) {
            debug!(document = %key, "opening document not yet listed by the file registry");
        }

        let created = self.store.insert_default(&key);
        self.phases.entry(key.clone()).or_default();

        if self.current.is_none() {
            self.registry.set_current_document(&key);
            self.current = Some(key);
        } else if !created {
            return;
        }

        self.notify_state();
    }

    /// Forget a closed document and cancel its pending timers.
    pub fn close_document(&mut self, key: &DocumentKey) {
        if self.disposed || self.store.remove(key).is_none() {
            return;
        }

        self.phases.remove(key);
        self.timers.cancel_kind(&TimerKind::NavigationTimeout(key.clone()));
        self.timers.cancel_kind(&TimerKind::ScrollIdle(key.clone()));

        if self.current.as_ref() == Some(key) {
            let next = self
                .registry
                .open_documents()
                .into_iter()
                .find(|open| open != key && self.store.contains(open));

            match &next {
                Some(next) => {
                    info!(closed = %key, current = %next, "current document closed");
                    self.registry.set_current_document(next);
                }
                None => info!(closed = %key, "last document closed"),
            }
            self.current = next;
        }

        self.notify_state();
    }

    /// Record the real page count reported by the renderer.
    pub fn set_page_count(&mut self, key: &DocumentKey, page_count: u32) {
        if self.disposed {
            return;
        }
        if !self.store.contains(key) {
            warn!(document = %key, page_count, "page count reported for unknown document");
            return;
        }

        let state = self.store.get(key);
        let current_page = clamp_page(state.current_page, page_count);
        let active_page = clamp_page(state.active_scroll_page, page_count);
        let mut update = DocumentViewUpdate::new()
            .page_count(page_count)
            .current_page(current_page)
            .active_scroll_page(active_page);

        let window = if page_count > 0 {
            self.windows
                .compute(current_page, page_count, Some(&state.rendered_pages))
        } else {
            PageWindow::default()
        };
        update = update.rendered_pages(window.rendered).visible_pages(window.visible);

        if self.store.set(key, update) {
            self.notify_state();
        }
    }

    /// Set the workspace zoom level, clamped to the supported range.
    pub fn set_zoom(&mut self, zoom_level: u16) {
        if self.disposed {
            return;
        }
        let zoom_level = zoom_level.clamp(MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT);
        if zoom_level != self.zoom_level {
            self.zoom_level = zoom_level;
            self.notify_state();
        }
    }

    /// Explicit focus change requested by the surrounding application.
    pub fn focus_document(&mut self, key: &DocumentKey, now: Instant) -> bool {
        if self.disposed {
            return false;
        }
        self.tick(now);
        if !self.is_loaded(key) {
            warn!(document = %key, "focus requested for unknown document");
            return false;
        }
        if self.current.as_ref() == Some(key) {
            return false;
        }

        self.switch_current(key, now);
        self.notify_state();
        true
    }

    /// Scroll observation: resolve geometry and update state.
    ///
    /// Returns the resolved visibility, or `None` when suppressed or when no
    /// geometry is available.
    pub fn on_scroll(
        &mut self,
        now: Instant,
        geometry: &dyn GeometryProvider,
    ) -> Option<Visibility> {
        if self.disposed {
            return None;
        }
        self.tick(now);
        if self.is_file_switching() {
            trace!("scroll ignored during file switch");
            return None;
        }

        let Some(viewport) = geometry.viewport() else {
            trace!("scroll ignored: viewport not measurable");
            return None;
        };

        let candidates: Vec<_> = geometry
            .documents()
            .into_iter()
            .filter(|doc| self.is_loaded(&doc.key))
            .collect();

        let visibility = resolve(&viewport, &candidates, self.current.as_ref())?;
        let key = visibility.document_key.clone();

        let navigating = matches!(self.phase(&key), NavigationPhase::ProgrammaticNavigating(_));
        if !navigating {
            self.phases.insert(key.clone(), NavigationPhase::ScrollTracking);
            self.timers.reschedule(
                TimerKind::ScrollIdle(key.clone()),
                now + self.config.scroll_idle(),
            );
        }

        self.events
            .publish(&NavigationEvent::PageVisibilityChanged(PageVisibilityChanged {
                document_key: key.clone(),
                page_number: visibility.page,
                visibility_ratio: visibility.visibility_ratio,
                source_id: self.config.source_id.clone(),
                timestamp: now,
            }));

        let mut changed = false;
        if navigating {
            trace!(
                document = %key,
                page = visibility.page,
                "holding optimistic page during navigation"
            );
        } else {
            changed = self.apply_page(&key, visibility.page, now, true);
        }

        if self.current.as_ref() != Some(&key)
            && visibility.visibility_ratio > self.config.file_switch_threshold
        {
            self.switch_current(&key, now);
            changed = true;
        }

        if changed {
            self.notify_state();
        }

        Some(visibility)
    }

    /// Programmatic "scroll to page N".
    ///
    /// Applies the target optimistically, starts the host's smooth scroll and
    /// holds the page until the scroll settles or the navigation timeout
    /// elapses. A newer request replaces an older one.
    pub fn scroll_to_page(
        &mut self,
        key: &DocumentKey,
        page: PageNumber,
        now: Instant,
    ) -> Option<ScrollTicket> {
        if self.disposed {
            return None;
        }
        self.tick(now);
        if !self.is_loaded(key) {
            warn!(document = %key, page, "navigation requested for unknown document");
            return None;
        }

        let target = clamp_page(page, self.store.get(key).page_count);
        if target != page {
            debug!(document = %key, requested = page, clamped = target, "target clamped");
        }

        self.apply_page(key, target, now, true);
        if self.current.as_ref() != Some(key) {
            self.switch_current(key, now);
        }

        let options = ScrollOptions::smooth(self.config.scroll_align);
        let ticket = match self.scroller.scroll_to_page(key, target, options) {
            Ok(ticket) => {
                self.phases
                    .insert(key.clone(), NavigationPhase::ProgrammaticNavigating(ticket));
                self.timers.cancel_kind(&TimerKind::ScrollIdle(key.clone()));
                self.timers.reschedule(
                    TimerKind::NavigationTimeout(key.clone()),
                    now + self.config.navigation_timeout(),
                );
                Some(ticket)
            }
            Err(err) => {
                warn!(document = %key, page = target, error = %err, "scroll primitive failed");
                self.phases.insert(key.clone(), NavigationPhase::Idle);
                self.timers
                    .cancel_kind(&TimerKind::NavigationTimeout(key.clone()));
                None
            }
        };

        self.notify_state();
        ticket
    }

    /// Completion signal from the scroll primitive.
    ///
    /// Returns `false` for stale tickets superseded by a newer request.
    pub fn on_scroll_settled(&mut self, ticket: ScrollTicket, now: Instant) -> bool {
        if self.disposed {
            return false;
        }
        self.tick(now);

        let Some(key) = self
            .phases
            .iter()
            .find(|(_, phase)| **phase == NavigationPhase::ProgrammaticNavigating(ticket))
            .map(|(key, _)| key.clone())
        else {
            debug!(ticket = ticket.0, "ignoring stale scroll completion");
            return false;
        };

        self.phases.insert(key.clone(), NavigationPhase::Idle);
        self.timers.cancel_kind(&TimerKind::NavigationTimeout(key));
        true
    }

    /// Keyboard navigation on the current document.
    ///
    /// Returns `true` if a navigation was started.
    pub fn handle_key(&mut self, key: NavigationKey, now: Instant) -> bool {
        if self.disposed {
            return false;
        }
        self.tick(now);
        let Some(document) = self.current.clone() else {
            return false;
        };

        let state = self.store.get(&document);
        let target = match key {
            NavigationKey::ArrowDown | NavigationKey::PageDown => {
                if state.current_page >= state.page_count {
                    return false;
                }
                state.current_page + 1
            }
            NavigationKey::ArrowUp | NavigationKey::PageUp => {
                if state.current_page <= 1 {
                    return false;
                }
                state.current_page - 1
            }
            NavigationKey::Home => 1,
            NavigationKey::End => state.page_count.max(1),
        };

        if target == state.current_page {
            return false;
        }

        self.scroll_to_page(&document, target, now);
        true
    }

    /// Apply a navigation event broadcast by another component.
    ///
    /// Never re-emits: we are the receiver, not the originator. Returns `true`
    /// if the event was applied.
    pub fn handle_external_event(&mut self, event: &NavigationEvent, now: Instant) -> bool {
        if self.disposed {
            return false;
        }
        self.tick(now);

        let NavigationEvent::PageChanged(event) = event else {
            return false;
        };

        if event.source_id == self.config.source_id {
            debug!(document = %event.document_key, "dropping echo of own page-changed event");
            return false;
        }
        if self.guard.should_suppress(&event.source_id, now) {
            debug!(source = %event.source_id, "page-changed suppressed by guard");
            return false;
        }
        if !self.is_loaded(&event.document_key) {
            debug!(document = %event.document_key, "page-changed for document not loaded");
            return false;
        }

        let key = event.document_key.clone();
        self.apply_page(&key, event.page_number, now, false);
        if self.current.as_ref() != Some(&key) {
            self.switch_current(&key, now);
        }

        self.notify_state();
        true
    }

    /// Fire every timer due at `now`. Returns how many fired.
    ///
    /// Entry points call this themselves; hosts only need it to advance time
    /// while no other input arrives.
    pub fn tick(&mut self, now: Instant) -> usize {
        if self.disposed {
            return 0;
        }

        let fired = self.timers.pop_due(now);
        let count = fired.len();

        for timer in fired {
            match timer {
                TimerKind::GuardRelease => self.guard.end_dispatch(),
                TimerKind::FileSwitchGrace => debug!("file switch grace period over"),
                TimerKind::NavigationTimeout(key) => {
                    if matches!(self.phase(&key), NavigationPhase::ProgrammaticNavigating(_)) {
                        debug!(document = %key, "navigation timed out before scroll settled");
                        self.phases.insert(key, NavigationPhase::Idle);
                    }
                }
                TimerKind::ScrollIdle(key) => {
                    if self.phase(&key) == NavigationPhase::ScrollTracking {
                        self.phases.insert(key, NavigationPhase::Idle);
                    }
                }
            }
        }

        count
    }

    /// Cancel every timer and drop all subscribers. Later calls are no-ops.
    pub fn teardown(&mut self) {
        let cancelled = self.timers.cancel_all();
        self.guard.reset();
        self.events.clear();
        self.observers.clear();
        for phase in self.phases.values_mut() {
            *phase = NavigationPhase::Idle;
        }
        self.disposed = true;
        debug!(cancelled, "viewport coordinator torn down");
    }

    fn is_loaded(&self, key: &DocumentKey) -> bool {
        self.store.contains(key) && self.registry.contains(key)
    }

    /// Move `key` to `page` (clamped) and recompute its windows.
    ///
    /// Returns `false` when the page was already current and active.
    fn apply_page(
        &mut self,
        key: &DocumentKey,
        page: PageNumber,
        now: Instant,
        broadcast: bool,
    ) -> bool {
        let state = self.store.get(key);
        let page = clamp_page(page, state.page_count);

        if state.current_page == page && state.active_scroll_page == page {
            return false;
        }

        let mut update = DocumentViewUpdate::new().page(page);
        if state.page_count > 0 {
            let window = self
                .windows
                .compute(page, state.page_count, Some(&state.rendered_pages));
            let diff = window.diff(&state.rendered_pages);
            if !diff.is_empty() {
                trace!(
                    document = %key,
                    mounted = ?diff.mounted,
                    unmounted = ?diff.unmounted,
                    "render window moved"
                );
            }
            update = update.rendered_pages(window.rendered).visible_pages(window.visible);
        }

        self.store.set(key, update);

        if broadcast && state.current_page != page {
            self.broadcast_page_changed(key, page, now);
        }
        true
    }

    fn broadcast_page_changed(&mut self, key: &DocumentKey, page: PageNumber, now: Instant) {
        let source_id = self.config.source_id.clone();
        self.guard.begin_dispatch(&source_id, now);
        self.timers
            .reschedule(TimerKind::GuardRelease, now + self.config.guard_release_delay());

        self.events.publish(&NavigationEvent::PageChanged(PageChanged {
            document_key: key.clone(),
            page_number: page,
            source_id,
            timestamp: now,
        }));
    }

    fn switch_current(&mut self, key: &DocumentKey, now: Instant) {
        info!(
            from = self.current.as_ref().map(DocumentKey::as_str).unwrap_or("<none>"),
            to = %key,
            "switching current document"
        );
        self.current = Some(key.clone());
        self.registry.set_current_document(key);
        self.timers
            .reschedule(TimerKind::FileSwitchGrace, now + self.config.file_switch_grace());
    }

    fn notify_state(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let view = self.workspace_view();
        self.observers.publish(&view);
    }
}
