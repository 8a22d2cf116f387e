//! Cross-component navigation events
//!
//! Two application-level events leave the coordinator: `page-changed` when a
//! document's current page moves, and `page-visibility-changed` on every
//! geometry recomputation. Both carry the originating [`SourceId`] and a
//! timestamp, which is what the [`NavigationEventGuard`](crate::NavigationEventGuard)
//! keys on.

use crate::types::{DocumentKey, PageNumber};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// Identity of the component that dispatched an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh id unique to this process.
    pub fn generate() -> Self {
        Self(format!("viewport-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageChanged {
    pub document_key: DocumentKey,
    pub page_number: PageNumber,
    pub source_id: SourceId,
    #[serde(skip)]
    pub timestamp: Instant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageVisibilityChanged {
    pub document_key: DocumentKey,
    pub page_number: PageNumber,
    pub visibility_ratio: f32,
    pub source_id: SourceId,
    #[serde(skip)]
    pub timestamp: Instant,
}

/// Event published on the navigation bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NavigationEvent {
    PageChanged(PageChanged),
    PageVisibilityChanged(PageVisibilityChanged),
}

impl NavigationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PageChanged(_) => "page-changed",
            Self::PageVisibilityChanged(_) => "page-visibility-changed",
        }
    }

    pub fn document_key(&self) -> &DocumentKey {
        match self {
            Self::PageChanged(event) => &event.document_key,
            Self::PageVisibilityChanged(event) => &event.document_key,
        }
    }

    pub fn page_number(&self) -> PageNumber {
        match self {
            Self::PageChanged(event) => event.page_number,
            Self::PageVisibilityChanged(event) => event.page_number,
        }
    }

    pub fn source_id(&self) -> &SourceId {
        match self {
            Self::PageChanged(event) => &event.source_id,
            Self::PageVisibilityChanged(event) => &event.source_id,
        }
    }

    pub fn timestamp(&self) -> Instant {
        match self {
            Self::PageChanged(event) => event.timestamp,
            Self::PageVisibilityChanged(event) => event.timestamp,
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
pub type SubscriptionId = u64;

/// Ordered list of listeners notified synchronously.
pub struct Subscribers<T: ?Sized> {
    next_id: SubscriptionId,
    listeners: Vec<(SubscriptionId, Box<dyn FnMut(&T)>)>,
}

impl<T: ?Sized> Subscribers<T> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Notify every listener in subscription order.
    pub fn publish(&mut self, value: &T) {
        for (_, listener) in &mut self.listeners {
            listener(value);
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<T: ?Sized> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Publish/subscribe channel for [`NavigationEvent`]s.
pub type EventBus = Subscribers<NavigationEvent>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn page_changed(page: PageNumber) -> NavigationEvent {
        NavigationEvent::PageChanged(PageChanged {
            document_key: DocumentKey::from("a.pdf"),
            page_number: page,
            source_id: SourceId::new("viewer"),
            timestamp: Instant::now(),
        })
    }

    #[test]
    fn listeners_receive_events_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let first = Rc::clone(&seen);
        bus.subscribe(move |event: &NavigationEvent| {
            first.borrow_mut().push(("first", event.page_number()))
        });
        let second = Rc::clone(&seen);
        bus.subscribe(move |event: &NavigationEvent| {
            second.borrow_mut().push(("second", event.page_number()))
        });

        bus.publish(&page_changed(4));

        assert_eq!(*seen.borrow(), vec![("first", 4), ("second", 4)]);
    }

    #[test]
    fn unsubscribed_listener_stops_receiving() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();

        let counter = Rc::clone(&count);
        let id = bus.subscribe(move |_: &NavigationEvent| *counter.borrow_mut() += 1);

        bus.publish(&page_changed(1));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&page_changed(2));

        assert_eq!(*count.borrow(), 1);
        assert!(bus.is_empty());
    }

    #[test]
    fn events_serialize_with_kebab_case_kind() {
        let value = serde_json::to_value(page_changed(3)).unwrap();

        assert_eq!(value["kind"], "page-changed");
        assert_eq!(value["document_key"], "a.pdf");
        assert_eq!(value["page_number"], 3);
        assert_eq!(value["source_id"], "viewer");
        assert!(value.get("timestamp").is_none());
    }

    #[test]
    fn generated_source_ids_are_unique() {
        let first = SourceId::generate();
        let second = SourceId::generate();

        assert_ne!(first, second);
        assert!(first.as_str().starts_with("viewport-"));
    }
}
