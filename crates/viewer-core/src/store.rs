//! Per-document navigation state
//!
//! [`DocumentViewStateStore`] is an arena of [`DocumentViewState`] records keyed
//! by [`DocumentKey`]. It has no side effects of its own: the coordinator is the
//! only writer, and the workspace mirror ([`WorkspaceViewState`]) is derived
//! from the store on read so the two can never drift apart.

use crate::types::{DocumentKey, PageNumber};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Navigation state of one open document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentViewState {
    pub page_count: u32,
    pub current_page: PageNumber,
    /// Page judged most visible by geometry; may lag `current_page` while a
    /// programmatic jump is animating.
    pub active_scroll_page: PageNumber,
    pub rendered_pages: BTreeSet<PageNumber>,
    pub visible_pages: BTreeSet<PageNumber>,
}

impl Default for DocumentViewState {
    fn default() -> Self {
        Self {
            page_count: 0,
            current_page: 1,
            active_scroll_page: 1,
            rendered_pages: BTreeSet::from([1]),
            visible_pages: BTreeSet::from([1, 2, 3]),
        }
    }
}

/// Partial update merged into a [`DocumentViewState`].
///
/// Fields left as `None` keep their previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentViewUpdate {
    pub page_count: Option<u32>,
    pub current_page: Option<PageNumber>,
    pub active_scroll_page: Option<PageNumber>,
    pub rendered_pages: Option<BTreeSet<PageNumber>>,
    pub visible_pages: Option<BTreeSet<PageNumber>>,
}

impl DocumentViewUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_count(mut self, page_count: u32) -> Self {
        self.page_count = Some(page_count);
        self
    }

    pub fn current_page(mut self, page: PageNumber) -> Self {
        self.current_page = Some(page);
        self
    }

    pub fn active_scroll_page(mut self, page: PageNumber) -> Self {
        self.active_scroll_page = Some(page);
        self
    }

    /// Set both the current and the active scroll page.
    pub fn page(self, page: PageNumber) -> Self {
        self.current_page(page).active_scroll_page(page)
    }

    pub fn rendered_pages(mut self, pages: BTreeSet<PageNumber>) -> Self {
        self.rendered_pages = Some(pages);
        self
    }

    pub fn visible_pages(mut self, pages: BTreeSet<PageNumber>) -> Self {
        self.visible_pages = Some(pages);
        self
    }

    fn apply(self, state: &mut DocumentViewState) -> bool {
        let before = state.clone();

        if let Some(page_count) = self.page_count {
            state.page_count = page_count;
        }
        if let Some(page) = self.current_page {
            state.current_page = page;
        }
        if let Some(page) = self.active_scroll_page {
            state.active_scroll_page = page;
        }
        if let Some(pages) = self.rendered_pages {
            state.rendered_pages = pages;
        }
        if let Some(pages) = self.visible_pages {
            state.visible_pages = pages;
        }

        *state != before
    }
}

/// Arena of per-document view state.
#[derive(Debug, Clone, Default)]
pub struct DocumentViewStateStore {
    documents: HashMap<DocumentKey, DocumentViewState>,
}

impl DocumentViewStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for `key`, or the defaults if the document was never seen.
    pub fn get(&self, key: &DocumentKey) -> DocumentViewState {
        self.documents.get(key).cloned().unwrap_or_default()
    }

    /// Merge `update` into the state for `key`, creating it if needed.
    ///
    /// Returns `true` if any field changed.
    pub fn set(&mut self, key: &DocumentKey, update: DocumentViewUpdate) -> bool {
        let created = !self.documents.contains_key(key);
        let state = self.documents.entry(key.clone()).or_default();
        update.apply(state) || created
    }

    /// Register `key` with default state if it is not already known.
    pub fn insert_default(&mut self, key: &DocumentKey) -> bool {
        if self.documents.contains_key(key) {
            return false;
        }
        self.documents.insert(key.clone(), DocumentViewState::default());
        true
    }

    pub fn remove(&mut self, key: &DocumentKey) -> Option<DocumentViewState> {
        self.documents.remove(key)
    }

    pub fn contains(&self, key: &DocumentKey) -> bool {
        self.documents.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &DocumentKey> {
        self.documents.keys()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Mirror of the current document for consumers that only know about "the"
/// active document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceViewState {
    pub current_document_key: Option<DocumentKey>,
    pub num_pages: u32,
    pub current_page: PageNumber,
    pub active_scroll_page: PageNumber,
    pub rendered_pages: BTreeSet<PageNumber>,
    pub visible_pages: BTreeSet<PageNumber>,
    pub zoom_level: u16,
}

impl WorkspaceViewState {
    /// Derive the mirror from the store and the current document key.
    pub fn derive(
        store: &DocumentViewStateStore,
        current_document_key: Option<&DocumentKey>,
        zoom_level: u16,
    ) -> Self {
        let state = current_document_key
            .map(|key| store.get(key))
            .unwrap_or_default();

        Self {
            current_document_key: current_document_key.cloned(),
            num_pages: state.page_count,
            current_page: state.current_page,
            active_scroll_page: state.active_scroll_page,
            rendered_pages: state.rendered_pages,
            visible_pages: state.visible_pages,
            zoom_level,
        }
    }

    /// Whether the mirrored fields equal `state`.
    pub fn mirrors(&self, state: &DocumentViewState) -> bool {
        self.num_pages == state.page_count
            && self.current_page == state.current_page
            && self.active_scroll_page == state.active_scroll_page
            && self.rendered_pages == state.rendered_pages
            && self.visible_pages == state.visible_pages
    }
}
