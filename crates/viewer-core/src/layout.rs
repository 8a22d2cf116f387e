//! Continuous multi-document layout
//!
//! Stacks every open document's pages top to bottom in one scrollable surface
//! and turns a scroll offset into the element geometry the resolver consumes.
//! Hosts that already measure real elements do not need this; it backs the
//! replay tool and tests.

use crate::geometry::{DocumentGeometry, GeometrySnapshot, PageGeometry, Rect};
use crate::types::{DocumentKey, PageNumber};

/// Default gap between pages of one document, in pixels.
pub const DEFAULT_PAGE_GAP: f32 = 16.0;

/// Default gap between consecutive documents, in pixels.
pub const DEFAULT_DOCUMENT_GAP: f32 = 48.0;

/// Default page width used for the produced rectangles.
pub const DEFAULT_PAGE_WIDTH: f32 = 800.0;

#[derive(Debug, Clone, PartialEq)]
struct LayoutDocument {
    key: DocumentKey,
    page_heights: Vec<f32>,
}

impl LayoutDocument {
    fn height(&self, page_gap: f32) -> f32 {
        let pages: f32 = self.page_heights.iter().sum();
        let gaps = self.page_heights.len().saturating_sub(1) as f32 * page_gap;
        pages + gaps
    }
}

/// Vertical stack of documents in a single scroll surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousLayout {
    documents: Vec<LayoutDocument>,
    page_gap: f32,
    document_gap: f32,
    page_width: f32,
}

impl Default for ContinuousLayout {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            page_gap: DEFAULT_PAGE_GAP,
            document_gap: DEFAULT_DOCUMENT_GAP,
            page_width: DEFAULT_PAGE_WIDTH,
        }
    }
}

impl ContinuousLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_gap(mut self, gap: f32) -> Self {
        self.page_gap = gap.max(0.0);
        self
    }

    pub fn with_document_gap(mut self, gap: f32) -> Self {
        self.document_gap = gap.max(0.0);
        self
    }

    /// Append a document, or replace its pages if the key is already present.
    pub fn push_document(&mut self, key: DocumentKey, page_heights: Vec<f32>) {
        let page_heights = page_heights.into_iter().map(|height| height.max(0.0)).collect();

        match self.documents.iter_mut().find(|doc| doc.key == key) {
            Some(existing) => existing.page_heights = page_heights,
            None => self.documents.push(LayoutDocument { key, page_heights }),
        }
    }

    pub fn remove_document(&mut self, key: &DocumentKey) -> bool {
        let before = self.documents.len();
        self.documents.retain(|doc| doc.key != *key);
        self.documents.len() != before
    }

    pub fn page_count(&self, key: &DocumentKey) -> Option<u32> {
        self.documents
            .iter()
            .find(|doc| doc.key == *key)
            .map(|doc| doc.page_heights.len() as u32)
    }

    pub fn document_keys(&self) -> Vec<DocumentKey> {
        self.documents.iter().map(|doc| doc.key.clone()).collect()
    }

    pub fn total_height(&self) -> f32 {
        let docs: f32 = self.documents.iter().map(|doc| doc.height(self.page_gap)).sum();
        let gaps = self.documents.len().saturating_sub(1) as f32 * self.document_gap;
        docs + gaps
    }

    /// Largest valid scroll offset for a viewport of the given height.
    pub fn max_scroll(&self, viewport_height: f32) -> f32 {
        (self.total_height() - viewport_height).max(0.0)
    }

    /// Top of a document container in surface coordinates.
    pub fn document_offset(&self, key: &DocumentKey) -> Option<f32> {
        let mut cursor = 0.0;
        for doc in &self.documents {
            if doc.key == *key {
                return Some(cursor);
            }
            cursor += doc.height(self.page_gap) + self.document_gap;
        }
        None
    }

    /// Top of a page in surface coordinates; out-of-range pages are clamped.
    pub fn page_offset(&self, key: &DocumentKey, page: PageNumber) -> Option<f32> {
        let top = self.document_offset(key)?;
        let doc = self.documents.iter().find(|doc| doc.key == *key)?;
        if doc.page_heights.is_empty() {
            return Some(top);
        }

        let index = (page.max(1) as usize - 1).min(doc.page_heights.len() - 1);
        let mut cursor = top;
        for height in &doc.page_heights[..index] {
            cursor += height + self.page_gap;
        }
        Some(cursor)
    }

    /// Geometry of the whole surface as seen through a viewport scrolled to
    /// `scroll_offset`.
    pub fn snapshot(&self, scroll_offset: f32, viewport_height: f32) -> GeometrySnapshot {
        let viewport = Rect::new(0.0, scroll_offset.max(0.0), self.page_width, viewport_height);
        let mut documents = Vec::with_capacity(self.documents.len());
        let mut cursor = 0.0;

        for doc in &self.documents {
            let height = doc.height(self.page_gap);
            let mut page_cursor = cursor;
            let pages = doc
                .page_heights
                .iter()
                .enumerate()
                .map(|(index, page_height)| {
                    let rect = Rect::new(0.0, page_cursor, self.page_width, *page_height);
                    page_cursor += page_height + self.page_gap;
                    PageGeometry {
                        page: index as PageNumber + 1,
                        rect,
                    }
                })
                .collect();

            documents.push(DocumentGeometry {
                key: doc.key.clone(),
                rect: Rect::new(0.0, cursor, self.page_width, height),
                pages,
            });

            cursor += height + self.document_gap;
        }

        GeometrySnapshot {
            viewport: Some(viewport),
            documents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::resolve_from;

    fn layout() -> ContinuousLayout {
        let mut layout = ContinuousLayout::new().with_page_gap(100.0).with_document_gap(200.0);
        layout.push_document(DocumentKey::from("a"), vec![1000.0; 3]);
        layout.push_document(DocumentKey::from("b"), vec![1000.0; 5]);
        layout
    }

    #[test]
    fn offsets_account_for_page_and_document_gaps() {
        let layout = layout();
        let b = DocumentKey::from("b");

        assert_eq!(layout.document_offset(&DocumentKey::from("a")), Some(0.0));
        // A is 3 pages + 2 gaps = 3200px, then a 200px document gap.
        assert_eq!(layout.document_offset(&b), Some(3400.0));
        assert_eq!(layout.page_offset(&b, 2), Some(4500.0));
        assert_eq!(layout.page_offset(&b, 99), Some(7800.0));
        assert_eq!(layout.total_height(), 3400.0 + 5400.0);
    }

    #[test]
    fn snapshot_feeds_the_resolver() {
        let layout = layout();
        let snapshot = layout.snapshot(4500.0, 1000.0);
        let result = resolve_from(&snapshot, None).unwrap();

        assert_eq!(result.document_key, DocumentKey::from("b"));
        assert_eq!(result.page, 2);
        assert_eq!(result.visibility_ratio, 1.0);
    }

    #[test]
    fn push_existing_key_replaces_pages() {
        let mut layout = layout();
        layout.push_document(DocumentKey::from("a"), vec![500.0]);

        assert_eq!(layout.page_count(&DocumentKey::from("a")), Some(1));
        assert_eq!(layout.document_keys().len(), 2);
        assert!(layout.remove_document(&DocumentKey::from("a")));
        assert!(!layout.remove_document(&DocumentKey::from("a")));
    }

    #[test]
    fn max_scroll_never_negative() {
        let mut layout = ContinuousLayout::new();
        layout.push_document(DocumentKey::from("short"), vec![300.0]);
        assert_eq!(layout.max_scroll(1000.0), 0.0);
    }
}
