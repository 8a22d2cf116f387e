//! Visibility resolution from element geometry
//!
//! Maps the bounding boxes of mounted document and page containers to a
//! "most visible" judgment. Each element is scored by the height of its
//! vertical overlap with the viewport, weighted by how close the visible slice
//! sits to the viewport's midpoint. Horizontal extent is ignored: documents
//! and pages are stacked in a single column. The best document wins, then the
//! same scoring picks the best page inside it.

use crate::types::{DocumentKey, PageNumber};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Axis-aligned rectangle in surface coordinates (y grows downward).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn mid_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Height of the vertical overlap with `other` (0 if disjoint).
    pub fn vertical_overlap(&self, other: &Rect) -> f32 {
        (self.bottom().min(other.bottom()) - self.top().max(other.top())).max(0.0)
    }

    fn is_measurable(&self) -> bool {
        self.height > 0.0 && self.height.is_finite() && self.y.is_finite()
    }
}

/// Bounding box of one mounted page element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page: PageNumber,
    pub rect: Rect,
}

/// Bounding box of one mounted document container and its pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentGeometry {
    pub key: DocumentKey,
    pub rect: Rect,
    pub pages: Vec<PageGeometry>,
}

/// Outcome of a visibility resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visibility {
    pub document_key: DocumentKey,
    pub page: PageNumber,
    /// Visible fraction of the winning page, in `0.0..=1.0`.
    pub visibility_ratio: f32,
}

/// Source of element geometry, typically the rendering collaborator.
///
/// Returning `None` for the viewport, or omitting an unmounted container,
/// is how missing geometry is reported; the resolver then yields nothing.
pub trait GeometryProvider {
    fn viewport(&self) -> Option<Rect>;
    fn documents(&self) -> Vec<DocumentGeometry>;
}

/// Owned geometry captured at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometrySnapshot {
    pub viewport: Option<Rect>,
    pub documents: Vec<DocumentGeometry>,
}

impl GeometryProvider for GeometrySnapshot {
    fn viewport(&self) -> Option<Rect> {
        self.viewport
    }

    fn documents(&self) -> Vec<DocumentGeometry> {
        self.documents.clone()
    }
}

/// Overlap height weighted by the proximity of the visible slice to the
/// viewport's midpoint; zero when nothing overlaps.
///
/// The slice, not the whole element, is measured so that a long element
/// covering the viewport is never penalized for extending far past it.
pub fn visibility_score(viewport: &Rect, element: &Rect) -> f32 {
    let top = element.top().max(viewport.top());
    let bottom = element.bottom().min(viewport.bottom());
    let overlap = bottom - top;
    if overlap <= 0.0 {
        return 0.0;
    }

    let distance = ((top + bottom) / 2.0 - viewport.mid_y()).abs();
    let proximity = 1.0 / (1.0 + distance / viewport.height);
    overlap * proximity
}

/// Resolve the most visible document and page.
///
/// Exact document ties prefer `previous` (stability bias at boundaries), then
/// the earlier candidate. Page ties prefer the lower page number.
pub fn resolve(
    viewport: &Rect,
    candidates: &[DocumentGeometry],
    previous: Option<&DocumentKey>,
) -> Option<Visibility> {
    if !viewport.is_measurable() {
        return None;
    }

    let mut best: Option<(&DocumentGeometry, f32)> = None;
    for candidate in candidates.iter().filter(|doc| doc.rect.is_measurable()) {
        let score = visibility_score(viewport, &candidate.rect);
        if score <= 0.0 {
            continue;
        }

        best = match best {
            None => Some((candidate, score)),
            Some((current, best_score)) => match score.partial_cmp(&best_score) {
                Some(Ordering::Greater) => Some((candidate, score)),
                Some(Ordering::Equal) if previous == Some(&candidate.key) => {
                    Some((candidate, score))
                }
                _ => Some((current, best_score)),
            },
        };
    }

    let (document, _) = best?;
    let (page, ratio) = most_visible_page(viewport, &document.pages)?;

    Some(Visibility {
        document_key: document.key.clone(),
        page,
        visibility_ratio: ratio,
    })
}

fn most_visible_page(viewport: &Rect, pages: &[PageGeometry]) -> Option<(PageNumber, f32)> {
    let mut best: Option<(&PageGeometry, f32)> = None;

    for page in pages.iter().filter(|page| page.rect.is_measurable()) {
        let score = visibility_score(viewport, &page.rect);
        if score <= 0.0 {
            continue;
        }

        let replace = match best {
            None => true,
            Some((current, best_score)) => match score.partial_cmp(&best_score) {
                Some(Ordering::Greater) => true,
                Some(Ordering::Equal) => page.page < current.page,
                _ => false,
            },
        };

        if replace {
            best = Some((page, score));
        }
    }

    best.map(|(page, _)| {
        let ratio = (page.rect.vertical_overlap(viewport) / page.rect.height).clamp(0.0, 1.0);
        (page.page, ratio)
    })
}

/// Resolve against a [`GeometryProvider`].
pub fn resolve_from(
    provider: &dyn GeometryProvider,
    previous: Option<&DocumentKey>,
) -> Option<Visibility> {
    let viewport = provider.viewport()?;
    resolve(&viewport, &provider.documents(), previous)
}
