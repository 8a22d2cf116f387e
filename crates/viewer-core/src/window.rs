//! Virtualization window calculation
//!
//! Decides which pages of a document must stay mounted and which are treated
//! as on-screen. The visible window is a strict radius around the center page.
//! The rendered window additionally keeps previously mounted pages that are
//! still within `radius + 1` of the center, so that small scroll deltas do not
//! unmount and remount the same boundary page over and over.

use crate::types::PageNumber;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default number of pages on each side of the center page.
pub const DEFAULT_WINDOW_RADIUS: u32 = 2;

/// Mounted and visible page sets for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    pub rendered: BTreeSet<PageNumber>,
    pub visible: BTreeSet<PageNumber>,
}

impl PageWindow {
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty() && self.visible.is_empty()
    }

    /// Pages that became mounted or unmounted relative to `previous`.
    pub fn diff(&self, previous: &BTreeSet<PageNumber>) -> WindowDiff {
        WindowDiff {
            mounted: self.rendered.difference(previous).copied().collect(),
            unmounted: previous.difference(&self.rendered).copied().collect(),
        }
    }
}

/// Mount/unmount delta between two rendered windows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowDiff {
    pub mounted: Vec<PageNumber>,
    pub unmounted: Vec<PageNumber>,
}

impl WindowDiff {
    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty() && self.unmounted.is_empty()
    }
}

/// Compute the window around `center_page`.
///
/// `prior_rendered` is the caller's current rendered set; pages from it that
/// are still within `radius + 1` of the (clamped) center are kept mounted.
/// A document without pages yields an empty window.
pub fn compute_window(
    center_page: PageNumber,
    page_count: u32,
    radius: u32,
    prior_rendered: Option<&BTreeSet<PageNumber>>,
) -> PageWindow {
    if page_count == 0 {
        return PageWindow::default();
    }

    let center = center_page.clamp(1, page_count);
    let first = center.saturating_sub(radius).max(1);
    let last = center.saturating_add(radius).min(page_count);

    let visible: BTreeSet<PageNumber> = (first..=last).collect();
    let mut rendered = visible.clone();

    if let Some(prior) = prior_rendered {
        let keep_distance = radius.saturating_add(1);
        rendered.extend(
            prior
                .iter()
                .copied()
                .filter(|page| (1..=page_count).contains(page))
                .filter(|page| page.abs_diff(center) <= keep_distance),
        );
    }

    PageWindow { rendered, visible }
}

/// Window calculator bound to a configured radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCalculator {
    radius: u32,
}

impl WindowCalculator {
    pub fn new(radius: u32) -> Self {
        Self { radius }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn compute(
        &self,
        center_page: PageNumber,
        page_count: u32,
        prior_rendered: Option<&BTreeSet<PageNumber>>,
    ) -> PageWindow {
        compute_window(center_page, page_count, self.radius, prior_rendered)
    }
}

impl Default for WindowCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_RADIUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(pages: &[u32]) -> BTreeSet<u32> {
        pages.iter().copied().collect()
    }

    #[test]
    fn window_centers_on_requested_page() {
        let window = compute_window(7, 10, 2, None);
        assert_eq!(window.visible, set(&[5, 6, 7, 8, 9]));
        assert_eq!(window.rendered, window.visible);
    }

    #[test]
    fn window_is_cut_at_document_edges() {
        assert_eq!(compute_window(1, 10, 2, None).visible, set(&[1, 2, 3]));
        assert_eq!(compute_window(10, 10, 2, None).visible, set(&[8, 9, 10]));
        assert_eq!(compute_window(2, 3, 5, None).visible, set(&[1, 2, 3]));
    }

    #[test]
    fn empty_document_has_empty_window() {
        let window = compute_window(4, 0, 2, Some(&set(&[1, 2, 3])));
        assert!(window.is_empty());
    }

    #[test]
    fn out_of_range_center_is_clamped() {
        assert_eq!(compute_window(0, 5, 1, None).visible, set(&[1, 2]));
        assert_eq!(compute_window(99, 5, 1, None).visible, set(&[4, 5]));
    }

    #[test]
    fn hysteresis_keeps_boundary_page_after_one_step() {
        let before = compute_window(5, 20, 2, None);
        let after = compute_window(6, 20, 2, Some(&before.rendered));

        assert_eq!(after.visible, set(&[4, 5, 6, 7, 8]));
        // Page 3 sits exactly radius + 1 away from the new center.
        assert_eq!(after.rendered, set(&[3, 4, 5, 6, 7, 8]));

        let diff = after.diff(&before.rendered);
        assert_eq!(diff.mounted, vec![8]);
        assert!(diff.unmounted.is_empty());
    }

    #[test]
    fn hysteresis_drops_far_pages() {
        let prior = set(&[1, 2, 3, 4, 5, 6, 7]);
        let window = compute_window(10, 20, 2, Some(&prior));

        assert_eq!(window.rendered, set(&[7, 8, 9, 10, 11, 12]));
        let diff = window.diff(&prior);
        assert_eq!(diff.unmounted, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn prior_pages_beyond_page_count_are_dropped() {
        let window = compute_window(3, 3, 2, Some(&set(&[4, 5])));
        assert_eq!(window.rendered, set(&[1, 2, 3]));
    }

    #[test]
    fn calculator_uses_configured_radius() {
        let calculator = WindowCalculator::new(1);
        assert_eq!(calculator.radius(), 1);
        assert_eq!(calculator.compute(5, 10, None).visible, set(&[4, 5, 6]));
        assert_eq!(WindowCalculator::default().radius(), DEFAULT_WINDOW_RADIUS);
    }

    proptest! {
        #[test]
        fn visible_is_subset_of_rendered_and_in_bounds(
            center in 0u32..250,
            page_count in 0u32..200,
            radius in 0u32..8,
            prior in proptest::collection::btree_set(0u32..260, 0..20),
        ) {
            let window = compute_window(center, page_count, radius, Some(&prior));

            prop_assert!(window.visible.is_subset(&window.rendered));
            for page in &window.rendered {
                prop_assert!(*page >= 1 && *page <= page_count);
            }
        }

        #[test]
        fn compute_is_idempotent_without_prior(
            center in 1u32..200,
            page_count in 0u32..200,
            radius in 0u32..8,
        ) {
            let first = compute_window(center, page_count, radius, None);
            let second = compute_window(center, page_count, radius, None);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn single_step_only_changes_boundary_pages(
            center in 1u32..150,
            page_count in 1u32..150,
            radius in 0u32..6,
            forward in any::<bool>(),
        ) {
            let center = center.min(page_count);
            let next = if forward {
                (center + 1).min(page_count)
            } else {
                center.saturating_sub(1).max(1)
            };

            let before = compute_window(center, page_count, radius, None);
            let after = compute_window(next, page_count, radius, Some(&before.rendered));
            let diff = after.diff(&before.rendered);

            prop_assert!(diff.mounted.len() <= 1);
            prop_assert!(diff.unmounted.is_empty());
            for page in &after.rendered {
                prop_assert!(page.abs_diff(next) <= radius + 1);
            }
        }
    }
}
