//! Multi-document viewport synchronization.
//!
//! A workspace shows several paged documents in one continuously scrolling
//! viewport. This crate keeps per-document page state consistent with what is
//! on screen and with navigation requests from elsewhere in the application:
//!
//! - [`geometry`] decides which document and page are "current" from measured
//!   rectangles.
//! - [`window`] computes the pages to keep mounted and visible around a center.
//! - [`store`] holds per-document state plus the derived workspace mirror.
//! - [`guard`] keeps broadcast navigation events from echoing back.
//! - [`coordinator`] ties it all together as a single-threaded state machine.
//!
//! ```
//! use std::time::Instant;
//! use viewer_core::{
//!     ContinuousLayout, DocumentKey, FileRegistry, ScrollOptions, ScrollPrimitive, ScrollError,
//!     ScrollTicket, SyncConfig, VecRegistry, ViewportCoordinator,
//! };
//!
//! struct InstantScroll;
//! impl ScrollPrimitive for InstantScroll {
//!     fn scroll_to_page(
//!         &mut self,
//!         _key: &DocumentKey,
//!         _page: u32,
//!         _options: ScrollOptions,
//!     ) -> Result<ScrollTicket, ScrollError> {
//!         Ok(ScrollTicket(1))
//!     }
//! }
//!
//! let doc = DocumentKey::from("report.pdf");
//! let mut registry = VecRegistry::new();
//! registry.open(doc.clone());
//!
//! let mut coordinator = ViewportCoordinator::new(SyncConfig::new(), registry, InstantScroll);
//! coordinator.open_document(doc.clone());
//! coordinator.set_page_count(&doc, 10);
//!
//! let mut layout = ContinuousLayout::new();
//! layout.push_document(doc.clone(), vec![1000.0; 10]);
//! let offset = layout.page_offset(&doc, 5).unwrap_or_default();
//!
//! coordinator.on_scroll(Instant::now(), &layout.snapshot(offset, 1000.0));
//! assert_eq!(coordinator.workspace_view().current_page, 5);
//! assert!(coordinator.registry().contains(&doc));
//! ```

pub mod collaborators;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod geometry;
pub mod guard;
pub mod layout;
pub mod store;
pub mod types;
pub mod window;

pub use collaborators::{
    FileRegistry, ScrollAlign, ScrollOptions, ScrollPrimitive, ScrollTicket, VecRegistry,
};
pub use config::SyncConfig;
pub use coordinator::{
    NavigationKey, NavigationPhase, ViewportCoordinator, DEFAULT_ZOOM_PERCENT, MAX_ZOOM_PERCENT,
    MIN_ZOOM_PERCENT,
};
pub use error::{ConfigError, ScrollError};
pub use events::{
    EventBus, NavigationEvent, PageChanged, PageVisibilityChanged, SourceId, Subscribers,
    SubscriptionId,
};
pub use geometry::{
    resolve, resolve_from, visibility_score, DocumentGeometry, GeometryProvider,
    GeometrySnapshot, PageGeometry, Rect, Visibility,
};
pub use guard::NavigationEventGuard;
pub use layout::ContinuousLayout;
pub use store::{DocumentViewState, DocumentViewStateStore, DocumentViewUpdate, WorkspaceViewState};
pub use types::{clamp_page, DocumentKey, PageNumber};
pub use window::{compute_window, PageWindow, WindowCalculator, WindowDiff, DEFAULT_WINDOW_RADIUS};
