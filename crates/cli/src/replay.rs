//! Scenario replay.
//!
//! A scenario lists documents laid out one after another in a continuous
//! surface and a timeline of steps. Each step is applied to a
//! [`ViewportCoordinator`] at `start + at_ms`, with due timers fired first, and
//! the final state plus every published event is reported as JSON.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use viewer_core::{
    ContinuousLayout, DocumentKey, DocumentViewState, NavigationEvent, NavigationKey,
    NavigationPhase, PageChanged, PageNumber, ScrollError, ScrollOptions, ScrollPrimitive,
    ScrollTicket, SourceId, SyncConfig, VecRegistry, ViewportCoordinator, WorkspaceViewState,
};

const DEFAULT_PAGE_HEIGHT: f32 = 1000.0;
const DEFAULT_VIEWPORT_HEIGHT: f32 = 1000.0;

fn default_page_height() -> f32 {
    DEFAULT_PAGE_HEIGHT
}

fn default_viewport_height() -> f32 {
    DEFAULT_VIEWPORT_HEIGHT
}

fn default_external_source() -> SourceId {
    SourceId::new("external")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub config: Option<SyncConfig>,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f32,
    pub documents: Vec<ScenarioDocument>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioDocument {
    pub key: DocumentKey,
    pub pages: u32,
    #[serde(default = "default_page_height")]
    pub page_height: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Move the viewport. With `document` and `page` the position is that
    /// page's top plus `offset`; otherwise `offset` is absolute.
    Scroll {
        #[serde(default)]
        document: Option<DocumentKey>,
        #[serde(default)]
        page: Option<PageNumber>,
        #[serde(default)]
        offset: f32,
    },
    Jump {
        document: DocumentKey,
        page: PageNumber,
    },
    Key {
        key: NavigationKey,
    },
    External {
        document: DocumentKey,
        page: PageNumber,
        #[serde(default = "default_external_source")]
        source_id: SourceId,
    },
    /// Finish the most recent programmatic scroll.
    Settle,
    Focus {
        document: DocumentKey,
    },
    Open {
        document: DocumentKey,
        pages: u32,
        #[serde(default = "default_page_height")]
        page_height: f32,
    },
    Close {
        document: DocumentKey,
    },
    Zoom {
        level: u16,
    },
}

impl Scenario {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid scenario {}", path.display()))
    }
}

/// Host-side scroll primitive: animations complete only on `settle` steps.
///
/// At most one animation per document is in flight; a newer request for the
/// same document replaces the older one.
#[derive(Debug, Default)]
struct ReplayScroller {
    issued: u64,
    pending: Vec<(ScrollTicket, DocumentKey, PageNumber)>,
}

impl ScrollPrimitive for ReplayScroller {
    fn scroll_to_page(
        &mut self,
        key: &DocumentKey,
        page: PageNumber,
        _options: ScrollOptions,
    ) -> Result<ScrollTicket, ScrollError> {
        self.issued += 1;
        let ticket = ScrollTicket(self.issued);
        self.pending.retain(|(_, pending, _)| pending != key);
        self.pending.push((ticket, key.clone(), page));
        Ok(ticket)
    }
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub current_document: Option<DocumentKey>,
    pub workspace: WorkspaceViewState,
    pub documents: Vec<DocumentReport>,
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Serialize)]
pub struct DocumentReport {
    pub key: DocumentKey,
    pub phase: NavigationPhase,
    #[serde(flatten)]
    pub state: DocumentViewState,
}

#[derive(Debug, Serialize)]
pub struct EventRecord {
    pub at_ms: u128,
    #[serde(flatten)]
    pub event: NavigationEvent,
}

/// Replay `scenario` under `config` and collect the report.
pub fn replay(scenario: &Scenario, config: SyncConfig) -> Result<ReplayReport> {
    let start = Instant::now();
    let mut registry = VecRegistry::new();
    let mut layout = ContinuousLayout::new();
    for doc in &scenario.documents {
        registry.open(doc.key.clone());
        layout.push_document(doc.key.clone(), vec![doc.page_height; doc.pages as usize]);
    }

    let mut coordinator = ViewportCoordinator::new(config, registry, ReplayScroller::default());
    for doc in &scenario.documents {
        coordinator.open_document(doc.key.clone());
        coordinator.set_page_count(&doc.key, doc.pages);
    }

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    coordinator.subscribe_events(move |event: &NavigationEvent| {
        sink.borrow_mut().push(event.clone())
    });

    let mut last_at = 0;
    for (index, step) in scenario.steps.iter().enumerate() {
        if step.at_ms < last_at {
            bail!(
                "step {index} at {}ms is earlier than the previous step at {last_at}ms",
                step.at_ms
            );
        }
        last_at = step.at_ms;

        let now = start + Duration::from_millis(step.at_ms);
        coordinator.tick(now);
        debug!(step = index, at_ms = step.at_ms, action = ?step.action, "replaying step");
        apply(&mut coordinator, &mut layout, scenario.viewport_height, &step.action, now);
    }
    coordinator.tick(start + Duration::from_millis(last_at));

    let mut documents: Vec<_> = coordinator
        .store()
        .keys()
        .map(|key| DocumentReport {
            key: key.clone(),
            phase: coordinator.phase(key),
            state: coordinator.document_state(key),
        })
        .collect();
    documents.sort_by(|a, b| a.key.cmp(&b.key));

    let events = events
        .borrow()
        .iter()
        .map(|event| EventRecord {
            at_ms: event.timestamp().saturating_duration_since(start).as_millis(),
            event: event.clone(),
        })
        .collect::<Vec<_>>();

    info!(steps = scenario.steps.len(), events = events.len(), "replay finished");

    Ok(ReplayReport {
        current_document: coordinator.current_document().cloned(),
        workspace: coordinator.workspace_view(),
        documents,
        events,
    })
}

fn apply(
    coordinator: &mut ViewportCoordinator<VecRegistry, ReplayScroller>,
    layout: &mut ContinuousLayout,
    viewport_height: f32,
    action: &Action,
    now: Instant,
) {
    match action {
        Action::Scroll { document, page, offset } => {
            let base = match (document, page) {
                (Some(document), Some(page)) => layout.page_offset(document, *page),
                (Some(document), None) => layout.document_offset(document),
                _ => Some(0.0),
            };
            let Some(base) = base else {
                debug!(?document, "scroll step references unknown document");
                return;
            };
            let position = (base + offset).clamp(0.0, layout.max_scroll(viewport_height));
            coordinator.on_scroll(now, &layout.snapshot(position, viewport_height));
        }
        Action::Jump { document, page } => {
            coordinator.scroll_to_page(document, *page, now);
        }
        Action::Key { key } => {
            coordinator.handle_key(*key, now);
        }
        Action::External { document, page, source_id } => {
            let event = NavigationEvent::PageChanged(PageChanged {
                document_key: document.clone(),
                page_number: *page,
                source_id: source_id.clone(),
                timestamp: now,
            });
            coordinator.handle_external_event(&event, now);
        }
        Action::Settle => {
            let Some((ticket, _, _)) = coordinator.scroller_mut().pending.pop() else {
                debug!("settle step without a pending scroll");
                return;
            };
            coordinator.on_scroll_settled(ticket, now);
        }
        Action::Focus { document } => {
            coordinator.focus_document(document, now);
        }
        Action::Open { document, pages, page_height } => {
            coordinator.registry_mut().open(document.clone());
            layout.push_document(document.clone(), vec![*page_height; *pages as usize]);
            coordinator.open_document(document.clone());
            coordinator.set_page_count(document, *pages);
        }
        Action::Close { document } => {
            coordinator.registry_mut().close(document);
            layout.remove_document(document);
            coordinator.close_document(document);
        }
        Action::Zoom { level } => coordinator.set_zoom(*level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SyncConfig {
        SyncConfig::new().with_source_id(SourceId::new("replay"))
    }

    fn scenario(json: &str) -> Scenario {
        serde_json::from_str(json).expect("scenario should parse")
    }

    #[test]
    fn parses_every_action_kind() {
        let scenario = scenario(
            r#"{
                "documents": [{ "key": "a.pdf", "pages": 4 }],
                "steps": [
                    { "action": "scroll", "document": "a.pdf", "page": 2 },
                    { "action": "jump", "document": "a.pdf", "page": 3 },
                    { "action": "key", "key": "page-down" },
                    { "action": "external", "document": "a.pdf", "page": 1 },
                    { "action": "settle" },
                    { "action": "focus", "document": "a.pdf" },
                    { "action": "open", "document": "b.pdf", "pages": 2 },
                    { "action": "close", "document": "b.pdf" },
                    { "action": "zoom", "level": 150 }
                ]
            }"#,
        );

        assert_eq!(scenario.steps.len(), 9);
        assert_eq!(scenario.viewport_height, DEFAULT_VIEWPORT_HEIGHT);
        assert!(matches!(
            scenario.steps[2].action,
            Action::Key { key: NavigationKey::PageDown }
        ));
    }

    #[test]
    fn jump_then_settle_returns_to_idle() {
        let scenario = scenario(
            r#"{
                "documents": [{ "key": "a.pdf", "pages": 10 }],
                "steps": [
                    { "action": "jump", "document": "a.pdf", "page": 7 },
                    { "at_ms": 30, "action": "settle" }
                ]
            }"#,
        );

        let report = replay(&scenario, config()).unwrap();
        let doc = &report.documents[0];

        assert_eq!(doc.state.current_page, 7);
        assert_eq!(doc.phase, NavigationPhase::Idle);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].event.name(), "page-changed");
    }

    #[test]
    fn newer_jump_replaces_pending_scroll_of_same_document() {
        let mut scroller = ReplayScroller::default();
        let a = DocumentKey::from("a.pdf");
        let b = DocumentKey::from("b.pdf");

        scroller.scroll_to_page(&a, 3, ScrollOptions::default()).unwrap();
        scroller.scroll_to_page(&b, 2, ScrollOptions::default()).unwrap();
        let latest = scroller.scroll_to_page(&a, 5, ScrollOptions::default()).unwrap();

        assert_eq!(scroller.pending.len(), 2);
        assert_eq!(scroller.pending.last(), Some(&(latest, a, 5)));
    }

    #[test]
    fn settle_after_repeated_jumps_leaves_nothing_pending() {
        let scenario = scenario(
            r#"{
                "documents": [{ "key": "a.pdf", "pages": 10 }],
                "steps": [
                    { "action": "jump", "document": "a.pdf", "page": 3 },
                    { "at_ms": 10, "action": "jump", "document": "a.pdf", "page": 6 },
                    { "at_ms": 20, "action": "jump", "document": "a.pdf", "page": 9 },
                    { "at_ms": 30, "action": "settle" },
                    { "at_ms": 40, "action": "settle" }
                ]
            }"#,
        );

        let report = replay(&scenario, config()).unwrap();
        let doc = &report.documents[0];

        assert_eq!(doc.state.current_page, 9);
        assert_eq!(doc.phase, NavigationPhase::Idle);
    }

    #[test]
    fn steps_must_not_go_back_in_time() {
        let scenario = scenario(
            r#"{
                "documents": [{ "key": "a.pdf", "pages": 2 }],
                "steps": [
                    { "at_ms": 50, "action": "zoom", "level": 120 },
                    { "at_ms": 10, "action": "zoom", "level": 130 }
                ]
            }"#,
        );

        let error = replay(&scenario, config()).unwrap_err();
        assert!(error.to_string().contains("step 1"));
    }

    #[test]
    fn closing_documents_updates_report() {
        let scenario = scenario(
            r#"{
                "documents": [{ "key": "a.pdf", "pages": 2 }, { "key": "b.pdf", "pages": 3 }],
                "steps": [{ "action": "close", "document": "a.pdf" }]
            }"#,
        );

        let report = replay(&scenario, config()).unwrap();

        assert_eq!(report.current_document, Some(DocumentKey::from("b.pdf")));
        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.workspace.num_pages, 3);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<Scenario>(
            r#"{ "documents": [], "viewport": 10 }"#,
        );
        assert!(result.is_err());
    }
}
