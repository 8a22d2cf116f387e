//! Interfaces of the collaborators the coordinator drives.

use crate::error::ScrollError;
use crate::types::{DocumentKey, PageNumber};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workspace file registry: the ordered list of open documents and the
/// application's notion of the current one.
pub trait FileRegistry {
    fn open_documents(&self) -> Vec<DocumentKey>;

    fn set_current_document(&mut self, key: &DocumentKey);

    fn contains(&self, key: &DocumentKey) -> bool {
        self.open_documents().iter().any(|open| open == key)
    }
}

/// In-memory registry backed by a vector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VecRegistry {
    documents: Vec<DocumentKey>,
    current: Option<DocumentKey>,
}

impl VecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, key: DocumentKey) {
        if !self.documents.contains(&key) {
            self.documents.push(key);
        }
    }

    pub fn close(&mut self, key: &DocumentKey) -> bool {
        let before = self.documents.len();
        self.documents.retain(|open| open != key);
        if self.current.as_ref() == Some(key) {
            self.current = None;
        }
        self.documents.len() != before
    }

    pub fn current(&self) -> Option<&DocumentKey> {
        self.current.as_ref()
    }
}

impl FileRegistry for VecRegistry {
    fn open_documents(&self) -> Vec<DocumentKey> {
        self.documents.clone()
    }

    fn set_current_document(&mut self, key: &DocumentKey) {
        self.current = Some(key.clone());
    }

    fn contains(&self, key: &DocumentKey) -> bool {
        self.documents.contains(key)
    }
}

/// Where the target page lands inside the viewport after a programmatic
/// scroll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollAlign {
    #[default]
    Start,
    Center,
    End,
    /// Scroll the least distance that brings the page into view.
    Nearest,
}

impl ScrollAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Center => "center",
            Self::End => "end",
            Self::Nearest => "nearest",
        }
    }
}

impl fmt::Display for ScrollAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrollAlign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "center" => Ok(Self::Center),
            "end" => Ok(Self::End),
            "nearest" => Ok(Self::Nearest),
            other => Err(format!(
                "unknown alignment `{other}` (expected start, center, end or nearest)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollOptions {
    pub smooth: bool,
    pub align: ScrollAlign,
}

impl ScrollOptions {
    /// Smooth scroll with the given alignment.
    pub fn smooth(align: ScrollAlign) -> Self {
        Self { smooth: true, align }
    }
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self::smooth(ScrollAlign::Start)
    }
}

/// Identifies one in-flight scroll animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScrollTicket(pub u64);

/// Host scroll primitive. Fire-and-forget: the call starts the animation and
/// returns a ticket; the host later reports completion through
/// [`ViewportCoordinator::on_scroll_settled`](crate::ViewportCoordinator::on_scroll_settled).
pub trait ScrollPrimitive {
    fn scroll_to_page(
        &mut self,
        key: &DocumentKey,
        page: PageNumber,
        options: ScrollOptions,
    ) -> Result<ScrollTicket, ScrollError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_keeps_open_order_and_ignores_duplicates() {
        let mut registry = VecRegistry::new();
        registry.open(DocumentKey::from("b"));
        registry.open(DocumentKey::from("a"));
        registry.open(DocumentKey::from("b"));

        assert_eq!(
            registry.open_documents(),
            vec![DocumentKey::from("b"), DocumentKey::from("a")]
        );
    }

    #[test]
    fn closing_current_document_clears_it() {
        let mut registry = VecRegistry::new();
        let key = DocumentKey::from("a");
        registry.open(key.clone());
        registry.set_current_document(&key);

        assert!(registry.close(&key));
        assert!(registry.current().is_none());
        assert!(!registry.contains(&key));
    }

    #[test]
    fn alignment_parses_every_variant() {
        for align in [
            ScrollAlign::Start,
            ScrollAlign::Center,
            ScrollAlign::End,
            ScrollAlign::Nearest,
        ] {
            assert_eq!(align.as_str().parse::<ScrollAlign>(), Ok(align));
        }
        assert_eq!("CENTER".parse::<ScrollAlign>(), Ok(ScrollAlign::Center));
        assert!("middle".parse::<ScrollAlign>().is_err());
    }
}
