//! Identifiers shared across the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 1-based page number within a document.
pub type PageNumber = u32;

/// Stable identifier of one open document within a workspace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(String);

impl DocumentKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DocumentKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Clamp a requested page into `[1, max(page_count, 1)]`.
pub fn clamp_page(page: PageNumber, page_count: u32) -> PageNumber {
    page.clamp(1, page_count.max(1))
}
