//! Catalog element definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-issued element identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A craftable concept as reported by the combination service.
///
/// Elements are immutable once fetched; the client never edits or
/// deduplicates them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub name: String,
    pub emoji: String,
}

impl Element {
    /// Create a new element.
    pub fn new(id: impl Into<ElementId>, name: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            emoji: emoji.into(),
        }
    }

    /// Display label, emoji first.
    pub fn label(&self) -> String {
        format!("{} {}", self.emoji, self.name)
    }
}
