//! clipkeep - Clipboard entry data models
//!
//! Defines the data structures for stored clipboard history entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Clipboard content kind enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Plain text
    Text,
    /// Image (PNG-encoded bytes)
    Image,
}

impl EntryKind {
    /// Convert from the database column value
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(EntryKind::Text),
            "image" => Some(EntryKind::Image),
            _ => None,
        }
    }

    /// Convert to the database column value
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Text => "text",
            EntryKind::Image => "image",
        }
    }
}

/// Entry payload; exactly one variant, always matching the entry's kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryContent {
    Text(String),
    Image(Vec<u8>),
}

impl EntryContent {
    pub fn kind(&self) -> EntryKind {
        match self {
            EntryContent::Text(_) => EntryKind::Text,
            EntryContent::Image(_) => EntryKind::Image,
        }
    }
}

/// A single stored clipboard capture with metadata
///
/// Entries are plain data: the store hands out copies, never live handles.
/// Only `favorite` ever changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier (UUID v4), assigned at creation
    pub id: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Whether exempt from retention cleanup
    pub favorite: bool,
    /// The captured payload
    pub content: EntryContent,
}

impl Entry {
    /// Create a new text entry with a fresh id and timestamp
    pub fn new_text(text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            favorite: false,
            content: EntryContent::Text(text),
        }
    }

    /// Create a new image entry with a fresh id and timestamp
    pub fn new_image(png_data: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            favorite: false,
            content: EntryContent::Image(png_data),
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.content.kind()
    }

    /// Short display text for list rows; trimming is display-only,
    /// the stored payload is never altered
    pub fn display_text(&self) -> String {
        match &self.content {
            EntryContent::Text(text) => Self::preview(text, 100),
            EntryContent::Image(_) => "[Image]".to_string(),
        }
    }

    fn preview(text: &str, max_len: usize) -> String {
        let text = text.trim();
        if text.chars().count() <= max_len {
            text.to_string()
        } else {
            let truncated: String = text.chars().take(max_len).collect();
            format!("{}...", truncated)
        }
    }
}
