//! Album and chapter metadata as returned by the comic library.

use serde::{Deserialize, Serialize};

/// One downloadable unit of an album (the library calls it a "photo").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub name: String,
    /// 1-based position within the album.
    pub index: u32,
    /// Length of the chapter's page array, when the library populated it.
    #[serde(default)]
    pub page_count: Option<usize>,
    /// Generic length the library reports for the chapter, when it has one.
    #[serde(default)]
    pub length: Option<usize>,
}

impl Chapter {
    /// Page array length, else the generic length, else 0 with a warning.
    pub fn image_count(&self) -> usize {
        match self.page_count.or(self.length) {
            Some(n) => n,
            None => {
                tracing::warn!(
                    "cannot determine image count of chapter {} ({}), using 0",
                    self.index,
                    self.name
                );
                0
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Album {
    pub fn total_chapters(&self) -> usize {
        self.chapters.len()
    }

    /// Chapters `start..=end` (1-based, inclusive). Bounds must already be clamped.
    pub fn chapter_range(&self, start: usize, end: usize) -> &[Chapter] {
        if start == 0 || start > end || end > self.chapters.len() {
            return &[];
        }
        &self.chapters[start - 1..end]
    }
}
