//! Text pipeline: normalization, heading detection, segmentation, and the
//! fallback tiers that turn source content into a chapter list.

mod fallback;
pub mod headings;
mod normalizer;
mod sections;
pub mod segmenter;

use serde::{Deserialize, Serialize};

pub use fallback::{build_fallback, build_fallback_with};
pub use headings::{HeadingPatterns, clean_heading, is_heading};
pub use normalizer::normalize_text;
pub use sections::{normalize_sections, normalize_sections_with};
pub use segmenter::{Segmenter, format_content_line, segment};

/// A titled (possibly untitled) unit of book content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Chapter title, empty when untitled
    pub title: String,
    /// Formatted prose, newline-joined
    pub body: String,
}

impl Chapter {
    /// Create a new chapter.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Whether the chapter has a title or a body.
    pub fn has_content(&self) -> bool {
        !self.title.is_empty() || !self.body.is_empty()
    }

    /// Title for display, numbering untitled chapters from 1.
    pub fn display_title(&self, index: usize) -> String {
        if self.title.is_empty() {
            format!("Chapter {}", index + 1)
        } else {
            self.title.clone()
        }
    }
}

/// Ordered chapters; insertion order is reading order.
pub type ChapterList = Vec<Chapter>;
