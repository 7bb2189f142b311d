//! Persisted reading progress for a single book.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Completed index meaning "nothing completed yet".
pub const NONE_COMPLETED: i64 = -1;

fn none_completed() -> i64 {
    NONE_COMPLETED
}

/// Progress record for one user and one book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookProgress {
    /// Highest completed chapter index (-1 = none)
    #[serde(default = "none_completed")]
    completed_chapter_index: i64,
    /// Chapter the reader last viewed, if any was recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_chapter_index: Option<i64>,
    /// Chapter count seen when the record was last written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    chapter_total: Option<usize>,
    /// When the record was last changed
    #[serde(default = "Utc::now")]
    updated_at: DateTime<Utc>,
}

impl Default for BookProgress {
    fn default() -> Self {
        Self {
            completed_chapter_index: NONE_COMPLETED,
            active_chapter_index: None,
            chapter_total: None,
            updated_at: Utc::now(),
        }
    }
}

impl BookProgress {
    /// Create a fresh record with nothing completed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a record from stored indices.
    ///
    /// # Panics
    /// If `completed` is below -1.
    pub fn restore(completed: i64, active: Option<i64>) -> Self {
        assert!(
            completed >= NONE_COMPLETED,
            "completed chapter index must be >= -1, got {}",
            completed
        );
        Self {
            completed_chapter_index: completed,
            active_chapter_index: active,
            ..Self::default()
        }
    }

    /// Highest completed chapter index (-1 = none).
    pub fn completed_index(&self) -> i64 {
        self.completed_chapter_index
    }

    /// Recorded active index, or 0 when none was recorded.
    pub fn active_index(&self) -> i64 {
        self.active_chapter_index.unwrap_or(0)
    }

    /// Whether an active index was ever recorded.
    pub fn has_active_index(&self) -> bool {
        self.active_chapter_index.is_some()
    }

    pub fn chapter_total(&self) -> Option<usize> {
        self.chapter_total
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether stored indices satisfy the record invariants.
    pub fn is_consistent(&self) -> bool {
        self.completed_chapter_index >= NONE_COMPLETED
    }

    /// Highest chapter index the reader may view, or -1 when nothing is.
    pub fn unlock_frontier(&self, chapter_count: usize) -> i64 {
        if chapter_count == 0 {
            return NONE_COMPLETED;
        }
        (self.completed_chapter_index + 1).min(chapter_count as i64 - 1)
    }

    /// Raise the completed index.
    ///
    /// # Panics
    /// If `index` is lower than the current completed index. Completion
    /// never regresses; a lower value is a caller bug.
    pub fn advance_completed(&mut self, index: i64) {
        assert!(
            index >= self.completed_chapter_index,
            "completed chapter index must not decrease ({} -> {})",
            self.completed_chapter_index,
            index
        );
        self.completed_chapter_index = index;
        self.touch();
    }

    pub(crate) fn set_active_index(&mut self, index: i64) {
        self.active_chapter_index = Some(index);
        self.touch();
    }

    pub(crate) fn set_chapter_total(&mut self, chapter_count: usize) {
        if self.chapter_total != Some(chapter_count) {
            self.chapter_total = Some(chapter_count);
            self.touch();
        }
    }

    /// Pull a recorded active index back inside `[0, frontier]`.
    pub(crate) fn clamp_active(&mut self, chapter_count: usize) {
        if chapter_count == 0 {
            return;
        }
        if let Some(active) = self.active_chapter_index {
            let clamped = active.clamp(0, self.unlock_frontier(chapter_count).max(0));
            if clamped != active {
                self.set_active_index(clamped);
            }
        }
    }

    /// Combine with an already stored record for a write.
    ///
    /// The completed index takes the maximum of both; the remaining fields
    /// come from `self` (last writer wins).
    pub fn merged_with(&self, stored: &BookProgress) -> BookProgress {
        let mut merged = self.clone();
        merged.completed_chapter_index = self
            .completed_chapter_index
            .max(stored.completed_chapter_index);
        if merged.active_chapter_index.is_none() {
            merged.active_chapter_index = stored.active_chapter_index;
        }
        if merged.chapter_total.is_none() {
            merged.chapter_total = stored.chapter_total;
        }
        if let Some(total) = merged.chapter_total {
            merged.clamp_active(total);
        }
        merged
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// How a chapter appears in a chapter picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterStatus {
    Completed,
    Available,
    Locked,
}

impl std::fmt::Display for ChapterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Completed => "completed",
            Self::Available => "available",
            Self::Locked => "locked",
        };
        write!(f, "{}", label)
    }
}
