//! Progressive-unlock state machine.
//!
//! A book is `Locked` until it is owned. Once owned, the reader may view
//! any chapter up to the unlock frontier, `min(completed + 1, count - 1)`,
//! and may only complete the chapter right after the last completed one.
//! Policy violations come back as values, never errors: they are ordinary
//! UI races such as a double tap on "complete".

use std::fmt;

use super::types::{BookProgress, ChapterStatus};

/// Externally visible state of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionState {
    Locked,
    Unlocked { active: i64, completed: i64 },
}

/// Why a navigation or completion request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The book is not owned
    Locked,
    /// The book has no chapters
    NoChapters,
    /// Negative chapter index
    OutOfRange { requested: i64 },
    /// The chapter is past the unlock frontier
    BeyondFrontier { requested: i64, frontier: i64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => write!(f, "book is locked"),
            Self::NoChapters => write!(f, "book has no chapters"),
            Self::OutOfRange { requested } => write!(f, "chapter {} does not exist", requested),
            Self::BeyondFrontier {
                requested,
                frontier,
            } => write!(
                f,
                "chapter {} is locked (unlocked up to {})",
                requested, frontier
            ),
        }
    }
}

/// Result of a chapter change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterChange {
    Moved { from: i64, to: i64 },
    Unchanged,
    Rejected(Rejection),
}

impl ChapterChange {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// Event emitted when a chapter is marked complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterCompleted {
    pub index: i64,
    pub next_active: i64,
    /// The completed chapter was the last one
    pub final_chapter: bool,
    /// Final chapter done and the ledger has not completed the book yet
    pub book_finishable: bool,
}

/// Result of a chapter completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed(ChapterCompleted),
    /// The chapter was already completed; nothing changed
    AlreadyDone,
    Rejected(Rejection),
}

impl CompletionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Reading progression for one book.
#[derive(Debug, Clone)]
pub struct ChapterProgression {
    book_id: String,
    owned: bool,
    book_completed: bool,
    progress: BookProgress,
}

impl ChapterProgression {
    /// Wrap stored progress with the ownership and book-completion facts
    /// supplied by the caller.
    pub fn new(
        book_id: impl Into<String>,
        progress: BookProgress,
        owned: bool,
        book_completed: bool,
    ) -> Self {
        Self {
            book_id: book_id.into(),
            owned,
            book_completed,
            progress,
        }
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn progress(&self) -> &BookProgress {
        &self.progress
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }

    pub fn is_book_completed(&self) -> bool {
        self.book_completed
    }

    pub fn state(&self) -> ProgressionState {
        if !self.owned {
            return ProgressionState::Locked;
        }
        ProgressionState::Unlocked {
            active: self.progress.active_index(),
            completed: self.progress.completed_index(),
        }
    }

    /// Record that the reader now owns the book.
    ///
    /// A freshly acquired book starts at the first chapter.
    pub fn grant_ownership(&mut self) {
        if self.owned {
            return;
        }
        self.owned = true;
        if !self.progress.has_active_index() {
            self.progress.set_active_index(0);
        }
    }

    /// Record that the ledger has marked the whole book complete.
    pub fn set_book_completed(&mut self, completed: bool) {
        self.book_completed = completed;
    }

    /// Open the book, initializing or resuming the active chapter.
    pub fn open(&mut self, chapter_count: Option<usize>) -> ProgressionState {
        if !self.owned {
            return ProgressionState::Locked;
        }

        if let Some(count) = chapter_count.filter(|&c| c > 0) {
            self.progress.set_chapter_total(count);
            if self.progress.has_active_index() {
                self.progress.clamp_active(count);
            } else {
                let start = self.progress.unlock_frontier(count);
                self.progress.set_active_index(start);
            }
        }

        self.state()
    }

    /// Re-clamp the active chapter after the chapter list was recomputed.
    pub fn sync_chapter_count(&mut self, chapter_count: usize) {
        if chapter_count == 0 {
            return;
        }
        self.progress.set_chapter_total(chapter_count);
        self.progress.clamp_active(chapter_count);
    }

    /// Highest viewable chapter; -1 when locked or empty.
    pub fn unlock_frontier(&self, chapter_count: usize) -> i64 {
        if !self.owned {
            return -1;
        }
        self.progress.unlock_frontier(chapter_count)
    }

    /// Active chapter as the reader sees it, always a valid index or 0.
    pub fn active_index(&self, chapter_count: usize) -> i64 {
        if chapter_count == 0 {
            return 0;
        }
        let active = self
            .progress
            .active_index()
            .clamp(0, chapter_count as i64 - 1);
        let frontier = self.unlock_frontier(chapter_count);
        if frontier >= 0 {
            active.min(frontier)
        } else {
            active
        }
    }

    /// Move to another chapter within the unlock frontier.
    pub fn change_chapter(&mut self, target: i64, chapter_count: usize) -> ChapterChange {
        if chapter_count == 0 {
            return ChapterChange::Rejected(Rejection::NoChapters);
        }
        if !self.owned {
            return ChapterChange::Rejected(Rejection::Locked);
        }

        let frontier = self.progress.unlock_frontier(chapter_count);
        if target > frontier {
            return ChapterChange::Rejected(Rejection::BeyondFrontier {
                requested: target,
                frontier,
            });
        }

        let to = target.clamp(0, chapter_count as i64 - 1);
        let from = self.progress.active_index();
        if self.progress.has_active_index() && to == from {
            return ChapterChange::Unchanged;
        }

        self.progress.set_active_index(to);
        ChapterChange::Moved { from, to }
    }

    /// Mark the chapter at `index` complete and advance to the next one.
    pub fn complete_chapter(&mut self, index: i64, chapter_count: usize) -> CompletionOutcome {
        if chapter_count == 0 {
            return CompletionOutcome::Rejected(Rejection::NoChapters);
        }
        if !self.owned {
            return CompletionOutcome::Rejected(Rejection::Locked);
        }
        if index < 0 {
            return CompletionOutcome::Rejected(Rejection::OutOfRange { requested: index });
        }
        if index <= self.progress.completed_index() {
            return CompletionOutcome::AlreadyDone;
        }

        let frontier = self.progress.unlock_frontier(chapter_count);
        if index > frontier {
            return CompletionOutcome::Rejected(Rejection::BeyondFrontier {
                requested: index,
                frontier,
            });
        }

        let last = chapter_count as i64 - 1;
        let next_active = (index + 1).min(last);
        self.progress.advance_completed(index);
        self.progress.set_active_index(next_active);
        self.progress.set_chapter_total(chapter_count);

        let final_chapter = index == last;
        let book_finishable = final_chapter && !self.book_completed;
        log::info!(
            "Completed chapter {} of {} in {}",
            index + 1,
            chapter_count,
            self.book_id
        );

        CompletionOutcome::Completed(ChapterCompleted {
            index,
            next_active,
            final_chapter,
            book_finishable,
        })
    }

    /// Whether the separate "mark book complete" action is permitted.
    pub fn can_finish_book(&self, chapter_count: usize) -> bool {
        self.owned
            && !self.book_completed
            && chapter_count > 0
            && self.progress.completed_index() >= chapter_count as i64 - 1
    }

    pub fn chapter_status(&self, index: usize, chapter_count: usize) -> ChapterStatus {
        let index = index as i64;
        if self.progress.completed_index() >= index {
            ChapterStatus::Completed
        } else if index <= self.unlock_frontier(chapter_count) {
            ChapterStatus::Available
        } else {
            ChapterStatus::Locked
        }
    }

    /// Share of the book up to and including the active chapter, in `[0, 1]`.
    pub fn reading_fraction(&self, chapter_count: usize) -> f64 {
        if chapter_count == 0 {
            return 0.0;
        }
        let position = self.active_index(chapter_count) + 1;
        (position as f64 / chapter_count as f64).clamp(0.0, 1.0)
    }
}
