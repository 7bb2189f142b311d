//! Reward ledger: token balance, XP grants, book ownership and completion.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::progress::ChapterProgression;

/// Tokens credited for finishing a whole book.
pub const BOOK_COMPLETION_REWARD: u64 = 1000;

/// What an XP grant is for. Each (kind, id) pair is granted at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XpKind {
    Course,
    Book,
}

impl std::fmt::Display for XpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            XpKind::Course => write!(f, "course"),
            XpKind::Book => write!(f, "book"),
        }
    }
}

/// External bookkeeping the progression machine consults but does not own.
pub trait RewardLedger {
    fn credit_tokens(&mut self, amount: u64) -> Result<()>;

    /// Grant XP for an item. Returns false if it was already granted.
    fn grant_xp(&mut self, kind: XpKind, id: &str) -> Result<bool>;

    fn is_book_completed(&self, book_id: &str) -> bool;

    /// Mark a book complete. Returns false if it already was.
    fn mark_book_completed(&mut self, book_id: &str) -> Result<bool>;

    fn is_owned(&self, book_id: &str) -> bool;

    /// Record ownership. Returns false if the book was already owned.
    fn grant_ownership(&mut self, book_id: &str) -> Result<bool>;

    /// Mark a book complete, credit `reward` tokens and grant book XP as
    /// one change. Nothing is applied if it fails. Returns false if the
    /// book was already complete.
    fn complete_book(&mut self, book_id: &str, reward: u64) -> Result<bool>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    #[serde(default)]
    pub tokens: u64,
    #[serde(default)]
    pub xp_grants: BTreeSet<(XpKind, String)>,
    #[serde(default)]
    pub owned_books: BTreeSet<String>,
    #[serde(default)]
    pub completed_books: BTreeSet<String>,
}

impl RewardLedger for LedgerState {
    fn credit_tokens(&mut self, amount: u64) -> Result<()> {
        self.tokens = self.tokens.saturating_add(amount);
        Ok(())
    }

    fn grant_xp(&mut self, kind: XpKind, id: &str) -> Result<bool> {
        Ok(self.xp_grants.insert((kind, id.to_string())))
    }

    fn is_book_completed(&self, book_id: &str) -> bool {
        self.completed_books.contains(book_id)
    }

    fn mark_book_completed(&mut self, book_id: &str) -> Result<bool> {
        Ok(self.completed_books.insert(book_id.to_string()))
    }

    fn is_owned(&self, book_id: &str) -> bool {
        self.owned_books.contains(book_id)
    }

    fn grant_ownership(&mut self, book_id: &str) -> Result<bool> {
        Ok(self.owned_books.insert(book_id.to_string()))
    }

    fn complete_book(&mut self, book_id: &str, reward: u64) -> Result<bool> {
        if !self.mark_book_completed(book_id)? {
            return Ok(false);
        }
        self.credit_tokens(reward)?;
        self.grant_xp(XpKind::Book, book_id)?;
        Ok(true)
    }
}

/// Ledger persisted as a single JSON file, replaced atomically after every
/// change. The in-memory state only moves once the write has succeeded.
pub struct JsonLedger {
    path: PathBuf,
    state: LedgerState,
}

impl JsonLedger {
    pub const FILE_NAME: &'static str = "ledger.json";

    /// Open the ledger in `dir`, starting empty if no file exists yet.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(Self::FILE_NAME);

        let state = match File::open(&path) {
            Ok(file) => serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse {}", path.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => LedgerState::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to open {}", path.display()));
            }
        };

        Ok(Self { path, state })
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn tokens(&self) -> u64 {
        self.state.tokens
    }

    /// Apply `change` to a copy of the state, persist it, then commit.
    fn update<T>(&mut self, change: impl FnOnce(&mut LedgerState) -> Result<T>) -> Result<T> {
        let mut next = self.state.clone();
        let result = change(&mut next)?;
        if next != self.state {
            self.write(&next)?;
            self.state = next;
        }
        Ok(result)
    }

    fn write(&self, state: &LedgerState) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let content = serde_json::to_string_pretty(state).context("Failed to serialize ledger")?;

        let mut temp_file = NamedTempFile::new_in(dir).context("Failed to create temp file")?;
        temp_file
            .write_all(content.as_bytes())
            .context("Failed to write ledger")?;
        temp_file
            .persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

impl RewardLedger for JsonLedger {
    fn credit_tokens(&mut self, amount: u64) -> Result<()> {
        self.update(|state| state.credit_tokens(amount))
    }

    fn grant_xp(&mut self, kind: XpKind, id: &str) -> Result<bool> {
        let granted = self.update(|state| state.grant_xp(kind, id))?;
        if granted {
            log::debug!("Granted {} XP for {}", kind, id);
        }
        Ok(granted)
    }

    fn is_book_completed(&self, book_id: &str) -> bool {
        self.state.is_book_completed(book_id)
    }

    fn mark_book_completed(&mut self, book_id: &str) -> Result<bool> {
        self.update(|state| state.mark_book_completed(book_id))
    }

    fn is_owned(&self, book_id: &str) -> bool {
        self.state.is_owned(book_id)
    }

    fn grant_ownership(&mut self, book_id: &str) -> Result<bool> {
        self.update(|state| state.grant_ownership(book_id))
    }

    fn complete_book(&mut self, book_id: &str, reward: u64) -> Result<bool> {
        self.update(|state| state.complete_book(book_id, reward))
    }
}

/// Result of the "mark book complete" action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishOutcome {
    Finished { tokens: u64 },
    /// Chapters remain, or the book is not owned.
    NotFinishable,
    AlreadyCompleted,
}

/// Mark a book complete and pay out its reward exactly once.
pub fn finish_book(
    progression: &mut ChapterProgression,
    chapter_count: usize,
    ledger: &mut dyn RewardLedger,
) -> Result<FinishOutcome> {
    let book_id = progression.book_id().to_string();
    if ledger.is_book_completed(&book_id) {
        progression.set_book_completed(true);
        return Ok(FinishOutcome::AlreadyCompleted);
    }
    if !progression.can_finish_book(chapter_count) {
        return Ok(FinishOutcome::NotFinishable);
    }

    let completed = ledger.complete_book(&book_id, BOOK_COMPLETION_REWARD)?;
    progression.set_book_completed(true);
    if !completed {
        return Ok(FinishOutcome::AlreadyCompleted);
    }

    log::info!("Finished book {}, credited {} tokens", book_id, BOOK_COMPLETION_REWARD);
    Ok(FinishOutcome::Finished {
        tokens: BOOK_COMPLETION_REWARD,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::BookProgress;
    use tempfile::TempDir;

    fn finished_progression(book_id: &str, chapter_count: usize) -> ChapterProgression {
        let last = chapter_count as i64 - 1;
        let progress = BookProgress::restore(last, Some(last));
        ChapterProgression::new(book_id, progress, true, false)
    }

    #[test]
    fn test_finish_book_pays_once() {
        let mut ledger = LedgerState::default();
        let mut progression = finished_progression("deep-work", 4);

        let outcome = finish_book(&mut progression, 4, &mut ledger).unwrap();
        assert_eq!(
            outcome,
            FinishOutcome::Finished {
                tokens: BOOK_COMPLETION_REWARD
            }
        );
        assert_eq!(ledger.tokens, BOOK_COMPLETION_REWARD);
        assert!(ledger.xp_grants.contains(&(XpKind::Book, "deep-work".to_string())));
        assert!(progression.is_book_completed());

        let again = finish_book(&mut progression, 4, &mut ledger).unwrap();
        assert_eq!(again, FinishOutcome::AlreadyCompleted);
        assert_eq!(ledger.tokens, BOOK_COMPLETION_REWARD);
    }

    #[test]
    fn test_finish_book_requires_last_chapter() {
        let mut ledger = LedgerState::default();
        let mut progression =
            ChapterProgression::new("deep-work", BookProgress::restore(1, Some(2)), true, false);

        let outcome = finish_book(&mut progression, 4, &mut ledger).unwrap();
        assert_eq!(outcome, FinishOutcome::NotFinishable);
        assert_eq!(ledger.tokens, 0);
        assert!(!ledger.is_book_completed("deep-work"));
    }

    #[test]
    fn test_finish_book_requires_ownership() {
        let mut ledger = LedgerState::default();
        let mut progression =
            ChapterProgression::new("deep-work", BookProgress::restore(3, Some(3)), false, false);
        assert_eq!(
            finish_book(&mut progression, 4, &mut ledger).unwrap(),
            FinishOutcome::NotFinishable
        );
    }

    #[test]
    fn test_ledger_completion_wins_over_stale_flag() {
        let mut ledger = LedgerState::default();
        ledger.mark_book_completed("deep-work").unwrap();
        let mut progression = finished_progression("deep-work", 2);

        assert_eq!(
            finish_book(&mut progression, 2, &mut ledger).unwrap(),
            FinishOutcome::AlreadyCompleted
        );
        assert_eq!(ledger.tokens, 0);
        assert!(progression.is_book_completed());
    }

    #[test]
    fn test_grants_are_idempotent() {
        let mut ledger = LedgerState::default();
        assert!(ledger.grant_ownership("b").unwrap());
        assert!(!ledger.grant_ownership("b").unwrap());
        assert!(ledger.grant_xp(XpKind::Course, "c1").unwrap());
        assert!(!ledger.grant_xp(XpKind::Course, "c1").unwrap());
        assert!(ledger.grant_xp(XpKind::Book, "c1").unwrap());
    }

    #[test]
    fn test_json_ledger_persists() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut ledger = JsonLedger::open(temp_dir.path()).unwrap();
            ledger.grant_ownership("essentialism").unwrap();
            let mut progression = finished_progression("essentialism", 3);
            finish_book(&mut progression, 3, &mut ledger).unwrap();
        }

        let ledger = JsonLedger::open(temp_dir.path()).unwrap();
        assert!(ledger.is_owned("essentialism"));
        assert!(ledger.is_book_completed("essentialism"));
        assert_eq!(ledger.tokens(), BOOK_COMPLETION_REWARD);
    }

    /// Ledger whose next book completion fails before touching any state.
    struct FailingLedger {
        inner: LedgerState,
        fail_next_completion: bool,
    }

    impl RewardLedger for FailingLedger {
        fn credit_tokens(&mut self, amount: u64) -> Result<()> {
            self.inner.credit_tokens(amount)
        }

        fn grant_xp(&mut self, kind: XpKind, id: &str) -> Result<bool> {
            self.inner.grant_xp(kind, id)
        }

        fn is_book_completed(&self, book_id: &str) -> bool {
            self.inner.is_book_completed(book_id)
        }

        fn mark_book_completed(&mut self, book_id: &str) -> Result<bool> {
            self.inner.mark_book_completed(book_id)
        }

        fn is_owned(&self, book_id: &str) -> bool {
            self.inner.is_owned(book_id)
        }

        fn grant_ownership(&mut self, book_id: &str) -> Result<bool> {
            self.inner.grant_ownership(book_id)
        }

        fn complete_book(&mut self, book_id: &str, reward: u64) -> Result<bool> {
            if std::mem::take(&mut self.fail_next_completion) {
                anyhow::bail!("ledger unavailable");
            }
            self.inner.complete_book(book_id, reward)
        }
    }

    #[test]
    fn test_failed_completion_can_be_retried() {
        let mut ledger = FailingLedger {
            inner: LedgerState::default(),
            fail_next_completion: true,
        };
        let mut progression = finished_progression("deep-work", 3);

        assert!(finish_book(&mut progression, 3, &mut ledger).is_err());
        assert!(!progression.is_book_completed());
        assert!(!ledger.is_book_completed("deep-work"));
        assert_eq!(ledger.inner.tokens, 0);

        let retry = finish_book(&mut progression, 3, &mut ledger).unwrap();
        assert_eq!(
            retry,
            FinishOutcome::Finished {
                tokens: BOOK_COMPLETION_REWARD
            }
        );
        assert_eq!(ledger.inner.tokens, BOOK_COMPLETION_REWARD);
    }

    #[test]
    fn test_json_ledger_write_failure_leaves_state_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let ledger_dir = temp_dir.path().join("ledger");
        let mut ledger = JsonLedger::open(&ledger_dir).unwrap();
        let mut progression = finished_progression("essentialism", 2);

        // Replace the directory with a plain file so the write cannot land
        fs::remove_dir_all(&ledger_dir).unwrap();
        fs::write(&ledger_dir, "not a directory").unwrap();

        assert!(finish_book(&mut progression, 2, &mut ledger).is_err());
        assert_eq!(ledger.state(), &LedgerState::default());
        assert!(!progression.is_book_completed());

        fs::remove_file(&ledger_dir).unwrap();
        fs::create_dir_all(&ledger_dir).unwrap();
        let retry = finish_book(&mut progression, 2, &mut ledger).unwrap();
        assert!(matches!(retry, FinishOutcome::Finished { .. }));

        let reopened = JsonLedger::open(&ledger_dir).unwrap();
        assert_eq!(reopened.tokens(), BOOK_COMPLETION_REWARD);
        assert!(reopened.is_book_completed("essentialism"));
    }

    #[test]
    fn test_json_ledger_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = JsonLedger::open(temp_dir.path()).unwrap();
        assert_eq!(ledger.state(), &LedgerState::default());
        assert!(!temp_dir.path().join(JsonLedger::FILE_NAME).exists());
    }
}
