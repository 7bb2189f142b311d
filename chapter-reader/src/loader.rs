//! Chapter loading: fetch a book's document, normalize it, fall back when
//! the document is missing or unusable.
//!
//! Loading never fails. Content problems surface as a [`ContentError`] tag
//! next to whatever chapters the fallback tiers could build.

use doc_source::{DocumentSource, SourceSection};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::BookConfig;
use crate::text::{ChapterList, HeadingPatterns, build_fallback_with, normalize_sections_with};

/// Where a chapter list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterOrigin {
    Document,
    Fallback,
}

/// Advisory tag explaining why the fallback was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentError {
    /// The document had no usable sections.
    Empty,
    /// The document could not be fetched.
    FetchFailed,
}

impl ContentError {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentError::Empty => "empty",
            ContentError::FetchFailed => "fetch_failed",
        }
    }
}

impl std::fmt::Display for ContentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedChapters {
    pub book_id: String,
    pub chapters: ChapterList,
    pub origin: ChapterOrigin,
    pub error: Option<ContentError>,
}

impl LoadedChapters {
    pub fn count(&self) -> usize {
        self.chapters.len()
    }
}

/// SHA-256 of the content, first 16 hex characters.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

fn sections_hash(sections: &[SourceSection]) -> String {
    let mut hasher = Sha256::new();
    for section in sections {
        hasher.update(section.title.as_bytes());
        hasher.update([0u8]);
        hasher.update(section.body.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())[..16].to_string()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Loads chapter lists for catalog books.
pub struct ChapterLoader {
    source: Option<Arc<dyn DocumentSource>>,
    patterns: HeadingPatterns,
    /// Document-backed results, reused until a forced reload
    documents: Mutex<HashMap<String, LoadedChapters>>,
    /// Latest segmentation per book, tagged with its content hash
    segmented: Mutex<HashMap<String, (String, ChapterList)>>,
}

impl ChapterLoader {
    pub fn new(source: Option<Arc<dyn DocumentSource>>, patterns: HeadingPatterns) -> Self {
        Self {
            source,
            patterns,
            documents: Mutex::new(HashMap::new()),
            segmented: Mutex::new(HashMap::new()),
        }
    }

    /// Load a book's chapters, using the document source when the book has
    /// a page id and a source is configured.
    pub async fn load(&self, book: &BookConfig, force: bool) -> LoadedChapters {
        if !force {
            if let Some(cached) = lock(&self.documents).get(&book.id) {
                log::debug!("Using cached chapters for {}", book.id);
                return cached.clone();
            }
        }

        let (page_id, source) = match (&book.page_id, &self.source) {
            (Some(page_id), Some(source)) if !page_id.is_empty() => (page_id, source),
            _ => return self.fallback(book, None),
        };

        let sections = match source.fetch_sections(page_id).await {
            Ok(sections) => sections,
            Err(e) => {
                log::warn!(
                    "Failed to fetch {} from {}: {}",
                    book.id,
                    source.name(),
                    e
                );
                return self.fallback(book, Some(ContentError::FetchFailed));
            }
        };

        let hash = sections_hash(&sections);
        let chapters = self.memoized(&book.id, hash, || {
            normalize_sections_with(&sections, &self.patterns)
        });
        if chapters.is_empty() {
            log::debug!("Document for {} has no usable sections", book.id);
            return self.fallback(book, Some(ContentError::Empty));
        }

        let loaded = LoadedChapters {
            book_id: book.id.clone(),
            chapters,
            origin: ChapterOrigin::Document,
            error: None,
        };
        lock(&self.documents).insert(book.id.clone(), loaded.clone());
        loaded
    }

    /// Drop cached results for a book.
    pub fn invalidate(&self, book_id: &str) {
        lock(&self.documents).remove(book_id);
        lock(&self.segmented).remove(book_id);
    }

    fn fallback(&self, book: &BookConfig, error: Option<ContentError>) -> LoadedChapters {
        let hash = content_hash(&book.synopsis);
        let chapters = self.memoized(&book.id, hash, || {
            build_fallback_with(&book.synopsis, &self.patterns)
        });
        LoadedChapters {
            book_id: book.id.clone(),
            chapters,
            origin: ChapterOrigin::Fallback,
            error,
        }
    }

    fn memoized(
        &self,
        book_id: &str,
        hash: String,
        build: impl FnOnce() -> ChapterList,
    ) -> ChapterList {
        if let Some((cached_hash, chapters)) = lock(&self.segmented).get(book_id) {
            if *cached_hash == hash {
                return chapters.clone();
            }
        }
        let chapters = build();
        lock(&self.segmented).insert(book_id.to_string(), (hash, chapters.clone()));
        chapters
    }

    #[cfg(test)]
    fn memo_len(&self) -> usize {
        lock(&self.segmented).len()
    }
}

/// Proof that a load was requested for a particular book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    book_id: String,
}

/// The reader's current selection and the chapters shown for it.
///
/// A load that finishes after the reader has moved on to another book is
/// discarded instead of overwriting the newer selection.
#[derive(Debug, Default)]
pub struct ReadingDesk {
    selected: Option<String>,
    chapters: Option<LoadedChapters>,
}

impl ReadingDesk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a book and get a ticket for loading its chapters.
    pub fn select(&mut self, book_id: &str) -> LoadTicket {
        if self.selected.as_deref() != Some(book_id) {
            self.chapters = None;
            self.selected = Some(book_id.to_string());
        }
        LoadTicket {
            book_id: book_id.to_string(),
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn chapters(&self) -> Option<&LoadedChapters> {
        self.chapters.as_ref()
    }

    /// Install a finished load. Returns false if it was stale.
    pub fn accept(&mut self, ticket: LoadTicket, loaded: LoadedChapters) -> bool {
        let current = self.selected.as_deref();
        if current != Some(ticket.book_id.as_str()) || loaded.book_id != ticket.book_id {
            log::debug!(
                "Discarding stale chapters for {} (selected: {:?})",
                loaded.book_id,
                current
            );
            return false;
        }
        self.chapters = Some(loaded);
        true
    }
}
