//! Mock document source for testing
//!
//! Provides a configurable source that can simulate failures, empty pages,
//! and successful fetches.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, SourceError};
use crate::source::{DocumentSource, SourceSection};

/// A mock source for testing fallback behavior
pub struct MockSource {
    /// Number of times to fail before succeeding (0 = always succeed)
    fail_count: AtomicUsize,
    /// Current call count
    call_count: AtomicUsize,
    /// Error to return on failure (None = always succeed)
    fail_with: Mutex<Option<SourceError>>,
    /// Sections to return on success
    sections: Vec<SourceSection>,
    /// Page ids requested so far, in call order
    requested: Mutex<Vec<String>>,
}

impl MockSource {
    /// Create a source that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: SourceError, sections: Vec<SourceSection>) -> Self {
        Self {
            fail_count: AtomicUsize::new(n),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(Some(error)),
            sections,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Create a source that always fails with the given error
    pub fn always_fails(error: SourceError) -> Self {
        Self::fails_then_succeeds(usize::MAX, error, Vec::new())
    }

    /// Create a source that always returns the given sections
    pub fn always_returns(sections: Vec<SourceSection>) -> Self {
        Self {
            fail_count: AtomicUsize::new(0),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
            sections,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Create a source that answers every page with an empty list
    pub fn empty() -> Self {
        Self::always_returns(Vec::new())
    }

    /// Get the number of times fetch_sections() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Page ids passed to fetch_sections(), in call order
    pub fn requested_pages(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|pages| pages.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentSource for MockSource {
    async fn fetch_sections(&self, page_id: &str) -> Result<Vec<SourceSection>> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(page_id.to_string());
        }

        if call_num < self.fail_count.load(Ordering::SeqCst) {
            if let Ok(error) = self.fail_with.lock() {
                if let Some(err) = error.as_ref() {
                    return Err(clone_error(err));
                }
            }
        }

        Ok(self.sections.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

/// Clone a SourceError (needed because SourceError doesn't implement Clone)
fn clone_error(err: &SourceError) -> SourceError {
    match err {
        SourceError::PageNotFound(s) => SourceError::PageNotFound(s.clone()),
        SourceError::InvalidPageId(s) => SourceError::InvalidPageId(s.clone()),
        SourceError::RequestFailed {
            message,
            status_code,
        } => SourceError::RequestFailed {
            message: message.clone(),
            status_code: *status_code,
        },
        SourceError::MalformedPayload(s) => SourceError::MalformedPayload(s.clone()),
        SourceError::ConfigError(s) => SourceError::ConfigError(s.clone()),
        SourceError::Io(e) => SourceError::Io(std::io::Error::new(e.kind(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<SourceSection> {
        vec![SourceSection::new("Chapter 1", "Body")]
    }

    #[tokio::test]
    async fn test_always_returns() {
        let source = MockSource::always_returns(sample());

        let result = source.fetch_sections("page").await;
        assert_eq!(result.unwrap(), sample());
        assert_eq!(source.call_count(), 1);
        assert_eq!(source.requested_pages(), vec!["page".to_string()]);
    }

    #[tokio::test]
    async fn test_always_fails() {
        let source = MockSource::always_fails(SourceError::RequestFailed {
            message: "offline".to_string(),
            status_code: None,
        });

        for _ in 0..3 {
            let result = source.fetch_sections("page").await;
            assert!(matches!(result, Err(SourceError::RequestFailed { .. })));
        }
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_then_succeeds() {
        let source = MockSource::fails_then_succeeds(
            1,
            SourceError::RequestFailed {
                message: "timeout".to_string(),
                status_code: Some(504),
            },
            sample(),
        );

        assert!(source.fetch_sections("page").await.is_err());
        assert_eq!(source.fetch_sections("page").await.unwrap(), sample());
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty() {
        let source = MockSource::empty();
        assert!(source.fetch_sections("page").await.unwrap().is_empty());
    }
}
