//! Local directory source
//!
//! Reads `{root}/{page_id}.json` exports in the same JSON shape the HTTP
//! service returns.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::{Result, SourceError};
use crate::source::{DocumentSource, SourceSection, parse_sections, validate_page_id};

/// Source reading page exports from disk
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn page_path(&self, page_id: &str) -> Result<PathBuf> {
        validate_page_id(page_id)?;
        Ok(self.root.join(format!("{}.json", page_id)))
    }
}

#[async_trait]
impl DocumentSource for DirectorySource {
    async fn fetch_sections(&self, page_id: &str) -> Result<Vec<SourceSection>> {
        let path = self.page_path(page_id)?;

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SourceError::PageNotFound(page_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        log::debug!("Read page export {}", path.display());
        parse_sections(&text)
    }

    fn name(&self) -> &'static str {
        "Local directory"
    }

    fn is_available(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(SourceError::ConfigError(format!(
                "Directory not found: {}",
                self.root.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_page_export() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("page-1.json"),
            r#"[{"title": "Preface", "body": "Why this book."}]"#,
        )
        .unwrap();

        let source = DirectorySource::new(temp_dir.path());
        assert!(source.is_available().is_ok());

        let sections = source.fetch_sections("page-1").await.unwrap();
        assert_eq!(sections, vec![SourceSection::new("Preface", "Why this book.")]);
    }

    #[tokio::test]
    async fn test_missing_page() {
        let temp_dir = TempDir::new().unwrap();
        let source = DirectorySource::new(temp_dir.path());
        let result = source.fetch_sections("absent").await;
        assert!(matches!(result, Err(SourceError::PageNotFound(id)) if id == "absent"));
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let source = DirectorySource::new(temp_dir.path());
        let result = source.fetch_sections("../etc/passwd").await;
        assert!(matches!(result, Err(SourceError::InvalidPageId(_))));
    }

    #[test]
    fn test_missing_directory_unavailable() {
        let source = DirectorySource::new("/nonexistent/chapter-reader/pages");
        assert!(source.is_available().is_err());
    }
}
