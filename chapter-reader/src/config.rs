//! chapter-reader configuration: document source, book catalog, data dir.

use anyhow::{Context, Result};
use doc_source::SourceConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::text::HeadingPatterns;

/// One entry in the book catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookConfig {
    pub id: String,

    #[serde(default)]
    pub title: String,

    /// Page in the document source holding the book's sections
    #[serde(default)]
    pub page_id: Option<String>,

    /// Short description used when no structured content is available
    #[serde(default)]
    pub synopsis: String,
}

impl BookConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            page_id: None,
            synopsis: String::new(),
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() { &self.id } else { &self.title }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Where progress and the ledger are kept. None means the platform
    /// data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Additional heading keywords, matched like the built-in ones
    #[serde(default)]
    pub extra_keywords: Vec<String>,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub books: Vec<BookConfig>,
}

impl ReaderConfig {
    /// Get the config file path: ~/.config/cli-programs/chapter-reader.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("chapter-reader.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ReaderConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Resolve the data directory for progress and ledger files.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .map(|d| d.join("chapter-reader"))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
    }

    pub fn get_book(&self, id: &str) -> Option<&BookConfig> {
        self.books.iter().find(|b| b.id == id)
    }

    /// Add a book, replacing any entry with the same id.
    pub fn add_book(&mut self, book: BookConfig) {
        match self.books.iter_mut().find(|b| b.id == book.id) {
            Some(existing) => *existing = book,
            None => self.books.push(book),
        }
    }

    /// Build the heading table, including any configured extra keywords.
    pub fn heading_patterns(&self) -> Result<HeadingPatterns> {
        if self.extra_keywords.is_empty() {
            return Ok(HeadingPatterns::default());
        }
        HeadingPatterns::with_extra_keywords(&self.extra_keywords)
            .context("Invalid extra heading keyword")
    }
}
