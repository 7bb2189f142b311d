use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SourceError};

/// One titled block of text as delivered by a document source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSection {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl SourceSection {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Check that a page id is safe to embed in a URL path or file name.
///
/// Only ASCII letters, digits, `-` and `_` are allowed.
pub(crate) fn validate_page_id(page_id: &str) -> Result<()> {
    let valid = !page_id.is_empty()
        && page_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(SourceError::InvalidPageId(page_id.to_string()));
    }
    Ok(())
}

/// Accepted payload shapes: a bare array or an object with a `sections` array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SectionsPayload {
    Bare(Vec<SourceSection>),
    Wrapped { sections: Vec<SourceSection> },
}

/// Parse a JSON payload into sections
pub(crate) fn parse_sections(text: &str) -> Result<Vec<SourceSection>> {
    let payload: SectionsPayload = serde_json::from_str(text)
        .map_err(|e| SourceError::MalformedPayload(e.to_string()))?;

    Ok(match payload {
        SectionsPayload::Bare(sections) => sections,
        SectionsPayload::Wrapped { sections } => sections,
    })
}

/// Trait for document sources
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the ordered sections of a page. An empty list is a valid answer.
    async fn fetch_sections(&self, page_id: &str) -> Result<Vec<SourceSection>>;

    /// Get the source name for display
    fn name(&self) -> &'static str;

    /// Check if the source is usable (endpoint configured, directory present, etc.)
    fn is_available(&self) -> Result<()>;
}
