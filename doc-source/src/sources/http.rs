//! HTTP document service source
//!
//! Fetches `GET {base_url}/pages/{page_id}/sections` and expects a JSON list
//! of `{title, body}` sections, optionally wrapped in `{"sections": [...]}`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::error::{Result, SourceError};
use crate::source::{DocumentSource, SourceSection, parse_sections, validate_page_id};

/// Source backed by a remote document service
pub struct HttpSource {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpSource {
    /// Create a new HTTP source
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn sections_url(&self, page_id: &str) -> String {
        format!("{}/pages/{}/sections", self.base_url, page_id)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(alias = "error")]
    message: String,
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn fetch_sections(&self, page_id: &str) -> Result<Vec<SourceSection>> {
        validate_page_id(page_id)?;

        let mut request = self
            .client
            .get(self.sections_url(page_id))
            .header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| SourceError::RequestFailed {
            message: format!("Request failed: {}", e),
            status_code: None,
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::PageNotFound(page_id.to_string()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&error_text) {
                Ok(error_response) => error_response.message,
                Err(_) => error_text,
            };

            return Err(SourceError::RequestFailed {
                message,
                status_code: Some(status.as_u16()),
            });
        }

        let text = response.text().await.map_err(|e| SourceError::RequestFailed {
            message: format!("Failed to read response: {}", e),
            status_code: None,
        })?;

        parse_sections(&text)
    }

    fn name(&self) -> &'static str {
        "HTTP document service"
    }

    fn is_available(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(SourceError::ConfigError("base_url is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_url_trims_slash() {
        let source =
            HttpSource::new("https://docs.example.com/api/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(
            source.sections_url("abc123"),
            "https://docs.example.com/api/pages/abc123/sections"
        );
    }

    #[tokio::test]
    async fn test_rejects_path_like_page_id() {
        let source =
            HttpSource::new("https://docs.example.com", None, Duration::from_secs(5)).unwrap();
        for page_id in ["../secrets", "..", "abc?x=1", "abc#frag"] {
            let result = source.fetch_sections(page_id).await;
            assert!(matches!(result, Err(SourceError::InvalidPageId(_))));
        }
    }

    #[test]
    fn test_empty_base_url_unavailable() {
        let source = HttpSource::new("", None, Duration::from_secs(5)).unwrap();
        assert!(source.is_available().is_err());
    }
}
