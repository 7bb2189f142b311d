use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable consulted when no token is set in the config
pub const TOKEN_ENV_VAR: &str = "CHAPTER_READER_SOURCE_TOKEN";

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Document source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source kind (none, http, directory)
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Base URL of the document service (for http)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Bearer token (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Directory holding `<page_id>.json` exports (for directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_kind() -> String {
    "none".to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            base_url: None,
            api_key: None,
            directory: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SourceConfig {
    /// Token from config, falling back to the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok())
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SourceConfig::default();
        assert_eq!(config.kind, "none");
        assert_eq!(config.timeout_secs, 15);
        assert!(config.base_url.is_none());
        assert!(config.directory.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
kind = "http"
base_url = "https://docs.example.com/api"
"#;
        let config: SourceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.kind, "http");
        assert_eq!(config.base_url.as_deref(), Some("https://docs.example.com/api"));
        assert_eq!(config.timeout_secs, 15);
    }

    #[test]
    fn test_config_key_takes_precedence() {
        let config = SourceConfig {
            api_key: Some("from-config".to_string()),
            ..SourceConfig::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("from-config"));
    }
}
