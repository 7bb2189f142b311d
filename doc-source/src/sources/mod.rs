//! Document source implementations

mod directory;
mod http;
pub mod mock;

pub use directory::DirectorySource;
pub use http::HttpSource;
pub use mock::MockSource;

use std::time::Duration;

use crate::config::SourceConfig;
use crate::error::{Result, SourceError};
use crate::source::DocumentSource;

/// Supported source types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    None,
    Http,
    Directory,
}

impl SourceKind {
    /// Parse source kind from string
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "" | "none" | "off" => Ok(Self::None),
            "http" | "https" => Ok(Self::Http),
            "directory" | "dir" | "local" => Ok(Self::Directory),
            _ => Err(SourceError::ConfigError(format!("Unknown source kind: {}", s))),
        }
    }
}

/// Create a source instance from config. `None` means fetching is disabled.
pub fn get_source(config: &SourceConfig) -> Result<Option<Box<dyn DocumentSource>>> {
    match SourceKind::parse(&config.kind)? {
        SourceKind::None => Ok(None),
        SourceKind::Http => {
            let base_url = config.base_url.clone().ok_or_else(|| {
                SourceError::ConfigError("http source requires base_url".to_string())
            })?;
            let timeout = Duration::from_secs(config.timeout_secs);
            Ok(Some(Box::new(HttpSource::new(
                &base_url,
                config.resolve_api_key(),
                timeout,
            )?)))
        }
        SourceKind::Directory => {
            let directory = config.directory.clone().ok_or_else(|| {
                SourceError::ConfigError("directory source requires directory".to_string())
            })?;
            Ok(Some(Box::new(DirectorySource::new(directory))))
        }
    }
}
