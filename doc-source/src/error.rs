use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Invalid page id: {0}")]
    InvalidPageId(String),

    #[error("Request failed{}: {message}", status_suffix(.status_code))]
    RequestFailed {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Malformed document payload: {0}")]
    MalformedPayload(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn status_suffix(status_code: &Option<u16>) -> String {
    status_code
        .map(|code| format!(" (HTTP {})", code))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, SourceError>;
