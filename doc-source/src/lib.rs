//! Document sources for the chapter reader
//!
//! A document source resolves an opaque page id into an ordered list of
//! titled text sections. Available sources:
//! - HTTP document service (JSON)
//! - Local directory of JSON page exports
//! - Scripted mock for tests

pub mod config;
pub mod error;
pub mod source;
pub mod sources;

pub use config::SourceConfig;
pub use error::{Result, SourceError};
pub use source::{DocumentSource, SourceSection};
pub use sources::{DirectorySource, HttpSource, MockSource, SourceKind, get_source};
