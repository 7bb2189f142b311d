//! chapter-reader - split book text into chapters and track progressive
//! chapter unlocking

pub mod config;
pub mod ledger;
pub mod loader;
pub mod progress;
pub mod text;
