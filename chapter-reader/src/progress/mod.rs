//! Chapter progression: the unlock state machine and its persisted record.

mod machine;
mod store;
mod types;

pub use machine::{
    ChapterChange, ChapterCompleted, ChapterProgression, CompletionOutcome, ProgressionState,
    Rejection,
};
pub use store::{JsonProgressStore, MemoryProgressStore, ProgressStore};
pub use types::{BookProgress, ChapterStatus, NONE_COMPLETED};
