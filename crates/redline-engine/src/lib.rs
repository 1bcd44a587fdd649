//! Headless rich-text review engine: ranged comment threads that stay
//! anchored to the right text as the buffer is edited, with every edit
//! undoable.
//!
//! The entry point is [`Session`]: feed it user actions (typing, comments,
//! find/replace, undo/redo) and poll it for the buffer and comment
//! snapshots. See the [`editing`] module docs for the architecture.

pub mod editing;
pub mod io;
pub mod search;

// Re-export key types for easier usage
pub use editing::*;
pub use io::*;
pub use search::*;
