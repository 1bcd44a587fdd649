use crate::editing::{ReplyId, ThreadId};
use thiserror::Error;

/// Invariant violations surfaced by commands, undo/redo, and the comment
/// store. Declined preconditions are not errors; they come back as
/// `Ok(false)` from `Command::execute`.
#[derive(Debug, Error)]
pub enum EditError {
    /// An undo/redo step or range restore referenced a thread that is gone.
    #[error("no comment thread with id {0}")]
    ThreadNotFound(ThreadId),

    /// Undo found different buffer content than the command recorded.
    #[error("buffer desync at offset {at}: expected {expected:?}, found {found:?}")]
    BufferDesync {
        at: usize,
        expected: String,
        found: String,
    },

    /// Undo popped a different reply than the one the command recorded.
    #[error("reply mismatch on thread {thread}: expected reply {expected}, found {found}")]
    ReplyMismatch {
        thread: ThreadId,
        expected: ReplyId,
        found: ReplyId,
    },

    /// A reply undo targeted a thread with no replies left to remove.
    #[error("comment thread {0} has no replies to remove")]
    NoReplies(ThreadId),

    /// Undo or redo was invoked on a command that never executed, so there
    /// is no memento to apply.
    #[error("undo/redo on a command that never executed")]
    NotExecuted,
}
