use crate::editing::TextRange;
use std::fmt;

/// Identity of a comment thread, allocated by the store. Ids are monotonic
/// within a session and never reused, so undo/redo can re-insert a removed
/// thread under its original id without colliding with later allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId(u64);

impl ThreadId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub(crate) fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReplyId(u64);

impl ReplyId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub(crate) fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ReplyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One message in a comment thread. Plain value type: mementos hold deep
/// copies of these, never references into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentReply {
    pub id: ReplyId,
    pub author: String,
    pub text: String,
    /// Unix seconds at creation.
    pub created_at: u64,
}

impl CommentReply {
    pub fn new(id: ReplyId, author: String, text: String, created_at: u64) -> Self {
        Self {
            id,
            author,
            text,
            created_at,
        }
    }
}

/// A comment thread anchored to a byte range of the buffer. The first reply
/// is the thread body; follow-ups append in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentThread {
    pub id: ThreadId,
    pub range: TextRange,
    pub replies: Vec<CommentReply>,
}

impl CommentThread {
    pub fn new(id: ThreadId, range: TextRange, replies: Vec<CommentReply>) -> Self {
        Self { id, range, replies }
    }

    /// The opening comment.
    pub fn body(&self) -> Option<&CommentReply> {
        self.replies.first()
    }

    pub fn latest_reply(&self) -> Option<&CommentReply> {
        self.replies.last()
    }
}
