//! Undoable units of editing work.
//!
//! Every user-visible mutation is a [`Command`]: `execute` applies it against
//! an [`EditContext`] and records a memento, `undo`/`redo` replay it exactly
//! from that memento. Commands never reach into globals; everything they
//! touch comes in through the context borrows.

mod annotate;
mod find_replace;
mod typing;

pub use annotate::{Comment, Reply};
pub use find_replace::{Find, Replace, ReplaceAll};
pub use typing::{Typing, TypingAction};

use std::collections::BTreeMap;

use crate::editing::error::EditError;
use crate::editing::{CommentStore, Editor, TextRange, ThreadId};
use crate::search::SearchIndex;

/// The match a successful `Find` left selected. `Replace` only acts when
/// this records a hit for its own term; every other successful command
/// clears it, so a stale match can never be replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub term: String,
    pub index: usize,
}

/// Everything a command may touch, borrowed for the duration of one
/// execute/undo/redo call. The session owns all four and hands them out to
/// exactly one command at a time.
pub struct EditContext<'a> {
    pub editor: &'a mut dyn Editor,
    pub comments: &'a mut CommentStore,
    pub search: &'a mut dyn SearchIndex,
    pub last_search: &'a mut Option<SearchHit>,
}

/// A unit of editing work.
///
/// `execute` returns `Ok(false)` for a declined precondition (nothing
/// mutated), `Ok(true)` once applied, and `Err` only for invariant
/// violations.
pub trait Command {
    fn name(&self) -> &'static str;

    /// Side-effect-free precondition probe: `false` predicts that `execute`
    /// would decline. UIs use this to grey out actions; `execute` still
    /// performs the authoritative check.
    fn can_execute(&self, ctx: &EditContext<'_>) -> bool {
        let _ = ctx;
        true
    }

    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<bool, EditError>;
}

/// A command that can be reversed and replayed from its memento. Called at
/// most once per direction and only in execute/undo/redo ping-pong order;
/// each call must restore the respective state exactly.
pub trait UndoableCommand: Command {
    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError>;

    fn redo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError>;
}

/// Folds a fresh shift map into an accumulated one, keeping the earliest
/// recorded range per thread so a multi-step command undoes to the state
/// before its first shift.
pub(crate) fn merge_earliest(
    into: &mut BTreeMap<ThreadId, TextRange>,
    newly_moved: BTreeMap<ThreadId, TextRange>,
) {
    for (id, range) in newly_moved {
        into.entry(id).or_insert(range);
    }
}

/// Current ranges of the threads in `moved`, captured after all shifts of a
/// command ran: the redo counterpart of the pre-shift map.
pub(crate) fn current_ranges(
    comments: &CommentStore,
    moved: &BTreeMap<ThreadId, TextRange>,
) -> BTreeMap<ThreadId, TextRange> {
    moved
        .keys()
        .filter_map(|id| comments.thread(*id).map(|t| (*id, t.range)))
        .collect()
}
