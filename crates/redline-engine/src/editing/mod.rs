/*!
 * # Editing Core
 *
 * The annotation-consistency and undo/redo engine.
 *
 * ## Architecture Overview
 *
 * ### 1. Single Source of Truth: xi-rope Buffer
 * - The document lives in a single `xi_rope::Rope` behind the [`Editor`]
 *   port; commands never touch text any other way
 * - The engine ships [`HeadlessEditor`]; embedders with a rendering
 *   surface implement the port themselves
 *
 * ### 2. Command-Based Editing
 * - Every mutation (typing, commenting, replying, replace, replace-all)
 *   is a [`Command`] carrying its own memento
 * - `execute` either fully applies and enters the history, or declines
 *   with `Ok(false)` leaving nothing changed
 *
 * ### 3. Comment Threads Anchored by Interval Shifting
 * - [`CommentStore`] keeps every thread range correct across
 *   buffer-length changes via [`CommentStore::shift`], and records
 *   pre-shift ranges so undo restores them exactly
 * - A deletion that swallows a thread whole removes it (subsumption);
 *   only undoing that deletion brings it back
 *
 * ### 4. Linear Bounded History
 * - [`UndoRedoManager`] owns two bounded stacks; a new command clears the
 *   redo stack, overflow silently evicts the oldest entry
 *
 * ### 5. Explicit Composition, Snapshot Reads
 * - [`Session`] wires editor, store, search index and history together
 *   and dispatches one command at a time; no globals
 * - Observers poll a revision counter and take deep snapshots instead of
 *   holding references into the store
 */

pub mod comment;
pub mod commands;
pub mod editor;
pub mod error;
pub mod history;
pub mod range;
pub mod session;
pub mod store;

pub use comment::{CommentReply, CommentThread, ReplyId, ThreadId};
pub use commands::{
    Command, Comment, EditContext, Find, Reply, Replace, ReplaceAll, SearchHit, Typing,
    TypingAction, UndoableCommand,
};
pub use editor::{Editor, HeadlessEditor, HighlightHandle};
pub use error::EditError;
pub use history::{DEFAULT_HISTORY_LIMIT, UndoRedoManager};
pub use range::TextRange;
pub use session::{Session, SessionOptions};
pub use store::CommentStore;
