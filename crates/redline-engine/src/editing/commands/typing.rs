use std::collections::BTreeMap;

use crate::editing::commands::{Command, EditContext, UndoableCommand, current_ranges, merge_earliest};
use crate::editing::error::EditError;
use crate::editing::{CommentThread, TextRange, ThreadId};

/// What one keystroke does to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingAction {
    Insert(char),
    Newline,
    /// Delete backwards from the caret, or the whole selection.
    Backspace,
    /// Delete forwards from the caret, or the whole selection.
    Delete,
}

#[derive(Debug)]
struct TypingMemento {
    /// Text the edit removed (selection content or the deleted char).
    removed: String,
    removed_at: usize,
    /// Text the edit inserted; empty for pure deletions.
    inserted: String,
    inserted_at: usize,
    prior_selection: TextRange,
    /// Threads the deleted selection fully contained, removed whole.
    subsumed: Vec<CommentThread>,
    pre_ranges: BTreeMap<ThreadId, TextRange>,
    post_ranges: BTreeMap<ThreadId, TextRange>,
}

/// One keystroke as an undoable command: insert, newline, backspace or
/// forward delete, each replacing an active selection when there is one.
///
/// The comment-shift extent follows the caret convention of the store:
/// single-point edits pass the caret position as both extent bounds, a
/// deleted selection passes its own span. Backspace keeps `backspace` set so
/// a thread ending exactly at the caret shrinks, and inserts keep `force`
/// set so a thread starting exactly at the caret moves right.
#[derive(Debug)]
pub struct Typing {
    action: TypingAction,
    memento: Option<TypingMemento>,
}

impl Typing {
    pub fn new(action: TypingAction) -> Self {
        Self {
            action,
            memento: None,
        }
    }

    pub fn insert(c: char) -> Self {
        Self::new(TypingAction::Insert(c))
    }

    pub fn newline() -> Self {
        Self::new(TypingAction::Newline)
    }

    pub fn backspace() -> Self {
        Self::new(TypingAction::Backspace)
    }

    pub fn delete_forward() -> Self {
        Self::new(TypingAction::Delete)
    }

    /// Removes the selection: subsumed threads first, then the text, then
    /// the general shift over the rest.
    fn delete_selection(
        ctx: &mut EditContext<'_>,
        selection: TextRange,
        backspace: bool,
        memento: &mut TypingMemento,
    ) {
        memento.subsumed = ctx.comments.remove_contained(selection);
        memento.removed = ctx.editor.slice(selection);
        memento.removed_at = selection.start;
        ctx.editor.delete_range(selection);
        merge_earliest(
            &mut memento.pre_ranges,
            ctx.comments.shift(
                -(memento.removed.len() as isize),
                selection.start,
                selection.end,
                backspace,
                false,
            ),
        );
    }
}

impl Command for Typing {
    fn name(&self) -> &'static str {
        "typing"
    }

    fn can_execute(&self, ctx: &EditContext<'_>) -> bool {
        let selection = ctx.editor.selection();
        match self.action {
            TypingAction::Insert(_) | TypingAction::Newline => true,
            TypingAction::Backspace => !selection.is_caret() || selection.start > 0,
            TypingAction::Delete => !selection.is_caret() || selection.start < ctx.editor.len(),
        }
    }

    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<bool, EditError> {
        let selection = ctx.editor.selection();
        let mut memento = TypingMemento {
            removed: String::new(),
            removed_at: selection.start,
            inserted: String::new(),
            inserted_at: selection.start,
            prior_selection: selection,
            subsumed: Vec::new(),
            pre_ranges: BTreeMap::new(),
            post_ranges: BTreeMap::new(),
        };

        match self.action {
            TypingAction::Insert(_) | TypingAction::Newline => {
                if !selection.is_caret() {
                    Self::delete_selection(ctx, selection, false, &mut memento);
                }
                let c = match self.action {
                    TypingAction::Insert(c) => c,
                    _ => '\n',
                };
                let at = selection.start;
                let mut buf = [0u8; 4];
                let text = c.encode_utf8(&mut buf);
                ctx.editor.insert(at, text);
                merge_earliest(
                    &mut memento.pre_ranges,
                    ctx.comments.shift(text.len() as isize, at, at, false, true),
                );
                memento.inserted = text.to_string();
                memento.inserted_at = at;
                ctx.editor.set_cursor(at + text.len());
            }
            TypingAction::Backspace => {
                if !selection.is_caret() {
                    Self::delete_selection(ctx, selection, true, &mut memento);
                    ctx.editor.set_cursor(selection.start);
                } else {
                    let at = selection.start;
                    let content = ctx.editor.content();
                    let Some(c) = content.get(..at).and_then(|s| s.chars().next_back()) else {
                        return Ok(false);
                    };
                    let len = c.len_utf8();
                    memento.removed = c.to_string();
                    memento.removed_at = at - len;
                    ctx.editor.delete_range(TextRange::new(at - len, at));
                    merge_earliest(
                        &mut memento.pre_ranges,
                        ctx.comments.shift(-(len as isize), at, at, true, true),
                    );
                    ctx.editor.set_cursor(at - len);
                }
            }
            TypingAction::Delete => {
                if !selection.is_caret() {
                    Self::delete_selection(ctx, selection, false, &mut memento);
                    ctx.editor.set_cursor(selection.start);
                } else {
                    let at = selection.start;
                    let content = ctx.editor.content();
                    let Some(c) = content.get(at..).and_then(|s| s.chars().next()) else {
                        return Ok(false);
                    };
                    let len = c.len_utf8();
                    memento.removed = c.to_string();
                    memento.removed_at = at;
                    ctx.editor.delete_range(TextRange::new(at, at + len));
                    merge_earliest(
                        &mut memento.pre_ranges,
                        ctx.comments.shift(-(len as isize), at, at, false, false),
                    );
                    ctx.editor.set_cursor(at);
                }
            }
        }

        memento.post_ranges = current_ranges(ctx.comments, &memento.pre_ranges);
        // Match positions do not survive an unreported edit.
        ctx.search.clear();
        self.memento = Some(memento);
        Ok(true)
    }
}

impl UndoableCommand for Typing {
    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let m = self.memento.as_ref().ok_or(EditError::NotExecuted)?;

        if !m.inserted.is_empty() {
            let placed = TextRange::new(m.inserted_at, m.inserted_at + m.inserted.len());
            let found = ctx.editor.slice(placed);
            if found != m.inserted {
                return Err(EditError::BufferDesync {
                    at: m.inserted_at,
                    expected: m.inserted.clone(),
                    found,
                });
            }
            ctx.editor.delete_range(placed);
        }
        if !m.removed.is_empty() {
            ctx.editor.insert(m.removed_at, &m.removed);
        }

        ctx.comments.restore_ranges(&m.pre_ranges)?;
        for thread in &m.subsumed {
            ctx.comments.insert(thread.clone());
        }

        ctx.editor.select_range(m.prior_selection);
        ctx.search.clear();
        Ok(())
    }

    fn redo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let m = self.memento.as_ref().ok_or(EditError::NotExecuted)?;

        for thread in &m.subsumed {
            ctx.comments
                .remove_by_id(thread.id)
                .ok_or(EditError::ThreadNotFound(thread.id))?;
        }
        if !m.removed.is_empty() {
            let target = TextRange::new(m.removed_at, m.removed_at + m.removed.len());
            let found = ctx.editor.slice(target);
            if found != m.removed {
                return Err(EditError::BufferDesync {
                    at: m.removed_at,
                    expected: m.removed.clone(),
                    found,
                });
            }
            ctx.editor.delete_range(target);
        }
        if !m.inserted.is_empty() {
            ctx.editor.insert(m.inserted_at, &m.inserted);
        }

        ctx.comments.restore_ranges(&m.post_ranges)?;

        let cursor = if m.inserted.is_empty() {
            m.removed_at
        } else {
            m.inserted_at + m.inserted.len()
        };
        ctx.editor.set_cursor(cursor);
        ctx.search.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{CommentStore, Editor, HeadlessEditor};
    use crate::search::{InMemorySearchIndex, SearchIndex};
    use pretty_assertions::assert_eq;

    struct Fixture {
        editor: HeadlessEditor,
        comments: CommentStore,
        search: InMemorySearchIndex,
        last_search: Option<crate::editing::commands::SearchHit>,
    }

    impl Fixture {
        fn new(text: &str) -> Self {
            Self {
                editor: HeadlessEditor::from_text(text),
                comments: CommentStore::new(),
                search: InMemorySearchIndex::new(),
                last_search: None,
            }
        }

        fn ctx(&mut self) -> EditContext<'_> {
            EditContext {
                editor: &mut self.editor,
                comments: &mut self.comments,
                search: &mut self.search,
                last_search: &mut self.last_search,
            }
        }
    }

    // ============ Insertions ============

    #[test]
    fn test_insert_char_at_caret() {
        let mut fx = Fixture::new("hello world");
        fx.editor.set_cursor(5);

        let mut cmd = Typing::insert('X');
        assert!(cmd.execute(&mut fx.ctx()).unwrap());

        assert_eq!(fx.editor.content(), "helloX world");
        assert_eq!(fx.editor.selection(), TextRange::caret(6));
    }

    #[test]
    fn test_insert_at_thread_end_leaves_thread_alone() {
        let mut fx = Fixture::new("hello world");
        fx.comments
            .start_thread(TextRange::new(0, 5), "ann", "greeting");
        fx.editor.set_cursor(5);

        Typing::insert('X').execute(&mut fx.ctx()).unwrap();

        assert_eq!(fx.editor.content(), "helloX world");
        assert_eq!(fx.comments.threads()[0].range, TextRange::new(0, 5));
    }

    #[test]
    fn test_insert_multibyte_char_shifts_by_utf8_len() {
        let mut fx = Fixture::new("ab");
        fx.comments.start_thread(TextRange::new(1, 2), "ann", "b");
        fx.editor.set_cursor(0);

        Typing::insert('é').execute(&mut fx.ctx()).unwrap();

        assert_eq!(fx.editor.content(), "éab");
        assert_eq!(fx.comments.threads()[0].range, TextRange::new(3, 4));
    }

    #[test]
    fn test_newline_is_an_insert() {
        let mut fx = Fixture::new("ab");
        fx.editor.set_cursor(1);

        Typing::newline().execute(&mut fx.ctx()).unwrap();

        assert_eq!(fx.editor.content(), "a\nb");
    }

    #[test]
    fn test_insert_over_selection_deletes_then_inserts() {
        let mut fx = Fixture::new("hello world");
        fx.editor.select_range(TextRange::new(6, 11));

        Typing::insert('X').execute(&mut fx.ctx()).unwrap();

        assert_eq!(fx.editor.content(), "hello X");
        assert_eq!(fx.editor.selection(), TextRange::caret(7));
    }

    // ============ Deletions ============

    #[test]
    fn test_backspace_shifts_thread_after_caret() {
        let mut fx = Fixture::new("0123456789ab");
        fx.comments
            .start_thread(TextRange::new(5, 10), "ann", "span");
        fx.editor.set_cursor(4);

        Typing::backspace().execute(&mut fx.ctx()).unwrap();

        assert_eq!(fx.editor.content(), "012456789ab");
        assert_eq!(fx.comments.threads()[0].range, TextRange::new(4, 9));
        assert_eq!(fx.editor.selection(), TextRange::caret(3));
    }

    #[test]
    fn test_backspace_at_start_declined() {
        let mut fx = Fixture::new("abc");
        fx.editor.set_cursor(0);

        let mut cmd = Typing::backspace();
        assert!(!cmd.execute(&mut fx.ctx()).unwrap());
        assert_eq!(fx.editor.content(), "abc");
    }

    #[test]
    fn test_delete_forward_at_end_declined() {
        let mut fx = Fixture::new("abc");
        fx.editor.set_cursor(3);

        let mut cmd = Typing::delete_forward();
        assert!(!cmd.execute(&mut fx.ctx()).unwrap());
        assert_eq!(fx.editor.content(), "abc");
    }

    #[test]
    fn test_can_execute_matches_buffer_edge_declines() {
        let mut fx = Fixture::new("abc");

        fx.editor.set_cursor(0);
        assert!(!Typing::backspace().can_execute(&fx.ctx()));
        assert!(Typing::delete_forward().can_execute(&fx.ctx()));

        fx.editor.set_cursor(3);
        assert!(Typing::backspace().can_execute(&fx.ctx()));
        assert!(!Typing::delete_forward().can_execute(&fx.ctx()));

        // A selection makes either direction a plain deletion.
        fx.editor.select_range(TextRange::new(0, 3));
        assert!(Typing::backspace().can_execute(&fx.ctx()));
        assert!(Typing::delete_forward().can_execute(&fx.ctx()));
    }

    #[test]
    fn test_delete_forward_removes_char_at_caret() {
        let mut fx = Fixture::new("abc");
        fx.editor.set_cursor(1);

        Typing::delete_forward().execute(&mut fx.ctx()).unwrap();

        assert_eq!(fx.editor.content(), "ac");
        assert_eq!(fx.editor.selection(), TextRange::caret(1));
    }

    #[test]
    fn test_selection_delete_subsumes_contained_thread() {
        let mut fx = Fixture::new("0123456789abcdef");
        fx.comments
            .start_thread(TextRange::new(5, 10), "ann", "inside");
        fx.editor.select_range(TextRange::new(3, 12));

        Typing::backspace().execute(&mut fx.ctx()).unwrap();

        assert_eq!(fx.editor.content(), "012cdef");
        assert!(fx.comments.is_empty());
    }

    // ============ Undo / redo ============

    #[test]
    fn test_undo_restores_buffer_threads_and_selection() {
        let mut fx = Fixture::new("0123456789abcdef");
        fx.comments
            .start_thread(TextRange::new(5, 10), "ann", "inside");
        fx.editor.select_range(TextRange::new(3, 12));
        let before_threads = fx.comments.snapshot();

        let mut cmd = Typing::backspace();
        cmd.execute(&mut fx.ctx()).unwrap();
        cmd.undo(&mut fx.ctx()).unwrap();

        assert_eq!(fx.editor.content(), "0123456789abcdef");
        assert_eq!(fx.comments.snapshot(), before_threads);
        assert_eq!(fx.editor.selection(), TextRange::new(3, 12));
    }

    #[test]
    fn test_undo_redo_ping_pong_is_exact() {
        let mut fx = Fixture::new("hello world");
        fx.comments
            .start_thread(TextRange::new(6, 11), "ann", "world");
        fx.editor.select_range(TextRange::new(0, 5));

        let mut cmd = Typing::insert('X');
        cmd.execute(&mut fx.ctx()).unwrap();
        let after_content = fx.editor.content();
        let after_threads = fx.comments.snapshot();
        let after_selection = fx.editor.selection();

        for _ in 0..2 {
            cmd.undo(&mut fx.ctx()).unwrap();
            assert_eq!(fx.editor.content(), "hello world");
            cmd.redo(&mut fx.ctx()).unwrap();
            assert_eq!(fx.editor.content(), after_content);
            assert_eq!(fx.comments.snapshot(), after_threads);
            assert_eq!(fx.editor.selection(), after_selection);
        }
    }

    #[test]
    fn test_undo_detects_buffer_desync() {
        let mut fx = Fixture::new("abc");
        fx.editor.set_cursor(1);
        let mut cmd = Typing::insert('X');
        cmd.execute(&mut fx.ctx()).unwrap();

        // Outside interference the command never saw.
        fx.editor.replace_range(TextRange::new(1, 2), "Y");

        let err = cmd.undo(&mut fx.ctx()).unwrap_err();
        assert!(matches!(err, EditError::BufferDesync { .. }));
    }

    #[test]
    fn test_undo_before_execute_is_an_error() {
        let mut fx = Fixture::new("abc");
        let mut cmd = Typing::insert('X');
        assert!(matches!(
            cmd.undo(&mut fx.ctx()),
            Err(EditError::NotExecuted)
        ));
    }

    #[test]
    fn test_execute_invalidates_search_positions() {
        let mut fx = Fixture::new("cat cat");
        fx.search.set_content("cat cat");
        fx.search.find_next("cat").unwrap();

        fx.editor.set_cursor(0);
        Typing::insert('x').execute(&mut fx.ctx()).unwrap();

        // Positions were dropped; a rebuild sees the new content only after
        // set_content, so the stale queue must be gone.
        fx.search.set_content(&fx.editor.content());
        assert_eq!(fx.search.find_next("cat"), Some(1));
    }
}
