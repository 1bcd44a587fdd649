use crate::editing::commands::{EditContext, UndoableCommand};
use crate::editing::error::EditError;

pub const DEFAULT_HISTORY_LIMIT: usize = 30;

/// Bounded, linear undo/redo stacks of executed commands.
///
/// Executing a new command clears the redo stack: there is no branching
/// history. At capacity the oldest undo entry is evicted silently; running
/// out of room is never an error.
pub struct UndoRedoManager {
    undo_stack: Vec<Box<dyn UndoableCommand>>,
    redo_stack: Vec<Box<dyn UndoableCommand>>,
    limit: usize,
}

impl UndoRedoManager {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Records an executed command as the newest undoable step.
    pub fn push(&mut self, command: Box<dyn UndoableCommand>) {
        if self.undo_stack.len() >= self.limit {
            let evicted = self.undo_stack.remove(0);
            log::debug!("history full, evicting oldest {} command", evicted.name());
        }
        self.undo_stack.push(command);
        self.redo_stack.clear();
    }

    /// Undoes the newest step. `Ok(false)` when there is nothing to undo.
    /// On error the command is dropped rather than moved to the redo stack;
    /// a failed undo must not be replayable.
    pub fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<bool, EditError> {
        let Some(mut command) = self.undo_stack.pop() else {
            return Ok(false);
        };
        command.undo(ctx)?;
        self.redo_stack.push(command);
        Ok(true)
    }

    /// Redoes the newest undone step. `Ok(false)` when there is nothing to
    /// redo.
    pub fn redo(&mut self, ctx: &mut EditContext<'_>) -> Result<bool, EditError> {
        let Some(mut command) = self.redo_stack.pop() else {
            return Ok(false);
        };
        command.redo(ctx)?;
        self.undo_stack.push(command);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Empties both stacks without undoing anything (new-document path).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for UndoRedoManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::commands::{Command, EditContext, SearchHit};
    use crate::editing::editor::Editor;
    use crate::editing::{CommentStore, HeadlessEditor, Typing};
    use crate::search::InMemorySearchIndex;
    use pretty_assertions::assert_eq;

    struct Fixture {
        editor: HeadlessEditor,
        comments: CommentStore,
        search: InMemorySearchIndex,
        last_search: Option<SearchHit>,
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

        fn type_char(&mut self, history: &mut UndoRedoManager, c: char) {
            let mut cmd = Typing::insert(c);
            assert!(cmd.execute(&mut self.ctx()).unwrap());
            history.push(Box::new(cmd));
        }
    }

    #[test]
    fn test_empty_stacks_are_no_ops() {
        let mut fx = Fixture::new("abc");
        let mut history = UndoRedoManager::default();

        assert!(!history.undo(&mut fx.ctx()).unwrap());
        assert!(!history.redo(&mut fx.ctx()).unwrap());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_moves_command_to_redo_stack() {
        let mut fx = Fixture::new("");
        let mut history = UndoRedoManager::default();
        fx.type_char(&mut history, 'a');

        assert!(history.undo(&mut fx.ctx()).unwrap());
        assert_eq!(fx.editor.content(), "");
        assert!(!history.can_undo());
        assert!(history.can_redo());

        assert!(history.redo(&mut fx.ctx()).unwrap());
        assert_eq!(fx.editor.content(), "a");
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_new_command_clears_redo_stack() {
        let mut fx = Fixture::new("");
        let mut history = UndoRedoManager::default();
        fx.type_char(&mut history, 'a');
        history.undo(&mut fx.ctx()).unwrap();
        assert!(history.can_redo());

        fx.type_char(&mut history, 'b');

        assert!(!history.can_redo());
        assert_eq!(fx.editor.content(), "b");
    }

    #[test]
    fn test_capacity_evicts_oldest_silently() {
        let mut fx = Fixture::new("");
        let mut history = UndoRedoManager::new(30);

        for _ in 0..31 {
            fx.type_char(&mut history, 'x');
        }
        assert_eq!(history.undo_depth(), 30);

        for _ in 0..30 {
            assert!(history.undo(&mut fx.ctx()).unwrap());
        }
        // The 31st step was evicted: one char is stranded.
        assert!(!history.undo(&mut fx.ctx()).unwrap());
        assert_eq!(fx.editor.content(), "x");
    }

    #[test]
    fn test_clear_empties_both_stacks_without_undoing() {
        let mut fx = Fixture::new("");
        let mut history = UndoRedoManager::default();
        fx.type_char(&mut history, 'a');
        fx.type_char(&mut history, 'b');
        history.undo(&mut fx.ctx()).unwrap();

        history.clear();

        assert!(!history.can_undo());
        assert!(!history.can_redo());
        // Buffer stays as it was at clear time.
        assert_eq!(fx.editor.content(), "a");
    }

    #[test]
    fn test_multi_command_sequence_unwinds_in_order() {
        let mut fx = Fixture::new("");
        let mut history = UndoRedoManager::default();
        for c in ['a', 'b', 'c'] {
            fx.type_char(&mut history, c);
        }
        assert_eq!(fx.editor.content(), "abc");

        history.undo(&mut fx.ctx()).unwrap();
        assert_eq!(fx.editor.content(), "ab");
        history.undo(&mut fx.ctx()).unwrap();
        assert_eq!(fx.editor.content(), "a");
        history.redo(&mut fx.ctx()).unwrap();
        history.redo(&mut fx.ctx()).unwrap();
        assert_eq!(fx.editor.content(), "abc");
    }

    #[test]
    fn test_failed_undo_is_not_replayable() {
        let mut fx = Fixture::new("");
        let mut history = UndoRedoManager::default();
        fx.type_char(&mut history, 'a');

        // Sabotage the buffer behind the command's back.
        fx.editor.set_content("other");

        assert!(history.undo(&mut fx.ctx()).is_err());
        assert!(!history.can_redo());
        assert!(!history.can_undo());
    }
}
