use crate::editing::commands::{Command, EditContext, UndoableCommand};
use crate::editing::error::EditError;
use crate::editing::{CommentReply, CommentThread, HighlightHandle, ThreadId};

#[derive(Debug)]
struct CommentMemento {
    thread: CommentThread,
    highlight: HighlightHandle,
}

/// Opens a comment thread over the current selection.
///
/// Declined when the selection is a caret or the comment text is empty. The
/// created thread is mementoed whole, so redo re-inserts it under its
/// original id and timestamps instead of allocating a new one.
#[derive(Debug)]
pub struct Comment {
    author: String,
    text: String,
    memento: Option<CommentMemento>,
}

impl Comment {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            memento: None,
        }
    }
}

impl Command for Comment {
    fn name(&self) -> &'static str {
        "comment"
    }

    fn can_execute(&self, ctx: &EditContext<'_>) -> bool {
        !ctx.editor.selection().is_caret() && !self.text.is_empty()
    }

    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<bool, EditError> {
        let selection = ctx.editor.selection();
        if selection.is_caret() || self.text.is_empty() {
            return Ok(false);
        }

        let thread = ctx.comments.start_thread(selection, &self.author, &self.text);
        let highlight = ctx.editor.highlight(selection);
        ctx.editor.set_cursor(selection.end);

        self.memento = Some(CommentMemento { thread, highlight });
        Ok(true)
    }
}

impl UndoableCommand for Comment {
    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let m = self.memento.as_ref().ok_or(EditError::NotExecuted)?;

        ctx.editor.remove_highlight(m.highlight);
        ctx.comments
            .remove_by_id(m.thread.id)
            .ok_or(EditError::ThreadNotFound(m.thread.id))?;
        ctx.editor.set_cursor(m.thread.range.end);
        Ok(())
    }

    fn redo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let m = self.memento.as_mut().ok_or(EditError::NotExecuted)?;

        ctx.comments.insert(m.thread.clone());
        m.highlight = ctx.editor.highlight(m.thread.range);
        ctx.editor.set_cursor(m.thread.range.end);
        Ok(())
    }
}

/// Appends a reply to an existing thread.
///
/// Declined when the text is empty or the thread is gone. Undo pops the
/// thread's latest reply and insists it is the one this command added; a
/// different reply on top means the history diverged and the undo is
/// refused.
#[derive(Debug)]
pub struct Reply {
    thread: ThreadId,
    author: String,
    text: String,
    memento: Option<CommentReply>,
}

impl Reply {
    pub fn new(thread: ThreadId, author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            thread,
            author: author.into(),
            text: text.into(),
            memento: None,
        }
    }
}

impl Command for Reply {
    fn name(&self) -> &'static str {
        "reply"
    }

    fn can_execute(&self, ctx: &EditContext<'_>) -> bool {
        !self.text.is_empty() && ctx.comments.thread(self.thread).is_some()
    }

    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<bool, EditError> {
        if self.text.is_empty() {
            return Ok(false);
        }
        let Some(reply) = ctx.comments.add_reply(self.thread, &self.author, &self.text) else {
            return Ok(false);
        };
        self.memento = Some(reply);
        Ok(true)
    }
}

impl UndoableCommand for Reply {
    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let m = self.memento.as_ref().ok_or(EditError::NotExecuted)?;

        let popped = ctx
            .comments
            .remove_latest_reply(self.thread)
            .ok_or(EditError::NoReplies(self.thread))?;
        if popped.id != m.id {
            let found = popped.id;
            // Put the stranger back; refusing beats corrupting the thread.
            ctx.comments.push_reply(self.thread, popped)?;
            return Err(EditError::ReplyMismatch {
                thread: self.thread,
                expected: m.id,
                found,
            });
        }
        Ok(())
    }

    fn redo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let m = self.memento.as_ref().ok_or(EditError::NotExecuted)?;
        ctx.comments.push_reply(self.thread, m.clone())
    }
}
