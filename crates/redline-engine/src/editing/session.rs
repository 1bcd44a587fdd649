use crate::editing::commands::{
    Command, Comment, EditContext, Find, Reply, Replace, ReplaceAll, SearchHit, Typing,
    UndoableCommand,
};
use crate::editing::error::EditError;
use crate::editing::history::{DEFAULT_HISTORY_LIMIT, UndoRedoManager};
use crate::editing::{
    CommentReply, CommentStore, CommentThread, Editor, HeadlessEditor, ReplyId, TextRange,
    ThreadId,
};
use crate::io::DocumentPayload;
use crate::search::{InMemorySearchIndex, SearchIndex};

/// Per-session settings, usually derived from the user's config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Name stamped on threads and replies created here.
    pub author: String,
    /// Undo stack depth.
    pub history_limit: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            author: "anonymous".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl From<&redline_config::Config> for SessionOptions {
    fn from(config: &redline_config::Config) -> Self {
        Self {
            author: config.author.clone(),
            history_limit: config.history_limit,
        }
    }
}

/// One review session: a text buffer, its comment threads, the search
/// index, and a linear undo/redo history, wired together explicitly.
///
/// Every user action dispatches as exactly one command against borrows of
/// these parts; nothing global, one writer at a time. Observers poll
/// [`Session::comments_revision`] and take [`Session::comments`] snapshots
/// rather than holding references into the store.
pub struct Session {
    editor: Box<dyn Editor>,
    comments: CommentStore,
    search: Box<dyn SearchIndex>,
    history: UndoRedoManager,
    last_search: Option<SearchHit>,
    options: SessionOptions,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        Self::with_ports(
            Box::new(HeadlessEditor::new()),
            Box::new(InMemorySearchIndex::new()),
            options,
        )
    }

    pub fn from_text(text: &str, options: SessionOptions) -> Self {
        Self::with_ports(
            Box::new(HeadlessEditor::from_text(text)),
            Box::new(InMemorySearchIndex::new()),
            options,
        )
    }

    /// Wires the session over caller-provided editor and search ports
    /// (embedders with their own rendering surface or search engine).
    pub fn with_ports(
        editor: Box<dyn Editor>,
        search: Box<dyn SearchIndex>,
        options: SessionOptions,
    ) -> Self {
        let history = UndoRedoManager::new(options.history_limit);
        Self {
            editor,
            comments: CommentStore::new(),
            search,
            history,
            last_search: None,
            options,
        }
    }

    // ============ Typing ============

    pub fn insert_char(&mut self, c: char) -> Result<bool, EditError> {
        self.run(Box::new(Typing::insert(c)))
    }

    pub fn insert_newline(&mut self) -> Result<bool, EditError> {
        self.run(Box::new(Typing::newline()))
    }

    pub fn backspace(&mut self) -> Result<bool, EditError> {
        self.run(Box::new(Typing::backspace()))
    }

    pub fn delete_forward(&mut self) -> Result<bool, EditError> {
        self.run(Box::new(Typing::delete_forward()))
    }

    // ============ Annotation ============

    /// Opens a comment thread over the current selection.
    pub fn comment(&mut self, text: &str) -> Result<bool, EditError> {
        let author = self.options.author.clone();
        self.run(Box::new(Comment::new(author, text)))
    }

    pub fn reply(&mut self, thread: ThreadId, text: &str) -> Result<bool, EditError> {
        let author = self.options.author.clone();
        self.run(Box::new(Reply::new(thread, author, text)))
    }

    // ============ Search ============

    /// Selects the next occurrence of `term`; repeated calls rotate through
    /// all matches. Finds never enter the history.
    pub fn find(&mut self, term: &str) -> Result<bool, EditError> {
        let mut command = Find::new(term);
        let mut ctx = EditContext {
            editor: &mut *self.editor,
            comments: &mut self.comments,
            search: &mut *self.search,
            last_search: &mut self.last_search,
        };
        command.execute(&mut ctx)
    }

    /// Replaces the match of the immediately preceding [`Session::find`]
    /// for the same term. `Ok(false)` with a broken chain locates the next
    /// match instead; call again to replace it.
    pub fn replace(&mut self, term: &str, replacement: &str) -> Result<bool, EditError> {
        self.run(Box::new(Replace::new(term, replacement)))
    }

    pub fn replace_all(&mut self, term: &str, replacement: &str) -> Result<bool, EditError> {
        self.run(Box::new(ReplaceAll::new(term, replacement)))
    }

    // ============ History ============

    pub fn undo(&mut self) -> Result<bool, EditError> {
        let mut ctx = EditContext {
            editor: &mut *self.editor,
            comments: &mut self.comments,
            search: &mut *self.search,
            last_search: &mut self.last_search,
        };
        let undone = self.history.undo(&mut ctx)?;
        if undone {
            self.last_search = None;
            self.editor.on_command_success();
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool, EditError> {
        let mut ctx = EditContext {
            editor: &mut *self.editor,
            comments: &mut self.comments,
            search: &mut *self.search,
            last_search: &mut self.last_search,
        };
        let redone = self.history.redo(&mut ctx)?;
        if redone {
            self.last_search = None;
            self.editor.on_command_success();
        }
        Ok(redone)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// `(undo_depth, redo_depth)`.
    pub fn history_depths(&self) -> (usize, usize) {
        (self.history.undo_depth(), self.history.redo_depth())
    }

    // ============ Queries and selection ============

    pub fn content(&self) -> String {
        self.editor.content()
    }

    pub fn selection(&self) -> TextRange {
        self.editor.selection()
    }

    pub fn select(&mut self, range: TextRange) {
        self.editor.select_range(range);
    }

    pub fn set_cursor(&mut self, at: usize) {
        self.editor.set_cursor(at);
    }

    /// Deep snapshot of every comment thread, sorted by range start.
    pub fn comments(&self) -> Vec<CommentThread> {
        self.comments.snapshot()
    }

    /// Cheap dirty check for observers: unchanged revision means the
    /// snapshot they hold is still current.
    pub fn comments_revision(&self) -> u64 {
        self.comments.revision()
    }

    /// Deep copies of the threads touching `range`.
    pub fn threads_overlapping(&self, range: TextRange) -> Vec<CommentThread> {
        self.comments
            .overlapping(range)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn is_range_commented(&self, range: TextRange) -> bool {
        !self.comments.overlapping(range).is_empty()
    }

    // ============ Lifecycle ============

    /// Resets to an empty document. History is discarded, not unwound.
    pub fn new_document(&mut self) {
        self.editor.set_content("");
        self.comments.clear();
        self.search.set_content("");
        self.search.clear();
        self.history.clear();
        self.last_search = None;
        log::debug!("session reset to a new document");
    }

    /// Replaces the whole session state with a loaded document. Thread and
    /// reply ids are reassigned monotonically in payload order.
    pub fn load_payload(&mut self, payload: DocumentPayload) {
        self.new_document();
        self.editor.set_content(&payload.content);
        self.search.set_content(&payload.content);

        let mut next_reply = 0u64;
        for (thread_index, comment) in payload.comments.into_iter().enumerate() {
            let replies: Vec<CommentReply> = comment
                .replies
                .into_iter()
                .map(|reply| {
                    let id = ReplyId::from_raw(next_reply);
                    next_reply += 1;
                    CommentReply::new(id, reply.author, reply.text, reply.timestamp)
                })
                .collect();
            self.comments.insert(CommentThread::new(
                ThreadId::from_raw(thread_index as u64),
                comment.range,
                replies,
            ));
        }
    }

    /// Serializable view of the session: buffer plus comment threads in the
    /// persistence wire shape.
    pub fn to_payload(&self) -> DocumentPayload {
        DocumentPayload {
            content: self.content(),
            comments: self.comments.threads().iter().map(Into::into).collect(),
        }
    }

    /// Executes one undoable command: push to history and clear the redo
    /// stack when applied, report a declined precondition as `false`.
    fn run(&mut self, mut command: Box<dyn UndoableCommand>) -> Result<bool, EditError> {
        let name = command.name();
        let mut ctx = EditContext {
            editor: &mut *self.editor,
            comments: &mut self.comments,
            search: &mut *self.search,
            last_search: &mut self.last_search,
        };
        let applied = command.execute(&mut ctx)?;
        if applied {
            // The match a find surfaced is gone once anything else ran.
            self.last_search = None;
            self.history.push(command);
            self.editor.on_command_success();
            log::debug!("executed {name} command");
        } else {
            log::debug!("{name} command declined");
        }
        Ok(applied)
    }
}
