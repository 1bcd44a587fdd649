use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::editing::error::EditError;
use crate::editing::{CommentReply, CommentThread, ReplyId, TextRange, ThreadId};

/// Owns every comment thread of a session, kept sorted by `range.start`
/// (stable: insertion order breaks ties).
///
/// All mutation goes through the store so thread ids stay monotonic, the
/// sort order survives every edit, and observers poll `revision` for a cheap
/// dirty check instead of holding references into the thread list.
#[derive(Debug, Clone, Default)]
pub struct CommentStore {
    threads: Vec<CommentThread>,
    next_thread_id: u64,
    next_reply_id: u64,
    revision: u64,
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threads(&self) -> &[CommentThread] {
        &self.threads
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Bumped on every mutation. Equal revisions mean unchanged threads.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn thread(&self, id: ThreadId) -> Option<&CommentThread> {
        self.threads.iter().find(|t| t.id == id)
    }

    fn thread_mut(&mut self, id: ThreadId) -> Option<&mut CommentThread> {
        self.threads.iter_mut().find(|t| t.id == id)
    }

    /// Deep copy of every thread, for UI snapshots and persistence.
    pub fn snapshot(&self) -> Vec<CommentThread> {
        self.threads.clone()
    }

    /// Opens a new thread over `range` with its body reply. Returns a deep
    /// copy for the caller's memento.
    pub fn start_thread(&mut self, range: TextRange, author: &str, text: &str) -> CommentThread {
        let id = ThreadId::from_raw(self.next_thread_id);
        self.next_thread_id += 1;
        let body = self.stamp_reply(author, text);
        let thread = CommentThread::new(id, range, vec![body]);
        self.threads.push(thread.clone());
        self.resort();
        self.touch();
        thread
    }

    /// Re-inserts a fully formed thread (undo/redo and payload load paths).
    /// Id counters are raised past any id the thread carries so later
    /// allocations never collide with it.
    pub fn insert(&mut self, thread: CommentThread) {
        self.next_thread_id = self.next_thread_id.max(thread.id.raw() + 1);
        for reply in &thread.replies {
            self.next_reply_id = self.next_reply_id.max(reply.id.raw() + 1);
        }
        self.threads.push(thread);
        self.resort();
        self.touch();
    }

    pub fn remove_by_id(&mut self, id: ThreadId) -> Option<CommentThread> {
        let at = self.threads.iter().position(|t| t.id == id)?;
        let removed = self.threads.remove(at);
        self.touch();
        Some(removed)
    }

    /// Removes the first thread whose range starts at `start`.
    pub fn remove_by_start(&mut self, start: usize) -> Option<CommentThread> {
        let at = self.threads.iter().position(|t| t.range.start == start)?;
        let removed = self.threads.remove(at);
        self.touch();
        Some(removed)
    }

    /// Appends a reply to a thread, stamping id and creation time. Returns a
    /// copy for the caller's memento, or `None` when the thread is gone.
    pub fn add_reply(&mut self, id: ThreadId, author: &str, text: &str) -> Option<CommentReply> {
        if self.thread(id).is_none() {
            return None;
        }
        let reply = self.stamp_reply(author, text);
        let thread = self.thread_mut(id)?;
        thread.replies.push(reply.clone());
        self.touch();
        Some(reply)
    }

    /// Redo path: re-attach a recorded reply without restamping it.
    pub fn push_reply(&mut self, id: ThreadId, reply: CommentReply) -> Result<(), EditError> {
        self.next_reply_id = self.next_reply_id.max(reply.id.raw() + 1);
        let thread = self.thread_mut(id).ok_or(EditError::ThreadNotFound(id))?;
        thread.replies.push(reply);
        self.touch();
        Ok(())
    }

    pub fn remove_latest_reply(&mut self, id: ThreadId) -> Option<CommentReply> {
        let thread = self.thread_mut(id)?;
        let reply = thread.replies.pop()?;
        self.touch();
        Some(reply)
    }

    /// Every thread whose span intersects `range`, boundary contact included.
    pub fn overlapping(&self, range: TextRange) -> Vec<&CommentThread> {
        self.threads
            .iter()
            .filter(|t| t.range.touches(&range))
            .collect()
    }

    /// Every thread lying fully inside `range`.
    pub fn contained_in(&self, range: TextRange) -> Vec<&CommentThread> {
        self.threads
            .iter()
            .filter(|t| range.contains_range(&t.range))
            .collect()
    }

    /// Removes and returns every thread fully contained in `selection`.
    /// Deletion commands call this before shifting so subsumed threads are
    /// mementoed whole instead of being squeezed into empty ranges.
    pub fn remove_contained(&mut self, selection: TextRange) -> Vec<CommentThread> {
        let removed: Vec<CommentThread> = self
            .contained_in(selection)
            .into_iter()
            .cloned()
            .collect();
        if removed.is_empty() {
            return removed;
        }
        self.threads
            .retain(|t| !selection.contains_range(&t.range));
        self.touch();
        removed
    }

    /// Adjusts every thread for an edit of `amount` signed bytes over the
    /// extent `edit_start..edit_end` (caret position twice for single-point
    /// edits). Returns the pre-shift range of each thread that moved, keyed
    /// by id: the caller's memento for `restore_ranges`.
    ///
    /// Per thread, first matching case wins:
    /// 1. Thread starts after the edit (`force` extends this to a thread
    ///    starting exactly on it): the whole range shifts. When a deletion's
    ///    extent ends inside the thread, only the part of the deletion left
    ///    of the thread moves the start, so the start lands on the edit
    ///    start while the overlapped prefix is consumed.
    /// 2. Thread ends after the edit start (`backspace` extends this to a
    ///    thread ending exactly on it): the edit happened inside the thread,
    ///    only the end shifts. A deletion extent reaching past the thread
    ///    end only removed the tail, so the end clamps to the edit start
    ///    instead of taking the full deletion amount.
    /// 3. Thread lies entirely before the edit: untouched.
    pub fn shift(
        &mut self,
        amount: isize,
        edit_start: usize,
        edit_end: usize,
        backspace: bool,
        force: bool,
    ) -> BTreeMap<ThreadId, TextRange> {
        let mut moved = BTreeMap::new();
        for thread in &mut self.threads {
            let range = thread.range;
            if range.start > edit_start || (force && range.start == edit_start) {
                let overlap = if edit_end > range.start && edit_end < range.end {
                    (edit_end - range.start) as isize
                } else {
                    0
                };
                thread.range = TextRange::new(
                    range.start.saturating_add_signed(amount + overlap),
                    range.end.saturating_add_signed(amount),
                );
                moved.insert(thread.id, range);
            } else if range.end > edit_start || (backspace && range.end == edit_start) {
                // Pure deletion of a span (amount is minus the extent
                // length) reaching the thread end or past it: only the tail
                // up to edit_start was removed. Caret extents and
                // replacements take the plain shift.
                let pure_deletion = amount < 0 && amount + (edit_end - edit_start) as isize == 0;
                thread.range.end = if pure_deletion && edit_end >= range.end {
                    edit_start
                } else {
                    range.end.saturating_add_signed(amount)
                };
                moved.insert(thread.id, range);
            }
        }
        if !moved.is_empty() {
            log::trace!("shifted {} comment threads by {amount}", moved.len());
            self.resort();
            self.touch();
        }
        moved
    }

    /// Writes recorded ranges back onto their threads. All-or-nothing: a
    /// missing thread fails the whole restore with no ranges applied.
    pub fn restore_ranges(
        &mut self,
        ranges: &BTreeMap<ThreadId, TextRange>,
    ) -> Result<(), EditError> {
        for id in ranges.keys() {
            if self.thread(*id).is_none() {
                return Err(EditError::ThreadNotFound(*id));
            }
        }
        for (id, range) in ranges {
            if let Some(thread) = self.thread_mut(*id) {
                thread.range = *range;
            }
        }
        if !ranges.is_empty() {
            self.resort();
            self.touch();
        }
        Ok(())
    }

    /// Drops every thread and restarts id allocation (new-document path).
    pub fn clear(&mut self) {
        self.threads.clear();
        self.next_thread_id = 0;
        self.next_reply_id = 0;
        self.touch();
    }

    fn stamp_reply(&mut self, author: &str, text: &str) -> CommentReply {
        let id = ReplyId::from_raw(self.next_reply_id);
        self.next_reply_id += 1;
        CommentReply::new(id, author.to_string(), text.to_string(), now_secs())
    }

    fn resort(&mut self) {
        self.threads.sort_by_key(|t| t.range.start);
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
