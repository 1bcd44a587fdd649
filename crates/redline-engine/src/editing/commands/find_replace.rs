use std::collections::BTreeMap;

use crate::editing::commands::{
    Command, EditContext, SearchHit, UndoableCommand, current_ranges, merge_earliest,
};
use crate::editing::error::EditError;
use crate::editing::{CommentStore, TextRange, ThreadId};

/// Overlap guard shared by find and replace-all: a match may touch at most
/// one thread, and then only when the thread fully contains it. Anything
/// else would slice a comment boundary.
fn hit_is_valid(comments: &CommentStore, hit: TextRange) -> bool {
    match comments.overlapping(hit).as_slice() {
        [] => true,
        [only] => only.range.contains_range(&hit),
        _ => false,
    }
}

/// Locates the next occurrence of a term and selects it.
///
/// Not undoable: a find mutates nothing but the selection and the search
/// rotation, so it never enters the history. A valid hit is recorded in
/// `last_search` for a chained `Replace`; a miss or guarded hit clears it.
/// Invalid hits stay consumed by the rotation, so repeating the find moves
/// on to the next occurrence.
#[derive(Debug)]
pub struct Find {
    term: String,
}

impl Find {
    pub fn new(term: impl Into<String>) -> Self {
        Self { term: term.into() }
    }
}

impl Command for Find {
    fn name(&self) -> &'static str {
        "find"
    }

    fn can_execute(&self, ctx: &EditContext<'_>) -> bool {
        let _ = ctx;
        !self.term.is_empty()
    }

    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<bool, EditError> {
        *ctx.last_search = None;
        if self.term.is_empty() {
            return Ok(false);
        }

        ctx.search.set_content(&ctx.editor.content());
        let Some(index) = ctx.search.find_next(&self.term) else {
            return Ok(false);
        };

        let hit = TextRange::new(index, index + self.term.len());
        if !hit_is_valid(ctx.comments, hit) {
            return Ok(false);
        }

        ctx.editor.select_range(hit);
        *ctx.last_search = Some(SearchHit {
            term: self.term.clone(),
            index,
        });
        Ok(true)
    }
}

#[derive(Debug)]
struct ReplaceMemento {
    at: usize,
    pre_ranges: BTreeMap<ThreadId, TextRange>,
    post_ranges: BTreeMap<ThreadId, TextRange>,
}

/// Replaces the occurrence the last `Find` located.
///
/// Only valid immediately after a find for the identical term: that is the
/// match the caller is looking at, so it is the only one this command may
/// touch. With the chain broken, execute degrades to the find itself and
/// reports that no replacement happened; the caller retries against the
/// match now current.
#[derive(Debug)]
pub struct Replace {
    term: String,
    replacement: String,
    memento: Option<ReplaceMemento>,
}

impl Replace {
    pub fn new(term: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            replacement: replacement.into(),
            memento: None,
        }
    }

    fn delta(&self) -> isize {
        self.replacement.len() as isize - self.term.len() as isize
    }
}

impl Command for Replace {
    fn name(&self) -> &'static str {
        "replace"
    }

    /// Also demands an unbroken find chain; with it broken, `execute`
    /// performs the find instead of replacing.
    fn can_execute(&self, ctx: &EditContext<'_>) -> bool {
        !self.replacement.is_empty()
            && self.replacement != self.term
            && ctx
                .last_search
                .as_ref()
                .is_some_and(|hit| hit.term == self.term)
    }

    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<bool, EditError> {
        if self.replacement.is_empty() || self.replacement == self.term {
            return Ok(false);
        }

        let index = match ctx.last_search.take() {
            Some(hit) if hit.term == self.term => hit.index,
            _ => {
                // Chain broken: surface the next match instead of guessing.
                Find::new(self.term.clone()).execute(ctx)?;
                return Ok(false);
            }
        };

        let target = TextRange::new(index, index + self.term.len());
        let found = ctx.editor.slice(target);
        if found != self.term {
            return Err(EditError::BufferDesync {
                at: index,
                expected: self.term.clone(),
                found,
            });
        }

        let delta = self.delta();
        if delta != 0 {
            ctx.search.shift_after_index(index, delta.unsigned_abs(), delta < 0);
        }
        ctx.editor.replace_range(target, &self.replacement);
        let pre_ranges = if delta != 0 {
            ctx.comments.shift(delta, index, index + self.term.len(), false, false)
        } else {
            BTreeMap::new()
        };
        let post_ranges = current_ranges(ctx.comments, &pre_ranges);
        ctx.search.remove_last();
        ctx.editor.set_cursor(index + self.replacement.len());

        self.memento = Some(ReplaceMemento {
            at: index,
            pre_ranges,
            post_ranges,
        });
        Ok(true)
    }
}

impl UndoableCommand for Replace {
    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let m = self.memento.as_ref().ok_or(EditError::NotExecuted)?;

        let placed = TextRange::new(m.at, m.at + self.replacement.len());
        let found = ctx.editor.slice(placed);
        if found != self.replacement {
            return Err(EditError::BufferDesync {
                at: m.at,
                expected: self.replacement.clone(),
                found,
            });
        }

        ctx.editor.replace_range(placed, &self.term);
        let delta = self.delta();
        if delta != 0 {
            ctx.search.shift_after_index(m.at, delta.unsigned_abs(), delta > 0);
        }
        ctx.search.insert_in_order(m.at);
        ctx.comments.restore_ranges(&m.pre_ranges)?;
        ctx.editor.set_cursor(m.at + self.term.len());
        Ok(())
    }

    fn redo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let m = self.memento.as_ref().ok_or(EditError::NotExecuted)?;

        let target = TextRange::new(m.at, m.at + self.term.len());
        let found = ctx.editor.slice(target);
        if found != self.term {
            return Err(EditError::BufferDesync {
                at: m.at,
                expected: self.term.clone(),
                found,
            });
        }

        let delta = self.delta();
        if delta != 0 {
            ctx.search.shift_after_index(m.at, delta.unsigned_abs(), delta < 0);
        }
        ctx.editor.replace_range(target, &self.replacement);
        ctx.comments.restore_ranges(&m.post_ranges)?;
        ctx.search.remove_element(m.at);
        ctx.editor.set_cursor(m.at + self.replacement.len());
        Ok(())
    }
}

#[derive(Debug)]
struct ReplaceAllMemento {
    /// Application-time offsets. Replacements run left to right, so these
    /// are also final-buffer offsets: undo walks them right to left.
    applied_at: Vec<usize>,
    pre_ranges: BTreeMap<ThreadId, TextRange>,
    post_ranges: BTreeMap<ThreadId, TextRange>,
}

/// Replaces every valid occurrence of a term, left to right.
///
/// Each occurrence passes the same overlap guard as `Find`; guarded ones
/// are skipped. Undo and redo replay the recorded per-occurrence edits
/// positionally instead of swapping whole buffers, so comment ranges come
/// back exact.
#[derive(Debug)]
pub struct ReplaceAll {
    term: String,
    replacement: String,
    memento: Option<ReplaceAllMemento>,
}

impl ReplaceAll {
    pub fn new(term: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            replacement: replacement.into(),
            memento: None,
        }
    }

    fn delta(&self) -> isize {
        self.replacement.len() as isize - self.term.len() as isize
    }

    fn resync(&self, ctx: &mut EditContext<'_>) {
        ctx.search.clear();
        ctx.search.set_content(&ctx.editor.content());
    }
}

impl Command for ReplaceAll {
    fn name(&self) -> &'static str {
        "replace-all"
    }

    fn can_execute(&self, ctx: &EditContext<'_>) -> bool {
        let _ = ctx;
        !self.term.is_empty()
    }

    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<bool, EditError> {
        if self.term.is_empty() {
            return Ok(false);
        }

        ctx.search.set_content(&ctx.editor.content());
        let occurrences = ctx.search.find_all(&self.term);
        let delta = self.delta();

        let mut applied_at = Vec::new();
        let mut pre_ranges = BTreeMap::new();
        let mut running: isize = 0;
        for original in occurrences {
            let at = original.saturating_add_signed(running);
            let target = TextRange::new(at, at + self.term.len());
            if !hit_is_valid(ctx.comments, target) {
                continue;
            }
            ctx.editor.replace_range(target, &self.replacement);
            if delta != 0 {
                merge_earliest(
                    &mut pre_ranges,
                    ctx.comments.shift(delta, at, at + self.term.len(), false, false),
                );
                running += delta;
            }
            applied_at.push(at);
        }

        if applied_at.is_empty() {
            self.resync(ctx);
            return Ok(false);
        }

        let post_ranges = current_ranges(ctx.comments, &pre_ranges);
        self.resync(ctx);
        *ctx.last_search = None;
        self.memento = Some(ReplaceAllMemento {
            applied_at,
            pre_ranges,
            post_ranges,
        });
        Ok(true)
    }
}

impl UndoableCommand for ReplaceAll {
    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let m = self.memento.as_ref().ok_or(EditError::NotExecuted)?;

        for &at in m.applied_at.iter().rev() {
            let placed = TextRange::new(at, at + self.replacement.len());
            let found = ctx.editor.slice(placed);
            if found != self.replacement {
                return Err(EditError::BufferDesync {
                    at,
                    expected: self.replacement.clone(),
                    found,
                });
            }
            ctx.editor.replace_range(placed, &self.term);
        }
        ctx.comments.restore_ranges(&m.pre_ranges)?;
        self.resync(ctx);
        Ok(())
    }

    fn redo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let m = self.memento.as_ref().ok_or(EditError::NotExecuted)?;

        for &at in &m.applied_at {
            let target = TextRange::new(at, at + self.term.len());
            let found = ctx.editor.slice(target);
            if found != self.term {
                return Err(EditError::BufferDesync {
                    at,
                    expected: self.term.clone(),
                    found,
                });
            }
            ctx.editor.replace_range(target, &self.replacement);
        }
        ctx.comments.restore_ranges(&m.post_ranges)?;
        self.resync(ctx);
        Ok(())
    }
}
