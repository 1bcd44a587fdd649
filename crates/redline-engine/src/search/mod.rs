//! Search-index port and the in-memory implementation behind find/replace.
//!
//! The engine never scans text itself: commands go through [`SearchIndex`],
//! which owns a copy of the content and a queue of pending match positions.
//! Positions are only valid for edits the caller reported via
//! [`SearchIndex::shift_after_index`]; any other edit must be followed by
//! [`SearchIndex::clear`] or a fresh [`SearchIndex::set_content`] plus
//! rebuild.

use std::collections::VecDeque;

/// Contract between the command core and the text-search engine.
///
/// Implementations hold positional state (the matches of the current term)
/// that the caller keeps aligned with the buffer: index shifts for length
/// changes it makes, insert/remove for matches it consumes or restores.
pub trait SearchIndex {
    /// Replaces the indexed content. Does not invalidate pending positions;
    /// callers clear or rebuild when the edit moved them.
    fn set_content(&mut self, content: &str);

    /// Next match of `term`, rotating through all occurrences and wrapping
    /// around. Rebuilds the match queue when the term changed or the queue
    /// ran empty.
    fn find_next(&mut self, term: &str) -> Option<usize>;

    /// All match positions of `term` in ascending order, rebuilding the
    /// queue unconditionally.
    fn find_all(&mut self, term: &str) -> Vec<usize>;

    /// Whole-content textual replacement; returns the new content. Pending
    /// positions are dropped.
    fn replace_all(&mut self, term: &str, replacement: &str) -> String;

    /// Adjusts every pending position strictly greater than `index` by
    /// `amount`, subtracting when `shrink` is set.
    fn shift_after_index(&mut self, index: usize, amount: usize, shrink: bool);

    /// Re-adds a position keeping ascending order (undo of a consumed match).
    fn insert_in_order(&mut self, index: usize);

    /// Drops an exact position from the queue.
    fn remove_element(&mut self, index: usize);

    /// Drops the most recently returned match.
    fn remove_last(&mut self);

    /// Drops all pending positions.
    fn clear(&mut self);
}

/// Literal-substring `SearchIndex` over an owned `String`.
///
/// `find_next` rotates: the returned position moves to the back of the
/// queue, so repeated finds cycle through all matches and `remove_last`
/// drops exactly the match just surfaced.
#[derive(Debug, Clone, Default)]
pub struct InMemorySearchIndex {
    content: String,
    term: String,
    positions: VecDeque<usize>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn rebuild(&mut self, term: &str) {
        self.positions = self.content.match_indices(term).map(|(i, _)| i).collect();
        self.term = term.to_owned();
    }
}

impl SearchIndex for InMemorySearchIndex {
    fn set_content(&mut self, content: &str) {
        self.content = content.to_owned();
    }

    fn find_next(&mut self, term: &str) -> Option<usize> {
        if term.is_empty() {
            return None;
        }
        if self.positions.is_empty() || term != self.term {
            self.rebuild(term);
        }
        let index = self.positions.pop_front()?;
        self.positions.push_back(index);
        Some(index)
    }

    fn find_all(&mut self, term: &str) -> Vec<usize> {
        if term.is_empty() {
            self.positions.clear();
            return Vec::new();
        }
        self.rebuild(term);
        self.positions.iter().copied().collect()
    }

    fn replace_all(&mut self, term: &str, replacement: &str) -> String {
        self.content = self.content.replace(term, replacement);
        self.positions.clear();
        self.content.clone()
    }

    fn shift_after_index(&mut self, index: usize, amount: usize, shrink: bool) {
        for position in self.positions.iter_mut().filter(|p| **p > index) {
            if shrink {
                *position -= amount;
            } else {
                *position += amount;
            }
        }
    }

    fn insert_in_order(&mut self, index: usize) {
        let at = self
            .positions
            .iter()
            .position(|p| *p > index)
            .unwrap_or(self.positions.len());
        self.positions.insert(at, index);
    }

    fn remove_element(&mut self, index: usize) {
        self.positions.retain(|p| *p != index);
    }

    fn remove_last(&mut self) {
        self.positions.pop_back();
    }

    fn clear(&mut self) {
        self.positions.clear();
    }
}
