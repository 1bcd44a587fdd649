use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` into a session's text buffer.
///
/// A zero-length range is a caret. Comment threads, selections and search
/// matches all use this type so annotation arithmetic and buffer edits stay
/// in the same unit: byte offsets, same as the rope underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-length range at `offset`.
    pub fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    /// True when `other` lies entirely within this range.
    pub fn contains_range(&self, other: &TextRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Inclusive overlap test: boundary contact counts. A match ending
    /// exactly where a thread begins still concerns that thread.
    pub fn touches(&self, other: &TextRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Both endpoints translated by `delta`, saturating at zero.
    pub fn shifted(&self, delta: isize) -> Self {
        Self {
            start: self.start.saturating_add_signed(delta),
            end: self.end.saturating_add_signed(delta),
        }
    }
}

impl From<TextRange> for std::ops::Range<usize> {
    fn from(range: TextRange) -> Self {
        range.start..range.end
    }
}

impl From<std::ops::Range<usize>> for TextRange {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}
