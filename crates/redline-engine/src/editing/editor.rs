use xi_rope::Rope;
use xi_rope::delta::Builder;

use crate::editing::TextRange;

/// Opaque identity of one highlight placed over a commented range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HighlightHandle(u64);

/// The engine's only window onto the text being reviewed.
///
/// Commands edit, select and highlight exclusively through this trait, so
/// the same command/undo core drives the headless buffer in tests and
/// whatever rendering surface embeds the engine.
pub trait Editor {
    /// Full buffer content.
    fn content(&self) -> String;

    /// Buffer length in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text under `range`, clamped to the buffer.
    fn slice(&self, range: TextRange) -> String;

    fn insert(&mut self, at: usize, text: &str);

    fn delete_range(&mut self, range: TextRange);

    /// Replaces `range` with `text` as a single edit.
    fn replace_range(&mut self, range: TextRange, text: &str);

    /// Swaps the whole buffer (document load path). Resets selection and
    /// highlights, which refer to the old text.
    fn set_content(&mut self, content: &str);

    /// Current selection; a caret is a zero-length range.
    fn selection(&self) -> TextRange;

    /// Callers pass ordered ranges; offsets are clamped to the buffer.
    fn select_range(&mut self, range: TextRange);

    fn set_cursor(&mut self, at: usize);

    /// Marks a commented range. The handle removes exactly that mark later.
    fn highlight(&mut self, range: TextRange) -> HighlightHandle;

    fn remove_highlight(&mut self, handle: HighlightHandle);

    /// Post-command hook for hosts: refocus, autosave, repaint.
    fn on_command_success(&mut self);
}

/// In-memory `Editor` over a xi-rope buffer: the engine's default and the
/// reference for embedders writing their own port.
///
/// Offsets are byte offsets. Callers edit at character boundaries; ranges
/// are clamped to the buffer rather than panicking.
#[derive(Debug, Clone)]
pub struct HeadlessEditor {
    buffer: Rope,
    selection: TextRange,
    highlights: Vec<(HighlightHandle, TextRange)>,
    next_highlight: u64,
    change_count: u64,
}

impl HeadlessEditor {
    pub fn new() -> Self {
        Self::from_text("")
    }

    pub fn from_text(text: &str) -> Self {
        let buffer = Rope::from(text);
        let len = buffer.len();
        Self {
            buffer,
            // Cursor starts at the end, as if the text was just typed
            selection: TextRange::caret(len),
            highlights: Vec::new(),
            next_highlight: 0,
            change_count: 0,
        }
    }

    /// Builds an editor from raw bytes, ensuring valid UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from_text(text))
    }

    /// Highlights currently placed, in creation order.
    pub fn highlights(&self) -> &[(HighlightHandle, TextRange)] {
        &self.highlights
    }

    /// How many successful commands have run against this editor.
    pub fn change_count(&self) -> u64 {
        self.change_count
    }

    fn clamp(&self, range: TextRange) -> TextRange {
        let len = self.buffer.len();
        let start = range.start.min(len);
        let end = range.end.min(len).max(start);
        TextRange::new(start, end)
    }

    fn edit(&mut self, range: TextRange, text: &str) {
        let range = self.clamp(range);
        if range.is_caret() && text.is_empty() {
            return;
        }
        let mut builder = Builder::new(self.buffer.len());
        if text.is_empty() {
            builder.delete(std::ops::Range::from(range));
        } else {
            builder.replace(std::ops::Range::from(range), Rope::from(text));
        }
        self.buffer = builder.build().apply(&self.buffer);
    }
}

impl Default for HeadlessEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor for HeadlessEditor {
    fn content(&self) -> String {
        self.buffer.to_string()
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn slice(&self, range: TextRange) -> String {
        self.buffer
            .slice_to_cow(std::ops::Range::from(self.clamp(range)))
            .into_owned()
    }

    fn insert(&mut self, at: usize, text: &str) {
        self.edit(TextRange::caret(at), text);
    }

    fn delete_range(&mut self, range: TextRange) {
        self.edit(range, "");
    }

    fn replace_range(&mut self, range: TextRange, text: &str) {
        self.edit(range, text);
    }

    fn set_content(&mut self, content: &str) {
        self.buffer = Rope::from(content);
        self.selection = TextRange::caret(self.buffer.len());
        self.highlights.clear();
    }

    fn selection(&self) -> TextRange {
        self.selection
    }

    fn select_range(&mut self, range: TextRange) {
        self.selection = self.clamp(range);
    }

    fn set_cursor(&mut self, at: usize) {
        self.selection = TextRange::caret(at.min(self.buffer.len()));
    }

    fn highlight(&mut self, range: TextRange) -> HighlightHandle {
        let handle = HighlightHandle(self.next_highlight);
        self.next_highlight += 1;
        self.highlights.push((handle, range));
        handle
    }

    fn remove_highlight(&mut self, handle: HighlightHandle) {
        self.highlights.retain(|(h, _)| *h != handle);
    }

    fn on_command_success(&mut self) {
        self.change_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ============ Buffer edits ============

    #[test]
    fn test_insert_and_delete_round_trip() {
        let mut editor = HeadlessEditor::from_text("hello world");

        editor.insert(5, " there");
        assert_eq!(editor.content(), "hello there world");

        editor.delete_range(TextRange::new(5, 11));
        assert_eq!(editor.content(), "hello world");
    }

    #[test]
    fn test_replace_range_single_edit() {
        let mut editor = HeadlessEditor::from_text("the cat sat");
        editor.replace_range(TextRange::new(4, 7), "dog");
        assert_eq!(editor.content(), "the dog sat");
    }

    #[test]
    fn test_insert_into_empty_buffer() {
        let mut editor = HeadlessEditor::new();
        editor.insert(0, "abc");
        assert_eq!(editor.content(), "abc");
        assert_eq!(editor.len(), 3);
    }

    #[test]
    fn test_unicode_lengths_are_bytes() {
        let mut editor = HeadlessEditor::from_text("héllo");
        assert_eq!(editor.len(), 6);

        editor.insert(0, "é");
        assert_eq!(editor.content(), "éhéllo");
        assert_eq!(editor.len(), 8);
    }

    #[test]
    fn test_from_bytes_invalid_utf8_is_error() {
        let invalid = vec![0xFF, 0xFE, 0x00];
        assert!(HeadlessEditor::from_bytes(&invalid).is_err());
    }

    #[test]
    fn test_from_bytes_valid_utf8() {
        let editor = HeadlessEditor::from_bytes("review me".as_bytes()).unwrap();
        assert_eq!(editor.content(), "review me");
    }

    // ============ Clamping ============

    #[test]
    fn test_slice_clamps_out_of_range() {
        let editor = HeadlessEditor::from_text("short");
        assert_eq!(editor.slice(TextRange::new(2, 99)), "ort");
        assert_eq!(editor.slice(TextRange::new(50, 99)), "");
    }

    #[test]
    fn test_delete_clamps_to_buffer() {
        let mut editor = HeadlessEditor::from_text("abc");
        editor.delete_range(TextRange::new(1, 99));
        assert_eq!(editor.content(), "a");
    }

    #[test]
    fn test_set_cursor_clamps() {
        let mut editor = HeadlessEditor::from_text("abc");
        editor.set_cursor(99);
        assert_eq!(editor.selection(), TextRange::caret(3));
    }

    // ============ Selection and view state ============

    #[test]
    fn test_cursor_starts_at_end() {
        let editor = HeadlessEditor::from_text("abc");
        assert_eq!(editor.selection(), TextRange::caret(3));
    }

    #[test]
    fn test_select_range_then_read_back() {
        let mut editor = HeadlessEditor::from_text("hello world");
        editor.select_range(TextRange::new(6, 11));
        assert_eq!(editor.selection(), TextRange::new(6, 11));
        assert_eq!(editor.slice(editor.selection()), "world");
    }

    #[test]
    fn test_set_content_resets_selection_and_highlights() {
        let mut editor = HeadlessEditor::from_text("hello world");
        editor.select_range(TextRange::new(0, 5));
        editor.highlight(TextRange::new(0, 5));

        editor.set_content("hi");

        assert_eq!(editor.selection(), TextRange::caret(2));
        assert!(editor.highlights().is_empty());
    }

    #[test]
    fn test_highlight_handles_remove_exactly_one_mark() {
        let mut editor = HeadlessEditor::from_text("hello world");
        let first = editor.highlight(TextRange::new(0, 5));
        let second = editor.highlight(TextRange::new(6, 11));

        editor.remove_highlight(first);

        assert_eq!(editor.highlights().len(), 1);
        assert_eq!(editor.highlights()[0].0, second);
    }

    #[test]
    fn test_change_count_tracks_command_hook_only() {
        let mut editor = HeadlessEditor::from_text("abc");
        editor.insert(0, "x");
        assert_eq!(editor.change_count(), 0);

        editor.on_command_success();
        editor.on_command_success();
        assert_eq!(editor.change_count(), 2);
    }
}
