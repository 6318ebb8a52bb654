//! Text buffer abstraction for the host editor.
//!
//! The `TextBuffer` trait is what resolution edits are applied to. Any
//! storage that can address text by char offset works; `EditorRope` is the
//! ropey-backed default.

use smol_str::{SmolStr, ToSmolStr};
use std::ops::Range;

use crate::annotation::HostEdit;

/// A text buffer that supports efficient editing and offset conversion.
///
/// All offsets are in Unicode scalar values (chars), not bytes or UTF-16.
pub trait TextBuffer {
    /// Total length in bytes (UTF-8).
    fn len_bytes(&self) -> usize;

    /// Total length in chars.
    fn len_chars(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len_chars() == 0
    }

    /// Insert text at char offset.
    fn insert(&mut self, char_offset: usize, text: &str);

    /// Delete char range.
    fn delete(&mut self, char_range: Range<usize>);

    /// Replace char range with text.
    fn replace(&mut self, char_range: Range<usize>, text: &str) {
        self.delete(char_range.clone());
        self.insert(char_range.start, text);
    }

    /// Get a slice as SmolStr. Returns None if range is invalid.
    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr>;

    /// Get character at offset. Returns None if out of bounds.
    fn char_at(&self, char_offset: usize) -> Option<char>;

    fn to_string(&self) -> String;

    fn char_to_byte(&self, char_offset: usize) -> usize;

    fn byte_to_char(&self, byte_offset: usize) -> usize;

    /// Replace the whole content.
    fn set_text(&mut self, text: &str) {
        let len = self.len_chars();
        self.replace(0..len, text);
    }

    /// Apply a resolution edit. Out-of-range edits are ignored and reported
    /// as `false`.
    fn apply_host_edit(&mut self, edit: &HostEdit) -> bool {
        let range = edit.range();
        if range.start > range.end || range.end > self.len_chars() {
            tracing::warn!(?range, len = self.len_chars(), "host edit out of range");
            return false;
        }
        match edit {
            HostEdit::Delete { range } => self.delete(range.clone()),
            HostEdit::Replace { range, text } => self.replace(range.clone(), text),
            // Plain text has no marks to drop.
            HostEdit::Unmark { .. } => {}
        }
        true
    }
}

/// Ropey-backed text buffer.
///
/// Provides O(log n) editing operations and offset conversions.
#[derive(Clone, Default)]
pub struct EditorRope {
    rope: ropey::Rope,
}

impl EditorRope {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        Self {
            rope: ropey::Rope::from_str(s),
        }
    }
}

impl TextBuffer for EditorRope {
    fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn insert(&mut self, char_offset: usize, text: &str) {
        self.rope.insert(char_offset, text);
    }

    fn delete(&mut self, char_range: Range<usize>) {
        self.rope.remove(char_range);
    }

    fn replace(&mut self, char_range: Range<usize>, text: &str) {
        let start = char_range.start;
        self.rope.remove(char_range);
        self.rope.insert(start, text);
    }

    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr> {
        if char_range.start > char_range.end || char_range.end > self.len_chars() {
            return None;
        }
        Some(self.rope.slice(char_range).to_smolstr())
    }

    fn char_at(&self, char_offset: usize) -> Option<char> {
        if char_offset >= self.len_chars() {
            return None;
        }
        Some(self.rope.char(char_offset))
    }

    fn to_string(&self) -> String {
        self.rope.to_string()
    }

    fn char_to_byte(&self, char_offset: usize) -> usize {
        self.rope.char_to_byte(char_offset)
    }

    fn byte_to_char(&self, byte_offset: usize) -> usize {
        self.rope.byte_to_char(byte_offset)
    }
}

impl From<&str> for EditorRope {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for EditorRope {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut rope = EditorRope::from_str("hello world");
        assert_eq!(rope.len_chars(), 11);

        rope.insert(5, " big");
        assert_eq!(rope.to_string(), "hello big world");

        rope.delete(5..9);
        assert_eq!(rope.to_string(), "hello world");
    }

    #[test]
    fn test_replace() {
        let mut rope = EditorRope::from_str("I has a apple");
        rope.replace(2..5, "have");
        assert_eq!(rope.to_string(), "I have a apple");
        assert_eq!(rope.len_chars(), 14);
    }

    #[test]
    fn test_slice_and_char_at() {
        let rope = EditorRope::from_str("héllo");
        assert_eq!(rope.slice(0..2).as_deref(), Some("hé"));
        assert_eq!(rope.slice(0..100), None);
        assert_eq!(rope.char_at(1), Some('é'));
        assert_eq!(rope.char_at(5), None);
        assert_eq!(rope.len_bytes(), 6);
        assert_eq!(rope.char_to_byte(2), 3);
        assert_eq!(rope.byte_to_char(3), 2);
    }

    #[test]
    fn test_apply_host_edits() {
        let mut rope = EditorRope::from_str("a big teh!");
        assert!(rope.apply_host_edit(&HostEdit::Delete { range: 2..6 }));
        assert_eq!(rope.to_string(), "a teh!");
        assert!(rope.apply_host_edit(&HostEdit::Replace {
            range: 2..5,
            text: "the".into()
        }));
        assert_eq!(rope.to_string(), "a the!");
        assert!(rope.apply_host_edit(&HostEdit::Unmark { range: 0..2 }));
        assert_eq!(rope.to_string(), "a the!");
    }

    #[test]
    fn test_out_of_range_edit_is_rejected() {
        let mut rope = EditorRope::from_str("abc");
        assert!(!rope.apply_host_edit(&HostEdit::Delete { range: 2..10 }));
        assert_eq!(rope.to_string(), "abc");
    }

    #[test]
    fn test_set_text() {
        let mut rope = EditorRope::from_str("old text");
        rope.set_text("new");
        assert_eq!(rope.to_string(), "new");
    }
}
