//! Host editor state: cursor and selection.

use std::ops::Range;

/// Cursor position as a char offset (not bytes).
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    pub offset: usize,
}

impl CursorState {
    pub fn new(offset: usize) -> Self {
        Self { offset }
    }
}

/// Text selection with anchor and head positions.
///
/// The anchor is where the selection started, the head is where the cursor is now.
/// They may be in any order - use `start()` and `end()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Selection covering a char range, head at the end.
    pub fn from_range(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_bounds() {
        let sel = Selection::new(10, 5);
        assert_eq!(sel.start(), 5);
        assert_eq!(sel.end(), 10);
        assert_eq!(sel.len(), 5);
        assert_eq!(sel.to_range(), 5..10);
        assert!(!sel.is_collapsed());
    }

    #[test]
    fn test_selection_from_range() {
        let sel = Selection::from_range(3..7);
        assert_eq!(sel.anchor, 3);
        assert_eq!(sel.head, 7);
        assert!(Selection::from_range(4..4).is_empty());
    }
}
