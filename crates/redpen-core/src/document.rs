//! Review document trait and the plain field-based implementation.
//!
//! A review document pairs the host's text buffer with the annotated
//! document it displays. Resolutions are computed on the annotations and
//! applied to the buffer as [`HostEdit`]s, so both always describe the
//! same text.

use std::ops::Range;

use smol_str::SmolStr;

use crate::annotation::{AnnotatedDocument, HostEdit, Resolution, SpanId, annotate};
use crate::text::TextBuffer;
use crate::types::{CursorState, Selection};
use crate::undo::{DEFAULT_MAX_STEPS, UndoManager, UndoableDocument};

/// Core trait for review documents.
///
/// Implementors provide storage; the provided methods hold the review
/// logic. After every provided mutation the buffer text equals
/// `document().rendered_text()`.
pub trait ReviewDocument {
    /// The buffer type used for text storage.
    type Buffer: TextBuffer;

    // === Required: storage ===

    fn buffer(&self) -> &Self::Buffer;

    fn buffer_mut(&mut self) -> &mut Self::Buffer;

    fn annotations(&self) -> &UndoableDocument;

    fn annotations_mut(&mut self) -> &mut UndoableDocument;

    fn cursor(&self) -> CursorState;

    fn set_cursor(&mut self, cursor: CursorState);

    fn selection(&self) -> Option<Selection>;

    fn set_selection(&mut self, selection: Option<Selection>);

    // === Provided: accessors ===

    fn document(&self) -> &AnnotatedDocument {
        self.annotations().inner()
    }

    fn cursor_offset(&self) -> usize {
        self.cursor().offset
    }

    fn set_cursor_offset(&mut self, offset: usize) {
        self.set_cursor(CursorState::new(offset));
    }

    fn content_string(&self) -> String {
        self.buffer().to_string()
    }

    fn len_chars(&self) -> usize {
        self.buffer().len_chars()
    }

    fn is_empty(&self) -> bool {
        self.buffer().is_empty()
    }

    fn slice(&self, range: Range<usize>) -> Option<SmolStr> {
        self.buffer().slice(range)
    }

    fn selected_text(&self) -> Option<SmolStr> {
        let sel = self.selection()?;
        if sel.is_collapsed() {
            return None;
        }
        self.slice(sel.to_range())
    }

    fn pending_count(&self) -> usize {
        self.document().pending_count()
    }

    /// Whether the buffer shows exactly what the annotations render.
    fn is_in_sync(&self) -> bool {
        self.content_string() == self.document().rendered_text()
    }

    // === Provided: content ===

    /// Replace the whole content with `document`.
    fn load(&mut self, document: AnnotatedDocument) {
        tracing::debug!(
            spans = document.len(),
            pending = document.pending_count(),
            "loading annotated document"
        );
        self.annotations_mut().replace(document);
        self.sync_buffer();
        self.set_cursor_offset(0);
        self.set_selection(None);
    }

    /// Annotate a correction and load it.
    fn load_correction(&mut self, original: &str, corrected: &str) {
        self.load(annotate(original, corrected));
    }

    /// Rewrite the buffer from the annotations, clamping the cursor.
    fn sync_buffer(&mut self) {
        let text = self.document().rendered_text();
        self.buffer_mut().set_text(&text);
        let len = self.len_chars();
        if self.cursor_offset() > len {
            self.set_cursor_offset(len);
        }
        self.set_selection(None);
    }

    /// Apply an edit produced by the annotations to the buffer and put the
    /// cursor after it.
    ///
    /// Returns `false` when the edit did not fit; the buffer has then been
    /// rebuilt from the annotations as they are now.
    fn apply_edit(&mut self, edit: &HostEdit) -> bool {
        if !self.buffer_mut().apply_host_edit(edit) {
            // Buffer drifted from the annotations; rebuild it.
            self.sync_buffer();
            return false;
        }
        self.set_cursor_offset(edit.end_after());
        self.set_selection(None);
        true
    }

    // === Provided: resolution ===

    fn resolve(&mut self, id: SpanId, resolution: Resolution) -> Option<HostEdit> {
        let edit = self.annotations_mut().resolve(id, resolution)?;
        self.apply_edit(&edit);
        Some(edit)
    }

    fn accept(&mut self, id: SpanId) -> Option<HostEdit> {
        self.resolve(id, Resolution::Accept)
    }

    fn reject(&mut self, id: SpanId) -> Option<HostEdit> {
        self.resolve(id, Resolution::Reject)
    }

    /// Resolve every pending span as a single undoable step.
    fn resolve_all(&mut self, resolution: Resolution) -> Vec<HostEdit> {
        let edits = self.annotations_mut().resolve_all(resolution);
        for edit in &edits {
            // A rebuild already reflects the whole batch.
            if !self.apply_edit(edit) {
                break;
            }
        }
        edits
    }

    // === Provided: history ===

    fn undo(&mut self) -> bool {
        let undone = self.annotations_mut().undo();
        if undone {
            self.sync_buffer();
        }
        undone
    }

    fn redo(&mut self) -> bool {
        let redone = self.annotations_mut().redo();
        if redone {
            self.sync_buffer();
        }
        redone
    }

    fn can_undo(&self) -> bool {
        self.annotations().can_undo()
    }

    fn can_redo(&self) -> bool {
        self.annotations().can_redo()
    }

    fn clear_history(&mut self) {
        self.annotations_mut().clear_history();
    }
}

/// Simple field-based implementation of [`ReviewDocument`].
#[derive(Clone)]
pub struct PlainReviewer<T: TextBuffer> {
    buffer: T,
    annotations: UndoableDocument,
    cursor: CursorState,
    selection: Option<Selection>,
}

impl<T: TextBuffer + Default> Default for PlainReviewer<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: TextBuffer> PlainReviewer<T> {
    /// Wrap a buffer. Its current text becomes a single resolved span.
    pub fn new(buffer: T) -> Self {
        let document = AnnotatedDocument::from_text(&buffer.to_string());
        let annotations = UndoableDocument::new(document, DEFAULT_MAX_STEPS);
        Self {
            buffer,
            annotations,
            cursor: CursorState::default(),
            selection: None,
        }
    }

    pub fn inner(&self) -> &T {
        &self.buffer
    }
}

impl<T: TextBuffer> ReviewDocument for PlainReviewer<T> {
    type Buffer = T;

    fn buffer(&self) -> &Self::Buffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut Self::Buffer {
        &mut self.buffer
    }

    fn annotations(&self) -> &UndoableDocument {
        &self.annotations
    }

    fn annotations_mut(&mut self) -> &mut UndoableDocument {
        &mut self.annotations
    }

    fn cursor(&self) -> CursorState {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: CursorState) {
        self.cursor = cursor;
    }

    fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{AnnotatedSpan, SpanKind};
    use crate::text::EditorRope;

    type TestReviewer = PlainReviewer<EditorRope>;

    fn make_reviewer(original: &str, corrected: &str) -> TestReviewer {
        let mut doc = TestReviewer::default();
        doc.load_correction(original, corrected);
        doc
    }

    #[test]
    fn test_new_wraps_existing_text() {
        let doc = PlainReviewer::new(EditorRope::from_str("plain text"));
        assert_eq!(doc.document().len(), 1);
        assert_eq!(doc.pending_count(), 0);
        assert!(doc.is_in_sync());
    }

    #[test]
    fn test_load_renders_spans() {
        let doc = make_reviewer("I has a apple.", "I have an apple.");
        assert_eq!(doc.content_string(), "I hasve an apple.");
        assert_eq!(doc.pending_count(), 3);
        assert_eq!(doc.cursor_offset(), 0);
        assert!(doc.is_in_sync());
    }

    #[test]
    fn test_resolve_keeps_buffer_in_sync() {
        let mut doc = make_reviewer("I has a apple.", "I have an apple.");
        let ids: Vec<SpanId> = doc.document().pending().collect();

        doc.accept(ids[0]);
        assert!(doc.is_in_sync());
        doc.reject(ids[1]);
        assert!(doc.is_in_sync());
        doc.accept(ids[2]);
        assert!(doc.is_in_sync());

        assert_eq!(doc.content_string(), "I ha an apple.");
        assert_eq!(doc.pending_count(), 0);
    }

    #[test]
    fn test_cursor_follows_edit() {
        let mut doc = make_reviewer("teh cat", "the cat");
        let change = doc
            .document()
            .entries()
            .iter()
            .find(|e| e.span.kind != SpanKind::Unchanged)
            .map(|e| e.id)
            .unwrap();
        let edit = doc.accept(change).unwrap();
        assert_eq!(doc.cursor_offset(), edit.end_after());
        assert_eq!(doc.content_string(), "the cat");
    }

    #[test]
    fn test_accept_all_and_undo() {
        let mut doc = make_reviewer("Their going too the store", "They're going to the store.");
        let edits = doc.resolve_all(Resolution::Accept);
        assert!(!edits.is_empty());
        assert_eq!(doc.content_string(), "They're going to the store.");

        assert!(doc.undo());
        assert_eq!(doc.content_string(), doc.document().rendered_text());
        assert!(doc.pending_count() > 0);

        assert!(doc.redo());
        assert_eq!(doc.content_string(), "They're going to the store.");
    }

    #[test]
    fn test_undo_load_restores_previous_content() {
        let mut doc = TestReviewer::new(EditorRope::from_str("draft"));
        doc.load_correction("draft", "drafts");
        assert_eq!(doc.content_string(), "drafts");
        assert!(doc.undo());
        assert_eq!(doc.content_string(), "draft");
    }

    #[test]
    fn test_drifted_buffer_is_rebuilt() {
        let mut doc = make_reviewer("abc", "");
        // Someone edits the buffer behind the reviewer's back.
        doc.buffer_mut().set_text("");
        let id = doc.document().first_pending().unwrap();
        doc.accept(id);
        assert!(doc.is_in_sync());
    }

    #[test]
    fn test_drifted_buffer_is_rebuilt_during_bulk_resolve() {
        let mut doc = TestReviewer::default();
        doc.load(AnnotatedDocument::from_spans([
            AnnotatedSpan::change("ab", "ABCDEF"),
            AnnotatedSpan::unchanged("xy"),
            AnnotatedSpan::deletion("z"),
            AnnotatedSpan::unchanged("w"),
        ]));
        doc.buffer_mut().set_text("");

        let edits = doc.resolve_all(Resolution::Accept);
        assert_eq!(edits.len(), 2);
        assert!(doc.is_in_sync());
        assert_eq!(doc.content_string(), "ABCDEFxyw");
        assert_eq!(doc.pending_count(), 0);
    }

    #[test]
    fn test_selected_text() {
        let mut doc = TestReviewer::new(EditorRope::from_str("hello world"));
        assert_eq!(doc.selected_text(), None);
        doc.set_selection(Some(Selection::new(6, 11)));
        assert_eq!(doc.selected_text().as_deref(), Some("world"));
    }
}
