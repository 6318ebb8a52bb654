//! Undo/redo for resolutions.
//!
//! Provides:
//! - `UndoManager` trait for abstracting undo implementations
//! - `UndoableDocument` - wraps an `AnnotatedDocument` and snapshots it
//!   before every mutation

use crate::annotation::{AnnotatedDocument, HostEdit, Resolution, SpanId};

/// Trait for managing undo/redo operations.
///
/// Implementations must actually perform the undo/redo, not just track state.
pub trait UndoManager {
    fn can_undo(&self) -> bool;

    fn can_redo(&self) -> bool;

    /// Perform undo. Returns true if successful.
    fn undo(&mut self) -> bool;

    /// Perform redo. Returns true if successful.
    fn redo(&mut self) -> bool;

    fn clear_history(&mut self);
}

pub const DEFAULT_MAX_STEPS: usize = 100;

/// An annotated document with bounded undo history.
///
/// Every mutating call records one step, so a batch such as
/// [`resolve_all`](Self::resolve_all) is undone as a unit.
#[derive(Debug, Clone)]
pub struct UndoableDocument {
    document: AnnotatedDocument,
    undo_stack: Vec<AnnotatedDocument>,
    redo_stack: Vec<AnnotatedDocument>,
    max_steps: usize,
}

impl Default for UndoableDocument {
    fn default() -> Self {
        Self::new(AnnotatedDocument::new(), DEFAULT_MAX_STEPS)
    }
}

impl UndoableDocument {
    pub fn new(document: AnnotatedDocument, max_steps: usize) -> Self {
        Self {
            document,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    pub fn inner(&self) -> &AnnotatedDocument {
        &self.document
    }

    fn checkpoint(&mut self) {
        self.redo_stack.clear();
        self.undo_stack.push(self.document.clone());
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
    }

    /// Swap in a new document (e.g. a fresh correction), undoably.
    pub fn replace(&mut self, document: AnnotatedDocument) {
        self.checkpoint();
        self.document = document;
    }

    /// Resolve one span. Nothing is recorded when the span is not pending.
    pub fn resolve(&mut self, id: SpanId, resolution: Resolution) -> Option<HostEdit> {
        if !self.document.get(id).is_some_and(|s| s.is_pending()) {
            return None;
        }
        self.checkpoint();
        self.document.resolve(id, resolution)
    }

    /// Resolve every pending span as one undo step.
    pub fn resolve_all(&mut self, resolution: Resolution) -> Vec<HostEdit> {
        if self.document.is_resolved() {
            return Vec::new();
        }
        self.checkpoint();
        self.document.resolve_all(resolution)
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
}

impl UndoManager for UndoableDocument {
    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.document, previous);
        self.redo_stack.push(current);
        true
    }

    fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.document, next);
        self.undo_stack.push(current);
        true
    }

    fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::annotate;

    fn sample() -> UndoableDocument {
        UndoableDocument::new(annotate("I has a apple.", "I have an apple."), DEFAULT_MAX_STEPS)
    }

    #[test]
    fn test_undo_single_resolution() {
        let mut doc = sample();
        let id = doc.inner().first_pending().unwrap();
        assert!(doc.resolve(id, Resolution::Accept).is_some());
        assert!(doc.can_undo());

        assert!(doc.undo());
        assert_eq!(doc.inner().rendered_text(), "I hasve an apple.");
        assert!(doc.can_redo());

        // The deleted "s" is gone; the additions are still pending.
        assert!(doc.redo());
        assert_eq!(doc.inner().rendered_text(), "I have an apple.");
        assert_eq!(doc.inner().pending_count(), 2);
    }

    #[test]
    fn test_accept_all_is_one_step() {
        let mut doc = sample();
        doc.resolve_all(Resolution::Accept);
        assert_eq!(doc.inner().rendered_text(), "I have an apple.");
        assert_eq!(doc.undo_depth(), 1);

        assert!(doc.undo());
        assert_eq!(doc.inner().pending_count(), 3);
        assert!(!doc.can_undo());
    }

    #[test]
    fn test_noop_records_nothing() {
        let mut doc = sample();
        assert!(doc.resolve(SpanId(42), Resolution::Reject).is_none());
        assert!(!doc.can_undo());

        doc.resolve_all(Resolution::Reject);
        assert!(doc.resolve_all(Resolution::Reject).is_empty());
        assert_eq!(doc.undo_depth(), 1);
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut doc = sample();
        doc.resolve_all(Resolution::Accept);
        doc.undo();
        let id = doc.inner().first_pending().unwrap();
        doc.resolve(id, Resolution::Reject);
        assert!(!doc.can_redo());
    }

    #[test]
    fn test_max_steps() {
        let mut doc = UndoableDocument::new(AnnotatedDocument::new(), 2);
        for text in ["a", "b", "c"] {
            doc.replace(AnnotatedDocument::from_text(text));
        }
        assert_eq!(doc.undo_depth(), 2);
        assert!(doc.undo());
        assert!(doc.undo());
        assert!(!doc.undo());
        assert_eq!(doc.inner().rendered_text(), "a");
    }

    #[test]
    fn test_clear_history() {
        let mut doc = sample();
        doc.resolve_all(Resolution::Accept);
        doc.clear_history();
        assert!(!doc.can_undo());
        assert!(!doc.can_redo());
    }
}
