//! Action execution for review documents.
//!
//! `execute_action` applies a `ReviewAction` to any type implementing
//! `ReviewDocument`.

use crate::actions::ReviewAction;
use crate::annotation::Resolution;
use crate::document::ReviewDocument;
use crate::types::Selection;

/// Execute a review action on a document.
///
/// This is the central dispatch point for all review operations.
/// Returns true if the action was handled and changed something.
pub fn execute_action<D: ReviewDocument>(doc: &mut D, action: &ReviewAction) -> bool {
    match action {
        // Needs the correction oracle; the host handles it.
        ReviewAction::Analyze => false,
        ReviewAction::Load {
            original,
            corrected,
        } => {
            doc.load_correction(original, corrected);
            true
        }
        ReviewAction::AcceptSpan { span } => doc.resolve(*span, Resolution::Accept).is_some(),
        ReviewAction::RejectSpan { span } => doc.resolve(*span, Resolution::Reject).is_some(),
        ReviewAction::AcceptAll => !doc.resolve_all(Resolution::Accept).is_empty(),
        ReviewAction::RejectAll => !doc.resolve_all(Resolution::Reject).is_empty(),
        ReviewAction::AcceptNext => execute_resolve_next(doc, Resolution::Accept),
        ReviewAction::RejectNext => execute_resolve_next(doc, Resolution::Reject),
        ReviewAction::GoToNext => execute_go_to_next(doc),
        ReviewAction::GoToPrevious => execute_go_to_previous(doc),
        ReviewAction::Undo => doc.undo(),
        ReviewAction::Redo => doc.redo(),
        ReviewAction::MoveCursor { offset } => execute_move_cursor(doc, *offset),
    }
}

fn execute_resolve_next<D: ReviewDocument>(doc: &mut D, resolution: Resolution) -> bool {
    let offset = doc.cursor_offset();
    let target = doc
        .document()
        .next_pending(offset)
        .or_else(|| doc.document().first_pending());
    match target {
        Some(id) => doc.resolve(id, resolution).is_some(),
        None => false,
    }
}

fn execute_go_to_next<D: ReviewDocument>(doc: &mut D) -> bool {
    let from = doc
        .selection()
        .map_or(doc.cursor_offset(), |sel| sel.end());
    let Some(id) = doc.document().next_pending(from) else {
        return false;
    };
    select_span(doc, id)
}

fn execute_go_to_previous<D: ReviewDocument>(doc: &mut D) -> bool {
    let from = doc
        .selection()
        .map_or(doc.cursor_offset(), |sel| sel.start());
    let Some(id) = doc.document().previous_pending(from) else {
        return false;
    };
    select_span(doc, id)
}

fn select_span<D: ReviewDocument>(doc: &mut D, id: crate::annotation::SpanId) -> bool {
    let Some(range) = doc.document().range_of(id) else {
        return false;
    };
    doc.set_cursor_offset(range.end);
    doc.set_selection(Some(Selection::from_range(range)));
    true
}

fn execute_move_cursor<D: ReviewDocument>(doc: &mut D, offset: usize) -> bool {
    let offset = offset.min(doc.len_chars());
    doc.set_cursor_offset(offset);
    doc.set_selection(None);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotatedDocument;
    use crate::classify::AnnotatedSpan;
    use crate::document::PlainReviewer;
    use crate::text::EditorRope;

    type TestReviewer = PlainReviewer<EditorRope>;

    fn make_reviewer() -> TestReviewer {
        let mut doc = TestReviewer::default();
        // "ab[cd]ef[gh]ij" with two pending spans.
        doc.load(AnnotatedDocument::from_spans([
            AnnotatedSpan::unchanged("ab"),
            AnnotatedSpan::deletion("cd"),
            AnnotatedSpan::unchanged("ef"),
            AnnotatedSpan::change("gh", "GH"),
            AnnotatedSpan::unchanged("ij"),
        ]));
        doc
    }

    #[test]
    fn test_load_action() {
        let mut doc = TestReviewer::default();
        let action = ReviewAction::Load {
            original: "teh cat".into(),
            corrected: "the cat".into(),
        };
        assert!(execute_action(&mut doc, &action));
        assert!(doc.pending_count() > 0);
        assert!(doc.is_in_sync());
    }

    #[test]
    fn test_analyze_is_not_handled() {
        let mut doc = make_reviewer();
        assert!(!execute_action(&mut doc, &ReviewAction::Analyze));
    }

    #[test]
    fn test_go_to_next_and_previous() {
        let mut doc = make_reviewer();

        assert!(execute_action(&mut doc, &ReviewAction::GoToNext));
        assert_eq!(doc.selection(), Some(Selection::new(2, 4)));
        assert_eq!(doc.selected_text().as_deref(), Some("cd"));

        assert!(execute_action(&mut doc, &ReviewAction::GoToNext));
        assert_eq!(doc.selected_text().as_deref(), Some("gh"));

        // Nothing further; selection stays put.
        assert!(!execute_action(&mut doc, &ReviewAction::GoToNext));
        assert_eq!(doc.selected_text().as_deref(), Some("gh"));

        assert!(execute_action(&mut doc, &ReviewAction::GoToPrevious));
        assert_eq!(doc.selected_text().as_deref(), Some("cd"));

        assert!(!execute_action(&mut doc, &ReviewAction::GoToPrevious));
    }

    #[test]
    fn test_accept_next_follows_cursor() {
        let mut doc = make_reviewer();
        execute_action(&mut doc, &ReviewAction::MoveCursor { offset: 5 });

        // The change after the cursor goes first.
        assert!(execute_action(&mut doc, &ReviewAction::AcceptNext));
        assert_eq!(doc.content_string(), "abcdefGHij");

        // Then wrap around to the deletion.
        assert!(execute_action(&mut doc, &ReviewAction::AcceptNext));
        assert_eq!(doc.content_string(), "abefGHij");

        assert!(!execute_action(&mut doc, &ReviewAction::AcceptNext));
    }

    #[test]
    fn test_reject_next() {
        let mut doc = make_reviewer();
        assert!(execute_action(&mut doc, &ReviewAction::RejectNext));
        assert!(execute_action(&mut doc, &ReviewAction::RejectNext));
        assert_eq!(doc.content_string(), "abcdefghij");
        assert_eq!(doc.pending_count(), 0);
    }

    #[test]
    fn test_span_actions_and_history() {
        let mut doc = make_reviewer();
        let ids: Vec<_> = doc.document().pending().collect();

        assert!(execute_action(&mut doc, &ReviewAction::for_click(ids[1], false)));
        assert_eq!(doc.content_string(), "abcdefGHij");
        // Stale id.
        assert!(!execute_action(&mut doc, &ReviewAction::for_click(ids[1], true)));

        assert!(execute_action(&mut doc, &ReviewAction::for_click(ids[0], true)));
        assert_eq!(doc.content_string(), "abcdefGHij");

        assert!(execute_action(&mut doc, &ReviewAction::Undo));
        assert!(execute_action(&mut doc, &ReviewAction::Undo));
        assert_eq!(doc.content_string(), "abcdefghij");
        assert_eq!(doc.pending_count(), 2);
        assert!(execute_action(&mut doc, &ReviewAction::Redo));
        assert_eq!(doc.content_string(), "abcdefGHij");
    }

    #[test]
    fn test_accept_all_action() {
        let mut doc = make_reviewer();
        assert!(execute_action(&mut doc, &ReviewAction::AcceptAll));
        assert_eq!(doc.content_string(), "abefGHij");
        assert!(!execute_action(&mut doc, &ReviewAction::AcceptAll));
        assert!(execute_action(&mut doc, &ReviewAction::Undo));
        assert!(execute_action(&mut doc, &ReviewAction::RejectAll));
        assert_eq!(doc.content_string(), "abcdefghij");
    }

    #[test]
    fn test_move_cursor_clamps() {
        let mut doc = make_reviewer();
        assert!(execute_action(&mut doc, &ReviewAction::MoveCursor { offset: 999 }));
        assert_eq!(doc.cursor_offset(), doc.len_chars());
        assert_eq!(doc.selection(), None);
    }
}
