//! Line-driven review session for the terminal.
//!
//! Each input line is either a one-letter command or a key combo such as
//! `ctrl+z`, looked up in the standard keymap.

use redpen_core::{
    AnnotatedDocument, EditorRope, KeyCombo, KeydownResult, Keymap, PlainReviewer, ReviewAction,
    ReviewDocument, SpanId, execute_action,
};

use crate::render;

pub const HELP: &str = "\
a  accept the focused suggestion     r  reject it
A  accept all                        R  reject all
n  next suggestion                   p  previous suggestion
u  undo                              U  redo
c  re-check the current text         q  finish
Key combos work too, e.g. ctrl+z or alt+right.";

/// What the caller should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// Send the current text back to the oracle.
    Analyze,
    Help,
    Quit,
    Unknown(String),
}

pub struct ReviewSession {
    reviewer: PlainReviewer<EditorRope>,
    keymap: Keymap,
}

impl ReviewSession {
    pub fn new(document: AnnotatedDocument) -> Self {
        let mut reviewer = PlainReviewer::new(EditorRope::new());
        reviewer.load(document);
        reviewer.clear_history();
        Self {
            reviewer,
            keymap: Keymap::standard(),
        }
    }

    pub fn reviewer(&self) -> &PlainReviewer<EditorRope> {
        &self.reviewer
    }

    /// Replace the content after a re-check. Undo brings the old one back.
    pub fn load(&mut self, document: AnnotatedDocument) {
        self.reviewer.load(document);
    }

    pub fn is_done(&self) -> bool {
        self.reviewer.pending_count() == 0
    }

    /// Text the buffer holds right now.
    pub fn text(&self) -> String {
        self.reviewer.content_string()
    }

    /// The pending span the next accept/reject applies to: the selected one,
    /// else the next one at or after the cursor, else the first.
    pub fn focused(&self) -> Option<SpanId> {
        let doc = self.reviewer.document();
        self.reviewer
            .selection()
            .and_then(|sel| doc.span_at(sel.start()))
            .filter(|id| doc.get(*id).is_some_and(|span| span.is_pending()))
            .or_else(|| doc.next_pending(self.reviewer.cursor_offset()))
            .or_else(|| doc.first_pending())
    }

    pub fn display(&self) -> String {
        format!(
            "{}\n({})",
            render::markup(self.reviewer.document(), self.focused()),
            render::summary(self.reviewer.document())
        )
    }

    pub fn apply(&mut self, input: &str) -> Step {
        let input = input.trim();
        let action = match input {
            "" => return Step::Continue,
            "q" => return Step::Quit,
            "?" | "h" => return Step::Help,
            "c" => return Step::Analyze,
            "a" | "r" => match self.focused() {
                Some(span) if input == "a" => ReviewAction::AcceptSpan { span },
                Some(span) => ReviewAction::RejectSpan { span },
                None => return Step::Continue,
            },
            "A" => ReviewAction::AcceptAll,
            "R" => ReviewAction::RejectAll,
            "n" => ReviewAction::GoToNext,
            "p" => ReviewAction::GoToPrevious,
            "u" => ReviewAction::Undo,
            "U" => ReviewAction::Redo,
            other => return self.apply_combo(other),
        };
        execute_action(&mut self.reviewer, &action);
        Step::Continue
    }

    fn apply_combo(&mut self, input: &str) -> Step {
        let Ok(combo) = input.parse::<KeyCombo>() else {
            return Step::Unknown(input.to_string());
        };
        match self.keymap.handle_keydown(&mut self.reviewer, &combo) {
            KeydownResult::Handled => Step::Continue,
            KeydownResult::Delegate(ReviewAction::Analyze) => Step::Analyze,
            KeydownResult::Delegate(_) | KeydownResult::NotHandled => {
                Step::Unknown(input.to_string())
            }
        }
    }
}
