//! Keyboard shortcut bindings for review actions.

use std::collections::HashMap;

use crate::actions::{Key, KeyCombo, KeydownResult, Modifiers, ReviewAction};
use crate::document::ReviewDocument;
use crate::execute::execute_action;

/// Maps key combos to review actions.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: HashMap<KeyCombo, ReviewAction>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard review shortcuts.
    ///
    /// "Primary" combos answer to both Ctrl and Cmd so the same map works on
    /// every platform.
    pub fn standard() -> Self {
        let mut map = Self::new();
        let ch = Key::character;

        for primary in [Modifiers::CTRL, Modifiers::META] {
            map.bind_with(Key::Enter, primary, ReviewAction::Analyze);
            map.bind_with(ch("a"), primary.with_alt(), ReviewAction::AcceptAll);
            map.bind_with(ch("r"), primary.with_alt(), ReviewAction::RejectAll);
            map.bind_with(ch("a"), primary.with_shift(), ReviewAction::AcceptAll);
            map.bind_with(ch("]"), primary, ReviewAction::GoToNext);
            map.bind_with(ch("["), primary, ReviewAction::GoToPrevious);
            map.bind_with(ch("z"), primary, ReviewAction::Undo);
            map.bind_with(ch("z"), primary.with_shift(), ReviewAction::Redo);
        }
        map.bind(KeyCombo::alt(Key::ArrowRight), ReviewAction::AcceptNext);
        map.bind(KeyCombo::alt(Key::ArrowLeft), ReviewAction::RejectNext);

        map
    }

    pub fn bind(&mut self, combo: KeyCombo, action: ReviewAction) {
        self.bindings.insert(combo, action);
    }

    fn bind_with(&mut self, key: Key, modifiers: Modifiers, action: ReviewAction) {
        self.bind(KeyCombo::with_modifiers(key, modifiers), action);
    }

    pub fn lookup(&self, combo: &KeyCombo) -> Option<&ReviewAction> {
        self.bindings.get(combo)
    }

    /// Run the bound action on `doc`.
    ///
    /// `Analyze` is handed back to the caller as [`KeydownResult::Delegate`].
    pub fn handle_keydown<D: ReviewDocument>(
        &self,
        doc: &mut D,
        combo: &KeyCombo,
    ) -> KeydownResult {
        match self.lookup(combo) {
            None => KeydownResult::NotHandled,
            Some(ReviewAction::Analyze) => KeydownResult::Delegate(ReviewAction::Analyze),
            Some(action) => {
                tracing::debug!(%combo, ?action, "shortcut");
                execute_action(doc, action);
                KeydownResult::Handled
            }
        }
    }
}
