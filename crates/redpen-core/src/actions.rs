//! Review actions and input types.
//!
//! The `ReviewAction` enum represents what a reviewer can do to an annotated
//! document, decoupled from how it is triggered (shortcut, click, command
//! line). `Key`, `Modifiers` and `KeyCombo` describe keyboard input in a
//! platform-agnostic way.

use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;

use crate::annotation::{Resolution, SpanId};

/// All possible review actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAction {
    /// Ask the correction oracle about the current text. Hosts handle this
    /// one themselves; it needs the network.
    Analyze,

    /// Replace the whole content with a fresh annotation of `corrected`
    /// against `original`.
    Load { original: String, corrected: String },

    /// Accept one span.
    AcceptSpan { span: SpanId },

    /// Reject one span.
    RejectSpan { span: SpanId },

    AcceptAll,
    RejectAll,

    /// Accept the first pending span after the cursor, wrapping around.
    AcceptNext,

    /// Reject the first pending span after the cursor, wrapping around.
    RejectNext,

    /// Select the next pending span.
    GoToNext,

    /// Select the previous pending span.
    GoToPrevious,

    Undo,
    Redo,

    /// Move cursor to position.
    MoveCursor { offset: usize },
}

impl ReviewAction {
    /// Action for a click on a span: accept, or reject with Shift held.
    pub fn for_click(span: SpanId, shift: bool) -> Self {
        if shift {
            Self::RejectSpan { span }
        } else {
            Self::AcceptSpan { span }
        }
    }

    pub fn resolve(span: SpanId, resolution: Resolution) -> Self {
        match resolution {
            Resolution::Accept => Self::AcceptSpan { span },
            Resolution::Reject => Self::RejectSpan { span },
        }
    }

    /// Whether executing this action may change document content.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::Analyze | Self::GoToNext | Self::GoToPrevious | Self::MoveCursor { .. }
        )
    }
}

/// Key values for keyboard input.
///
/// Platform-specific code converts from native key events to this enum.
/// Character keys are stored lowercased so Shift+A and Shift+a match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Character(SmolStr),
    Unidentified,
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    Space,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
}

impl Key {
    pub fn character(s: impl AsRef<str>) -> Self {
        Self::Character(SmolStr::new(s.as_ref().to_lowercase()))
    }

    /// Parse a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Escape" | "Esc" => Self::Escape,
            " " | "Space" => Self::Space,
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowRight" | "Right" => Self::ArrowRight,
            "ArrowUp" | "Up" => Self::ArrowUp,
            "ArrowDown" | "Down" => Self::ArrowDown,
            "Home" => Self::Home,
            "End" => Self::End,
            s if s.chars().count() == 1 => Self::character(s),
            _ => Self::Unidentified,
        }
    }

    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
        )
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Character(c) => f.write_str(&c.to_uppercase()),
            Key::Unidentified => f.write_str("Unidentified"),
            Key::Backspace => f.write_str("Backspace"),
            Key::Delete => f.write_str("Delete"),
            Key::Enter => f.write_str("Enter"),
            Key::Tab => f.write_str("Tab"),
            Key::Escape => f.write_str("Escape"),
            Key::Space => f.write_str("Space"),
            Key::ArrowLeft => f.write_str("Left"),
            Key::ArrowRight => f.write_str("Right"),
            Key::ArrowUp => f.write_str("Up"),
            Key::ArrowDown => f.write_str("Down"),
            Key::Home => f.write_str("Home"),
            Key::End => f.write_str("End"),
        }
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    /// Get the primary modifier for the platform (Cmd on Mac, Ctrl elsewhere).
    pub fn primary(is_mac: bool) -> Self {
        if is_mac { Self::META } else { Self::CTRL }
    }

    pub fn with_shift(self) -> Self {
        Self {
            shift: true,
            ..self
        }
    }

    pub fn with_alt(self) -> Self {
        Self { alt: true, ..self }
    }
}

/// A key combination for triggering an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn alt(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::ALT)
    }

    pub fn primary(key: Key, is_mac: bool) -> Self {
        Self::with_modifiers(key, Modifiers::primary(is_mac))
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        if m.ctrl {
            f.write_str("Ctrl+")?;
        }
        if m.meta {
            f.write_str("Cmd+")?;
        }
        if m.alt {
            f.write_str("Alt+")?;
        }
        if m.shift {
            f.write_str("Shift+")?;
        }
        write!(f, "{}", self.key)
    }
}

/// Error from parsing a key combo such as `ctrl+alt+a`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid key combo '{0}'")]
pub struct ParseKeyComboError(pub String);

impl FromStr for KeyCombo {
    type Err = ParseKeyComboError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modifiers = Modifiers::NONE;
        let mut key = None;
        for part in s.split('+').map(str::trim) {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "cmd" | "meta" | "super" => modifiers.meta = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "" => return Err(ParseKeyComboError(s.to_string())),
                _ if key.is_none() => {
                    let parsed = match part.to_ascii_lowercase().as_str() {
                        "left" | "arrowleft" => Key::ArrowLeft,
                        "right" | "arrowright" => Key::ArrowRight,
                        "up" | "arrowup" => Key::ArrowUp,
                        "down" | "arrowdown" => Key::ArrowDown,
                        "enter" | "return" => Key::Enter,
                        "esc" | "escape" => Key::Escape,
                        "space" => Key::Space,
                        "tab" => Key::Tab,
                        _ => Key::from_dom(part),
                    };
                    if parsed == Key::Unidentified {
                        return Err(ParseKeyComboError(s.to_string()));
                    }
                    key = Some(parsed);
                }
                _ => return Err(ParseKeyComboError(s.to_string())),
            }
        }
        key.map(|key| KeyCombo { key, modifiers })
            .ok_or_else(|| ParseKeyComboError(s.to_string()))
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, PartialEq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let platform handle it.
    NotHandled,
    /// Bound to an action the host has to perform itself (e.g. `Analyze`).
    Delegate(ReviewAction),
}
