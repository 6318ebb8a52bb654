//! redpen-core: turning a model's correction into reviewable suggestions.
//!
//! This crate provides:
//! - `compute_diff` - character-level diff with efficiency cleanup
//! - `classify` / `share_common_parts` - spans of unchanged, deleted, added
//!   and changed text
//! - `AnnotatedDocument` - spans with stable ids, accept/reject resolution
//! - `ReviewDocument` / `PlainReviewer<T>` - a host editor model over any
//!   `TextBuffer`, driven by `ReviewAction`s and a `Keymap`
//! - host formats (JSON node tree and HTML) for rich-text editors

pub mod actions;
pub mod annotation;
pub mod classify;
pub mod diff;
pub mod document;
pub mod execute;
pub mod keymap;
pub mod serialize;
pub mod text;
pub mod types;
pub mod undo;

pub use actions::{Key, KeyCombo, KeydownResult, Modifiers, ParseKeyComboError, ReviewAction};
pub use annotation::{
    AnnotatedDocument, Entry, HostEdit, Resolution, SpanId, annotate, annotate_with,
};
pub use classify::{AnnotatedSpan, SpanKind, classify, share_common_parts};
pub use diff::{
    DEFAULT_EDIT_COST, DiffOptions, DiffTag, EditOperation, compute_diff, compute_diff_with,
    source_text, target_text,
};
pub use document::{PlainReviewer, ReviewDocument};
pub use execute::execute_action;
pub use keymap::Keymap;
pub use serialize::{HostFormatError, from_html, from_json, to_html, to_json, to_json_pretty};
pub use smol_str::SmolStr;
pub use text::{EditorRope, TextBuffer};
pub use types::{CursorState, Selection};
pub use undo::{UndoManager, UndoableDocument};
