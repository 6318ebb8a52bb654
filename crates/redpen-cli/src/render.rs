//! Plain-terminal rendering of an annotated document.
//!
//! Uses wdiff-style markers: `[-removed-]` and `{+added+}`.

use redpen_core::{AnnotatedDocument, SpanId, SpanKind};

/// Markup for the whole document. The span `current`, if any, is wrapped in
/// `>>` `<<` so the reviewer can see what the next command applies to.
pub fn markup(doc: &AnnotatedDocument, current: Option<SpanId>) -> String {
    let mut out = String::new();
    for entry in doc.entries() {
        let span = &entry.span;
        let focused = current == Some(entry.id);
        if focused {
            out.push_str(">>");
        }
        match span.kind {
            SpanKind::Unchanged => out.push_str(&span.text),
            SpanKind::Deletion => {
                out.push_str("[-");
                out.push_str(&span.text);
                out.push_str("-]");
            }
            SpanKind::Addition => {
                out.push_str("{+");
                out.push_str(&span.text);
                out.push_str("+}");
            }
            SpanKind::Change => {
                out.push_str("[-");
                out.push_str(&span.text);
                out.push_str("-]{+");
                out.push_str(span.correction.as_deref().unwrap_or_default());
                out.push_str("+}");
            }
        }
        if focused {
            out.push_str("<<");
        }
    }
    out
}

/// "3 suggestions" style summary.
pub fn summary(doc: &AnnotatedDocument) -> String {
    match doc.pending_count() {
        0 => "no suggestions".to_string(),
        1 => "1 suggestion".to_string(),
        n => format!("{n} suggestions"),
    }
}
