//! The annotated document: spans with stable ids, and their resolution.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::classify::{AnnotatedSpan, SpanKind, classify};
use crate::diff::{DiffOptions, compute_diff_with};

/// Stable handle for a span within one [`AnnotatedDocument`].
///
/// Ids are never reused inside a document, so a handle obtained before
/// other spans were resolved still addresses the same span (or nothing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanId(pub u32);

impl std::fmt::Display for SpanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether to take or drop a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Accept,
    Reject,
}

/// What a resolution did to the rendered text, in char offsets.
///
/// Edits from one batch are meant to be applied in order; each range is
/// relative to the text as left by the previous edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum HostEdit {
    /// Remove the text in `range`.
    Delete { range: Range<usize> },
    /// Replace the text in `range` with unmarked `text`.
    Replace { range: Range<usize>, text: String },
    /// Keep the text in `range`, drop its diff metadata.
    Unmark { range: Range<usize> },
}

impl HostEdit {
    pub fn range(&self) -> &Range<usize> {
        match self {
            HostEdit::Delete { range }
            | HostEdit::Replace { range, .. }
            | HostEdit::Unmark { range } => range,
        }
    }

    /// Char offset right after the edited region once applied.
    pub fn end_after(&self) -> usize {
        match self {
            HostEdit::Delete { range } => range.start,
            HostEdit::Replace { range, text } => range.start + text.chars().count(),
            HostEdit::Unmark { range } => range.end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: SpanId,
    #[serde(flatten)]
    pub span: AnnotatedSpan,
}

/// Ordered spans inside one paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    entries: Vec<Entry>,
    next_id: u32,
}

/// Diff, classify and wrap in a document.
pub fn annotate(original: &str, corrected: &str) -> AnnotatedDocument {
    annotate_with(original, corrected, DiffOptions::default())
}

pub fn annotate_with(original: &str, corrected: &str, options: DiffOptions) -> AnnotatedDocument {
    let operations = compute_diff_with(original, corrected, options);
    let document = AnnotatedDocument::from_spans(classify(&operations));
    tracing::debug!(
        spans = document.len(),
        pending = document.pending_count(),
        "annotated correction"
    );
    document
}

impl AnnotatedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_spans(spans: impl IntoIterator<Item = AnnotatedSpan>) -> Self {
        let mut doc = Self::new();
        for span in spans {
            doc.push(span);
        }
        doc
    }

    /// Plain, fully resolved text.
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            Self::new()
        } else {
            Self::from_spans([AnnotatedSpan::unchanged(text)])
        }
    }

    pub fn push(&mut self, span: AnnotatedSpan) -> SpanId {
        let id = SpanId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, span });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn spans(&self) -> impl Iterator<Item = &AnnotatedSpan> {
        self.entries.iter().map(|e| &e.span)
    }

    pub fn get(&self, id: SpanId) -> Option<&AnnotatedSpan> {
        self.position(id).map(|i| &self.entries[i].span)
    }

    fn position(&self, id: SpanId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Ids of spans that still carry a suggestion, in document order.
    pub fn pending(&self) -> impl Iterator<Item = SpanId> + '_ {
        self.entries
            .iter()
            .filter(|e| e.span.is_pending())
            .map(|e| e.id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    pub fn is_resolved(&self) -> bool {
        self.pending_count() == 0
    }

    /// Char range of a span within the rendered text.
    pub fn range_of(&self, id: SpanId) -> Option<Range<usize>> {
        let mut start = 0;
        for entry in &self.entries {
            let len = entry.span.char_len();
            if entry.id == id {
                return Some(start..start + len);
            }
            start += len;
        }
        None
    }

    /// Span covering the char `offset` (the one starting there wins at a
    /// boundary).
    pub fn span_at(&self, offset: usize) -> Option<SpanId> {
        let mut start = 0;
        for entry in &self.entries {
            let end = start + entry.span.char_len();
            if offset >= start && offset < end {
                return Some(entry.id);
            }
            start = end;
        }
        None
    }

    /// What the editor shows: every span's text, in order.
    pub fn rendered_text(&self) -> String {
        self.spans().map(|s| s.text.as_str()).collect()
    }

    pub fn rendered_len(&self) -> usize {
        self.spans().map(AnnotatedSpan::char_len).sum()
    }

    /// Text if every pending suggestion were rejected.
    pub fn original_text(&self) -> String {
        self.spans().map(AnnotatedSpan::rejected_text).collect()
    }

    /// Text if every pending suggestion were accepted.
    pub fn corrected_text(&self) -> String {
        self.spans().map(AnnotatedSpan::accepted_text).collect()
    }

    /// First pending span that ends after `offset`, i.e. the one under the
    /// cursor or the next one after it.
    pub fn next_pending(&self, offset: usize) -> Option<SpanId> {
        let mut start = 0;
        for entry in &self.entries {
            let end = start + entry.span.char_len();
            if entry.span.is_pending() && end > offset {
                return Some(entry.id);
            }
            start = end;
        }
        None
    }

    /// Last pending span that ends at or before `offset`.
    pub fn previous_pending(&self, offset: usize) -> Option<SpanId> {
        let mut start = 0;
        let mut found = None;
        for entry in &self.entries {
            let end = start + entry.span.char_len();
            if end > offset {
                break;
            }
            if entry.span.is_pending() {
                found = Some(entry.id);
            }
            start = end;
        }
        found
    }

    /// First pending span in the document.
    pub fn first_pending(&self) -> Option<SpanId> {
        self.pending().next()
    }

    pub fn accept(&mut self, id: SpanId) -> Option<HostEdit> {
        self.resolve(id, Resolution::Accept)
    }

    pub fn reject(&mut self, id: SpanId) -> Option<HostEdit> {
        self.resolve(id, Resolution::Reject)
    }

    /// Resolve one span. Unknown ids and unchanged spans are a no-op.
    pub fn resolve(&mut self, id: SpanId, resolution: Resolution) -> Option<HostEdit> {
        let index = self.position(id)?;
        if !self.entries[index].span.is_pending() {
            return None;
        }

        let start: usize = self.entries[..index]
            .iter()
            .map(|e| e.span.char_len())
            .sum();
        let span = &self.entries[index].span;
        let range = start..start + span.char_len();
        let kind = span.kind;
        let remaining = match resolution {
            Resolution::Accept => span.accepted_text(),
            Resolution::Reject => span.rejected_text(),
        }
        .to_string();

        let edit = if remaining.is_empty() {
            self.entries.remove(index);
            HostEdit::Delete { range }
        } else if remaining == span.text {
            self.entries[index].span = AnnotatedSpan::unchanged(remaining);
            HostEdit::Unmark { range }
        } else {
            self.entries[index].span = AnnotatedSpan::unchanged(remaining.as_str());
            HostEdit::Replace {
                range,
                text: remaining,
            }
        };
        self.merge_unchanged();

        tracing::debug!(span = %id, %kind, ?resolution, ?edit, "resolved span");
        Some(edit)
    }

    pub fn accept_all(&mut self) -> Vec<HostEdit> {
        self.resolve_all(Resolution::Accept)
    }

    pub fn reject_all(&mut self) -> Vec<HostEdit> {
        self.resolve_all(Resolution::Reject)
    }

    /// Resolve every pending span in document order.
    pub fn resolve_all(&mut self, resolution: Resolution) -> Vec<HostEdit> {
        let ids: Vec<SpanId> = self.pending().collect();
        ids.into_iter()
            .filter_map(|id| self.resolve(id, resolution))
            .collect()
    }

    /// Fold adjacent unchanged spans together, keeping the first id.
    fn merge_unchanged(&mut self) {
        let mut merged: Vec<Entry> = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            match merged.last_mut() {
                Some(last)
                    if last.span.kind == SpanKind::Unchanged
                        && entry.span.kind == SpanKind::Unchanged =>
                {
                    last.span.text.push_str(&entry.span.text);
                }
                _ => merged.push(entry),
            }
        }
        self.entries = merged;
    }
}
