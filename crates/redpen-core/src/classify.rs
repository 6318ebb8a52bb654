//! Turning diff operations into annotated spans.

use serde::{Deserialize, Serialize};

use crate::diff::{DiffTag, EditOperation, common_prefix, common_suffix};

/// Replacements whose lengths differ by more than this are never related.
pub const MAX_LENGTH_DIFFERENCE: usize = 3;

/// Shared material must exceed this percentage of the longer word.
pub const RELATEDNESS_PERCENT: usize = 60;

/// How a span differs between the original and the corrected text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Unchanged,
    Deletion,
    Addition,
    Change,
}

impl SpanKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SpanKind::Unchanged => "unchanged",
            SpanKind::Deletion => "deletion",
            SpanKind::Addition => "addition",
            SpanKind::Change => "change",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unchanged" => Some(SpanKind::Unchanged),
            "deletion" => Some(SpanKind::Deletion),
            "addition" => Some(SpanKind::Addition),
            "change" => Some(SpanKind::Change),
            _ => None,
        }
    }
}

impl std::fmt::Display for SpanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A run of displayed text plus its diff metadata.
///
/// `text` is what the reader sees. For deletions and changes that is the
/// original wording; for additions it is the new wording. `correction`
/// holds what accepting the span would leave behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedSpan {
    pub text: String,
    pub kind: SpanKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<String>,
}

impl AnnotatedSpan {
    pub fn unchanged(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: SpanKind::Unchanged,
            correction: None,
        }
    }

    pub fn deletion(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: SpanKind::Deletion,
            correction: Some(String::new()),
        }
    }

    pub fn addition(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            correction: Some(text.clone()),
            text,
            kind: SpanKind::Addition,
        }
    }

    pub fn change(text: impl Into<String>, correction: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: SpanKind::Change,
            correction: Some(correction.into()),
        }
    }

    /// Whether the span still carries a suggestion.
    pub fn is_pending(&self) -> bool {
        self.kind != SpanKind::Unchanged
    }

    /// Text left in place if the suggestion is accepted.
    pub fn accepted_text(&self) -> &str {
        match self.kind {
            SpanKind::Unchanged | SpanKind::Addition => &self.text,
            SpanKind::Deletion => "",
            SpanKind::Change => self.correction.as_deref().unwrap_or(&self.text),
        }
    }

    /// Text left in place if the suggestion is rejected.
    pub fn rejected_text(&self) -> &str {
        match self.kind {
            SpanKind::Addition => "",
            SpanKind::Unchanged | SpanKind::Deletion | SpanKind::Change => &self.text,
        }
    }

    /// Text this span contributes to the original.
    pub fn original_text(&self) -> &str {
        self.rejected_text()
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Map diff operations to spans, pairing delete+insert replacements.
pub fn classify(operations: &[EditOperation]) -> Vec<AnnotatedSpan> {
    let mut spans = Vec::with_capacity(operations.len());
    let mut i = 0;

    while i < operations.len() {
        let op = &operations[i];
        match op.tag {
            DiffTag::Equal => spans.push(AnnotatedSpan::unchanged(op.text.as_str())),
            DiffTag::Insert => spans.push(AnnotatedSpan::addition(op.text.as_str())),
            DiffTag::Delete => match operations.get(i + 1) {
                Some(next) if next.tag == DiffTag::Insert => {
                    if share_common_parts(&op.text, &next.text) {
                        spans.push(AnnotatedSpan::change(op.text.as_str(), next.text.as_str()));
                    } else {
                        spans.push(AnnotatedSpan::deletion(op.text.as_str()));
                        spans.push(AnnotatedSpan::addition(next.text.as_str()));
                    }
                    // The insert has been consumed.
                    i += 1;
                }
                _ => spans.push(AnnotatedSpan::deletion(op.text.as_str())),
            },
        }
        i += 1;
    }

    spans
}

/// Whether a replacement looks like a fix of the same word rather than a
/// different word.
///
/// Related when the shared prefix, the shared suffix, or failing those the
/// longest common subsequence is longer than 60% of the longer word. Words
/// whose lengths differ by more than three characters are never related.
pub fn share_common_parts(first: &str, second: &str) -> bool {
    let a: Vec<char> = first.chars().collect();
    let b: Vec<char> = second.chars().collect();

    if a.len().abs_diff(b.len()) > MAX_LENGTH_DIFFERENCE {
        return false;
    }

    let threshold = a.len().max(b.len()) * RELATEDNESS_PERCENT / 100;

    common_prefix(&a, &b) > threshold
        || common_suffix(&a, &b) > threshold
        || longest_common_subsequence(&a, &b) > threshold
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    // Two rolling rows of the classic DP table.
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}
