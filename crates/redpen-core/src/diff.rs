//! Character-level text diff.
//!
//! Common affixes are stripped and a contained text is kept whole; the rest
//! goes through `similar`'s Myers diff. A merge pass and an efficiency
//! cleanup then trade the minimal edit script for fewer, larger operations
//! that read better as suggestions.
//!
//! All lengths and positions are in Unicode scalar values (`char`s), not
//! bytes.

use serde::{Deserialize, Serialize};
use similar::{Algorithm, capture_diff_slices};

/// Default cost of an edit, in characters, used by the efficiency cleanup.
///
/// An equality shorter than this that is surrounded by edits gets folded
/// into them.
pub const DEFAULT_EDIT_COST: usize = 4;

/// Tag of a single diff operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffTag {
    Equal,
    Delete,
    Insert,
}

/// One contiguous tagged slice of a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOperation {
    pub tag: DiffTag,
    pub text: String,
}

impl EditOperation {
    pub fn new(tag: DiffTag, text: impl Into<String>) -> Self {
        Self {
            tag,
            text: text.into(),
        }
    }

    pub fn equal(text: impl Into<String>) -> Self {
        Self::new(DiffTag::Equal, text)
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Self::new(DiffTag::Delete, text)
    }

    pub fn insert(text: impl Into<String>) -> Self {
        Self::new(DiffTag::Insert, text)
    }

    /// Length in chars.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Knobs for [`compute_diff_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Edit cost for the efficiency cleanup. Zero disables the cleanup.
    pub edit_cost: usize,
    /// Drop leading whitespace the correction introduced when the original
    /// had none.
    pub strip_leading_whitespace: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            edit_cost: DEFAULT_EDIT_COST,
            strip_leading_whitespace: true,
        }
    }
}

/// Diff `original` against `corrected` with the default options.
pub fn compute_diff(original: &str, corrected: &str) -> Vec<EditOperation> {
    compute_diff_with(original, corrected, DiffOptions::default())
}

/// Diff `original` against `corrected`.
///
/// The result is in document order, contains no empty operations, never has
/// two adjacent operations with the same tag, and puts the delete before the
/// insert of a replacement.
pub fn compute_diff_with(
    original: &str,
    corrected: &str,
    options: DiffOptions,
) -> Vec<EditOperation> {
    let corrected = if options.strip_leading_whitespace {
        normalize_leading_whitespace(original, corrected)
    } else {
        corrected
    };

    let src: Vec<char> = original.chars().collect();
    let dst: Vec<char> = corrected.chars().collect();

    let mut diffs = diff_main(&src, &dst);
    if options.edit_cost > 0 {
        cleanup_efficiency(&mut diffs, options.edit_cost);
    }
    let diffs = coalesce(diffs);

    tracing::debug!(
        src_chars = src.len(),
        dst_chars = dst.len(),
        operations = diffs.len(),
        edit_cost = options.edit_cost,
        "computed diff"
    );

    diffs
        .into_iter()
        .map(|(tag, chars)| EditOperation::new(tag, chars.into_iter().collect::<String>()))
        .collect()
}

/// Strip leading whitespace from `corrected` if `original` has none.
///
/// Models tend to echo the prompt with a leading space or newline; without
/// this every correction would open with a spurious addition.
pub fn normalize_leading_whitespace<'a>(original: &str, corrected: &'a str) -> &'a str {
    let starts_with_ws = |s: &str| s.chars().next().is_some_and(char::is_whitespace);
    if !starts_with_ws(original) && starts_with_ws(corrected) {
        corrected.trim_start()
    } else {
        corrected
    }
}

/// Reconstruct the original text (everything but inserts).
pub fn source_text(operations: &[EditOperation]) -> String {
    operations
        .iter()
        .filter(|op| op.tag != DiffTag::Insert)
        .map(|op| op.text.as_str())
        .collect()
}

/// Reconstruct the corrected text (everything but deletes).
pub fn target_text(operations: &[EditOperation]) -> String {
    operations
        .iter()
        .filter(|op| op.tag != DiffTag::Delete)
        .map(|op| op.text.as_str())
        .collect()
}

// ── Internals (char-slice based) ─────────────────────────────────────────

type Chunk = (DiffTag, Vec<char>);

pub(crate) fn common_prefix(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

pub(crate) fn common_suffix(a: &[char], b: &[char]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// First occurrence of `needle` in `haystack` at or after `from`.
fn find(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return (from <= haystack.len()).then_some(from);
    }
    if from >= haystack.len() || needle.len() > haystack.len() - from {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

fn diff_main(a: &[char], b: &[char]) -> Vec<Chunk> {
    if a == b {
        return if a.is_empty() {
            Vec::new()
        } else {
            vec![(DiffTag::Equal, a.to_vec())]
        };
    }

    let prefix = common_prefix(a, b);
    let (a_rest, b_rest) = (&a[prefix..], &b[prefix..]);
    let suffix = common_suffix(a_rest, b_rest);
    let a_mid = &a_rest[..a_rest.len() - suffix];
    let b_mid = &b_rest[..b_rest.len() - suffix];

    let mut diffs = diff_compute(a_mid, b_mid);
    if prefix > 0 {
        diffs.insert(0, (DiffTag::Equal, a[..prefix].to_vec()));
    }
    if suffix > 0 {
        diffs.push((DiffTag::Equal, a_rest[a_rest.len() - suffix..].to_vec()));
    }

    cleanup_merge(&mut diffs);
    diffs
}

/// Diff two texts that share no common prefix or suffix.
fn diff_compute(a: &[char], b: &[char]) -> Vec<Chunk> {
    if a.is_empty() {
        return vec![(DiffTag::Insert, b.to_vec())];
    }
    if b.is_empty() {
        return vec![(DiffTag::Delete, a.to_vec())];
    }

    let (long, short, a_is_long) = if a.len() > b.len() {
        (a, b, true)
    } else {
        (b, a, false)
    };

    // Keep a contained text whole instead of letting Myers scatter it.
    if let Some(i) = find(long, short, 0) {
        let tag = if a_is_long {
            DiffTag::Delete
        } else {
            DiffTag::Insert
        };
        return vec![
            (tag, long[..i].to_vec()),
            (DiffTag::Equal, short.to_vec()),
            (tag, long[i + short.len()..].to_vec()),
        ];
    }

    let mut diffs = Vec::new();
    for op in capture_diff_slices(Algorithm::Myers, a, b) {
        let (tag, old, new) = op.as_tag_tuple();
        match tag {
            similar::DiffTag::Equal => diffs.push((DiffTag::Equal, a[old].to_vec())),
            similar::DiffTag::Delete => diffs.push((DiffTag::Delete, a[old].to_vec())),
            similar::DiffTag::Insert => diffs.push((DiffTag::Insert, b[new].to_vec())),
            similar::DiffTag::Replace => {
                diffs.push((DiffTag::Delete, a[old].to_vec()));
                diffs.push((DiffTag::Insert, b[new].to_vec()));
            }
        }
    }
    diffs
}

/// Reorder and merge like edit sections, factor shared affixes of
/// delete/insert pairs into the surrounding equalities, and slide single
/// edits sideways to absorb neighbouring equalities.
fn cleanup_merge(diffs: &mut Vec<Chunk>) {
    diffs.retain(|(_, text)| !text.is_empty());
    // Sentinel so the trailing edit run gets flushed.
    diffs.push((DiffTag::Equal, Vec::new()));

    let mut pointer = 0;
    let mut count_delete = 0;
    let mut count_insert = 0;
    let mut text_delete: Vec<char> = Vec::new();
    let mut text_insert: Vec<char> = Vec::new();

    while pointer < diffs.len() {
        match diffs[pointer].0 {
            DiffTag::Insert => {
                count_insert += 1;
                text_insert.extend_from_slice(&diffs[pointer].1);
                pointer += 1;
            }
            DiffTag::Delete => {
                count_delete += 1;
                text_delete.extend_from_slice(&diffs[pointer].1);
                pointer += 1;
            }
            DiffTag::Equal => {
                if count_delete + count_insert > 1 {
                    if count_delete != 0 && count_insert != 0 {
                        let common = common_prefix(&text_insert, &text_delete);
                        if common != 0 {
                            let run_start = pointer - count_delete - count_insert;
                            if run_start > 0 && diffs[run_start - 1].0 == DiffTag::Equal {
                                diffs[run_start - 1]
                                    .1
                                    .extend_from_slice(&text_insert[..common]);
                            } else {
                                diffs.insert(0, (DiffTag::Equal, text_insert[..common].to_vec()));
                                pointer += 1;
                            }
                            text_insert.drain(..common);
                            text_delete.drain(..common);
                        }

                        let common = common_suffix(&text_insert, &text_delete);
                        if common != 0 {
                            let mut merged = text_insert[text_insert.len() - common..].to_vec();
                            merged.extend_from_slice(&diffs[pointer].1);
                            diffs[pointer].1 = merged;
                            text_insert.truncate(text_insert.len() - common);
                            text_delete.truncate(text_delete.len() - common);
                        }
                    }

                    pointer -= count_delete + count_insert;
                    diffs.drain(pointer..pointer + count_delete + count_insert);
                    if !text_delete.is_empty() {
                        diffs.insert(pointer, (DiffTag::Delete, std::mem::take(&mut text_delete)));
                        pointer += 1;
                    }
                    if !text_insert.is_empty() {
                        diffs.insert(pointer, (DiffTag::Insert, std::mem::take(&mut text_insert)));
                        pointer += 1;
                    }
                    pointer += 1;
                } else if pointer != 0 && diffs[pointer - 1].0 == DiffTag::Equal {
                    let text = std::mem::take(&mut diffs[pointer].1);
                    diffs[pointer - 1].1.extend(text);
                    diffs.remove(pointer);
                } else {
                    pointer += 1;
                }
                count_delete = 0;
                count_insert = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
    }

    if diffs.last().is_some_and(|(_, text)| text.is_empty()) {
        diffs.pop();
    }

    // Second pass: single edits surrounded by equalities that can be
    // shifted sideways to eliminate one of them.
    // e.g: A<ins>BA</ins>C -> <ins>AB</ins>AC
    let mut changes = false;
    let mut pointer = 1;
    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].0 == DiffTag::Equal && diffs[pointer + 1].0 == DiffTag::Equal {
            let prev = diffs[pointer - 1].1.clone();
            let next = diffs[pointer + 1].1.clone();
            let cur = diffs[pointer].1.clone();

            if cur.ends_with(&prev) {
                let mut shifted = prev.clone();
                shifted.extend_from_slice(&cur[..cur.len() - prev.len()]);
                let mut following = prev;
                following.extend_from_slice(&next);
                diffs[pointer].1 = shifted;
                diffs[pointer + 1].1 = following;
                diffs.remove(pointer - 1);
                changes = true;
            } else if cur.starts_with(&next) {
                diffs[pointer - 1].1.extend_from_slice(&next);
                let mut shifted = cur[next.len()..].to_vec();
                shifted.extend_from_slice(&next);
                diffs[pointer].1 = shifted;
                diffs.remove(pointer + 1);
                changes = true;
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(diffs);
    }
}

/// Fold short equalities that sit between edits into those edits.
///
/// An equality is eliminated when it is surrounded by edits on all four
/// sides (insert and delete before and after), or when it is shorter than
/// half the edit cost and surrounded on three sides.
fn cleanup_efficiency(diffs: &mut Vec<Chunk>, edit_cost: usize) {
    let mut changes = false;
    // Stack of indices of candidate equalities.
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<Vec<char>> = None;
    let mut pointer: isize = 0;
    let mut pre_ins = false;
    let mut pre_del = false;
    let mut post_ins = false;
    let mut post_del = false;

    while (pointer as usize) < diffs.len() {
        let p = pointer as usize;
        if diffs[p].0 == DiffTag::Equal {
            if diffs[p].1.len() < edit_cost && (post_ins || post_del) {
                equalities.push(p);
                pre_ins = post_ins;
                pre_del = post_del;
                last_equality = Some(diffs[p].1.clone());
            } else {
                // Not a candidate, and can never become one.
                equalities.clear();
                last_equality = None;
            }
            post_ins = false;
            post_del = false;
        } else {
            if diffs[p].0 == DiffTag::Delete {
                post_del = true;
            } else {
                post_ins = true;
            }

            let sides = [pre_ins, pre_del, post_ins, post_del]
                .iter()
                .filter(|side| **side)
                .count();

            if let (Some(equality), Some(&at)) = (last_equality.as_ref(), equalities.last()) {
                let surrounded = sides == 4 || (equality.len() * 2 < edit_cost && sides == 3);
                if !equality.is_empty() && surrounded {
                    let equality = equality.clone();
                    // Duplicate the equality as a delete, turn the original
                    // into an insert.
                    diffs.insert(at, (DiffTag::Delete, equality));
                    diffs[at + 1].0 = DiffTag::Insert;
                    equalities.pop();
                    last_equality = None;
                    if pre_ins && pre_del {
                        // Nothing changed that could affect the previous entry.
                        post_ins = true;
                        post_del = true;
                        equalities.clear();
                    } else {
                        equalities.pop();
                        pointer = equalities.last().map_or(-1, |&i| i as isize);
                        post_ins = false;
                        post_del = false;
                    }
                    changes = true;
                }
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(diffs);
    }
}

/// Merge runs of same-tagged chunks and drop empty ones.
fn coalesce(diffs: Vec<Chunk>) -> Vec<Chunk> {
    let mut result: Vec<Chunk> = Vec::with_capacity(diffs.len());
    for (tag, text) in diffs {
        if text.is_empty() {
            continue;
        }
        match result.last_mut() {
            Some(last) if last.0 == tag => last.1.extend(text),
            _ => result.push((tag, text)),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(original: &str, corrected: &str) -> Vec<(DiffTag, String)> {
        compute_diff(original, corrected)
            .into_iter()
            .map(|op| (op.tag, op.text))
            .collect()
    }

    fn assert_reconstructs(original: &str, corrected: &str) {
        let diff = compute_diff(original, corrected);
        assert_eq!(source_text(&diff), original);
        assert_eq!(target_text(&diff), corrected);
    }

    #[test]
    fn test_identical_inputs() {
        assert_eq!(ops("hello", "hello"), vec![(DiffTag::Equal, "hello".into())]);
        assert!(ops("", "").is_empty());
    }

    #[test]
    fn test_empty_sides() {
        assert_eq!(ops("", "abc"), vec![(DiffTag::Insert, "abc".into())]);
        assert_eq!(ops("abc", ""), vec![(DiffTag::Delete, "abc".into())]);
    }

    #[test]
    fn test_containment() {
        assert_eq!(
            ops("cat", "the cat sat"),
            vec![
                (DiffTag::Insert, "the ".into()),
                (DiffTag::Equal, "cat".into()),
                (DiffTag::Insert, " sat".into()),
            ]
        );
    }

    #[test]
    fn test_single_char_replacement() {
        assert_eq!(
            ops("a", "b"),
            vec![(DiffTag::Delete, "a".into()), (DiffTag::Insert, "b".into())]
        );
    }

    #[test]
    fn test_grammar_fix() {
        assert_eq!(
            ops("I has a apple.", "I have an apple."),
            vec![
                (DiffTag::Equal, "I ha".into()),
                (DiffTag::Delete, "s".into()),
                (DiffTag::Insert, "ve".into()),
                (DiffTag::Equal, " a".into()),
                (DiffTag::Insert, "n".into()),
                (DiffTag::Equal, " apple.".into()),
            ]
        );
    }

    #[test]
    fn test_word_swap() {
        assert_eq!(
            ops("the quick brown fox", "the slow brown fox"),
            vec![
                (DiffTag::Equal, "the ".into()),
                (DiffTag::Delete, "quick".into()),
                (DiffTag::Insert, "slow".into()),
                (DiffTag::Equal, " brown fox".into()),
            ]
        );
        // A lone shared "e" inside the word is folded into the edit.
        assert_eq!(
            ops("I goed home", "I went home"),
            vec![
                (DiffTag::Equal, "I ".into()),
                (DiffTag::Delete, "goed".into()),
                (DiffTag::Insert, "went".into()),
                (DiffTag::Equal, " home".into()),
            ]
        );
    }

    #[test]
    fn test_reconstructs_both_sides() {
        assert_reconstructs("the quick brown fox", "the slow green fox");
        assert_reconstructs("Their going too the store", "They're going to the store.");
        assert_reconstructs("abcdefghij", "jihgfedcba");
        assert_reconstructs("héllo wörld", "hello world");
        assert_reconstructs("line one\nline two\n", "line 1\nline two\nline three\n");
    }

    #[test]
    fn test_leading_whitespace_artifact_is_stripped() {
        assert_eq!(ops("Hello", "  Hello"), vec![(DiffTag::Equal, "Hello".into())]);
        assert_eq!(ops("Hello", "\nHello"), vec![(DiffTag::Equal, "Hello".into())]);
    }

    #[test]
    fn test_leading_whitespace_kept_when_original_has_it() {
        // The inserted space slides left onto the shared one.
        assert_eq!(
            ops(" Hello", "  Hello"),
            vec![(DiffTag::Insert, " ".into()), (DiffTag::Equal, " Hello".into())]
        );
        assert_reconstructs(" Hello", "  Hello");
    }

    #[test]
    fn test_leading_whitespace_option_off() {
        let options = DiffOptions {
            strip_leading_whitespace: false,
            ..Default::default()
        };
        let diff = compute_diff_with("Hello", " Hello", options);
        assert_eq!(target_text(&diff), " Hello");
        assert_eq!(diff[0], EditOperation::insert(" "));
    }

    #[test]
    fn test_no_adjacent_equal_or_empty_operations() {
        let cases = [
            ("The cat sat on teh mat", "The cat sat on the mat."),
            ("abcabcabc", "abcxabcyabc"),
            ("aaaa", "aaaaa"),
            ("I goed to the park yesturday", "I went to the park yesterday"),
        ];
        for (original, corrected) in cases {
            let diff = compute_diff(original, corrected);
            assert!(diff.iter().all(|op| !op.text.is_empty()));
            for pair in diff.windows(2) {
                assert_ne!(pair[0].tag, pair[1].tag, "{original:?} -> {corrected:?}");
                assert!(
                    !(pair[0].tag == DiffTag::Insert && pair[1].tag == DiffTag::Delete),
                    "insert before delete in {diff:?}"
                );
            }
        }
    }

    #[test]
    fn test_efficiency_cleanup_folds_short_equalities() {
        // Raw diff: <del>ab</del><ins>12</ins>wxyz<del>cd</del><ins>34</ins>
        // is left alone because "wxyz" is as long as the edit cost.
        assert_eq!(
            ops("abwxyzcd", "12wxyz34"),
            vec![
                (DiffTag::Delete, "ab".into()),
                (DiffTag::Insert, "12".into()),
                (DiffTag::Equal, "wxyz".into()),
                (DiffTag::Delete, "cd".into()),
                (DiffTag::Insert, "34".into()),
            ]
        );
        // "xyz" is shorter and surrounded by edits on all four sides.
        assert_eq!(
            ops("abxyzcd", "12xyz34"),
            vec![(DiffTag::Delete, "abxyzcd".into()), (DiffTag::Insert, "12xyz34".into())]
        );
    }

    #[test]
    fn test_edit_cost_zero_disables_cleanup() {
        let options = DiffOptions {
            edit_cost: 0,
            ..Default::default()
        };
        let diff = compute_diff_with("abxyzcd", "12xyz34", options);
        assert!(diff.iter().any(|op| op.tag == DiffTag::Equal && op.text == "xyz"));
    }

    #[test]
    fn test_common_affixes() {
        let a: Vec<char> = "running".chars().collect();
        let b: Vec<char> = "runing".chars().collect();
        assert_eq!(common_prefix(&a, &b), 3);
        assert_eq!(common_suffix(&a, &b), 4);
        assert_eq!(common_prefix(&a, &[]), 0);
    }

    #[test]
    fn test_find() {
        let hay: Vec<char> = "abcabc".chars().collect();
        let needle: Vec<char> = "bc".chars().collect();
        assert_eq!(find(&hay, &needle, 0), Some(1));
        assert_eq!(find(&hay, &needle, 2), Some(4));
        assert_eq!(find(&hay, &needle, 5), None);
    }
}
