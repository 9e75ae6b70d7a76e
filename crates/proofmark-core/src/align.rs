//! Token-level alignment of an original text against a corrected version.
//!
//! The alignment is a Myers diff (via `similar`) over token *text*, which
//! finds a longest common subsequence in linear space. Consecutive
//! non-matching tokens on either side are merged into a single edit, and
//! every edit is located by its span in the original text so it can be
//! reconciled against detector diagnostics.
//!
//! When two alignments keep the same number of tokens, the one that
//! consumes the original side first wins: `"b a"` against `"a b"` deletes
//! `b` and re-inserts it after `a`, never the other way round.
//!
//! The corrected side of an edit is its tokens rejoined with single spaces.
//! That loses the corrected text's own spacing (`"cats ,"` and `"cats,"`
//! both become `"cats ,"`), which is accepted: the span into the original is
//! what matters downstream.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use similar::{Algorithm, DiffTag, capture_diff_slices};

use crate::span::Span;
use crate::tokenize::{Token, tokenize};

/// What an alignment op does to the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    /// Tokens present on both sides.
    Equal,
    /// Tokens only present in the corrected text.
    Insert,
    /// Tokens only present in the original text.
    Delete,
    /// Original tokens replaced by different corrected tokens.
    Replace,
}

impl EditKind {
    /// Returns the kind as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::Replace => "replace",
        }
    }
}

impl std::fmt::Display for EditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of the edit script between original and corrected text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AlignmentOp {
    /// Kind of edit.
    pub kind: EditKind,
    /// The original text covered by `original_span`, verbatim.
    pub original_text: String,
    /// The corrected tokens, joined with single spaces.
    pub corrected_text: String,
    /// Location in the original text. Zero-width for inserts.
    pub original_span: Span,
}

impl AlignmentOp {
    /// Whether this op changes anything.
    pub fn is_edit(&self) -> bool {
        self.kind != EditKind::Equal
    }
}

/// Align two texts and return the full op sequence, `Equal` runs included.
///
/// Projecting the ops' original spans (plus the whitespace between them)
/// covers the whole original text.
#[tracing::instrument(skip_all, fields(original_len = original.len(), corrected_len = corrected.len()))]
pub fn align(original: &str, corrected: &str) -> Vec<AlignmentOp> {
    let original_tokens = tokenize(original);
    let corrected_tokens = tokenize(corrected);
    align_tokens(original, &original_tokens, &corrected_tokens)
}

/// Align two texts and keep only the ops that change something.
pub fn edits(original: &str, corrected: &str) -> Vec<AlignmentOp> {
    align(original, corrected)
        .into_iter()
        .filter(AlignmentOp::is_edit)
        .collect()
}

/// Align pre-tokenized input. `original_text` must be the text
/// `original` was cut from.
pub fn align_tokens(
    original_text: &str,
    original: &[Token<'_>],
    corrected: &[Token<'_>],
) -> Vec<AlignmentOp> {
    let a: Vec<&str> = original.iter().map(|t| t.text).collect();
    let b: Vec<&str> = corrected.iter().map(|t| t.text).collect();

    let mut builder = OpBuilder {
        text: original_text,
        original,
        corrected,
        ops: Vec::new(),
    };

    let (mut i, mut j) = (0, 0);
    // Start of the current equal or non-equal run, on both sides.
    let (mut run_i, mut run_j) = (0, 0);
    let mut in_equal_run = false;

    for step in diff_steps(&a, &b) {
        let is_match = step == Step::Match;
        if is_match != in_equal_run {
            builder.flush(run_i..i, run_j..j, in_equal_run);
            run_i = i;
            run_j = j;
            in_equal_run = is_match;
        }
        match step {
            Step::Match => {
                i += 1;
                j += 1;
            }
            Step::Delete => i += 1,
            Step::Insert => j += 1,
        }
    }
    builder.flush(run_i..i, run_j..j, in_equal_run);

    tracing::debug!(op_count = builder.ops.len(), "alignment computed");
    builder.ops
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Match,
    Delete,
    Insert,
}

/// Per-token steps of a minimal diff between `a` and `b`.
fn diff_steps(a: &[&str], b: &[&str]) -> Vec<Step> {
    let mut runs: Vec<(Step, usize)> = Vec::new();
    for op in capture_diff_slices(Algorithm::Myers, a, b) {
        let (tag, old, new) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => runs.push((Step::Match, old.len())),
            DiffTag::Delete => runs.push((Step::Delete, old.len())),
            DiffTag::Insert => runs.push((Step::Insert, new.len())),
            DiffTag::Replace => {
                runs.push((Step::Delete, old.len()));
                runs.push((Step::Insert, new.len()));
            }
        }
    }
    prefer_deletions(&mut runs, a, b);

    runs.into_iter()
        .flat_map(|(step, len)| std::iter::repeat_n(step, len))
        .collect()
}

/// Rewrite `insert B, keep E, delete A` as `delete E, keep A, insert E`
/// wherever `A` and `B` are the same tokens and `E` is as long as `A`.
/// Both keep the same number of tokens; the rewritten form advances the
/// original side first.
fn prefer_deletions(runs: &mut [(Step, usize)], a: &[&str], b: &[&str]) {
    let (mut i, mut j) = (0, 0);
    for k in 0..runs.len() {
        if let Some(&[(Step::Insert, ins), (Step::Match, kept), (Step::Delete, del)]) =
            runs.get(k..k + 3)
            && ins == del
            && kept == del
            && b[j..j + ins] == a[i + kept..i + kept + del]
        {
            runs[k] = (Step::Delete, kept);
            runs[k + 1] = (Step::Match, del);
            runs[k + 2] = (Step::Insert, ins);
        }
        match runs[k] {
            (Step::Match, len) => {
                i += len;
                j += len;
            }
            (Step::Delete, len) => i += len,
            (Step::Insert, len) => j += len,
        }
    }
}

struct OpBuilder<'t, 'a> {
    text: &'t str,
    original: &'a [Token<'a>],
    corrected: &'a [Token<'a>],
    ops: Vec<AlignmentOp>,
}

impl OpBuilder<'_, '_> {
    fn flush(&mut self, orig: std::ops::Range<usize>, corr: std::ops::Range<usize>, equal: bool) {
        let kind = match (orig.is_empty(), corr.is_empty()) {
            (true, true) => return,
            _ if equal => EditKind::Equal,
            (false, false) => EditKind::Replace,
            (false, true) => EditKind::Delete,
            (true, false) => EditKind::Insert,
        };

        let original_span = if orig.is_empty() {
            // Anchor inserts right after the preceding original token.
            let at = orig
                .start
                .checked_sub(1)
                .map_or(0, |prev| self.original[prev].end);
            Span::point(at)
        } else {
            Span::new(self.original[orig.start].start, self.original[orig.end - 1].end)
        };

        let original_text = original_span.slice(self.text).unwrap_or_default().to_string();
        let corrected_text = self.corrected[corr]
            .iter()
            .map(|t| t.text)
            .collect::<Vec<_>>()
            .join(" ");

        self.ops.push(AlignmentOp {
            kind,
            original_text,
            corrected_text,
            original_span,
        });
    }
}
