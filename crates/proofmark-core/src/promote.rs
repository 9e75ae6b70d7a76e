//! Promotion of punctuation-only edits to mechanics diagnostics.
//!
//! When the corrected text differs from the original only by punctuation,
//! the edit is a mechanics error in its own right rather than a stylistic
//! suggestion. Such edits are turned into `punctuation_error` diagnostics
//! and withheld from the assistive set.

use std::collections::HashSet;

use crate::align::{AlignmentOp, EditKind};
use crate::diagnostic::{Category, Diagnostic};
use crate::span::Span;

/// Kind assigned to promoted punctuation diagnostics.
pub const PUNCTUATION_KIND: &str = "punctuation_error";

/// Characters an edit may consist of to count as punctuation-only.
pub const PUNCTUATION_MARKS: &[char] = &[',', '.', ';', ':', '!', '?', '—', '-'];

/// Whether `text`, ignoring surrounding whitespace, is non-empty and made up
/// solely of [`PUNCTUATION_MARKS`].
pub fn is_punctuation_only(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| PUNCTUATION_MARKS.contains(&c))
}

/// Result of a promotion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Promotion {
    /// New mechanics diagnostics, in op order.
    pub diagnostics: Vec<Diagnostic>,
    /// Indices into the op list of every punctuation-only edit, promoted or
    /// already covered by an existing mechanics diagnostic. None of these
    /// belong in the assistive set.
    pub absorbed: Vec<usize>,
}

impl Promotion {
    /// Whether the op at `index` was absorbed into mechanics.
    pub fn is_absorbed(&self, index: usize) -> bool {
        self.absorbed.binary_search(&index).is_ok()
    }
}

/// Promote punctuation-only edits in `ops`.
///
/// An edit whose original span exactly matches a span already held by a
/// mechanics diagnostic is absorbed without producing a duplicate.
#[tracing::instrument(skip_all, fields(op_count = ops.len()))]
pub fn promote_punctuation(ops: &[AlignmentOp], existing_mechanics: &[Diagnostic]) -> Promotion {
    let mut occupied: HashSet<Span> = existing_mechanics.iter().filter_map(|d| d.span).collect();
    let mut promotion = Promotion::default();

    for (index, op) in ops.iter().enumerate() {
        let original = op.original_text.trim();
        let corrected = op.corrected_text.trim();

        let (message, suggestion) = match op.kind {
            EditKind::Insert if is_punctuation_only(corrected) => (
                format!("Missing punctuation: '{corrected}'"),
                format!("Add '{corrected}' here"),
            ),
            EditKind::Delete if is_punctuation_only(original) => (
                format!("Unnecessary punctuation: '{original}'"),
                format!("Remove '{original}'"),
            ),
            EditKind::Replace if is_punctuation_only(original) && is_punctuation_only(corrected) => (
                format!("Incorrect punctuation: '{original}' should be '{corrected}'"),
                format!("Replace '{original}' with '{corrected}'"),
            ),
            _ => continue,
        };

        promotion.absorbed.push(index);
        if !occupied.insert(op.original_span) {
            tracing::debug!(span = %op.original_span, "punctuation edit already flagged");
            continue;
        }

        promotion.diagnostics.push(Diagnostic::located(
            Category::Mechanics,
            PUNCTUATION_KIND,
            op.original_span,
            message,
            suggestion,
        ));
    }

    tracing::debug!(
        promoted = promotion.diagnostics.len(),
        absorbed = promotion.absorbed.len(),
        "punctuation promotion complete"
    );
    promotion
}
