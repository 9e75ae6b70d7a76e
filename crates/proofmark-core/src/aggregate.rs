//! Normalization and join of detector output.
//!
//! [`aggregate`] takes whatever the detectors and the aligner produced for a
//! text and returns fresh, normalized collections. Inputs are borrowed and
//! never modified.

use crate::align::AlignmentOp;
use crate::diagnostic::{Category, Diagnostic, normalize_all};
use crate::promote::promote_punctuation;
use crate::registry::suppress_covered;
use crate::services::{LinguisticReport, SpellingReport};
use crate::span::Span;

/// Normalized diagnostics for one text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    /// Grammar diagnostics, in detector order.
    pub grammar: Vec<Diagnostic>,
    /// Mechanics diagnostics: detector output followed by promoted
    /// punctuation edits.
    pub mechanics: Vec<Diagnostic>,
    /// One diagnostic per misspelled occurrence.
    pub spelling: Vec<Diagnostic>,
    /// Distinct misspelled words.
    pub spelling_count: usize,
    /// Edits not absorbed by punctuation promotion, as diagnostics.
    pub assistive: Vec<Diagnostic>,
    /// Edits not absorbed by promotion that touch no grammar, mechanics, or
    /// spelling span.
    pub suggestions: Vec<AlignmentOp>,
}

impl Aggregate {
    /// Grammar, mechanics, and spelling diagnostics in that order.
    pub fn authoritative(&self) -> impl Iterator<Item = &Diagnostic> {
        self.grammar
            .iter()
            .chain(&self.mechanics)
            .chain(&self.spelling)
    }

    /// Every diagnostic, assistive last.
    pub fn all(&self) -> impl Iterator<Item = &Diagnostic> {
        self.authoritative().chain(&self.assistive)
    }

    /// Mechanics diagnostics that carry a span, valid or not.
    pub fn located_mechanics(&self) -> usize {
        self.mechanics.iter().filter(|d| d.span.is_some()).count()
    }
}

/// Join detector output for `text`.
///
/// `ops` should hold only non-equal alignment ops; equal ops are ignored.
#[tracing::instrument(skip_all, fields(text_len = text.len(), ops = ops.len()))]
pub fn aggregate(
    text: &str,
    linguistic: &LinguisticReport,
    spelling: &SpellingReport,
    ops: &[AlignmentOp],
) -> Aggregate {
    let grammar = normalize_all(&linguistic.grammar, Category::Grammar);
    let mut mechanics = normalize_all(&linguistic.mechanics, Category::Mechanics);

    let edits: Vec<AlignmentOp> = ops.iter().filter(|op| op.is_edit()).cloned().collect();
    let promotion = promote_punctuation(&edits, &mechanics);
    mechanics.extend(promotion.diagnostics.iter().cloned());

    let spelling_diagnostics: Vec<Diagnostic> = spelling
        .misspelled_words
        .iter()
        .map(|m| m.to_diagnostic())
        .collect();

    let remaining: Vec<&AlignmentOp> = edits
        .iter()
        .enumerate()
        .filter(|(index, _)| !promotion.is_absorbed(*index))
        .map(|(_, op)| op)
        .collect();

    let assistive = remaining
        .iter()
        .filter_map(|op| Diagnostic::from_edit(op))
        .collect();

    let authoritative_spans: Vec<Span> = grammar
        .iter()
        .chain(&mechanics)
        .chain(&spelling_diagnostics)
        .filter_map(|d| d.valid_span(text))
        .collect();
    let suggestions = suppress_covered(remaining, &authoritative_spans);

    let aggregate = Aggregate {
        grammar,
        mechanics,
        spelling: spelling_diagnostics,
        spelling_count: spelling.distinct_count(),
        assistive,
        suggestions,
    };
    tracing::debug!(
        grammar = aggregate.grammar.len(),
        mechanics = aggregate.mechanics.len(),
        spelling = aggregate.spelling.len(),
        promoted = promotion.diagnostics.len(),
        suggestions = aggregate.suggestions.len(),
        "aggregation complete"
    );
    aggregate
}
