//! Interval conflict resolution across diagnostic sources.
//!
//! Grammar/mechanics detectors, the spell checker, and the assistive diff
//! all annotate the same text independently. The registry turns their union
//! into one ordered set in which no two spans overlap.
//!
//! Resolution runs in two phases:
//!
//! 1. **Exact duplicates.** Among candidates sharing an identical span only
//!    the highest [`Authority`](crate::diagnostic::Authority) survives (first seen wins a tie).
//! 2. **Greedy sweep.** Survivors are visited in policy order and accepted
//!    unless they overlap something already accepted.
//!
//! Under [`ResolutionPolicy::LeftToRight`] the sweep visits earliest start
//! first, widest first among equal starts, so a wide low-authority span can
//! shadow a narrow high-authority one it overlaps.
//! [`ResolutionPolicy::AuthorityFirst`] sweeps by authority tier first.
//!
//! The strict filter [`suppress_covered`] is separate: it drops every
//! assistive edit that touches any authoritative span at all.

use std::cmp::Reverse;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::align::AlignmentOp;
use crate::diagnostic::Diagnostic;
use crate::span::Span;

/// Sweep order used when non-identical spans overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ResolutionPolicy {
    /// Earliest start wins, then widest span; authority only breaks exact
    /// duplicates.
    #[default]
    LeftToRight,
    /// Highest authority wins, then earliest start, then widest span.
    AuthorityFirst,
}

impl ResolutionPolicy {
    /// Returns the policy as a kebab-case string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LeftToRight => "left-to-right",
            Self::AuthorityFirst => "authority-first",
        }
    }
}

impl std::fmt::Display for ResolutionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves overlapping diagnostics into a non-overlapping view.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanRegistry {
    policy: ResolutionPolicy,
}

impl SpanRegistry {
    /// Create a registry with the given sweep order.
    pub const fn new(policy: ResolutionPolicy) -> Self {
        Self { policy }
    }

    /// The sweep order in use.
    pub const fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Reconcile `candidates` against `text`.
    ///
    /// Candidates without a span, or whose span is not valid for `text`, are
    /// skipped. The result is ordered by start, widest first, and no two of
    /// its spans overlap.
    #[tracing::instrument(skip_all, fields(policy = self.policy.as_str()))]
    pub fn reconcile<I>(&self, text: &str, candidates: I) -> Vec<Diagnostic>
    where
        I: IntoIterator<Item = Diagnostic>,
    {
        let mut survivors: Vec<(Span, Diagnostic)> = Vec::new();
        let mut by_span: HashMap<Span, usize> = HashMap::new();
        let mut skipped = 0usize;

        for candidate in candidates {
            let Some(span) = candidate.valid_span(text) else {
                skipped += 1;
                continue;
            };
            match by_span.get(&span) {
                Some(&slot) => {
                    if candidate.authority > survivors[slot].1.authority {
                        survivors[slot].1 = candidate;
                    }
                }
                None => {
                    by_span.insert(span, survivors.len());
                    survivors.push((span, candidate));
                }
            }
        }

        // Stable sorts keep input order among otherwise equal candidates.
        match self.policy {
            ResolutionPolicy::LeftToRight => {
                survivors.sort_by_key(|(span, _)| (span.start, Reverse(span.len())));
            }
            ResolutionPolicy::AuthorityFirst => {
                survivors.sort_by_key(|(span, diag)| {
                    (Reverse(diag.authority), span.start, Reverse(span.len()))
                });
            }
        }

        let mut accepted: Vec<(Span, Diagnostic)> = Vec::with_capacity(survivors.len());
        for (span, diag) in survivors {
            if accepted.iter().any(|(taken, _)| taken.overlaps(&span)) {
                tracing::trace!(kind = %diag.kind, %span, "candidate shadowed");
                continue;
            }
            accepted.push((span, diag));
        }
        accepted.sort_by_key(|(span, _)| (span.start, Reverse(span.len())));

        tracing::debug!(
            accepted = accepted.len(),
            skipped,
            "reconciliation complete"
        );
        accepted.into_iter().map(|(_, diag)| diag).collect()
    }
}

/// Keep only the edits that no authoritative span covers, even partially.
///
/// A non-empty edit is dropped if it overlaps any span in `authoritative`.
/// A zero-width insertion is dropped if its anchor falls strictly inside one.
#[tracing::instrument(skip_all, fields(authoritative = authoritative.len()))]
pub fn suppress_covered<'a, I>(ops: I, authoritative: &[Span]) -> Vec<AlignmentOp>
where
    I: IntoIterator<Item = &'a AlignmentOp>,
{
    ops.into_iter()
        .filter(|op| {
            let span = op.original_span;
            !authoritative.iter().any(|auth| {
                if span.is_empty() {
                    auth.start < span.start && span.start < auth.end
                } else {
                    auth.overlaps(&span)
                }
            })
        })
        .cloned()
        .collect()
}

/// Whether no two spans in `diagnostics` overlap.
pub fn is_non_overlapping(diagnostics: &[Diagnostic]) -> bool {
    let spans: Vec<Span> = diagnostics.iter().filter_map(|d| d.span).collect();
    spans
        .iter()
        .enumerate()
        .all(|(i, a)| spans[i + 1..].iter().all(|b| !a.overlaps(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::EditKind;
    use crate::diagnostic::{Authority, Category};

    const TEXT: &str = "The quick brown fox jumps over the lazy dog today.";

    fn diag(category: Category, kind: &str, start: usize, end: usize) -> Diagnostic {
        Diagnostic::located(category, kind, Span::new(start, end), kind, "")
    }

    fn kinds(diags: &[Diagnostic]) -> Vec<&str> {
        diags.iter().map(|d| d.kind.as_str()).collect()
    }

    fn op(start: usize, end: usize) -> AlignmentOp {
        AlignmentOp {
            kind: if start == end {
                EditKind::Insert
            } else {
                EditKind::Replace
            },
            original_text: TEXT[start..end].to_string(),
            corrected_text: "x".to_string(),
            original_span: Span::new(start, end),
        }
    }

    #[test]
    fn exact_duplicate_keeps_highest_authority() {
        let registry = SpanRegistry::default();
        let out = registry.reconcile(
            TEXT,
            vec![
                diag(Category::Assistive, "edit", 10, 14),
                diag(Category::Spelling, "spelling", 10, 14),
            ],
        );
        assert_eq!(kinds(&out), vec!["spelling"]);
    }

    #[test]
    fn grammar_beats_assistive_on_same_span() {
        let registry = SpanRegistry::default();
        let out = registry.reconcile(
            TEXT,
            vec![
                diag(Category::Grammar, "tense", 4, 9),
                diag(Category::Assistive, "edit", 4, 9),
            ],
        );
        assert_eq!(kinds(&out), vec!["tense"]);
        assert_eq!(out[0].authority, Authority::Grammar);
    }

    #[test]
    fn equal_authority_duplicate_keeps_first() {
        let registry = SpanRegistry::default();
        let out = registry.reconcile(
            TEXT,
            vec![
                diag(Category::Grammar, "first", 4, 9),
                diag(Category::Mechanics, "second", 4, 9),
            ],
        );
        assert_eq!(kinds(&out), vec!["first"]);
    }

    #[test]
    fn earlier_and_wider_spans_win_left_to_right() {
        let registry = SpanRegistry::default();
        let out = registry.reconcile(
            TEXT,
            vec![
                diag(Category::Grammar, "narrow", 10, 15),
                diag(Category::Assistive, "wide", 4, 19),
                diag(Category::Spelling, "later", 20, 25),
            ],
        );
        assert_eq!(kinds(&out), vec!["wide", "later"]);
    }

    #[test]
    fn same_start_prefers_widest() {
        let registry = SpanRegistry::default();
        let out = registry.reconcile(
            TEXT,
            vec![
                diag(Category::Grammar, "short", 4, 9),
                diag(Category::Spelling, "long", 4, 15),
            ],
        );
        assert_eq!(kinds(&out), vec!["long"]);
    }

    #[test]
    fn authority_first_lets_narrow_grammar_win() {
        let registry = SpanRegistry::new(ResolutionPolicy::AuthorityFirst);
        let out = registry.reconcile(
            TEXT,
            vec![
                diag(Category::Assistive, "wide", 4, 19),
                diag(Category::Grammar, "narrow", 10, 15),
                diag(Category::Spelling, "later", 20, 25),
            ],
        );
        assert_eq!(kinds(&out), vec!["narrow", "later"]);
    }

    #[test]
    fn adjacent_spans_both_survive() {
        let registry = SpanRegistry::default();
        let out = registry.reconcile(
            TEXT,
            vec![
                diag(Category::Grammar, "a", 0, 3),
                diag(Category::Grammar, "b", 3, 9),
            ],
        );
        assert_eq!(kinds(&out), vec!["a", "b"]);
    }

    #[test]
    fn unlocated_and_malformed_are_skipped() {
        let registry = SpanRegistry::default();
        let out = registry.reconcile(
            TEXT,
            vec![
                Diagnostic::label(Category::Mechanics, "capitalization"),
                diag(Category::Grammar, "backwards", 9, 4),
                diag(Category::Grammar, "past_end", 40, 400),
                diag(Category::Grammar, "ok", 0, 3),
            ],
        );
        assert_eq!(kinds(&out), vec!["ok"]);
    }

    #[test]
    fn output_never_overlaps() {
        let registry = SpanRegistry::default();
        let mut candidates = Vec::new();
        for start in 0..20 {
            for width in [0, 1, 3, 7] {
                let category = match (start + width) % 3 {
                    0 => Category::Grammar,
                    1 => Category::Spelling,
                    _ => Category::Assistive,
                };
                candidates.push(diag(category, "c", start, start + width));
            }
        }
        for policy in [ResolutionPolicy::LeftToRight, ResolutionPolicy::AuthorityFirst] {
            let out = SpanRegistry::new(policy).reconcile(TEXT, candidates.clone());
            assert!(is_non_overlapping(&out), "{policy} produced overlaps");
        }
        assert!(!registry.reconcile(TEXT, candidates).is_empty());
    }

    #[test]
    fn reconcile_is_deterministic() {
        let registry = SpanRegistry::default();
        let candidates = vec![
            diag(Category::Assistive, "a", 4, 19),
            diag(Category::Grammar, "g", 4, 19),
            diag(Category::Spelling, "s", 16, 19),
            diag(Category::Mechanics, "m", 19, 20),
        ];
        assert_eq!(
            registry.reconcile(TEXT, candidates.clone()),
            registry.reconcile(TEXT, candidates)
        );
    }

    #[test]
    fn strict_mode_drops_partial_overlap() {
        let ops = vec![op(4, 15), op(20, 25)];
        let kept = suppress_covered(&ops, &[Span::new(10, 12)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].original_span, Span::new(20, 25));
    }

    #[test]
    fn strict_mode_keeps_untouched_and_adjacent_edits() {
        let ops = vec![op(0, 3), op(4, 9)];
        let kept = suppress_covered(&ops, &[Span::new(3, 4)]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn strict_mode_insertion_points() {
        let ops = vec![op(12, 12), op(9, 9)];
        let kept = suppress_covered(&ops, &[Span::new(10, 15)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].original_span, Span::point(9));

        // An anchor on the boundary is not inside the flagged text.
        let kept = suppress_covered(&[op(10, 10)], &[Span::new(10, 15)]);
        assert_eq!(kept.len(), 1);
    }
}
