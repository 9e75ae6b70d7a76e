//! Deterministic scoring from aggregated error counts.
//!
//! Two sub-scores share one step table:
//!
//! | errors | score |
//! |--------|-------|
//! | 0      | 100   |
//! | 1–2    | 75    |
//! | 3–5    | 50    |
//! | 6–8    | 25    |
//! | 9+     | 0     |
//!
//! *Grammar quality* is driven by grammar plus span-bearing mechanics
//! diagnostics; *spelling quality* by the number of distinct misspelled
//! words. A coarser holistic band on a 0–4 scale is reported alongside.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of each error-count step and its score.
/// Counts past the last step score zero.
const STEPS: [(usize, u8); 4] = [(0, 100), (2, 75), (5, 50), (8, 25)];

/// Maximum holistic band.
pub const MAX_BAND: u8 = 4;

/// Error counts a score is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorCounts {
    /// Grammar diagnostics, located or not.
    pub grammar: usize,
    /// Mechanics diagnostics that carry a span.
    pub mechanics: usize,
    /// Distinct misspelled words.
    pub spelling: usize,
}

/// Bounded scores for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Score {
    /// Grammar quality, 0--100.
    pub grammar: u8,
    /// Spelling quality, 0--100.
    pub spelling: u8,
    /// Holistic band, 0--4.
    pub band: u8,
}

impl Score {
    /// The score of an error-free text.
    pub const PERFECT: Self = Self {
        grammar: 100,
        spelling: 100,
        band: MAX_BAND,
    };

    /// The lower of the two sub-scores.
    pub fn min_sub_score(&self) -> u8 {
        self.grammar.min(self.spelling)
    }
}

/// Map an error count to its step-table score.
pub fn step_score(errors: usize) -> u8 {
    STEPS
        .iter()
        .find(|(max, _)| errors <= *max)
        .map_or(0, |(_, score)| *score)
}

/// Compute the score for `counts`.
#[tracing::instrument(level = "debug", ret)]
pub fn score(counts: ErrorCounts) -> Score {
    Score {
        grammar: step_score(counts.grammar.saturating_add(counts.mechanics)),
        spelling: step_score(counts.spelling),
        band: band(counts),
    }
}

/// Holistic band: start from 4, subtract a capped penalty per category,
/// round up, floor at 0. Penalties are in quarter points to stay exact.
fn band(counts: ErrorCounts) -> u8 {
    let grammar_penalty = match counts.grammar {
        0 => 0,
        1 => 4,
        2 | 3 => 6,
        _ => 8,
    };
    let mechanics_penalty = match counts.mechanics {
        0 => 0,
        1 => 1,
        2 | 3 => 2,
        _ => 4,
    };
    let spelling_penalty = match counts.spelling {
        0 => 0,
        1 | 2 => 2,
        _ => 4,
    };

    let quarters: u32 = u32::from(MAX_BAND) * 4;
    let remaining = quarters.saturating_sub(grammar_penalty + mechanics_penalty + spelling_penalty);
    // Penalties cap at 16 quarters, so this always fits.
    u8::try_from(remaining.div_ceil(4)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(grammar: usize, mechanics: usize, spelling: usize) -> ErrorCounts {
        ErrorCounts {
            grammar,
            mechanics,
            spelling,
        }
    }

    #[test]
    fn step_table() {
        let expected = [
            (0, 100),
            (1, 75),
            (2, 75),
            (3, 50),
            (5, 50),
            (6, 25),
            (8, 25),
            (9, 0),
            (1000, 0),
        ];
        for (errors, score) in expected {
            assert_eq!(step_score(errors), score, "errors = {errors}");
        }
    }

    #[test]
    fn no_errors_is_perfect() {
        assert_eq!(score(ErrorCounts::default()), Score::PERFECT);
    }

    #[test]
    fn grammar_and_mechanics_combine() {
        let s = score(counts(1, 2, 0));
        assert_eq!(s.grammar, 50);
        assert_eq!(s.spelling, 100);
    }

    #[test]
    fn nine_misspellings_floor_spelling() {
        let s = score(counts(0, 0, 9));
        assert_eq!(s.spelling, 0);
        assert_eq!(s.grammar, 100);
    }

    #[test]
    fn sub_scores_are_monotone_and_bounded() {
        for mechanics in 0..4 {
            let mut previous = u8::MAX;
            for grammar in 0..30 {
                let s = score(counts(grammar, mechanics, 0));
                assert!(s.grammar <= 100);
                assert!(s.grammar <= previous);
                assert!(s.band <= MAX_BAND);
                previous = s.grammar;
            }
        }
    }

    #[test]
    fn band_follows_distributed_penalties() {
        assert_eq!(score(counts(0, 0, 0)).band, 4);
        // 4 - 1 = 3
        assert_eq!(score(counts(1, 0, 0)).band, 3);
        // 4 - 1 - 0.25 = 2.75 -> 3
        assert_eq!(score(counts(1, 1, 0)).band, 3);
        // 4 - 1.5 - 0.5 - 0.5 = 1.5 -> 2
        assert_eq!(score(counts(2, 2, 1)).band, 2);
        // 4 - 2 - 1 - 1 = 0
        assert_eq!(score(counts(10, 10, 10)).band, 0);
    }

    #[test]
    fn band_is_monotone_in_every_count() {
        for g in 0..6 {
            for m in 0..6 {
                for s in 0..6 {
                    let base = score(counts(g, m, s)).band;
                    assert!(score(counts(g + 1, m, s)).band <= base);
                    assert!(score(counts(g, m + 1, s)).band <= base);
                    assert!(score(counts(g, m, s + 1)).band <= base);
                }
            }
        }
    }

    #[test]
    fn saturating_counts_do_not_panic() {
        let s = score(counts(usize::MAX, usize::MAX, usize::MAX));
        assert_eq!(s, Score { grammar: 0, spelling: 0, band: 0 });
    }
}
